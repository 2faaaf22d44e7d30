pub mod exp;
pub mod flowmon;
pub mod net;
pub mod proto;
pub mod queue;
pub mod sim;
pub mod topo;

#[cfg(test)]
mod test;
