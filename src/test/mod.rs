mod data_rate;
mod exp_driver;
mod network_integration;
mod onoff;
mod queues;
mod sim_time;
mod topologies;
