//! 拓扑构建
//!
//! Builders for the two scenario shapes: isolated point-to-point pairs and a
//! single shared ad-hoc channel.

pub mod adhoc;
pub mod point_to_point;

pub use adhoc::{build_adhoc, AdhocOpts};
pub use point_to_point::{build_point_to_point_pairs, PointToPointOpts};
