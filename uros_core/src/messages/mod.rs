//! Message types carried by the client library
//!
//! Messages are grouped by package the way generated interface code is:
//! - `std_msgs`: primitive wrappers (Int32)

pub mod std_msgs;

pub use std_msgs::Int32;
