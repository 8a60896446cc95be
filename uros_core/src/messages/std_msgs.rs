//! Primitive wrapper messages

use crate::communication::message::{LogSummary, Message};
use serde::{Deserialize, Serialize};

/// A single signed 32-bit integer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Int32 {
    pub data: i32,
}

impl Int32 {
    pub fn new(data: i32) -> Self {
        Self { data }
    }
}

impl Message for Int32 {
    const TYPE_NAME: &'static str = "std_msgs/msg/Int32";
}

impl LogSummary for Int32 {
    fn log_summary(&self) -> String {
        self.data.to_string()
    }
}

impl From<i32> for Int32 {
    fn from(data: i32) -> Self {
        Self { data }
    }
}
