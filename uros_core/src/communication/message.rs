//! Message trait shared by every type carried on a topic

use crate::error::UrosResult;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Debug;

/// Trait for providing lightweight logging summaries of message types
///
/// Large messages should only include metadata; small ones can print
/// their payload directly.
pub trait LogSummary {
    /// Return a compact string representation suitable for logging
    fn log_summary(&self) -> String;
}

/// A typed message with a stable type name and a binary encoding.
pub trait Message:
    Serialize + DeserializeOwned + Clone + Default + Debug + LogSummary + Send + 'static
{
    /// Fully qualified interface name, e.g. `std_msgs/msg/Int32`
    const TYPE_NAME: &'static str;

    fn encode(&self) -> UrosResult<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    fn decode(bytes: &[u8]) -> UrosResult<Self> {
        Ok(bincode::deserialize(bytes)?)
    }
}
