//! Transport abstraction used by publishers, subscriptions and the executor.
//!
//! A transport moves opaque payloads between endpoints attached to the same
//! topic. Endpoints are identified by an [`EndpointId`] handed out at
//! registration time.

use crate::error::UrosResult;
use std::fmt::Debug;
use std::time::Duration;
use uuid::Uuid;

/// Globally unique endpoint identifier
pub type EndpointId = Uuid;

/// Queueing policy of a subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum History {
    /// Keep at most this many messages, dropping the oldest
    KeepLast(usize),
    /// Keep everything until taken
    KeepAll,
}

/// Quality of service settings for an endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QosProfile {
    pub history: History,
}

impl QosProfile {
    /// Keep the last 10 messages
    pub const fn default_profile() -> Self {
        Self {
            history: History::KeepLast(10),
        }
    }

    /// Keep the last 5 messages, the usual choice for sensor streams
    pub const fn sensor_data() -> Self {
        Self {
            history: History::KeepLast(5),
        }
    }

    pub const fn keep_last(depth: usize) -> Self {
        Self {
            history: History::KeepLast(depth),
        }
    }
}

impl Default for QosProfile {
    fn default() -> Self {
        Self::default_profile()
    }
}

/// Byte-oriented message bus
pub trait Transport: Send + Sync + Debug {
    /// Attach a publisher of `type_name` to `topic`
    fn register_publisher(&self, topic: &str, type_name: &'static str) -> UrosResult<EndpointId>;

    /// Attach a subscription of `type_name` to `topic`
    fn register_subscription(
        &self,
        topic: &str,
        type_name: &'static str,
        qos: QosProfile,
    ) -> UrosResult<EndpointId>;

    /// Detach an endpoint and drop anything still queued for it
    fn unregister(&self, endpoint: EndpointId) -> UrosResult<()>;

    /// Deliver `payload` to every subscription on the publisher's topic
    fn publish(&self, publisher: EndpointId, payload: Vec<u8>) -> UrosResult<()>;

    /// Pop the oldest queued payload of a subscription
    fn take(&self, subscription: EndpointId) -> UrosResult<Option<Vec<u8>>>;

    /// Whether a subscription has queued payloads
    fn has_data(&self, subscription: EndpointId) -> bool;

    /// Block until one of `subscriptions` has data or `timeout` elapses.
    /// Returns true when data is available.
    fn wait(&self, subscriptions: &[EndpointId], timeout: Duration) -> bool;
}
