//! # Communication layer
//!
//! Typed endpoints on top of a byte-oriented transport:
//!
//! - **Publisher**: serializes messages and hands them to the transport
//! - **Subscription**: takes queued payloads and deserializes them into a buffer
//! - **Transport**: the bus abstraction; [`LocalTransport`] is the in-process implementation
//!
//! ## Usage
//!
//! ```rust,no_run
//! use uros_core::{Allocator, InitOptions, Int32, Node, Publisher, Subscription, Support};
//!
//! let support = Support::init(InitOptions::default(), &Allocator::default_allocator()).unwrap();
//! let node = Node::init_default("talker", "", &support).unwrap();
//! let publisher: Publisher<Int32> = Publisher::init_default(&node, "chatter").unwrap();
//! let subscription: Subscription<Int32> = Subscription::init_default(&node, "chatter").unwrap();
//!
//! publisher.publish(&Int32::new(1)).unwrap();
//! let mut buffer = Int32::default();
//! subscription.take(&mut buffer).unwrap();
//! ```

pub mod local;
pub mod message;
pub mod metrics;
pub mod publisher;
pub mod subscription;
pub mod transport;

pub use local::LocalTransport;
pub use message::{LogSummary, Message};
pub use metrics::{AtomicEndpointMetrics, EndpointMetrics};
pub use publisher::Publisher;
pub use subscription::Subscription;
pub use transport::{EndpointId, History, QosProfile, Transport};
