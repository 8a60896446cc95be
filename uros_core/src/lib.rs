//! # uros core
//!
//! A small in-process client library with the lifecycle surface of a
//! micro ROS client. It provides the building blocks an embedded
//! application binds to:
//!
//! - **Support**: init options, the shared context and the default allocator
//! - **Nodes**: named endpoints that resolve topic names inside a namespace
//! - **Communication**: typed publishers and subscriptions over a transport
//! - **Scheduling**: periodic timers and a cooperative executor
//! - **RTOS**: a thin task shim (spawn, delay, join)
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use uros_core::{Allocator, Executor, InitOptions, Int32, Invocation, Node, Publisher, Support};
//!
//! struct Counter {
//!     publisher: Publisher<Int32>,
//!     msg: Int32,
//! }
//!
//! let allocator = Allocator::default_allocator();
//! let support = Support::init(InitOptions::default(), &allocator).unwrap();
//! let node = Node::init_default("counter", "", &support).unwrap();
//! let publisher = Publisher::init_default(&node, "count").unwrap();
//! let timer = uros_core::Timer::init_default(&support, Duration::from_millis(500)).unwrap();
//!
//! let mut executor = Executor::new(support.context(), 1, &allocator).unwrap();
//! executor
//!     .add_timer(timer, |ctx: &mut Counter, _timer, _elapsed| {
//!         let _ = ctx.publisher.publish(&ctx.msg);
//!         ctx.msg.data += 1;
//!     })
//!     .unwrap();
//!
//! let mut ctx = Counter { publisher, msg: Int32::default() };
//! executor.spin_some(&mut ctx, Duration::from_millis(10)).unwrap();
//! # let _ = Invocation::OnNewData;
//! ```

pub mod communication;
pub mod core;
pub mod error;
pub mod messages;
pub mod params;
pub mod rtos;
pub mod scheduling;

// Re-export commonly used types for easy access
pub use communication::{
    EndpointId, EndpointMetrics, History, LocalTransport, Message, Publisher, QosProfile,
    Subscription, Transport,
};
pub use core::{Allocator, Clock, Context, InitOptions, ManualClock, Node, SteadyClock, Support};
pub use error::{UrosError, UrosResult};
pub use messages::std_msgs::Int32;
pub use params::RuntimeParams;
pub use scheduling::{Executor, Invocation, Timer};
