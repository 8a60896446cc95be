//! # Core types of the client library
//!
//! - **Support**: init options, the shared [`Context`] and the default [`Allocator`]
//! - **Node**: a named endpoint that owns topic name resolution and parameters
//! - **Clock**: the time source timers are measured against
//!
//! ## Lifecycle
//!
//! 1. **Support** - `Support::init()` creates the context
//! 2. **Node** - `Node::init_default()` binds a name and namespace to the context
//! 3. **Endpoints** - publishers, subscriptions and timers are created from the node/support
//! 4. **Finalization** - endpoints, then the node, then the support are finalized

pub mod clock;
pub mod names;
pub mod node;
pub mod support;

pub use clock::{Clock, ManualClock, SteadyClock};
pub use node::Node;
pub use support::{Allocator, Context, InitOptions, Support};
