//! # Scheduling
//!
//! - **Timer**: periodic ready-event source measured on the support clock
//! - **Executor**: cooperative dispatcher for timers and subscriptions
//!
//! ## Usage
//!
//! ```rust,ignore
//! let mut executor = Executor::new(support.context(), 3, &allocator)?;
//! executor.add_subscription(subscription, on_message, Invocation::OnNewData)?;
//! executor.add_timer(timer, on_timer)?;
//! loop {
//!     executor.spin_some(&mut app, Duration::from_millis(10))?;
//! }
//! ```

pub mod executor;
pub mod timer;

pub use executor::{Executor, Invocation, DEFAULT_SPIN_TIMEOUT};
pub use timer::Timer;
