//! Int32 publish/subscribe application.
//!
//! One node publishes a counter on a timer and logs every integer it
//! receives. All state lives in [`app::AppContext`], which the executor hands
//! to the callbacks.

#[macro_use]
mod check;

pub mod app;
pub mod config;
pub mod task;

pub use app::AppContext;
pub use config::AppConfig;
pub use task::{app_main, register_handles, setup, App, SetupError, SetupStep, TaskArgs};
