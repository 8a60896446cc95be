//! Application context and executor callbacks.

use uros_core::{Int32, Node, Publisher, Subscription, Timer};

/// Everything the application creates during setup, handed to every callback.
#[derive(Debug)]
pub struct AppContext {
    pub node: Node,
    pub publisher: Publisher<Int32>,
    pub subscription: Subscription<Int32>,
    /// Outgoing message; its value is the counter
    pub msg: Int32,
}

impl AppContext {
    pub fn new(node: Node, publisher: Publisher<Int32>, subscription: Subscription<Int32>) -> Self {
        Self {
            node,
            publisher,
            subscription,
            msg: Int32::new(0),
        }
    }

    /// Next value the timer will publish
    pub fn counter(&self) -> i32 {
        self.msg.data
    }

    fn publish_and_increment(&mut self) {
        rc_soft_check!(self.publisher.publish(&self.msg));
        self.msg.data = self.msg.data.wrapping_add(1);
    }
}

/// Timer callback: publishes the counter twice per firing.
///
/// The first publish only happens when the executor passes the timer; the
/// second one always does. Both advance the counter.
pub fn timer_callback(ctx: &mut AppContext, timer: Option<&Timer>, _last_call_time: i64) {
    if timer.is_some() {
        ctx.publish_and_increment();
    }
    ctx.publish_and_increment();
}

pub fn subscription_callback(_ctx: &mut AppContext, msg: Option<&Int32>) {
    if let Some(msg) = msg {
        tracing::info!("Received: {}", msg.data);
    }
}
