//! Setup, run loop and teardown of the application task.

use crate::app::{self, AppContext};
use crate::config::AppConfig;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use uros_core::rtos;
use uros_core::{
    Allocator, Executor, InitOptions, Int32, Invocation, Node, Publisher, Subscription, Support,
    Timer, UrosError,
};

/// Creation steps of the setup sequence, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupStep {
    Support,
    Node,
    Publisher,
    Subscription,
    Timer,
    Executor,
    AddSubscription,
    AddTimer,
}

impl fmt::Display for SetupStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SetupStep::Support => "support init",
            SetupStep::Node => "node init",
            SetupStep::Publisher => "publisher init",
            SetupStep::Subscription => "subscription init",
            SetupStep::Timer => "timer init",
            SetupStep::Executor => "executor init",
            SetupStep::AddSubscription => "executor add subscription",
            SetupStep::AddTimer => "executor add timer",
        };
        f.write_str(name)
    }
}

/// A fatal failure during setup. The run loop is never entered.
#[derive(Debug, Error)]
#[error("{step} failed on line {line} with status {code}")]
pub struct SetupError {
    pub step: SetupStep,
    pub line: u32,
    pub code: i32,
    #[source]
    pub source: UrosError,
}

/// A fully set up application, ready to spin.
pub struct App {
    support: Support,
    executor: Executor<AppContext>,
    ctx: AppContext,
    spin_timeout: Duration,
    idle_sleep: Duration,
}

impl fmt::Debug for App {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("App")
            .field("node", &self.ctx.node.fully_qualified_name())
            .field("executor", &self.executor)
            .field("spin_timeout", &self.spin_timeout)
            .field("idle_sleep", &self.idle_sleep)
            .finish_non_exhaustive()
    }
}

/// Create every entity and register it with the executor.
///
/// `options` supplies the transport and clock; the domain id always comes
/// from `config`.
pub fn setup(config: &AppConfig, options: InitOptions) -> Result<App, SetupError> {
    let allocator = Allocator::default_allocator();

    let support = rc_check!(
        SetupStep::Support,
        Support::init(options.with_domain_id(config.domain_id), &allocator)
    );

    let node = rc_check!(
        SetupStep::Node,
        Node::init_default(&config.node_name, &config.namespace, &support)
    );
    let params = node.params();
    let timer_period_ms = rc_check!(
        SetupStep::Node,
        params.declare("timer_period_ms", config.timer_period_ms)
    );
    let spin_timeout_ms = rc_check!(
        SetupStep::Node,
        params.declare("spin_timeout_ms", config.spin_timeout_ms)
    );
    let idle_sleep_us = rc_check!(
        SetupStep::Node,
        params.declare("idle_sleep_us", config.idle_sleep_us)
    );

    let publisher: Publisher<Int32> = rc_check!(
        SetupStep::Publisher,
        Publisher::init_default(&node, &config.publisher_topic)
    );

    let subscription: Subscription<Int32> = rc_check!(
        SetupStep::Subscription,
        Subscription::init_default(&node, &config.subscriber_topic)
    );

    let timer = rc_check!(
        SetupStep::Timer,
        Timer::init_default(&support, Duration::from_millis(timer_period_ms))
    );

    let mut executor = rc_check!(
        SetupStep::Executor,
        Executor::new(support.context(), config.executor_capacity, &allocator)
    );
    register_handles(&mut executor, subscription.clone(), timer)?;

    tracing::info!(
        node = %node.fully_qualified_name(),
        publisher = %publisher.topic_name(),
        subscription = %subscription.topic_name(),
        "setup complete"
    );

    Ok(App {
        support,
        executor,
        ctx: AppContext::new(node, publisher, subscription),
        spin_timeout: Duration::from_millis(spin_timeout_ms),
        idle_sleep: Duration::from_micros(idle_sleep_us),
    })
}

/// Add the subscription, then the timer, to `executor`.
pub fn register_handles(
    executor: &mut Executor<AppContext>,
    subscription: Subscription<Int32>,
    timer: Timer,
) -> Result<(), SetupError> {
    rc_check!(
        SetupStep::AddSubscription,
        executor.add_subscription(subscription, app::subscription_callback, Invocation::OnNewData)
    );
    rc_check!(
        SetupStep::AddTimer,
        executor.add_timer(timer, app::timer_callback)
    );
    Ok(())
}

impl App {
    pub fn context(&self) -> &AppContext {
        &self.ctx
    }

    pub fn support(&self) -> &Support {
        &self.support
    }

    pub fn executor(&self) -> &Executor<AppContext> {
        &self.executor
    }

    /// One loop iteration: spin the executor once, then idle.
    /// Returns the number of callbacks run.
    pub fn step(&mut self) -> usize {
        let dispatched = rc_soft_check!(self.executor.spin_some(&mut self.ctx, self.spin_timeout))
            .unwrap_or(0);
        rtos::task_delay(self.idle_sleep);
        dispatched
    }

    /// Loop until `stop` is set or the context is shut down.
    /// Without a stop flag this only returns on shutdown.
    pub fn run(&mut self, stop: Option<&AtomicBool>) {
        loop {
            if stop.is_some_and(|flag| flag.load(Ordering::Acquire)) {
                tracing::info!("stop requested");
                break;
            }
            if !self.support.context().is_valid() {
                tracing::warn!("context shut down, leaving run loop");
                break;
            }
            self.step();
        }
    }

    /// Finalize publisher, subscription and node, in that order, then shut
    /// the support down. Failures are logged and skipped.
    pub fn teardown(self) {
        let App {
            support,
            executor,
            mut ctx,
            ..
        } = self;

        rc_soft_check!(ctx.publisher.fini(&ctx.node));
        rc_soft_check!(ctx.subscription.fini(&ctx.node));
        rc_soft_check!(ctx.node.fini());
        drop(executor);
        rc_soft_check!(support.fini());

        tracing::info!("teardown complete");
    }
}

/// Argument of [`app_main`].
///
/// `TaskArgs::default()` (also reachable as `()`) is the stock task: built-in
/// settings, default transport and clock, and no stop flag.
#[derive(Debug, Default)]
pub struct TaskArgs {
    pub config: AppConfig,
    pub options: InitOptions,
    /// When set, the loop ends and the app is torn down
    pub stop: Option<Arc<AtomicBool>>,
}

impl From<()> for TaskArgs {
    fn from(_: ()) -> Self {
        Self::default()
    }
}

/// Task entry point: set up, run until stopped, then tear down.
///
/// A setup failure has already been logged when this returns it; the task
/// simply ends.
pub fn app_main(arg: impl Into<TaskArgs>) -> Result<(), SetupError> {
    let TaskArgs {
        config,
        options,
        stop,
    } = arg.into();

    tracing::info!(
        task = rtos::current_task_name().as_deref().unwrap_or("<unnamed>"),
        "application task starting"
    );

    let mut app = setup(&config, options)?;
    app.run(stop.as_deref());
    app.teardown();
    Ok(())
}
