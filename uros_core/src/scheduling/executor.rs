use crate::communication::{EndpointId, Message, Subscription};
use crate::core::support::{Allocator, Context};
use crate::error::{UrosError, UrosResult};
use crate::rtos;
use crate::scheduling::timer::Timer;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Default bound used by [`Executor::spin`] and friends for each wait
pub const DEFAULT_SPIN_TIMEOUT: Duration = Duration::from_millis(100);

/// When a subscription callback is invoked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Invocation {
    /// Only when a message was taken
    OnNewData,
    /// On every spin; the callback gets `None` when nothing arrived
    Always,
}

type TimerCallback<C> = Box<dyn FnMut(&mut C, Option<&Timer>, i64) + Send>;

/// Type-erased subscription handle so one executor can hold several message types
trait SubscriptionEntry<C>: Send {
    fn endpoint_id(&self) -> EndpointId;
    fn topic_name(&self) -> &str;
    fn has_data(&self) -> bool;
    /// Take and dispatch. Returns whether the callback ran.
    fn execute(&mut self, ctx: &mut C, data_ready: bool) -> UrosResult<bool>;
}

struct TypedSubscription<C, M: Message> {
    subscription: Subscription<M>,
    buffer: M,
    callback: Box<dyn FnMut(&mut C, Option<&M>) + Send>,
    invocation: Invocation,
}

impl<C, M: Message> SubscriptionEntry<C> for TypedSubscription<C, M> {
    fn endpoint_id(&self) -> EndpointId {
        self.subscription.endpoint_id()
    }

    fn topic_name(&self) -> &str {
        self.subscription.topic_name()
    }

    fn has_data(&self) -> bool {
        self.subscription.has_data()
    }

    fn execute(&mut self, ctx: &mut C, data_ready: bool) -> UrosResult<bool> {
        if data_ready {
            match self.subscription.take(&mut self.buffer) {
                Ok(()) => {
                    (self.callback)(ctx, Some(&self.buffer));
                    return Ok(true);
                }
                Err(UrosError::SubscriptionTakeFailed(_)) => {}
                Err(e) => return Err(e),
            }
        }

        if self.invocation == Invocation::Always {
            (self.callback)(ctx, None);
            Ok(true)
        } else {
            Ok(false)
        }
    }
}

enum Handle<C> {
    Subscription(Box<dyn SubscriptionEntry<C>>),
    Timer {
        timer: Timer,
        callback: TimerCallback<C>,
    },
}

/// Cooperative dispatcher with a fixed number of handle slots.
///
/// Callbacks receive `&mut C`, the application context passed to the spin
/// call, so no state has to live in globals. Callbacks run to completion in
/// registration order; each handle is dispatched at most once per spin.
pub struct Executor<C> {
    context: Context,
    handles: Vec<Handle<C>>,
    capacity: usize,
    timeout: Duration,
    invocation_time: Option<Instant>,
}

impl<C> fmt::Debug for Executor<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Executor")
            .field("handles", &self.handles.len())
            .field("capacity", &self.capacity)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl<C: 'static> Executor<C> {
    /// Create an executor with room for `capacity` handles.
    ///
    /// The handle table is reserved up front through `allocator`.
    pub fn new(context: &Context, capacity: usize, allocator: &Allocator) -> UrosResult<Self> {
        context.ensure_valid()?;
        if capacity == 0 {
            return Err(UrosError::invalid_argument("executor capacity must be at least 1"));
        }

        log::debug!("executor created with {} handle slots", capacity);

        Ok(Self {
            context: context.clone(),
            handles: allocator.reserve(capacity)?,
            capacity,
            timeout: DEFAULT_SPIN_TIMEOUT,
            invocation_time: None,
        })
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Wait bound used by [`Executor::spin`], [`Executor::spin_until`] and
    /// [`Executor::spin_one_period`]
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    fn ensure_slot(&self) -> UrosResult<()> {
        if self.handles.len() >= self.capacity {
            return Err(UrosError::ExecutorFull {
                capacity: self.capacity,
            });
        }
        Ok(())
    }

    /// Register a subscription. Taken messages land in an executor-owned
    /// buffer that is handed to `callback`.
    pub fn add_subscription<M, F>(
        &mut self,
        subscription: Subscription<M>,
        callback: F,
        invocation: Invocation,
    ) -> UrosResult<()>
    where
        M: Message,
        F: FnMut(&mut C, Option<&M>) + Send + 'static,
    {
        self.ensure_slot()?;
        if !subscription.is_valid() {
            return Err(UrosError::SubscriptionInvalid(
                subscription.topic_name().to_string(),
            ));
        }

        log::debug!(
            "executor: added subscription on '{}' ({:?})",
            subscription.topic_name(),
            invocation
        );

        self.handles
            .push(Handle::Subscription(Box::new(TypedSubscription {
                subscription,
                buffer: M::default(),
                callback: Box::new(callback),
                invocation,
            })));
        Ok(())
    }

    /// Register a timer; `callback` gets the timer and the nanoseconds since its last call
    pub fn add_timer<F>(&mut self, timer: Timer, callback: F) -> UrosResult<()>
    where
        F: FnMut(&mut C, Option<&Timer>, i64) + Send + 'static,
    {
        self.ensure_slot()?;

        log::debug!("executor: added timer with period {:?}", timer.period());

        self.handles.push(Handle::Timer {
            timer,
            callback: Box::new(callback),
        });
        Ok(())
    }

    /// Mutable access to the registered timers, in registration order
    pub fn timers_mut(&mut self) -> impl Iterator<Item = &mut Timer> {
        self.handles.iter_mut().filter_map(|handle| match handle {
            Handle::Timer { timer, .. } => Some(timer),
            Handle::Subscription(_) => None,
        })
    }

    /// Topics of the registered subscriptions, in registration order
    pub fn subscription_topics(&self) -> Vec<String> {
        self.handles
            .iter()
            .filter_map(|handle| match handle {
                Handle::Subscription(entry) => Some(entry.topic_name().to_string()),
                Handle::Timer { .. } => None,
            })
            .collect()
    }

    fn readiness(&self) -> UrosResult<Vec<bool>> {
        self.handles
            .iter()
            .map(|handle| match handle {
                Handle::Subscription(entry) => Ok(entry.has_data()),
                Handle::Timer { timer, .. } => timer.is_ready(),
            })
            .collect()
    }

    fn time_until_next_timer(&self) -> Option<Duration> {
        self.handles
            .iter()
            .filter_map(|handle| match handle {
                Handle::Timer { timer, .. } if !timer.is_canceled() => {
                    Some(timer.next_call_time().saturating_sub(timer.clock().now()))
                }
                _ => None,
            })
            .min()
    }

    /// Wait up to `timeout` for a timer to become due or a message to arrive,
    /// then dispatch every ready handle once, in registration order.
    ///
    /// Subscriptions registered with [`Invocation::Always`] are dispatched
    /// even when the wait timed out. Returns the number of callbacks run.
    pub fn spin_some(&mut self, ctx: &mut C, timeout: Duration) -> UrosResult<usize> {
        self.context.ensure_valid()?;

        if self.handles.is_empty() {
            rtos::task_delay(timeout);
            return Ok(0);
        }

        let subscriptions: Vec<EndpointId> = self
            .handles
            .iter()
            .filter_map(|handle| match handle {
                Handle::Subscription(entry) => Some(entry.endpoint_id()),
                Handle::Timer { .. } => None,
            })
            .collect();

        let deadline = Instant::now() + timeout;
        let ready = loop {
            let ready = self.readiness()?;
            if ready.iter().any(|r| *r) {
                break ready;
            }

            let now = Instant::now();
            if now >= deadline {
                break ready;
            }

            let mut wait = deadline - now;
            if let Some(until_timer) = self.time_until_next_timer() {
                wait = wait.min(until_timer);
            }
            if !wait.is_zero() {
                self.context.transport().wait(&subscriptions, wait);
            }
        };

        let mut dispatched = 0;
        for (handle, data_ready) in self.handles.iter_mut().zip(ready) {
            match handle {
                Handle::Timer { timer, callback } => {
                    if !data_ready {
                        continue;
                    }
                    match timer.call() {
                        Ok(since_last_call) => {
                            callback(ctx, Some(&*timer), since_last_call);
                            dispatched += 1;
                        }
                        Err(UrosError::TimerCanceled) => {}
                        Err(e) => return Err(e),
                    }
                }
                Handle::Subscription(entry) => {
                    if entry.execute(ctx, data_ready)? {
                        dispatched += 1;
                    }
                }
            }
        }

        Ok(dispatched)
    }

    /// Spin once, then sleep so consecutive calls start `period` apart
    pub fn spin_one_period(&mut self, ctx: &mut C, period: Duration) -> UrosResult<usize> {
        let started = *self.invocation_time.get_or_insert_with(Instant::now);
        let dispatched = self.spin_some(ctx, self.timeout)?;

        let next = started + period;
        let now = Instant::now();
        if next > now {
            rtos::task_delay(next - now);
            self.invocation_time = Some(next);
        } else {
            // overran the period, restart the grid from now
            self.invocation_time = Some(now);
        }
        Ok(dispatched)
    }

    /// Spin until `stop` is set or the context is shut down
    pub fn spin_until(&mut self, ctx: &mut C, stop: &AtomicBool) -> UrosResult<()> {
        while !stop.load(Ordering::Acquire) && self.context.is_valid() {
            match self.spin_some(ctx, self.timeout) {
                Ok(_) => {}
                Err(UrosError::NotInit) => break,
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    /// Spin until the context is shut down
    pub fn spin(&mut self, ctx: &mut C) -> UrosResult<()> {
        self.spin_until(ctx, &AtomicBool::new(false))
    }
}
