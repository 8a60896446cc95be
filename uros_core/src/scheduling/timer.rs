use crate::core::clock::Clock;
use crate::core::support::{Context, Support};
use crate::error::{UrosError, UrosResult};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Periodic ready-event source.
///
/// A timer becomes ready once its clock reaches the next call time. Calling
/// it moves the next call time forward by whole periods, so a timer that
/// fell behind fires once and skips the periods it missed.
pub struct Timer {
    period: Duration,
    clock: Arc<dyn Clock>,
    context: Context,
    last_call_time: Duration,
    next_call_time: Duration,
    canceled: bool,
}

impl Timer {
    /// Create a timer on the support's clock, first due one period from now
    pub fn init_default(support: &Support, period: Duration) -> UrosResult<Self> {
        support.context().ensure_valid()?;
        if period.as_nanos() > i64::MAX as u128 {
            return Err(UrosError::invalid_argument("timer period does not fit in i64 nanoseconds"));
        }

        let clock = support.clock().clone();
        let now = clock.now();

        log::debug!("timer created with period {:?}", period);

        Ok(Self {
            period,
            clock,
            context: support.context().clone(),
            last_call_time: now,
            next_call_time: now + period,
            canceled: false,
        })
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Swap the period, returning the old one. Takes effect after the next call.
    pub fn exchange_period(&mut self, period: Duration) -> Duration {
        std::mem::replace(&mut self.period, period)
    }

    pub fn is_canceled(&self) -> bool {
        self.canceled
    }

    pub fn cancel(&mut self) {
        self.canceled = true;
    }

    /// Re-arm the timer one period from now, clearing a cancel
    pub fn reset(&mut self) {
        let now = self.clock.now();
        self.next_call_time = now + self.period;
        self.canceled = false;
    }

    pub fn is_ready(&self) -> UrosResult<bool> {
        self.context.ensure_valid()?;
        Ok(!self.canceled && self.clock.now() >= self.next_call_time)
    }

    /// Nanoseconds until the timer is due; negative when overdue
    pub fn time_until_next_call(&self) -> UrosResult<i64> {
        if self.canceled {
            return Err(UrosError::TimerCanceled);
        }
        let now = self.clock.now();
        Ok(signed_nanos(self.next_call_time) - signed_nanos(now))
    }

    pub fn time_since_last_call(&self) -> Duration {
        self.clock.now().saturating_sub(self.last_call_time)
    }

    /// Record a call: advance the schedule and return the nanoseconds elapsed
    /// since the previous call (or since creation for the first one).
    pub fn call(&mut self) -> UrosResult<i64> {
        self.context.ensure_valid()?;
        if self.canceled {
            return Err(UrosError::TimerCanceled);
        }

        let now = self.clock.now();
        let since_last_call = signed_nanos(now) - signed_nanos(self.last_call_time);
        self.last_call_time = now;

        if self.period.is_zero() {
            self.next_call_time = now;
        } else {
            self.next_call_time += self.period;
            if now >= self.next_call_time {
                let behind = (now - self.next_call_time).as_nanos();
                let skipped = behind / self.period.as_nanos() + 1;
                self.next_call_time +=
                    Duration::from_nanos((self.period.as_nanos() * skipped) as u64);
            }
        }

        Ok(since_last_call)
    }

    pub(crate) fn next_call_time(&self) -> Duration {
        self.next_call_time
    }

    pub(crate) fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }
}

impl fmt::Debug for Timer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Timer")
            .field("period", &self.period)
            .field("next_call_time", &self.next_call_time)
            .field("canceled", &self.canceled)
            .finish_non_exhaustive()
    }
}

fn signed_nanos(d: Duration) -> i64 {
    i64::try_from(d.as_nanos()).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::ManualClock;
    use crate::core::support::{Allocator, InitOptions};

    fn manual_support() -> (Support, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        let support = Support::init(
            InitOptions::new().with_clock(clock.clone()),
            &Allocator::default_allocator(),
        )
        .unwrap();
        (support, clock)
    }

    #[test]
    fn ready_after_one_period() {
        let (support, clock) = manual_support();
        let timer = Timer::init_default(&support, Duration::from_millis(3000)).unwrap();

        assert!(!timer.is_ready().unwrap());
        assert_eq!(timer.time_until_next_call().unwrap(), 3_000_000_000);

        clock.advance(Duration::from_millis(2999));
        assert!(!timer.is_ready().unwrap());

        clock.advance(Duration::from_millis(1));
        assert!(timer.is_ready().unwrap());
    }

    #[test]
    fn call_reports_time_since_last_call() {
        let (support, clock) = manual_support();
        let mut timer = Timer::init_default(&support, Duration::from_millis(100)).unwrap();

        clock.advance(Duration::from_millis(120));
        assert_eq!(timer.call().unwrap(), 120_000_000);
        // next call stays on the 100 ms grid
        assert_eq!(timer.time_until_next_call().unwrap(), 80_000_000);

        clock.advance(Duration::from_millis(80));
        assert_eq!(timer.call().unwrap(), 80_000_000);
    }

    #[test]
    fn missed_periods_are_skipped() {
        let (support, clock) = manual_support();
        let mut timer = Timer::init_default(&support, Duration::from_millis(100)).unwrap();

        clock.advance(Duration::from_millis(350));
        timer.call().unwrap();
        assert!(!timer.is_ready().unwrap());
        assert_eq!(timer.next_call_time(), Duration::from_millis(400));
    }

    #[test]
    fn canceled_timer_never_ready() {
        let (support, clock) = manual_support();
        let mut timer = Timer::init_default(&support, Duration::from_millis(10)).unwrap();
        timer.cancel();

        clock.advance(Duration::from_secs(1));
        assert!(!timer.is_ready().unwrap());
        assert!(matches!(timer.call(), Err(UrosError::TimerCanceled)));
        assert!(matches!(timer.time_until_next_call(), Err(UrosError::TimerCanceled)));

        timer.reset();
        assert!(!timer.is_canceled());
        assert_eq!(timer.time_until_next_call().unwrap(), 10_000_000);
    }

    #[test]
    fn exchange_period_applies_after_next_call() {
        let (support, clock) = manual_support();
        let mut timer = Timer::init_default(&support, Duration::from_millis(100)).unwrap();

        assert_eq!(
            timer.exchange_period(Duration::from_millis(50)),
            Duration::from_millis(100)
        );
        clock.advance(Duration::from_millis(100));
        assert!(timer.is_ready().unwrap());
        timer.call().unwrap();
        assert_eq!(timer.time_until_next_call().unwrap(), 50_000_000);
    }

    #[test]
    fn timer_on_shut_down_context() {
        let (support, _clock) = manual_support();
        let timer = Timer::init_default(&support, Duration::from_millis(10)).unwrap();
        support.context().shutdown().unwrap();
        assert!(matches!(timer.is_ready(), Err(UrosError::NotInit)));
    }
}
