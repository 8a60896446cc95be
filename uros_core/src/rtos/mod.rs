// Task shim for the client library
//
// Applications are written as a single task entry function that sets up its
// endpoints and then loops forever. On a hosted target a task is a named
// std thread; delays block only the calling task.

use crate::error::{UrosError, UrosResult};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Task priority levels
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TaskPriority {
    Idle = 0,
    Low = 10,
    Normal = 50,
    High = 70,
    RealTime = 90,
}

/// Smallest stack a hosted task gets. Unwinding a panic needs more than a
/// typical embedded task stack.
pub const MIN_STACK_SIZE: usize = 64 * 1024;

/// Task attributes for creating tasks
#[derive(Debug, Clone)]
pub struct TaskAttributes {
    pub name: String,
    pub priority: TaskPriority,
    pub stack_size: usize,
}

impl Default for TaskAttributes {
    fn default() -> Self {
        Self {
            name: "uros_task".to_string(),
            priority: TaskPriority::Normal,
            stack_size: MIN_STACK_SIZE,
        }
    }
}

/// Handle to a spawned task
#[derive(Debug)]
pub struct TaskHandle {
    name: String,
    join: JoinHandle<()>,
}

impl TaskHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Wait for the task to end
    pub fn join(self) -> UrosResult<()> {
        self.join
            .join()
            .map_err(|_| UrosError::Internal(format!("task '{}' panicked", self.name)))
    }
}

/// Spawn `entry` as a new task.
///
/// Priorities are advisory on hosted targets and only recorded in the log.
/// Stack sizes below [`MIN_STACK_SIZE`] are raised to it.
pub fn spawn_task<F>(attrs: TaskAttributes, entry: F) -> UrosResult<TaskHandle>
where
    F: FnOnce() + Send + 'static,
{
    if attrs.stack_size == 0 {
        return Err(UrosError::invalid_argument("task stack size must be non-zero"));
    }

    let stack_size = attrs.stack_size.max(MIN_STACK_SIZE);
    let join = thread::Builder::new()
        .name(attrs.name.clone())
        .stack_size(stack_size)
        .spawn(entry)?;

    log::info!(
        "task '{}' started (priority {:?}, stack {} bytes)",
        attrs.name,
        attrs.priority,
        stack_size
    );

    Ok(TaskHandle {
        name: attrs.name,
        join,
    })
}

/// Block the calling task for `duration`
pub fn task_delay(duration: Duration) {
    if !duration.is_zero() {
        thread::sleep(duration);
    }
}

/// Name of the calling task, if it has one
pub fn current_task_name() -> Option<String> {
    thread::current().name().map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::time::Instant;

    #[test]
    fn spawned_task_runs_with_its_name() {
        let seen = Arc::new(AtomicBool::new(false));
        let flag = seen.clone();

        let handle = spawn_task(
            TaskAttributes {
                name: "worker".to_string(),
                ..Default::default()
            },
            move || {
                assert_eq!(current_task_name().as_deref(), Some("worker"));
                flag.store(true, Ordering::SeqCst);
            },
        )
        .unwrap();

        assert_eq!(handle.name(), "worker");
        handle.join().unwrap();
        assert!(seen.load(Ordering::SeqCst));
    }

    #[test]
    fn panicking_task_reports_error() {
        let handle = spawn_task(TaskAttributes::default(), || panic!("boom")).unwrap();
        let err = handle.join().unwrap_err();
        assert!(matches!(err, UrosError::Internal(_)));
    }

    #[test]
    fn small_stack_is_raised_so_panics_unwind() {
        let attrs = TaskAttributes {
            name: "tiny".to_string(),
            stack_size: 4 * 1024,
            ..Default::default()
        };
        let handle = spawn_task(attrs, || panic!("unwinds on a hosted stack")).unwrap();
        assert!(matches!(handle.join(), Err(UrosError::Internal(_))));
    }

    #[test]
    fn zero_stack_is_rejected() {
        let attrs = TaskAttributes {
            stack_size: 0,
            ..Default::default()
        };
        assert!(spawn_task(attrs, || {}).is_err());
    }

    #[test]
    fn delay_blocks_at_least_the_requested_time() {
        let start = Instant::now();
        task_delay(Duration::from_millis(5));
        assert!(start.elapsed() >= Duration::from_millis(5));
    }
}
