//! Deferred tasks on the engine clock.
//!
//! Tasks are plain values scheduled for an instant; the owner polls with
//! [`Scheduler::take_due`] whenever its clock advances.

use std::time::Duration;

/// Handle returned by [`Scheduler::schedule`], used to cancel a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskHandle(u64);

#[derive(Debug, Clone)]
struct Scheduled<T> {
    handle: TaskHandle,
    due: Duration,
    task: T,
}

/// Ordered set of pending tasks.
#[derive(Debug, Clone)]
pub struct Scheduler<T> {
    next_handle: u64,
    pending: Vec<Scheduled<T>>,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self {
            next_handle: 0,
            pending: Vec::new(),
        }
    }
}

impl<T> Scheduler<T> {
    /// Empty scheduler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `task` to fire once the clock reaches `due`.
    pub fn schedule(&mut self, due: Duration, task: T) -> TaskHandle {
        let handle = TaskHandle(self.next_handle);
        self.next_handle += 1;
        self.pending.push(Scheduled { handle, due, task });
        handle
    }

    /// Cancel `previous` (if still pending) and queue `task` in its place.
    pub fn reschedule(
        &mut self,
        previous: Option<TaskHandle>,
        due: Duration,
        task: T,
    ) -> TaskHandle {
        if let Some(handle) = previous {
            self.cancel(handle);
        }
        self.schedule(due, task)
    }

    /// Drop a pending task. Returns false if it already fired or was cancelled.
    pub fn cancel(&mut self, handle: TaskHandle) -> bool {
        let before = self.pending.len();
        self.pending.retain(|entry| entry.handle != handle);
        self.pending.len() != before
    }

    /// Whether `handle` is still waiting to fire.
    pub fn is_pending(&self, handle: TaskHandle) -> bool {
        self.pending.iter().any(|entry| entry.handle == handle)
    }

    /// Remove and return every task due at or before `now`, earliest first.
    /// Ties fire in scheduling order.
    pub fn take_due(&mut self, now: Duration) -> Vec<T> {
        let (mut due, waiting): (Vec<_>, Vec<_>) = self
            .pending
            .drain(..)
            .partition(|entry| entry.due <= now);
        self.pending = waiting;
        due.sort_by_key(|entry| (entry.due, entry.handle));
        due.into_iter().map(|entry| entry.task).collect()
    }

    /// Earliest pending due instant.
    pub fn next_due(&self) -> Option<Duration> {
        self.pending.iter().map(|entry| entry.due).min()
    }

    /// Drop every pending task.
    pub fn clear(&mut self) {
        self.pending.clear();
    }

    /// Number of pending tasks.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Whether nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[test]
    fn tasks_fire_in_due_order_once() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule(ms(300), "late");
        scheduler.schedule(ms(100), "early");
        scheduler.schedule(ms(100), "early-second");

        assert!(scheduler.take_due(ms(99)).is_empty());
        assert_eq!(scheduler.take_due(ms(100)), vec!["early", "early-second"]);
        assert_eq!(scheduler.next_due(), Some(ms(300)));
        assert_eq!(scheduler.take_due(ms(1_000)), vec!["late"]);
        assert!(scheduler.take_due(ms(2_000)).is_empty());
        assert!(scheduler.is_empty());
    }

    #[test]
    fn cancelled_tasks_never_fire() {
        let mut scheduler = Scheduler::new();
        let handle = scheduler.schedule(ms(500), 1);
        assert!(scheduler.is_pending(handle));
        assert!(scheduler.cancel(handle));
        assert!(!scheduler.cancel(handle));
        assert!(scheduler.take_due(ms(600)).is_empty());
    }

    #[test]
    fn reschedule_supersedes_previous_task() {
        let mut scheduler = Scheduler::new();
        let first = scheduler.schedule(ms(500), "first");
        let second = scheduler.reschedule(Some(first), ms(800), "second");
        assert_ne!(first, second);
        assert!(!scheduler.is_pending(first));
        assert_eq!(scheduler.len(), 1);
        assert!(scheduler.take_due(ms(600)).is_empty());
        assert_eq!(scheduler.take_due(ms(800)), vec!["second"]);
    }
}
