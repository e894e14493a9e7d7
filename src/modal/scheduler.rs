//! Virtual-time task queue for transition delays.
//!
//! The scheduler never sleeps. The host moves time forward and collects the
//! tasks that fell due, which keeps every delay deterministic under test and
//! lets a real event loop drive it by sleeping until [`Scheduler::next_deadline`].

use std::time::Duration;

/// Handle for cancelling a scheduled task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

#[derive(Debug)]
struct Pending<T> {
    id: TaskId,
    due: Duration,
    task: T,
}

/// Queue of delayed tasks keyed by virtual deadline
#[derive(Debug)]
pub struct Scheduler<T> {
    now: Duration,
    next_id: u64,
    pending: Vec<Pending<T>>,
}

impl<T> Scheduler<T> {
    pub fn new() -> Self {
        Self {
            now: Duration::ZERO,
            next_id: 0,
            pending: Vec::new(),
        }
    }

    /// Current virtual time
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Schedule `task` to fire `delay` after the current time
    pub fn schedule(&mut self, delay: Duration, task: T) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id += 1;
        self.pending.push(Pending {
            id,
            due: self.now.saturating_add(delay),
            task,
        });
        id
    }

    /// Remove a pending task, returning it if it had not fired
    pub fn cancel(&mut self, id: TaskId) -> Option<T> {
        let index = self.pending.iter().position(|pending| pending.id == id)?;
        Some(self.pending.remove(index).task)
    }

    /// Remove every pending task matching `predicate`
    pub fn cancel_where(&mut self, mut predicate: impl FnMut(&T) -> bool) -> usize {
        let before = self.pending.len();
        self.pending.retain(|pending| !predicate(&pending.task));
        before - self.pending.len()
    }

    pub fn is_pending(&self, id: TaskId) -> bool {
        self.pending.iter().any(|pending| pending.id == id)
    }

    /// Earliest deadline among pending tasks
    pub fn next_deadline(&self) -> Option<Duration> {
        self.pending.iter().map(|pending| pending.due).min()
    }

    /// Pop the earliest task due at or before `until`.
    ///
    /// Ties fire in scheduling order. The clock moves to the task's deadline so
    /// work scheduled from inside the task is measured from when it ran.
    pub fn pop_due(&mut self, until: Duration) -> Option<(TaskId, T)> {
        let index = self
            .pending
            .iter()
            .enumerate()
            .filter(|(_, pending)| pending.due <= until)
            .min_by_key(|(_, pending)| (pending.due, pending.id))
            .map(|(index, _)| index)?;

        let pending = self.pending.remove(index);
        self.now = self.now.max(pending.due);
        Some((pending.id, pending.task))
    }

    /// Move the clock to `until` without running anything. Time never goes back.
    pub fn set_now(&mut self, until: Duration) {
        self.now = self.now.max(until);
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[test]
    fn test_tasks_fire_in_deadline_order() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule(ms(300), "late");
        scheduler.schedule(ms(100), "early");
        scheduler.schedule(ms(100), "early-second");

        assert_eq!(scheduler.next_deadline(), Some(ms(100)));
        assert_eq!(scheduler.pop_due(ms(500)).map(|(_, t)| t), Some("early"));
        assert_eq!(scheduler.pop_due(ms(500)).map(|(_, t)| t), Some("early-second"));
        assert_eq!(scheduler.now(), ms(100));
        assert_eq!(scheduler.pop_due(ms(500)).map(|(_, t)| t), Some("late"));
        assert!(scheduler.pop_due(ms(500)).is_none());
    }

    #[test]
    fn test_nothing_fires_before_deadline() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule(ms(300), ());

        assert!(scheduler.pop_due(ms(299)).is_none());
        scheduler.set_now(ms(299));
        assert_eq!(scheduler.now(), ms(299));
        assert!(scheduler.pop_due(ms(300)).is_some());
    }

    #[test]
    fn test_zero_delay_is_still_deferred() {
        let mut scheduler = Scheduler::new();
        let id = scheduler.schedule(Duration::ZERO, ());

        assert!(scheduler.is_pending(id));
        assert!(scheduler.pop_due(Duration::ZERO).is_some());
        assert!(!scheduler.is_pending(id));
    }

    #[test]
    fn test_cancel() {
        let mut scheduler = Scheduler::new();
        let keep = scheduler.schedule(ms(10), 1);
        let drop = scheduler.schedule(ms(10), 2);

        assert_eq!(scheduler.cancel(drop), Some(2));
        assert_eq!(scheduler.cancel(drop), None);
        assert!(scheduler.is_pending(keep));
        assert_eq!(scheduler.len(), 1);
    }

    #[test]
    fn test_cancel_where() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule(ms(10), 1);
        scheduler.schedule(ms(20), 2);
        scheduler.schedule(ms(30), 3);

        assert_eq!(scheduler.cancel_where(|task| task % 2 == 1), 2);
        assert_eq!(scheduler.next_deadline(), Some(ms(20)));
    }

    #[test]
    fn test_delays_are_relative_to_now() {
        let mut scheduler = Scheduler::new();
        scheduler.set_now(ms(1000));
        scheduler.schedule(ms(50), ());

        assert_eq!(scheduler.next_deadline(), Some(ms(1050)));
        scheduler.set_now(ms(10));
        assert_eq!(scheduler.now(), ms(1000));
    }

    #[test]
    fn test_deadline_saturates() {
        let mut scheduler = Scheduler::new();
        scheduler.set_now(ms(1000));
        scheduler.schedule(Duration::MAX, 7);

        assert_eq!(scheduler.next_deadline(), Some(Duration::MAX));
        assert_eq!(scheduler.pop_due(ms(2000)), None);
        assert!(scheduler.pop_due(Duration::MAX).is_some());
    }
}
