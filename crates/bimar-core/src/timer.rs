//! Deadline-ordered, cancellable deferred tasks.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

/// Handle to a scheduled task, used to cancel it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(u64);

#[derive(Debug, Clone, Copy)]
struct Deadline {
    at_ms: f64,
    seq: u64,
}

impl PartialEq for Deadline {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Deadline {}

impl PartialOrd for Deadline {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Deadline {
    // Reversed so the max-heap yields the earliest deadline first.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .at_ms
            .total_cmp(&self.at_ms)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Tasks keyed by a millisecond clock.
///
/// A task fires once, on the first [`TimerQueue::pop_due`] whose `now` has reached
/// its deadline. Tasks with equal deadlines fire in scheduling order.
#[derive(Debug)]
pub struct TimerQueue<T> {
    heap: BinaryHeap<Deadline>,
    tasks: HashMap<u64, T>,
    next_seq: u64,
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self {
            heap: BinaryHeap::new(),
            tasks: HashMap::new(),
            next_seq: 0,
        }
    }
}

impl<T> TimerQueue<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules `task` to fire at `deadline_ms`.
    pub fn schedule(&mut self, deadline_ms: f64, task: T) -> TimerHandle {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Deadline {
            at_ms: deadline_ms,
            seq,
        });
        self.tasks.insert(seq, task);
        TimerHandle(seq)
    }

    /// Cancels a pending task and returns it, or `None` if it already fired or was
    /// cancelled.
    pub fn cancel(&mut self, handle: TimerHandle) -> Option<T> {
        self.tasks.remove(&handle.0)
    }

    pub fn is_pending(&self, handle: TimerHandle) -> bool {
        self.tasks.contains_key(&handle.0)
    }

    /// Removes and returns the earliest task due at `now_ms`.
    pub fn pop_due(&mut self, now_ms: f64) -> Option<T> {
        while let Some(top) = self.heap.peek().copied() {
            if !self.tasks.contains_key(&top.seq) {
                // cancelled
                self.heap.pop();
                continue;
            }
            if top.at_ms > now_ms {
                return None;
            }
            self.heap.pop();
            return self.tasks.remove(&top.seq);
        }
        None
    }

    /// Deadline of the earliest pending task.
    pub fn next_deadline(&self) -> Option<f64> {
        self.heap
            .iter()
            .filter(|d| self.tasks.contains_key(&d.seq))
            .map(|d| d.at_ms)
            .min_by(f64::total_cmp)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Drops every pending task.
    pub fn clear(&mut self) {
        self.heap.clear();
        self.tasks.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_at_deadline_not_before() {
        let mut timers = TimerQueue::new();
        timers.schedule(2000.0, "label");

        assert_eq!(timers.pop_due(1999.0), None);
        assert_eq!(timers.pop_due(2000.0), Some("label"));
        assert_eq!(timers.pop_due(5000.0), None);
        assert!(timers.is_empty());
    }

    #[test]
    fn test_order_by_deadline_then_schedule_order() {
        let mut timers = TimerQueue::new();
        timers.schedule(30.0, 'c');
        timers.schedule(10.0, 'a');
        timers.schedule(10.0, 'b');

        let fired: Vec<char> = std::iter::from_fn(|| timers.pop_due(100.0)).collect();
        assert_eq!(fired, vec!['a', 'b', 'c']);
    }

    #[test]
    fn test_cancel() {
        let mut timers = TimerQueue::new();
        let keep = timers.schedule(10.0, 1);
        let drop = timers.schedule(5.0, 2);

        assert_eq!(timers.cancel(drop), Some(2));
        assert_eq!(timers.cancel(drop), None);
        assert!(timers.is_pending(keep));
        assert_eq!(timers.next_deadline(), Some(10.0));
        assert_eq!(timers.pop_due(100.0), Some(1));
        assert!(!timers.is_pending(keep));
    }

    #[test]
    fn test_clear() {
        let mut timers = TimerQueue::new();
        timers.schedule(1.0, ());
        timers.clear();
        assert!(timers.is_empty());
        assert_eq!(timers.pop_due(10.0), None);
    }
}
