//! Deferred re-entry for the render and reconnect loops.
//!
//! Neither loop ever blocks: each iteration asks the host to call back into
//! the client after a delay. Hosts map this onto their own timer facility
//! (`DelayQueue` natively, `setTimeout` in the browser); tests use
//! [`VirtualScheduler`].

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::time::Duration;

/// Work the client asks to be re-entered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Task {
    Frame,
    Reconnect,
}

pub trait Scheduler {
    fn schedule(&mut self, delay: Duration, task: Task);
}

/// Deterministic virtual clock.
///
/// Tasks become due once [`VirtualScheduler::advance`] moves the clock past
/// their deadline. Ties fire in scheduling order.
#[derive(Debug, Default)]
pub struct VirtualScheduler {
    now: Duration,
    seq: u64,
    queue: BinaryHeap<Reverse<(Duration, u64, Task)>>,
    history: Vec<(Duration, Task)>,
}

impl VirtualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn advance(&mut self, by: Duration) {
        self.now += by;
    }

    /// Next due task, if any, removing it from the queue.
    pub fn pop_due(&mut self) -> Option<Task> {
        let Reverse((at, _, _)) = self.queue.peek()?;
        if *at > self.now {
            return None;
        }
        self.queue.pop().map(|Reverse((_, _, task))| task)
    }

    /// Jump the clock to the earliest pending deadline and pop that task.
    pub fn pop_next(&mut self) -> Option<(Duration, Task)> {
        let Reverse((at, _, task)) = self.queue.pop()?;
        if at > self.now {
            self.now = at;
        }
        Some((at, task))
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn pending_of(&self, task: Task) -> usize {
        self.queue.iter().filter(|Reverse((_, _, t))| *t == task).count()
    }

    /// Every `(delay, task)` ever scheduled, in order.
    pub fn history(&self) -> &[(Duration, Task)] {
        &self.history
    }
}

impl Scheduler for VirtualScheduler {
    fn schedule(&mut self, delay: Duration, task: Task) {
        self.seq += 1;
        self.queue.push(Reverse((self.now + delay, self.seq, task)));
        self.history.push((delay, task));
    }
}
