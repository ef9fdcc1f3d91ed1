//! Timer queue backing the client's deferred tasks.

use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use futures_util::Stream;
use tokio_util::time::DelayQueue;

use mazeview::schedule::{Scheduler, Task};

#[derive(Default)]
pub struct TermScheduler {
    queue: DelayQueue<Task>,
}

impl TermScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

impl Scheduler for TermScheduler {
    fn schedule(&mut self, delay: Duration, task: Task) {
        self.queue.insert(task, delay);
    }
}

/// Yields tasks as their delays expire.
impl Stream for TermScheduler {
    type Item = Task;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Task>> {
        self.get_mut()
            .queue
            .poll_expired(cx)
            .map(|expired| expired.map(|e| e.into_inner()))
    }
}
