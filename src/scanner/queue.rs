//! Bounded work queue with a drain barrier.
//!
//! Producers wait while the queue is full, consumers wait while it is
//! empty, and [`WorkQueue::drain`] waits until every submitted task has
//! been marked done. Capacity is a backpressure device: a producer can
//! never run more than `capacity` tasks ahead of the workers.

use crate::error::QueueError;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::Notify;

struct State<T> {
    tasks: VecDeque<T>,
    /// Submitted but not yet marked done (queued + in flight).
    pending: usize,
    closed: bool,
}

/// A bounded FIFO of tasks shared between one producer and a pool of workers.
pub struct WorkQueue<T> {
    state: Mutex<State<T>>,
    capacity: usize,
    not_full: Notify,
    not_empty: Notify,
    drained: Notify,
}

impl<T> WorkQueue<T> {
    /// Create a queue holding at most `capacity` tasks (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            state: Mutex::new(State {
                tasks: VecDeque::with_capacity(capacity),
                pending: 0,
                closed: false,
            }),
            capacity,
            not_full: Notify::new(),
            not_empty: Notify::new(),
            drained: Notify::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State<T>> {
        // Critical sections never panic, so a poisoned lock still holds
        // consistent state.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Enqueue a task, waiting for a free slot if the queue is full.
    ///
    /// Fails only if the queue has been closed; the task is then dropped
    /// without having been counted.
    pub async fn submit(&self, task: T) -> Result<(), QueueError> {
        loop {
            let notified = self.not_full.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            {
                let mut state = self.lock();
                if state.closed {
                    return Err(QueueError::Closed);
                }
                if state.tasks.len() < self.capacity {
                    state.tasks.push_back(task);
                    state.pending += 1;
                    drop(state);
                    self.not_empty.notify_waiters();
                    return Ok(());
                }
            }

            notified.await;
        }
    }

    /// Dequeue the oldest task, waiting while the queue is empty.
    ///
    /// Returns `None` once the queue is closed and fully consumed.
    pub async fn take(&self) -> Option<T> {
        loop {
            let notified = self.not_empty.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            {
                let mut state = self.lock();
                if let Some(task) = state.tasks.pop_front() {
                    drop(state);
                    self.not_full.notify_waiters();
                    return Some(task);
                }
                if state.closed {
                    return None;
                }
            }

            notified.await;
        }
    }

    /// Record that a task obtained from [`take`](Self::take) has finished.
    pub fn mark_done(&self) {
        let mut state = self.lock();
        state.pending = state.pending.saturating_sub(1);
        let drained = state.pending == 0;
        drop(state);
        if drained {
            self.drained.notify_waiters();
        }
    }

    /// Wait until every submitted task has been marked done.
    pub async fn drain(&self) {
        loop {
            let notified = self.drained.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            {
                let state = self.lock();
                if state.pending == 0 && state.tasks.is_empty() {
                    return;
                }
            }

            notified.await;
        }
    }

    /// Stop accepting tasks. Queued tasks are still handed out; after that
    /// every `take` returns `None`.
    pub fn close(&self) {
        self.lock().closed = true;
        self.not_empty.notify_waiters();
        self.not_full.notify_waiters();
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Number of tasks waiting to be taken.
    pub fn len(&self) -> usize {
        self.lock().tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().tasks.is_empty()
    }

    /// Submitted tasks not yet marked done.
    pub fn pending(&self) -> usize {
        self.lock().pending
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
