//! Fixed-size pool of workers consuming a [`WorkQueue`].
//!
//! Every worker loops on `take()`, runs the handler, and marks the task
//! done no matter how the handler ended. A panicking handler is caught and
//! logged so one bad task can never stall the drain barrier.

use crate::scanner::queue::WorkQueue;
use futures::FutureExt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{trace, warn};

/// A set of running workers bound to one queue.
pub struct WorkerPool<T> {
    queue: Arc<WorkQueue<T>>,
    workers: Vec<JoinHandle<()>>,
}

impl<T: Send + 'static> WorkerPool<T> {
    /// Number of workers to run for `port_count` tasks.
    ///
    /// `max(1, min(requested, port_count - 1))` when there is more than one
    /// port, otherwise exactly 1.
    pub fn clamp_threads(requested: usize, port_count: usize) -> usize {
        if port_count > 1 {
            requested.min(port_count - 1).max(1)
        } else {
            1
        }
    }

    /// Start `size` workers (minimum 1) eagerly.
    pub fn spawn<H, Fut>(size: usize, queue: Arc<WorkQueue<T>>, handler: H) -> Self
    where
        H: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let handler = Arc::new(handler);
        let workers = (0..size.max(1))
            .map(|id| {
                let queue = Arc::clone(&queue);
                let handler = Arc::clone(&handler);
                tokio::spawn(async move {
                    while let Some(task) = queue.take().await {
                        trace!(worker = id, "took task from queue");
                        if let Err(panic) = AssertUnwindSafe(handler(task)).catch_unwind().await {
                            warn!(worker = id, reason = panic_message(&*panic), "task panicked");
                        }
                        trace!(worker = id, "marking task done");
                        queue.mark_done();
                    }
                    trace!(worker = id, "queue closed, worker exiting");
                })
            })
            .collect();

        Self { queue, workers }
    }

    /// Number of workers in the pool.
    pub fn size(&self) -> usize {
        self.workers.len()
    }

    /// Close the queue and wait for every worker to exit.
    ///
    /// Tasks still queued are processed before the workers stop.
    pub async fn shutdown(self) {
        self.queue.close();
        for worker in self.workers {
            if let Err(e) = worker.await {
                warn!(error = %e, "worker terminated abnormally");
            }
        }
    }
}

pub(crate) fn panic_message(panic: &(dyn std::any::Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown panic"
    }
}
