//! Single-threaded execution context
//!
//! A dedicated worker thread owns a piece of state and runs queued tasks
//! against it one at a time, in the order they were enqueued. Callers on any
//! thread hand work over with [`ExecutionContext::run_later`] and return as
//! soon as the task is queued.
//!
//! ```text
//!  rpc task ──┐
//!  rpc task ──┼──► mpsc queue ──► worker thread ──► &mut S
//!  host ui  ──┘      (FIFO)        (owns S)
//! ```
//!
//! The queue is bounded. When the worker falls behind, `run_later` fails with
//! [`ContextError::Full`] instead of letting the backlog grow.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use thiserror::Error;
use tokio::sync::mpsc::error::{TryRecvError, TrySendError};
use tokio::sync::{mpsc, oneshot};

/// Tasks a context queues before rejecting more
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// Errors from enqueueing work
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ContextError {
    /// The worker has shut down and accepts no more tasks
    #[error("execution context is closed")]
    Closed,
    /// The queue is at capacity
    #[error("execution context queue is full")]
    Full,
    /// The task was dropped or panicked before producing a result
    #[error("task did not complete")]
    Dropped,
}

type Task<S> = Box<dyn FnOnce(&mut S) + Send>;

enum Envelope<S> {
    Task(Task<S>),
    Shutdown,
}

/// Handle to a single-threaded execution context
///
/// Cheap to clone; all clones feed the same worker.
pub struct ExecutionContext<S> {
    name: Arc<str>,
    tx: mpsc::Sender<Envelope<S>>,
    closing: Arc<AtomicBool>,
    worker: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl<S> Clone for ExecutionContext<S> {
    fn clone(&self) -> Self {
        Self {
            name: Arc::clone(&self.name),
            tx: self.tx.clone(),
            closing: Arc::clone(&self.closing),
            worker: Arc::clone(&self.worker),
        }
    }
}

impl<S: Send + 'static> ExecutionContext<S> {
    /// Start a worker thread named `name` that owns `state`
    pub fn spawn(name: impl Into<String>, state: S) -> std::io::Result<Self> {
        Self::with_capacity(name, state, DEFAULT_QUEUE_CAPACITY)
    }

    /// Start a worker whose queue holds at most `capacity` pending tasks
    pub fn with_capacity(
        name: impl Into<String>,
        state: S,
        capacity: usize,
    ) -> std::io::Result<Self> {
        let name: String = name.into();
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let closing = Arc::new(AtomicBool::new(false));

        let thread_name = name.clone();
        let worker_closing = Arc::clone(&closing);
        let handle = thread::Builder::new()
            .name(name.clone())
            .spawn(move || run_worker(&thread_name, state, rx, &worker_closing))?;

        tracing::debug!(context = %name, capacity = capacity, "Execution context started");

        Ok(Self {
            name: name.into(),
            tx,
            closing,
            worker: Arc::new(Mutex::new(Some(handle))),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Queue a task and return without waiting for it to run
    pub fn run_later<F>(&self, task: F) -> Result<(), ContextError>
    where
        F: FnOnce(&mut S) + Send + 'static,
    {
        if self.closing.load(Ordering::SeqCst) {
            return Err(ContextError::Closed);
        }

        match self.tx.try_send(Envelope::Task(Box::new(task))) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                tracing::warn!(context = %self.name, "Execution context queue full, task rejected");
                Err(ContextError::Full)
            }
            Err(TrySendError::Closed(_)) => Err(ContextError::Closed),
        }
    }

    /// Queue a task and wait for its result
    pub async fn call<F, R>(&self, task: F) -> Result<R, ContextError>
    where
        F: FnOnce(&mut S) -> R + Send + 'static,
        R: Send + 'static,
    {
        let (result_tx, result_rx) = oneshot::channel();
        self.run_later(move |state| {
            let _ = result_tx.send(task(state));
        })?;
        result_rx.await.map_err(|_| ContextError::Dropped)
    }

    /// Ask the worker to stop once every task queued so far has run
    ///
    /// Tasks queued after this call are discarded.
    pub fn shutdown(&self) {
        self.closing.store(true, Ordering::SeqCst);
        // On a full queue the worker still exits once it finds the queue empty
        let _ = self.tx.try_send(Envelope::Shutdown);
    }

    /// Whether the worker has stopped accepting tasks
    pub fn is_closed(&self) -> bool {
        self.closing.load(Ordering::SeqCst) || self.tx.is_closed()
    }

    /// Block until the worker thread exits
    ///
    /// Only the first caller joins; later calls return immediately.
    pub fn join(&self) {
        let handle = match self.worker.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(handle) = handle {
            if handle.join().is_err() {
                tracing::error!(context = %self.name, "Execution context worker panicked");
            }
        }
    }
}

fn run_worker<S>(
    name: &str,
    mut state: S,
    mut rx: mpsc::Receiver<Envelope<S>>,
    closing: &AtomicBool,
) {
    let mut executed: u64 = 0;

    loop {
        let envelope = match rx.try_recv() {
            Ok(envelope) => envelope,
            Err(TryRecvError::Empty) => {
                if closing.load(Ordering::SeqCst) {
                    break;
                }
                match rx.blocking_recv() {
                    Some(envelope) => envelope,
                    None => break,
                }
            }
            Err(TryRecvError::Disconnected) => break,
        };

        match envelope {
            Envelope::Task(task) => {
                executed += 1;
                if catch_unwind(AssertUnwindSafe(|| task(&mut state))).is_err() {
                    tracing::error!(context = %name, task = executed, "Task panicked");
                }
            }
            Envelope::Shutdown => break,
        }
    }

    rx.close();
    let mut discarded = 0usize;
    while rx.try_recv().is_ok() {
        discarded += 1;
    }

    tracing::debug!(
        context = %name,
        executed = executed,
        discarded = discarded,
        "Execution context stopped"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_tasks_run_in_order() {
        let ctx = ExecutionContext::spawn("test-order", Vec::new()).unwrap();

        for i in 0..100 {
            ctx.run_later(move |log: &mut Vec<u32>| log.push(i)).unwrap();
        }

        let log = ctx.call(|log| log.clone()).await.unwrap();
        assert_eq!(log, (0..100).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_runs_on_dedicated_thread() {
        let ctx = ExecutionContext::spawn("test-thread", ()).unwrap();

        let caller = thread::current().id();
        let (worker, name) = ctx
            .call(|_| {
                let current = thread::current();
                (current.id(), current.name().map(str::to_string))
            })
            .await
            .unwrap();

        assert_ne!(worker, caller);
        assert_eq!(name.as_deref(), Some("test-thread"));
    }

    #[tokio::test]
    async fn test_enqueue_from_many_threads() {
        let ctx = ExecutionContext::spawn("test-threads", 0u32).unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let ctx = ctx.clone();
                thread::spawn(move || {
                    for _ in 0..50 {
                        ctx.run_later(|n| *n += 1).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(ctx.call(|n| *n).await.unwrap(), 400);
    }

    #[tokio::test]
    async fn test_panicking_task_does_not_stop_worker() {
        let ctx = ExecutionContext::spawn("test-panic", 0u32).unwrap();

        ctx.run_later(|_| panic!("boom")).unwrap();
        ctx.run_later(|n| *n = 7).unwrap();

        assert_eq!(ctx.call(|n| *n).await.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_call_that_panics_reports_dropped() {
        let ctx = ExecutionContext::spawn("test-call-panic", ()).unwrap();
        let result: Result<(), _> = ctx.call(|_| panic!("boom")).await;
        assert_eq!(result, Err(ContextError::Dropped));
    }

    #[test]
    fn test_shutdown_drains_then_closes() {
        let ctx = ExecutionContext::spawn("test-shutdown", Vec::new()).unwrap();
        let (tx, rx) = std::sync::mpsc::channel();

        ctx.run_later(move |log: &mut Vec<u32>| {
            log.push(1);
            tx.send(log.len()).unwrap();
        })
        .unwrap();
        ctx.shutdown();
        ctx.join();

        assert_eq!(rx.recv().unwrap(), 1);
        assert!(ctx.is_closed());
        assert_eq!(ctx.run_later(|_| {}), Err(ContextError::Closed));

        // Second join is a no-op
        ctx.join();
    }

    /// Park the worker inside a task until the returned sender fires
    fn block_worker<S: Send + 'static>(ctx: &ExecutionContext<S>) -> std::sync::mpsc::Sender<()> {
        let (entered_tx, entered_rx) = std::sync::mpsc::channel();
        let (release_tx, release_rx) = std::sync::mpsc::channel::<()>();
        ctx.run_later(move |_| {
            entered_tx.send(()).unwrap();
            let _ = release_rx.recv();
        })
        .unwrap();
        entered_rx.recv().unwrap();
        release_tx
    }

    #[test]
    fn test_full_queue_rejects_tasks() {
        let ctx = ExecutionContext::with_capacity("test-full", 0u32, 2).unwrap();
        let release = block_worker(&ctx);

        ctx.run_later(|n| *n += 1).unwrap();
        ctx.run_later(|n| *n += 1).unwrap();
        assert_eq!(ctx.run_later(|n| *n += 1), Err(ContextError::Full));
        assert!(!ctx.is_closed());

        release.send(()).unwrap();
        let (tx, rx) = std::sync::mpsc::channel();
        // Space frees up once the worker catches up
        loop {
            let tx = tx.clone();
            match ctx.run_later(move |n| tx.send(*n).unwrap()) {
                Ok(()) => break,
                Err(ContextError::Full) => thread::yield_now(),
                Err(e) => panic!("unexpected {:?}", e),
            }
        }
        assert_eq!(rx.recv().unwrap(), 2);

        ctx.shutdown();
        ctx.join();
    }

    #[test]
    fn test_shutdown_with_full_queue_still_stops() {
        let ctx = ExecutionContext::with_capacity("test-full-shutdown", Vec::new(), 1).unwrap();
        let release = block_worker(&ctx);

        let (tx, rx) = std::sync::mpsc::channel();
        ctx.run_later(move |log: &mut Vec<u32>| {
            log.push(1);
            tx.send(log.len()).unwrap();
        })
        .unwrap();

        // Queue is full, so the stop marker cannot be queued
        ctx.shutdown();
        assert_eq!(ctx.run_later(|_| {}), Err(ContextError::Closed));

        release.send(()).unwrap();
        ctx.join();

        // Work queued before the shutdown still ran
        assert_eq!(rx.recv().unwrap(), 1);
    }
}
