//! Execution contexts that callback closures are delivered on.
//!
//! Each stream (and the engine itself) is bound to one executor. Every
//! executor delivers the tasks submitted to it in FIFO order and never runs
//! two tasks for the same executor concurrently, which is what lets the
//! dispatcher guarantee per-stream callback ordering.

use std::sync::Arc;
use std::thread;

use crossbeam_channel::{bounded, unbounded, Sender};

/// A unit of callback work handed to an executor.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// An execution context for callback delivery.
///
/// Implementations must run submitted tasks exactly once, in submission
/// order, without overlapping two tasks from the same executor.
pub trait EventExecutor: Send + Sync {
    fn execute(&self, task: Task);

    /// Block until every task submitted before this call has run.
    ///
    /// Must not be called from the executor's own delivery thread.
    fn flush(&self);
}

/// Runs each task synchronously on the submitting thread.
///
/// With this executor, callbacks fire directly on the engine's internal
/// thread; callers that need thread isolation should use [`SerialExecutor`]
/// or [`RuntimeExecutor`] instead.
#[derive(Debug, Default, Clone, Copy)]
pub struct InlineExecutor;

impl EventExecutor for InlineExecutor {
    fn execute(&self, task: Task) {
        task();
    }

    fn flush(&self) {}
}

enum Message {
    Run(Task),
    Flush(Sender<()>),
}

/// A dedicated-thread serial queue.
///
/// Tasks run one at a time on a named background thread. The thread exits
/// when the last handle to the executor is dropped.
pub struct SerialExecutor {
    tx: Sender<Message>,
}

impl SerialExecutor {
    #[must_use]
    pub fn new(name: &str) -> Arc<Self> {
        let (tx, rx) = unbounded::<Message>();
        let builder = thread::Builder::new().name(name.to_string());
        // Receiver loop ends when every sender is gone.
        let spawned = builder.spawn(move || {
            for message in rx {
                match message {
                    Message::Run(task) => task(),
                    Message::Flush(ack) => {
                        let _ = ack.send(());
                    }
                }
            }
        });
        if let Err(e) = spawned {
            tracing::error!("failed to spawn serial executor thread {name}: {e}");
        }
        Arc::new(Self { tx })
    }
}

impl EventExecutor for SerialExecutor {
    fn execute(&self, task: Task) {
        if self.tx.send(Message::Run(task)).is_err() {
            tracing::warn!("serial executor thread is gone; dropping task");
        }
    }

    fn flush(&self) {
        let (ack_tx, ack_rx) = bounded(1);
        if self.tx.send(Message::Flush(ack_tx)).is_ok() {
            let _ = ack_rx.recv();
        }
    }
}

impl std::fmt::Debug for SerialExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialExecutor").finish_non_exhaustive()
    }
}

/// An executor backed by a tokio runtime.
///
/// Tasks are pushed onto an unbounded channel drained by a single spawned
/// task, which preserves FIFO order even on a multi-threaded runtime.
pub struct RuntimeExecutor {
    tx: tokio::sync::mpsc::UnboundedSender<Message>,
}

impl RuntimeExecutor {
    #[must_use]
    pub fn new(handle: &tokio::runtime::Handle) -> Arc<Self> {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<Message>();
        handle.spawn(async move {
            while let Some(message) = rx.recv().await {
                match message {
                    Message::Run(task) => task(),
                    Message::Flush(ack) => {
                        let _ = ack.send(());
                    }
                }
            }
        });
        Arc::new(Self { tx })
    }
}

impl EventExecutor for RuntimeExecutor {
    fn execute(&self, task: Task) {
        if self.tx.send(Message::Run(task)).is_err() {
            tracing::warn!("runtime executor task is gone; dropping task");
        }
    }

    fn flush(&self) {
        let (ack_tx, ack_rx) = bounded(1);
        if self.tx.send(Message::Flush(ack_tx)).is_ok() {
            let _ = ack_rx.recv();
        }
    }
}

impl std::fmt::Debug for RuntimeExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuntimeExecutor").finish_non_exhaustive()
    }
}
