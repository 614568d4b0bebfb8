//! Queue abstraction a node can be pinned to: once attached, a node's
//! outgoing events are submitted through its dispatcher and every
//! continuation downstream runs on that dispatcher's queue (spec §5, §6).

use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tracing::warn;

/// Named execution queues a dispatcher can target.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Queue {
    /// The caller's own thread; work runs before `execute` returns.
    Main,
    /// A background worker, unordered with respect to other background work.
    Background,
    /// A background worker with an explicit priority band; lower runs first.
    PriorityBackground(u8),
    /// A caller-named queue, for callers wiring their own worker pools.
    Custom(String),
}

impl fmt::Display for Queue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Queue::Main => write!(f, "main"),
            Queue::Background => write!(f, "background"),
            Queue::PriorityBackground(p) => write!(f, "background[{p}]"),
            Queue::Custom(name) => write!(f, "{name}"),
        }
    }
}

/// A unit of deferred work submitted to a dispatcher.
pub type Work = Box<dyn FnOnce() + Send + 'static>;

/// Runs work on some queue. Implementations decide whether `execute` blocks
/// the caller until the work finishes (`sync`) or returns immediately
/// (`async`, `inline` also returns immediately since it ran synchronously
/// inline).
pub trait Dispatcher: Send + Sync {
    /// Which queue this dispatcher targets, for diagnostics.
    fn queue(&self) -> Queue;

    /// Submit `block` for execution.
    fn execute(&self, block: Work);

    /// Build a chained dispatcher: `block` runs on `self`, and whatever the
    /// caller submits to the returned handle afterwards runs on `next`.
    fn chain(self: Arc<Self>, next: Arc<dyn Dispatcher>) -> ChainedDispatcher
    where
        Self: Sized + 'static,
    {
        ChainedDispatcher { first: self, next }
    }
}

/// Runs work immediately, on the calling thread.
pub struct InlineDispatcher;

impl Dispatcher for InlineDispatcher {
    fn queue(&self) -> Queue {
        Queue::Main
    }

    fn execute(&self, block: Work) {
        block();
    }
}

/// Runs work on a tokio runtime's blocking pool, and waits for it to finish
/// before `execute` returns.
pub struct SyncQueueDispatcher {
    queue: Queue,
    handle: Handle,
}

impl SyncQueueDispatcher {
    pub fn new(queue: Queue, handle: Handle) -> Self {
        Self { queue, handle }
    }
}

impl Dispatcher for SyncQueueDispatcher {
    fn queue(&self) -> Queue {
        self.queue.clone()
    }

    fn execute(&self, block: Work) {
        let (tx, rx) = std::sync::mpsc::channel();
        self.handle.spawn_blocking(move || {
            block();
            let _ = tx.send(());
        });
        if rx.recv().is_err() {
            warn!("sync dispatcher's worker dropped before signaling completion");
        }
    }
}

/// Runs work on a tokio runtime's blocking pool and returns immediately.
pub struct AsyncQueueDispatcher {
    queue: Queue,
    handle: Handle,
}

impl AsyncQueueDispatcher {
    pub fn new(queue: Queue, handle: Handle) -> Self {
        Self { queue, handle }
    }
}

impl Dispatcher for AsyncQueueDispatcher {
    fn queue(&self) -> Queue {
        self.queue.clone()
    }

    fn execute(&self, block: Work) {
        self.handle.spawn_blocking(block);
    }
}

/// Wraps another dispatcher, delaying submission by a fixed duration.
pub struct AfterDispatcher {
    delay: Duration,
    handle: Handle,
    inner: Arc<dyn Dispatcher>,
}

impl AfterDispatcher {
    pub fn new(delay: Duration, handle: Handle, inner: Arc<dyn Dispatcher>) -> Self {
        Self { delay, handle, inner }
    }
}

impl Dispatcher for AfterDispatcher {
    fn queue(&self) -> Queue {
        self.inner.queue()
    }

    fn execute(&self, block: Work) {
        let delay = self.delay;
        let inner = self.inner.clone();
        self.handle.spawn(async move {
            tokio::time::sleep(delay).await;
            inner.execute(block);
        });
    }
}

/// The result of [`Dispatcher::chain`]: runs `block` on the first
/// dispatcher, then hands execution off to the second.
pub struct ChainedDispatcher {
    first: Arc<dyn Dispatcher>,
    next: Arc<dyn Dispatcher>,
}

impl ChainedDispatcher {
    /// Run `block` on the first dispatcher, then submit a no-op continuation
    /// marker to the second so anything the caller chains after `then` runs
    /// there.
    pub fn then(&self, block: Work) -> Arc<dyn Dispatcher> {
        self.first.execute(block);
        self.next.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[test]
    fn inline_dispatcher_runs_synchronously() {
        let ran = Arc::new(AtomicBool::new(false));
        let ran2 = ran.clone();
        InlineDispatcher.execute(Box::new(move || ran2.store(true, Ordering::SeqCst)));
        assert!(ran.load(Ordering::SeqCst));
    }

    #[test]
    fn queue_display_matches_naming() {
        assert_eq!(Queue::Background.to_string(), "background");
        assert_eq!(Queue::PriorityBackground(2).to_string(), "background[2]");
        assert_eq!(Queue::Custom("io".into()).to_string(), "io");
    }
}
