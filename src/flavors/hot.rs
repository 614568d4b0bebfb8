//! Hot streams: fire-and-forget, errors never terminate them (spec §4.4).

use crate::event::{Event, TerminationReason};
use crate::node::flavor::{FlavorHooks, FlavorKind};
use crate::node::StreamNode;
use std::sync::Arc;

pub(crate) struct HotHooks;

impl<T, Err> FlavorHooks<T, Err> for HotHooks {
    fn kind(&self) -> FlavorKind {
        FlavorKind::Hot
    }
}

/// A manually-driven Hot stream: the caller owns the producing side and
/// pushes values in directly, the way UI event buses or broadcast channels
/// are built in this crate's host applications.
pub struct HotInput<T, Err> {
    node: Arc<StreamNode<T, Err>>,
}

impl<T, Err> HotInput<T, Err>
where
    T: Clone + Send + Sync + 'static,
    Err: Clone + Send + Sync + 'static,
{
    /// Create a new, unconnected Hot source.
    pub fn new(descriptor: impl Into<String>) -> Self {
        HotInput {
            node: StreamNode::new_root(descriptor, Box::new(HotHooks)),
        }
    }

    /// The stream handle to attach operators on.
    pub fn stream(&self) -> Arc<StreamNode<T, Err>> {
        self.node.clone()
    }

    /// Push a value to every currently-attached child.
    pub fn push(&self, value: T) {
        self.node.ingest(Event::Next(value));
    }

    /// Push a non-terminating error.
    pub fn error(&self, err: Err) {
        self.node.ingest(Event::Error(err));
    }

    /// Close the stream.
    pub fn terminate(&self, reason: TerminationReason<Err>) {
        self.node.ingest(Event::Terminate(reason));
    }

    /// Close the stream as cancelled.
    pub fn cancel(&self) {
        self.node.cancel();
    }
}

/// A Hot source driven by a generator closure rather than manual pushes:
/// `produce` is polled by whatever dispatcher [`HotProducer::start`] was
/// given, and keeps running until it returns `None`, at which point the
/// stream completes.
pub struct HotProducer<T, Err> {
    node: Arc<StreamNode<T, Err>>,
}

impl<T, Err> HotProducer<T, Err>
where
    T: Clone + Send + Sync + 'static,
    Err: Clone + Send + Sync + 'static,
{
    /// Wrap a generator closure as a Hot source. Nothing runs until
    /// [`start`](Self::start) is called.
    pub fn new(descriptor: impl Into<String>) -> Self {
        HotProducer {
            node: StreamNode::new_root(descriptor, Box::new(HotHooks)),
        }
    }

    /// The stream handle to attach operators on.
    pub fn stream(&self) -> Arc<StreamNode<T, Err>> {
        self.node.clone()
    }

    /// Spawn `produce` on the given tokio runtime, pushing every `Some(v)`
    /// it yields and completing the stream on the first `None`.
    pub fn start(&self, handle: tokio::runtime::Handle, mut produce: impl FnMut() -> Option<T> + Send + 'static)
    where
        T: 'static,
    {
        let node = self.node.clone();
        handle.spawn_blocking(move || loop {
            if !node.is_active() {
                return;
            }
            match produce() {
                Some(v) => node.ingest(Event::Next(v)),
                None => {
                    node.ingest(Event::Terminate(TerminationReason::Completed));
                    return;
                }
            }
        });
    }
}
