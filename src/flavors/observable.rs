//! Observable streams: Hot plus an always-defined "current value" that a
//! newly attached child receives immediately (spec §4.4).

use crate::event::{Event, TerminationReason};
use crate::node::flavor::{FlavorHooks, FlavorKind, ReplayPolicy};
use crate::node::StreamNode;
use std::sync::Arc;

struct ObservableHooks;

impl<T, Err> FlavorHooks<T, Err> for ObservableHooks {
    fn kind(&self) -> FlavorKind {
        FlavorKind::Observable
    }

    fn default_replay(&self) -> ReplayPolicy {
        ReplayPolicy::REPLAY
    }
}

/// A derived, read-only view of an Observable's current value. Cheap to
/// clone, and always has a value once the source has been constructed.
pub struct Observable<T, Err> {
    node: Arc<StreamNode<T, Err>>,
}

impl<T, Err> Observable<T, Err>
where
    T: Clone + Send + Sync + 'static,
    Err: Clone + Send + Sync + 'static,
{
    pub(crate) fn wrap(node: Arc<StreamNode<T, Err>>) -> Self {
        Observable { node }
    }

    /// The stream handle to attach operators on.
    pub fn stream(&self) -> Arc<StreamNode<T, Err>> {
        self.node.clone()
    }

    /// The current value. Always `Some` once constructed with an initial
    /// value, unless the stream has since terminated without a final push.
    pub fn value(&self) -> Option<T> {
        self.node.last_value()
    }
}

/// The writable side of an Observable.
pub struct ObservableInput<T, Err> {
    node: Arc<StreamNode<T, Err>>,
}

impl<T, Err> ObservableInput<T, Err>
where
    T: Clone + Send + Sync + 'static,
    Err: Clone + Send + Sync + 'static,
{
    /// Create a new Observable seeded with `initial`.
    pub fn new(descriptor: impl Into<String>, initial: T) -> Self {
        let node = StreamNode::new_root(descriptor, Box::new(ObservableHooks));
        node.ingest(Event::Next(initial));
        ObservableInput { node }
    }

    /// A read-only [`Observable`] view over this source.
    pub fn observable(&self) -> Observable<T, Err> {
        Observable::wrap(self.node.clone())
    }

    /// The stream handle to attach operators on.
    pub fn stream(&self) -> Arc<StreamNode<T, Err>> {
        self.node.clone()
    }

    /// Set a new current value.
    pub fn set(&self, value: T) {
        self.node.ingest(Event::Next(value));
    }

    /// The current value.
    pub fn value(&self) -> Option<T> {
        self.node.last_value()
    }

    /// Close the stream.
    pub fn terminate(&self, reason: TerminationReason<Err>) {
        self.node.ingest(Event::Terminate(reason));
    }
}
