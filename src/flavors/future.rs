//! Future streams: at most one `Next` or `Error` over their lifetime, then
//! `Terminate(Completed)` (spec §4.4).

use crate::event::{Event, TerminationReason};
use crate::flavors::hot::HotHooks;
use crate::node::flavor::{single_emission, FlavorHooks, FlavorKind, ReplayPolicy};
use crate::node::StreamNode;
use crate::signal::Signal;
use std::sync::Arc;

pub(crate) struct FutureHooks;

impl<T, Err> FlavorHooks<T, Err> for FutureHooks {
    fn kind(&self) -> FlavorKind {
        FlavorKind::Future
    }

    fn preprocess(&self, signal: Signal<T, Err>) -> Signal<T, Err> {
        single_emission(signal)
    }

    fn default_replay(&self) -> ReplayPolicy {
        ReplayPolicy::REPLAY
    }
}

/// A read-only handle to a Future's eventual value.
pub struct Future<T, Err> {
    node: Arc<StreamNode<T, Err>>,
}

impl<T, Err> Future<T, Err>
where
    T: Clone + Send + Sync + 'static,
    Err: Clone + Send + Sync + 'static,
{
    pub(crate) fn wrap(node: Arc<StreamNode<T, Err>>) -> Self {
        Future { node }
    }

    /// Build an already-completed Future (spec §4.4 `.completed(value)`).
    pub fn completed(descriptor: impl Into<String>, value: T) -> Self {
        let node = StreamNode::new_root(descriptor, Box::new(FutureHooks));
        node.ingest(Event::Next(value));
        Future { node }
    }

    /// Build an already-failed Future.
    pub fn failed(descriptor: impl Into<String>, err: Err) -> Self {
        let node = StreamNode::new_root(descriptor, Box::new(FutureHooks));
        node.ingest(Event::Error(err));
        Future { node }
    }

    /// The stream handle to attach operators on.
    pub fn stream(&self) -> Arc<StreamNode<T, Err>> {
        self.node.clone()
    }

    /// The resolved value, once settled successfully.
    pub fn value(&self) -> Option<T> {
        self.node.last_value()
    }

    /// `true` once this Future has settled, one way or another.
    pub fn is_settled(&self) -> bool {
        !self.node.is_active()
    }

    /// Expand the resolved value into a Hot stream of its own, the way
    /// `flatMap` on an already-completed Future is defined: there is only
    /// ever one value to expand, so this reads it directly rather than
    /// subscribing to the Future's own replay (which only ever carries the
    /// termination reason to late attachers, never the value itself). The
    /// expansion waits for the first real subscriber rather than firing
    /// into an empty children list, so `.on(...)` attached right after this
    /// call still observes every emitted value.
    /// A Future that never resolved successfully yields a Hot stream that
    /// never emits and is already inactive.
    pub fn flat_map<U>(&self, f: impl FnOnce(T) -> Vec<U> + Send + 'static) -> Arc<StreamNode<U, Err>>
    where
        U: Clone + Send + Sync + 'static,
    {
        let out: Arc<StreamNode<U, Err>> = StreamNode::new_root("future_flat_map", Box::new(HotHooks));
        let value = self.value();
        let reason = self.node.termination_reason();
        let out2 = out.clone();
        out.defer_until_first_attach(move || match value {
            Some(v) => {
                for item in f(v) {
                    out2.ingest(Event::Next(item));
                }
                out2.ingest(Event::Terminate(TerminationReason::Completed));
            }
            None => {
                if let Some(reason) = reason {
                    out2.ingest(Event::Terminate(reason));
                }
            }
        });
        out
    }
}

/// The writable side of a Future: exactly one of [`complete`](Self::complete)
/// or [`fail`](Self::fail) should be called; later calls are no-ops because
/// the node is already terminated.
pub struct FutureInput<T, Err> {
    node: Arc<StreamNode<T, Err>>,
}

impl<T, Err> FutureInput<T, Err>
where
    T: Clone + Send + Sync + 'static,
    Err: Clone + Send + Sync + 'static,
{
    /// Create a new, unsettled Future.
    pub fn new(descriptor: impl Into<String>) -> Self {
        FutureInput {
            node: StreamNode::new_root(descriptor, Box::new(FutureHooks)),
        }
    }

    /// A read-only [`Future`] view over this source.
    pub fn future(&self) -> Future<T, Err> {
        Future::wrap(self.node.clone())
    }

    /// The stream handle to attach operators on.
    pub fn stream(&self) -> Arc<StreamNode<T, Err>> {
        self.node.clone()
    }

    /// Resolve successfully.
    pub fn complete(&self, value: T) {
        self.node.ingest(Event::Next(value));
    }

    /// Resolve with an error.
    pub fn fail(&self, err: Err) {
        self.node.ingest(Event::Error(err));
    }

    /// Cancel before settling.
    pub fn cancel(&self) {
        self.node.ingest(Event::Terminate(TerminationReason::Cancelled));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[test]
    fn flat_map_on_an_already_completed_future_still_reaches_a_late_subscriber() {
        let input = FutureInput::<i32, String>::new("seven");
        input.complete(7);

        let tripled = input.future().flat_map(|v| vec![v, v, v]);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen2 = seen.clone();
        let _watcher = tripled.on(move |v| seen2.lock().push(*v));

        assert_eq!(*seen.lock(), vec![7, 7, 7]);
        assert!(!tripled.is_active());
    }

    #[test]
    fn flat_map_on_a_failed_future_only_forwards_the_termination() {
        let input = FutureInput::<i32, String>::new("boom");
        input.fail("nope".to_string());

        let mapped = input.future().flat_map(|v| vec![v]);
        let terminations = Arc::new(Mutex::new(Vec::new()));
        let terminations2 = terminations.clone();
        let _watcher = mapped.on_terminate(move |r| terminations2.lock().push(r.clone()));

        assert_eq!(terminations.lock().len(), 1);
        assert!(!mapped.is_active());
    }
}
