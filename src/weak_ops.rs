//! Weak-lifetime operators: `using`, `lifeOf` (spec §4.7). Both tie a
//! stream's continued life to an external object, without extending that
//! object's own lifetime — the node holds only a [`Weak`], never an [`Arc`].

use crate::event::{Event, TerminationReason};
use crate::node::flavor::{BaseHooks, FlavorHooks, FlavorKind, ReplayPolicy};
use crate::node::StreamNode;
use crate::signal::Signal;
use std::sync::{Arc, Weak};

/// Hook table for `using`/`lifeOf` derived nodes: replay is refused outright,
/// since replaying a stale value to a late subscriber would only resurrect
/// an object that may already be gone (spec §4.7).
struct NoReplayHooks;

impl<T, Err> FlavorHooks<T, Err> for NoReplayHooks {
    fn kind(&self) -> FlavorKind {
        FlavorKind::Base
    }

    fn default_replay(&self) -> ReplayPolicy {
        ReplayPolicy::NONE
    }
}

impl<T, Err> StreamNode<T, Err>
where
    T: Clone + Send + Sync + 'static,
    Err: Clone + Send + Sync + 'static,
{
    /// Pair every value with `obj`, as long as `obj` is still alive. Once the
    /// weak reference clears, the stream terminates with `then()` rather
    /// than continuing to emit against a vanished object.
    pub fn using<O>(
        self: &Arc<Self>,
        obj: &Arc<O>,
        then: impl Fn() -> TerminationReason<Err> + Send + Sync + 'static,
    ) -> Arc<StreamNode<(T, Arc<O>), Err>>
    where
        O: Send + Sync + 'static,
    {
        let weak: Weak<O> = Arc::downgrade(obj);
        self.attach("using", Box::new(NoReplayHooks), move |_prior, ev: &Event<T, Err>| match ev {
            Event::Next(v) => match weak.upgrade() {
                Some(strong) => Signal::push((v.clone(), strong)),
                None => Signal::terminate(then()),
            },
            Event::Error(e) => Signal::Error(e.clone()),
            Event::Terminate(r) => Signal::terminate(r.clone()),
        })
    }

    /// Pass every value through unchanged, as long as `obj` is still alive.
    /// Once the weak reference clears, the stream terminates with `then()`.
    pub fn life_of<O>(
        self: &Arc<Self>,
        obj: &Arc<O>,
        then: impl Fn() -> TerminationReason<Err> + Send + Sync + 'static,
    ) -> Arc<StreamNode<T, Err>>
    where
        O: Send + Sync + 'static,
    {
        let weak: Weak<O> = Arc::downgrade(obj);
        self.attach("life_of", Box::new(NoReplayHooks), move |_prior, ev: &Event<T, Err>| match ev {
            Event::Next(v) => {
                if weak.upgrade().is_some() {
                    Signal::push(v.clone())
                } else {
                    Signal::terminate(then())
                }
            }
            Event::Error(e) => Signal::Error(e.clone()),
            Event::Terminate(r) => Signal::terminate(r.clone()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::flavor::BaseHooks as RootHooks;

    #[test]
    fn life_of_terminates_once_object_is_dropped() {
        let root: Arc<StreamNode<i32, String>> = StreamNode::new_root("root", Box::new(RootHooks));
        let obj = Arc::new(42_u64);
        let child = root.life_of(&obj, || TerminationReason::Cancelled);

        root.ingest(Event::Next(1));
        assert!(child.is_active());
        assert_eq!(child.last_value(), Some(1));

        drop(obj);
        root.ingest(Event::Next(2));
        assert!(!child.is_active());
    }

    #[test]
    fn using_pairs_value_with_strong_handle_while_alive() {
        let root: Arc<StreamNode<i32, String>> = StreamNode::new_root("root", Box::new(RootHooks));
        let obj = Arc::new("label".to_string());
        let child = root.using(&obj, || TerminationReason::Cancelled);

        root.ingest(Event::Next(7));
        let (v, handle) = child.last_value().expect("value delivered while object is alive");
        assert_eq!(v, 7);
        assert_eq!(*handle, "label");
    }
}
