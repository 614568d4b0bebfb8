//! The parent→child link: a type-erased-on-the-parent-side edge carrying the
//! operator work function installed when the child was attached (spec §3.3,
//! §4.1 "work function (parent-installed closure)").

use crate::event::{Event, TerminationReason};
use crate::node::key::EventKeyId;
use crate::node::flavor::FlavorKind;
use crate::node::{NodeId, StreamNode};
use crate::signal::Signal;
use std::sync::Arc;

/// A parent's view of one child: everything the parent needs to fan an
/// event out without knowing the child's own payload type `U`.
pub(crate) trait ChildSink<T, Err>: Send + Sync {
    fn id(&self) -> NodeId;
    fn registered_key(&self) -> Option<EventKeyId>;
    fn flavor(&self) -> FlavorKind;
    fn is_active(&self) -> bool;
    fn deliver(&self, event: &Event<T, Err>);
}

/// Concrete edge: a child node plus the closure that turns an incoming
/// parent event into a [`Signal`] for that child.
pub(crate) struct Edge<T, U, Err, F> {
    pub(crate) child: Arc<StreamNode<U, Err>>,
    pub(crate) work: F,
    pub(crate) registered_key: Option<EventKeyId>,
    pub(crate) _marker: std::marker::PhantomData<fn(T)>,
}

impl<T, U, Err, F> ChildSink<T, Err> for Edge<T, U, Err, F>
where
    T: Send + Sync + 'static,
    U: Clone + Send + Sync + 'static,
    Err: Clone + Send + Sync + 'static,
    F: Fn(Option<&U>, &Event<T, Err>) -> Signal<U, Err> + Send + Sync,
{
    fn id(&self) -> NodeId {
        self.child.id()
    }

    fn registered_key(&self) -> Option<EventKeyId> {
        self.registered_key
    }

    fn flavor(&self) -> FlavorKind {
        self.child.flavor()
    }

    fn is_active(&self) -> bool {
        self.child.is_active()
    }

    fn deliver(&self, event: &Event<T, Err>) {
        let prior = self.child.last_value();
        let signal = (self.work)(prior.as_ref(), event);
        self.child.apply_signal(signal);
    }
}

/// A node's weak back-reference to its parent, erased over the parent's own
/// payload type. Implemented by every `StreamNode<T, Err>` for its own `T`.
pub(crate) trait ParentLink<Err>: Send + Sync {
    fn child_terminated(&self, child_id: NodeId, reason: TerminationReason<Err>);
}
