//! Cold streams: a definition invoked fresh on every `request`, with
//! request/response isolation between branches via keyed fan-out (spec
//! §4.2, §4.4).

use crate::event::{Event, TerminationReason};
use crate::node::flavor::{BaseHooks, FlavorHooks, FlavorKind};
use crate::node::key::{EventKey, EventKeyId};
use crate::node::StreamNode;
use std::sync::Arc;

struct ColdHooks;

impl<T, Err> FlavorHooks<T, Err> for ColdHooks {
    fn kind(&self) -> FlavorKind {
        FlavorKind::Cold
    }
}

/// Handle a `Cold`'s definition closure uses to answer one request. Each
/// handle is bound to the branch that issued the request.
pub struct ColdResponder<T, Err> {
    root: Arc<StreamNode<T, Err>>,
    branch_id: EventKeyId,
}

impl<T, Err> ColdResponder<T, Err>
where
    T: Clone + Send + Sync + 'static,
    Err: Clone + Send + Sync + 'static,
{
    /// Reply only to the branch that made this request.
    pub fn push(&self, value: T) {
        self.root
            .ingest_keyed(Event::Next(value), EventKey::Keyed(self.branch_id));
    }

    /// Reply to every branch currently registered, not just this one (spec
    /// §4.4 `share`).
    pub fn push_shared(&self, value: T) {
        self.root
            .ingest_keyed(Event::Next(value), EventKey::Shared(EventKeyId::fresh()));
    }

    /// A non-terminating error, to this branch only.
    pub fn error(&self, err: Err) {
        self.root
            .ingest_keyed(Event::Error(err), EventKey::Keyed(self.branch_id));
    }

    /// Close this branch.
    pub fn terminate(&self, reason: TerminationReason<Err>) {
        self.root
            .ingest_keyed(Event::Terminate(reason), EventKey::Keyed(self.branch_id));
    }
}

/// A stream definition that runs fresh every time [`Cold::request`] is
/// called, producing an independent branch.
pub struct Cold<R, T, Err> {
    root: Arc<StreamNode<T, Err>>,
    definition: Arc<dyn Fn(R, ColdResponder<T, Err>) + Send + Sync>,
}

impl<R, T, Err> Cold<R, T, Err>
where
    T: Clone + Send + Sync + 'static,
    Err: Clone + Send + Sync + 'static,
{
    /// Build a Cold stream from a definition closure. `definition` is
    /// invoked once per [`request`](Self::request), synchronously, and
    /// replies through the [`ColdResponder`] it is handed.
    pub fn new(
        descriptor: impl Into<String>,
        definition: impl Fn(R, ColdResponder<T, Err>) + Send + Sync + 'static,
    ) -> Self {
        let root = StreamNode::new_root(descriptor, Box::new(ColdHooks));
        root.persist();
        Cold {
            root,
            definition: Arc::new(definition),
        }
    }

    /// Start a new, independent branch by running the definition with `req`.
    /// Events from this invocation reach only the returned branch unless the
    /// definition calls [`ColdResponder::push_shared`].
    pub fn request(&self, req: R) -> Arc<StreamNode<T, Err>> {
        let branch_id = EventKeyId::fresh();
        let branch = self.root.attach_keyed(
            "cold-branch",
            Box::new(BaseHooks),
            Some(branch_id),
            |_prior, ev: &Event<T, Err>| match ev {
                Event::Next(v) => crate::signal::Signal::push(v.clone()),
                Event::Error(e) => crate::signal::Signal::Error(e.clone()),
                Event::Terminate(r) => crate::signal::Signal::terminate(r.clone()),
            },
        );
        let responder = ColdResponder {
            root: self.root.clone(),
            branch_id,
        };
        (self.definition)(req, responder);
        branch
    }
}
