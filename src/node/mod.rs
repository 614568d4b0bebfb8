//! The stream node core: the single event-processing engine every flavor and
//! operator is built on top of (spec §3.3, §4.1).

pub mod edge;
pub mod flavor;
pub mod key;

use crate::dispatch::Dispatcher;
use crate::event::{Event, TerminationReason};
use crate::signal::{PushValue, Signal};
use edge::{ChildSink, Edge, ParentLink};
use flavor::{FlavorHooks, FlavorKind, ReplayPolicy};
use key::{EventKey, EventKeyId};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque node identity, stable for the node's lifetime. Used for child
/// bookkeeping (detach-by-id) and diagnostics; never exposed as a public
/// ordering guarantee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u64);

impl NodeId {
    fn fresh() -> Self {
        NodeId(NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Either the node is running or it has closed for good (I1).
enum NodeState<Err> {
    Active,
    Terminated(TerminationReason<Err>),
}

struct Inner<T, Err> {
    state: NodeState<Err>,
    last_value: Option<T>,
    replay: ReplayPolicy,
    /// Set aside by an async-completing operator (`asyncMap`, `retryOn`) that
    /// received a termination while a unit of async work was still in
    /// flight, so it can be delivered only once that work's own completion
    /// has been processed (preserves I2's ordering).
    pending_termination: Option<TerminationReason<Err>>,
    /// Run once, the first time a child attaches, then cleared. Lets a
    /// source that already knows its own events (e.g. `Future::flat_map`'s
    /// synthetic expansion) wait for a real subscriber instead of firing
    /// into an empty children list.
    on_first_attach: Option<Box<dyn FnOnce() + Send>>,
}

/// The engine behind every stream flavor. Generic only in its own output
/// type `T` — a child's output type `U` is erased behind [`edge::ChildSink`]
/// so a node never needs to know what its descendants carry (spec §9,
/// "generics at the node level, trait objects at the edges").
pub struct StreamNode<T, Err> {
    id: NodeId,
    descriptor: String,
    flavor: FlavorKind,
    hooks: Box<dyn FlavorHooks<T, Err>>,
    inner: Mutex<Inner<T, Err>>,
    children: Mutex<Vec<Arc<dyn ChildSink<T, Err>>>>,
    parent: Mutex<Option<Weak<dyn ParentLink<Err>>>>,
    /// When `true`, this node is kept alive (and active) even after its last
    /// child detaches (spec I5 / §4.1 "persist").
    persist: AtomicBool,
    dispatcher: Mutex<Option<Arc<dyn Dispatcher>>>,
}

impl<T, Err> StreamNode<T, Err>
where
    T: Clone + Send + Sync + 'static,
    Err: Clone + Send + Sync + 'static,
{
    /// Construct a fresh, parentless node (a source: `HotInput`, `Cold`'s
    /// definition node, `Promise`'s task node, a `Timer`, ...).
    pub fn new_root(
        descriptor: impl Into<String>,
        hooks: Box<dyn FlavorHooks<T, Err>>,
    ) -> Arc<Self> {
        let flavor = hooks.kind();
        let replay = hooks.default_replay();
        Arc::new(StreamNode {
            id: NodeId::fresh(),
            descriptor: descriptor.into(),
            flavor,
            hooks,
            inner: Mutex::new(Inner {
                state: NodeState::Active,
                last_value: None,
                replay,
                pending_termination: None,
                on_first_attach: None,
            }),
            children: Mutex::new(Vec::new()),
            parent: Mutex::new(None),
            persist: AtomicBool::new(false),
            dispatcher: Mutex::new(None),
        })
    }

    /// Attach a derived node below `self`, wired through `work`: on every
    /// event delivered to `self`, `work` is run with the child's last value
    /// (for stateful operators) and the incoming event, and its [`Signal`]
    /// result is applied to the child. Replay happens here, synchronously,
    /// before this call returns (spec §3.3, §4.1).
    pub fn attach<U, F>(
        self: &Arc<Self>,
        descriptor: impl Into<String>,
        hooks: Box<dyn FlavorHooks<U, Err>>,
        work: F,
    ) -> Arc<StreamNode<U, Err>>
    where
        U: Clone + Send + Sync + 'static,
        F: Fn(Option<&U>, &Event<T, Err>) -> Signal<U, Err> + Send + Sync + 'static,
    {
        self.attach_keyed(descriptor, hooks, None, work)
    }

    /// Like [`attach`](Self::attach), but the edge only accepts events whose
    /// [`EventKey`] matches `registered_key` (used by `Cold` branches).
    pub fn attach_keyed<U, F>(
        self: &Arc<Self>,
        descriptor: impl Into<String>,
        hooks: Box<dyn FlavorHooks<U, Err>>,
        registered_key: Option<EventKeyId>,
        work: F,
    ) -> Arc<StreamNode<U, Err>>
    where
        U: Clone + Send + Sync + 'static,
        F: Fn(Option<&U>, &Event<T, Err>) -> Signal<U, Err> + Send + Sync + 'static,
    {
        let child = StreamNode::new_root(descriptor, hooks);
        *child.parent.lock() = Some(Arc::downgrade(&(self.clone() as Arc<dyn ParentLink<Err>>)));

        let edge = Arc::new(Edge {
            child: child.clone(),
            work,
            registered_key,
            _marker: std::marker::PhantomData,
        });

        // Replay: if this node already has a terminal last value/termination,
        // the new child sees it immediately, before joining the live list.
        let replay_event = {
            let inner = self.inner.lock();
            match (&inner.state, &inner.last_value) {
                (NodeState::Terminated(reason), _) if inner.replay.replay => {
                    Some(Event::Terminate(reason.clone()))
                }
                (NodeState::Active, Some(v)) if inner.replay.replay || inner.replay.replay_next => {
                    Some(Event::Next(v.clone()))
                }
                _ => None,
            }
        };
        if let Some(event) = replay_event {
            edge.deliver(&event);
        }

        if child.is_active() {
            self.children.lock().push(edge);
        }

        self.run_deferred_on_attach();

        child
    }

    /// Wire an *existing* node as a child of `self`, without creating it and
    /// without claiming the single-parent back-link (used by `merge`/`zip`/
    /// `combine`, whose child has two upstream parents at once — spec §4.6.
    /// Pruning such a child from its parents' children lists is left to an
    /// explicit `detach`/`terminate` by whoever holds it, since there's no
    /// single parent to report termination back to).
    pub(crate) fn attach_existing<U, F>(
        self: &Arc<Self>,
        child: Arc<StreamNode<U, Err>>,
        registered_key: Option<EventKeyId>,
        work: F,
    ) where
        U: Clone + Send + Sync + 'static,
        F: Fn(Option<&U>, &Event<T, Err>) -> Signal<U, Err> + Send + Sync + 'static,
    {
        let edge = Arc::new(Edge {
            child: child.clone(),
            work,
            registered_key,
            _marker: std::marker::PhantomData,
        });

        let replay_event = {
            let inner = self.inner.lock();
            match (&inner.state, &inner.last_value) {
                (NodeState::Terminated(reason), _) if inner.replay.replay => {
                    Some(Event::Terminate(reason.clone()))
                }
                (NodeState::Active, Some(v)) if inner.replay.replay || inner.replay.replay_next => {
                    Some(Event::Next(v.clone()))
                }
                _ => None,
            }
        };
        if let Some(event) = replay_event {
            edge.deliver(&event);
        }

        if child.is_active() {
            self.children.lock().push(edge);
        }

        self.run_deferred_on_attach();
    }

    /// This node's stable identity.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// A human-readable name for diagnostics (`tracing` spans, panics never
    /// happen here but this is what shows up if you log the node).
    pub fn descriptor(&self) -> &str {
        &self.descriptor
    }

    /// Which flavor this node belongs to.
    pub fn flavor(&self) -> FlavorKind {
        self.flavor
    }

    /// `false` once this node has terminated.
    pub fn is_active(&self) -> bool {
        matches!(self.inner.lock().state, NodeState::Active)
    }

    /// The last value this node emitted, if any and if still held (cleared
    /// on termination unless the flavor's replay policy wants it kept around
    /// — Observable and Promise read this after completion).
    pub fn last_value(&self) -> Option<T> {
        self.inner.lock().last_value.clone()
    }

    /// Why this node terminated, if it has.
    pub fn termination_reason(&self) -> Option<TerminationReason<Err>> {
        match &self.inner.lock().state {
            NodeState::Terminated(reason) => Some(reason.clone()),
            NodeState::Active => None,
        }
    }

    /// Run `f` once, the first time a child attaches to this node, instead
    /// of immediately. Used by sources that compute their own events
    /// up front but still want a real subscriber in place before firing
    /// them (spec §4.4 `Future::flat_map`).
    pub(crate) fn defer_until_first_attach(self: &Arc<Self>, f: impl FnOnce() + Send + 'static) {
        self.inner.lock().on_first_attach = Some(Box::new(f));
    }

    fn run_deferred_on_attach(self: &Arc<Self>) {
        let deferred = self.inner.lock().on_first_attach.take();
        if let Some(f) = deferred {
            f();
        }
    }

    /// Keep this node alive even once every child detaches (spec I5).
    pub fn persist(self: &Arc<Self>) -> Arc<Self> {
        self.persist.store(true, Ordering::SeqCst);
        self.clone()
    }

    /// Pin this node's outgoing fan-out to a dispatcher. From here down,
    /// every descendant that doesn't set its own dispatcher runs on this
    /// queue (spec §5).
    pub fn dispatch_on(self: &Arc<Self>, dispatcher: Arc<dyn Dispatcher>) -> Arc<Self> {
        *self.dispatcher.lock() = Some(dispatcher);
        self.clone()
    }

    /// Feed a source-originated event into this node (used by producers:
    /// `HotInput::push`, `FutureInput::complete`, a `Timer`'s tick). Runs the
    /// same preprocess → apply → postprocess pipeline as a derived node, but
    /// without an operator work function — the event *is* the signal.
    pub(crate) fn ingest(self: &Arc<Self>, event: Event<T, Err>) {
        self.ingest_keyed(event, EventKey::None);
    }

    /// Like [`ingest`](Self::ingest), but the resulting event is fanned out
    /// under `key` rather than [`EventKey::None`]. Used by `Cold` to isolate
    /// (or, with `share`, broadcast) one branch's response (spec §4.2).
    pub(crate) fn ingest_keyed(self: &Arc<Self>, event: Event<T, Err>, key: EventKey) {
        let signal = match event {
            Event::Next(v) => Signal::Push(PushValue::Value(v)),
            Event::Error(e) => Signal::Error(e),
            Event::Terminate(r) => Signal::Terminate(None, r),
        };
        self.apply_signal_keyed(signal, key);
    }

    /// Feed a terminal value in directly, without collapsing it through the
    /// plain `Event` vocabulary (which has no slot for "this is the last
    /// value"). Used by `Progression::complete` and any other source that
    /// terminates with a final payload attached.
    pub(crate) fn ingest_final(self: &Arc<Self>, value: T, reason: TerminationReason<Err>) {
        self.apply_signal_keyed(Signal::Terminate(Some(value), reason), EventKey::None);
    }

    /// Apply an operator's (or a source's) [`Signal`] to this node: updates
    /// state, fans the resulting event out to children in order, and, on
    /// termination, notifies the parent for pruning (spec §4.1).
    pub(crate) fn apply_signal(&self, signal: Signal<T, Err>) {
        self.apply_signal_keyed(signal, EventKey::None);
    }

    pub(crate) fn apply_signal_keyed(&self, signal: Signal<T, Err>, key: EventKey) {
        if !self.is_active() {
            return;
        }
        let signal = self.hooks.preprocess(signal);
        match signal {
            Signal::Push(PushValue::Value(v)) => self.push_one(v, key),
            Signal::Push(PushValue::Flatten(vs)) => {
                for v in vs {
                    if !self.is_active() {
                        break;
                    }
                    self.push_one(v, key);
                }
            }
            Signal::Error(e) => {
                self.fan_out(Event::Error(e), key, &[]);
                self.hooks.postprocess(false);
            }
            Signal::Cancel => {}
            Signal::Terminate(value, reason) => {
                if let Some(v) = value {
                    self.push_one(v, key);
                    if !self.is_active() {
                        return;
                    }
                }
                self.terminate_internal(reason, key, &[]);
            }
            Signal::Merging => {}
        }
    }

    fn push_one(&self, v: T, key: EventKey) {
        {
            let mut inner = self.inner.lock();
            inner.last_value = Some(v.clone());
        }
        self.fan_out(Event::Next(v), key, &[]);
        self.hooks.postprocess(false);
    }

    /// Deliver `event` to every active child whose registration the key
    /// accepts, skipping children whose flavor appears in `skip_flavors`
    /// (used by Future/Promise completion to keep nested latent Futures
    /// untouched — spec §4.4).
    fn fan_out(&self, event: Event<T, Err>, key: EventKey, skip_flavors: &[FlavorKind]) {
        let children: Vec<_> = {
            let mut guard = self.children.lock();
            guard.retain(|c| c.is_active());
            guard
                .iter()
                .filter(|c| key.accepts(c.registered_key()) && !skip_flavors.contains(&c.flavor()))
                .cloned()
                .collect()
        };
        if children.is_empty() {
            return;
        }
        match self.dispatcher.lock().clone() {
            None => {
                for child in children {
                    child.deliver(&event);
                }
            }
            Some(d) => {
                d.execute(Box::new(move || {
                    for child in children {
                        child.deliver(&event);
                    }
                }));
            }
        }
    }

    /// Terminate this node right now, fanning the termination out (subject
    /// to `skip_flavors`) and notifying the parent.
    fn terminate_internal(&self, reason: TerminationReason<Err>, key: EventKey, skip_flavors: &[FlavorKind]) {
        {
            let mut inner = self.inner.lock();
            if matches!(inner.state, NodeState::Terminated(_)) {
                return;
            }
            inner.state = NodeState::Terminated(reason.clone());
        }
        self.fan_out(Event::Terminate(reason.clone()), key, skip_flavors);
        self.hooks.postprocess(true);
        if let Some(parent) = self.parent.lock().as_ref().and_then(Weak::upgrade) {
            parent.child_terminated(self.id, reason);
        }
    }

    /// Terminate with `Completed`/`Cancelled`/`Error`, delivering the
    /// termination to every child.
    pub fn terminate(&self, reason: TerminationReason<Err>) {
        self.terminate_internal(reason, EventKey::None, &[]);
    }

    /// Terminate as `Cancelled` (spec §3.5: explicit user cancellation).
    pub fn cancel(&self) {
        self.terminate(TerminationReason::Cancelled);
    }

    /// Like [`terminate`](Self::terminate), but children whose flavor is in
    /// `skip_flavors` are left untouched instead of also terminating. Used
    /// by `Future`/`Promise` postprocess so nested Futures stay latent.
    pub(crate) fn terminate_skipping(&self, reason: TerminationReason<Err>, skip_flavors: &[FlavorKind]) {
        self.terminate_internal(reason, EventKey::None, skip_flavors);
    }

    /// Explicitly detach a child before it has terminated on its own (a
    /// dropped subscription). If this was the last child and `persist` is
    /// not set, the node terminates as `Cancelled`.
    pub fn detach(&self, child_id: NodeId) {
        let now_empty = {
            let mut children = self.children.lock();
            children.retain(|c| c.id() != child_id);
            children.is_empty()
        };
        if now_empty && !self.persist.load(Ordering::SeqCst) {
            self.terminate(TerminationReason::Cancelled);
        }
    }

    /// Stash a termination that arrived mid-flight so an async-completing
    /// operator can apply it once its in-flight unit of work has resolved.
    pub(crate) fn stash_pending_termination(&self, reason: TerminationReason<Err>) {
        self.inner.lock().pending_termination = Some(reason);
    }

    /// Take back a previously stashed termination, if any.
    pub(crate) fn take_pending_termination(&self) -> Option<TerminationReason<Err>> {
        self.inner.lock().pending_termination.take()
    }
}

impl<T, Err> ParentLink<Err> for StreamNode<T, Err>
where
    T: Clone + Send + Sync + 'static,
    Err: Clone + Send + Sync + 'static,
{
    fn child_terminated(&self, child_id: NodeId, reason: TerminationReason<Err>) {
        let now_empty = {
            let mut children = self.children.lock();
            children.retain(|c| c.id() != child_id);
            children.is_empty()
        };
        if now_empty && !self.persist.load(Ordering::SeqCst) {
            self.terminate_internal(reason, EventKey::None, &[]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::flavor::BaseHooks;
    use std::sync::atomic::AtomicUsize;

    fn root() -> Arc<StreamNode<i32, String>> {
        StreamNode::new_root("root", Box::new(BaseHooks))
    }

    #[test]
    fn push_reaches_attached_child() {
        let parent = root();
        let seen = Arc::new(AtomicUsize::new(0));
        let seen2 = seen.clone();
        let _child = parent.attach("child", Box::new(BaseHooks), move |_prior, ev: &Event<i32, String>| {
            if let Event::Next(v) = ev {
                seen2.store(*v as usize, Ordering::SeqCst);
            }
            Signal::push(*match ev {
                Event::Next(v) => v,
                _ => &0,
            })
        });
        parent.ingest(Event::Next(42));
        assert_eq!(seen.load(Ordering::SeqCst), 42);
    }

    #[test]
    fn terminate_propagates_to_children_and_prunes_from_parent() {
        let parent = root();
        let child = parent.attach("child", Box::new(BaseHooks), |_prior, ev: &Event<i32, String>| match ev {
            Event::Next(v) => Signal::push(*v),
            Event::Terminate(r) => Signal::terminate(r.clone()),
            Event::Error(e) => Signal::Error(e.clone()),
        });
        parent.ingest(Event::Terminate(TerminationReason::Completed));
        assert!(!child.is_active());
        assert!(!parent.is_active());
    }

    #[test]
    fn losing_last_child_terminates_unless_persisting() {
        let parent = root();
        let child = parent.attach("child", Box::new(BaseHooks), |_prior, ev: &Event<i32, String>| match ev {
            Event::Next(v) => Signal::push(*v),
            Event::Terminate(r) => Signal::terminate(r.clone()),
            Event::Error(e) => Signal::Error(e.clone()),
        });
        parent.detach(child.id());
        assert!(!parent.is_active());

        let parent2 = root();
        parent2.persist();
        let child2 = parent2.attach("child", Box::new(BaseHooks), |_prior, ev: &Event<i32, String>| match ev {
            Event::Next(v) => Signal::push(*v),
            Event::Terminate(r) => Signal::terminate(r.clone()),
            Event::Error(e) => Signal::Error(e.clone()),
        });
        parent2.detach(child2.id());
        assert!(parent2.is_active());
    }

    #[test]
    fn replay_delivers_last_value_to_late_child() {
        let parent = StreamNode::new_root("observable-ish", Box::new(BaseHooks));
        *parent.inner.lock() = Inner {
            state: NodeState::Active,
            last_value: Some(7),
            replay: ReplayPolicy::REPLAY,
            pending_termination: None,
        };
        let seen = Arc::new(AtomicUsize::new(0));
        let seen2 = seen.clone();
        parent.attach("late", Box::new(BaseHooks), move |_prior, ev: &Event<i32, String>| {
            if let Event::Next(v) = ev {
                seen2.store(*v as usize, Ordering::SeqCst);
            }
            Signal::push(match ev {
                Event::Next(v) => *v,
                _ => 0,
            })
        });
        assert_eq!(seen.load(Ordering::SeqCst), 7);
    }
}
