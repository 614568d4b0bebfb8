//! Flavor overlays: pre/post-processing hooks and replay policy that vary by
//! stream flavor (spec §4.4). Modeled as a tagged enum plus a small table of
//! hook functions rather than inheritance, per spec §9's design note.

use crate::event::TerminationReason;
use crate::signal::{PushValue, Signal};
use std::fmt;

/// Which of the six flavors a node belongs to. Carried alongside the node so
/// operators can make flavor-aware decisions (e.g. "this transform degrades
/// Observable to Hot because its output isn't always defined").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlavorKind {
    /// A plain derived node with no flavor-specific behavior of its own;
    /// inherits whatever its parent enforces.
    Base,
    /// Fire-and-forget; errors never terminate it.
    Hot,
    /// Request/response, keyed fan-out.
    Cold,
    /// Hot plus an always-defined "current value".
    Observable,
    /// At most one `Next`/`Error` over its lifetime.
    Future,
    /// A retryable Future.
    Promise,
    /// A Future-like stream that also carries progress ticks.
    Progression,
}

impl fmt::Display for FlavorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Replay configuration a node is created with (spec §3.3, §4.1).
#[derive(Debug, Clone, Copy)]
pub struct ReplayPolicy {
    /// Deliver the last emission (value or termination) to a newly attached
    /// child before any further event.
    pub replay: bool,
    /// Emit the node's current value to a newly attached child even when
    /// `replay` is otherwise off — used by Observable's "always defined"
    /// contract and by stateful operators (`distinct`, `min`, `max`,
    /// `onTransition`) that need a late attacher to see accumulator state.
    pub replay_next: bool,
}

impl ReplayPolicy {
    /// Neither replays values nor terminations. The default for plain `Base`
    /// and `Hot` nodes.
    pub const NONE: ReplayPolicy = ReplayPolicy {
        replay: false,
        replay_next: false,
    };

    /// Replays the last value/termination to new children. Used by
    /// `Observable`, `Cold` response edges, and `Promise`/`Future` once
    /// completed.
    pub const REPLAY: ReplayPolicy = ReplayPolicy {
        replay: true,
        replay_next: false,
    };
}

/// Flavor-specific hooks invoked by the node-core event pipeline (spec
/// §4.1). Each flavor module provides one implementation; `Base` is the
/// identity/no-op case every other flavor falls back to for steps it
/// doesn't care about.
pub trait FlavorHooks<T, Err>: Send + Sync {
    /// Which flavor this hook table belongs to.
    fn kind(&self) -> FlavorKind {
        FlavorKind::Base
    }

    /// Runs on every [`Signal`] this node is about to apply to itself —
    /// whether it came from a source's direct ingest or from a parent-
    /// installed work function — before any state mutation or fan-out. May
    /// swallow, transform, or upgrade it. Default is the identity
    /// transform; `Future`/`Promise` use this to collapse the first `Push`
    /// or `Error` into a terminal event (spec §4.4).
    fn preprocess(&self, signal: Signal<T, Err>) -> Signal<T, Err> {
        signal
    }

    /// Runs after the node has applied a signal to itself and fanned the
    /// resulting event out. `completed` is `true` if this event caused the
    /// node to terminate. Default is a no-op.
    fn postprocess(&self, _completed: bool) {}

    /// The replay policy a freshly-constructed node of this flavor starts
    /// with, absent any operator-specific override.
    fn default_replay(&self) -> ReplayPolicy {
        ReplayPolicy::NONE
    }
}

/// The hook table used by `Base` nodes and as the fallback for flavors that
/// don't need to override a given step.
#[derive(Default)]
pub struct BaseHooks;

impl<T, Err> FlavorHooks<T, Err> for BaseHooks {}

/// Helper shared by `Future`/`Promise`: the node accepts exactly one `Push`
/// or `Error` over its lifetime. The first of either becomes a `Terminate`
/// carrying that value (or no value, for an error) so node-core's own
/// "nothing after terminate" rule (I1) does the rest (spec §4.4).
pub(crate) fn single_emission<T, Err>(signal: Signal<T, Err>) -> Signal<T, Err> {
    match signal {
        Signal::Push(PushValue::Value(v)) => Signal::Terminate(Some(v), TerminationReason::Completed),
        Signal::Push(PushValue::Flatten(vs)) => {
            let mut vs = vs.into_iter();
            match vs.next() {
                Some(v) => Signal::Terminate(Some(v), TerminationReason::Completed),
                None => Signal::Cancel,
            }
        }
        Signal::Error(e) => Signal::Terminate(None, TerminationReason::Error(e)),
        other => other,
    }
}
