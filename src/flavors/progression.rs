//! Progression streams: a Future-like stream that also emits progress ticks
//! before its final value (spec §4.4, §4.9).

use crate::event::TerminationReason;
use crate::node::flavor::{FlavorHooks, FlavorKind, ReplayPolicy};
use crate::node::StreamNode;
use std::sync::Arc;

/// The canonical shape of a progress tick (spec §4.4): current progress out
/// of total, with a human-readable title and unit. `Progression<T,Err>` is
/// generic over the tick type so callers aren't forced into this shape, but
/// it's the natural choice for `Progression<Progress, Err>`.
#[derive(Clone, Debug, PartialEq)]
pub struct Progress {
    pub current: u64,
    pub total: u64,
    pub title: String,
    pub unit: String,
}

struct ProgressionHooks;

impl<T, Err> FlavorHooks<T, Err> for ProgressionHooks {
    fn kind(&self) -> FlavorKind {
        FlavorKind::Progression
    }

    fn default_replay(&self) -> ReplayPolicy {
        ReplayPolicy {
            replay: false,
            replay_next: true,
        }
    }
}

/// A stream of progress ticks (`Next`) ending in exactly one final value
/// (`Terminate(Some(value), Completed)`). Progress ticks and the terminal
/// value are already structurally distinct in this model — ticks travel as
/// ordinary `Next` events, the final value only ever arrives bundled with
/// termination — so `onProgress`/`mapProgress` need no dedicated operator:
/// `.on(f)`/`.map(f)` on [`stream`](Self::stream) already only ever see
/// ticks, never the terminal value.
pub struct Progression<T, Err> {
    node: Arc<StreamNode<T, Err>>,
}

impl<T, Err> Progression<T, Err>
where
    T: Clone + Send + Sync + 'static,
    Err: Clone + Send + Sync + 'static,
{
    /// Create a new, unstarted Progression.
    pub fn new(descriptor: impl Into<String>) -> Self {
        Progression {
            node: StreamNode::new_root(descriptor, Box::new(ProgressionHooks)),
        }
    }

    /// The stream handle to attach operators on.
    pub fn stream(&self) -> Arc<StreamNode<T, Err>> {
        self.node.clone()
    }

    /// Report a progress tick. Delivered like any other `Next`, but doesn't
    /// end the stream.
    pub fn tick(&self, progress: T) {
        self.node.ingest(crate::event::Event::Next(progress));
    }

    /// Finish the task successfully, carrying the final value.
    pub fn complete(&self, final_value: T) {
        self.node.ingest_final(final_value, TerminationReason::Completed);
    }

    /// Finish the task with an error.
    pub fn fail(&self, err: Err) {
        self.node.terminate(TerminationReason::Error(err));
    }
}
