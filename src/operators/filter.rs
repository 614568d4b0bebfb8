//! Selection operators: `filter`, `stride`, `skip`, `distinct` (spec §4.3).

use crate::event::Event;
use crate::node::flavor::{BaseHooks, FlavorHooks, FlavorKind, ReplayPolicy};
use crate::node::StreamNode;
use crate::signal::Signal;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Hook table for stateful operators (`distinct`, `min`, `max`,
/// `onTransition`) whose derived node should replay its accumulator to a
/// late-attaching child instead of staying silent until the next value
/// (spec §4.1's "temporarily flip replayNext" note, simplified here to a
/// permanent flag since nothing else on these nodes ever changes it).
pub(crate) struct StatefulHooks;

impl<T, Err> FlavorHooks<T, Err> for StatefulHooks {
    fn kind(&self) -> FlavorKind {
        FlavorKind::Base
    }

    fn default_replay(&self) -> ReplayPolicy {
        ReplayPolicy {
            replay: false,
            replay_next: true,
        }
    }
}

impl<T, Err> StreamNode<T, Err>
where
    T: Clone + Send + Sync + 'static,
    Err: Clone + Send + Sync + 'static,
{
    /// Keep only values for which `predicate` returns `true`.
    pub fn filter(self: &Arc<Self>, predicate: impl Fn(&T) -> bool + Send + Sync + 'static) -> Arc<StreamNode<T, Err>> {
        self.attach("filter", Box::new(BaseHooks), move |_prior, ev: &Event<T, Err>| match ev {
            Event::Next(v) => {
                if predicate(v) {
                    Signal::push(v.clone())
                } else {
                    Signal::Cancel
                }
            }
            Event::Error(e) => Signal::Error(e.clone()),
            Event::Terminate(r) => Signal::terminate(r.clone()),
        })
    }

    /// Keep only every `n`th value (1-indexed: the 1st, (n+1)th, ...).
    pub fn stride(self: &Arc<Self>, n: usize) -> Arc<StreamNode<T, Err>> {
        let count = Arc::new(AtomicUsize::new(0));
        self.attach("stride", Box::new(BaseHooks), move |_prior, ev: &Event<T, Err>| match ev {
            Event::Next(v) => {
                let i = count.fetch_add(1, Ordering::SeqCst);
                if i % n.max(1) == 0 {
                    Signal::push(v.clone())
                } else {
                    Signal::Cancel
                }
            }
            Event::Error(e) => Signal::Error(e.clone()),
            Event::Terminate(r) => Signal::terminate(r.clone()),
        })
    }

    /// Drop the first `n` values, then pass everything through.
    pub fn skip(self: &Arc<Self>, n: usize) -> Arc<StreamNode<T, Err>> {
        let remaining = Arc::new(AtomicUsize::new(n));
        self.attach("skip", Box::new(BaseHooks), move |_prior, ev: &Event<T, Err>| match ev {
            Event::Next(v) => {
                let prev = remaining.load(Ordering::SeqCst);
                if prev == 0 {
                    Signal::push(v.clone())
                } else {
                    remaining.fetch_sub(1, Ordering::SeqCst);
                    Signal::Cancel
                }
            }
            Event::Error(e) => Signal::Error(e.clone()),
            Event::Terminate(r) => Signal::terminate(r.clone()),
        })
    }

    /// Drop consecutive duplicate values, as judged by `T`'s own equality.
    /// A late-attaching child sees the current distinct value immediately
    /// (spec §4.1, stateful replay).
    pub fn distinct(self: &Arc<Self>) -> Arc<StreamNode<T, Err>>
    where
        T: PartialEq,
    {
        self.attach("distinct", Box::new(StatefulHooks), move |prior, ev: &Event<T, Err>| match ev {
            Event::Next(v) => match prior {
                Some(p) if p == v => Signal::Cancel,
                _ => Signal::push(v.clone()),
            },
            Event::Error(e) => Signal::Error(e.clone()),
            Event::Terminate(r) => Signal::terminate(r.clone()),
        })
    }
}
