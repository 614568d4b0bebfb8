//! Tagging operators: `stamp`, `timeStamp`, `countStamp` (spec §4.3).

use crate::event::Event;
use crate::node::flavor::BaseHooks;
use crate::node::StreamNode;
use crate::signal::Signal;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

impl<T, Err> StreamNode<T, Err>
where
    T: Clone + Send + Sync + 'static,
    Err: Clone + Send + Sync + 'static,
{
    /// Pair every value with whatever `f` computes from it.
    pub fn stamp<S>(self: &Arc<Self>, f: impl Fn(&T) -> S + Send + Sync + 'static) -> Arc<StreamNode<(T, S), Err>>
    where
        S: Clone + Send + Sync + 'static,
    {
        self.attach("stamp", Box::new(BaseHooks), move |_prior, ev: &Event<T, Err>| match ev {
            Event::Next(v) => {
                let s = f(v);
                Signal::push((v.clone(), s))
            }
            Event::Error(e) => Signal::Error(e.clone()),
            Event::Terminate(r) => Signal::terminate(r.clone()),
        })
    }

    /// Pair every value with the wall-clock time it was observed.
    pub fn time_stamp(self: &Arc<Self>) -> Arc<StreamNode<(T, DateTime<Utc>), Err>> {
        self.attach("time_stamp", Box::new(BaseHooks), |_prior, ev: &Event<T, Err>| match ev {
            Event::Next(v) => Signal::push((v.clone(), Utc::now())),
            Event::Error(e) => Signal::Error(e.clone()),
            Event::Terminate(r) => Signal::terminate(r.clone()),
        })
    }

    /// Pair every value with its 1-based position in the stream.
    pub fn count_stamp(self: &Arc<Self>) -> Arc<StreamNode<(T, usize), Err>> {
        let n = Arc::new(AtomicUsize::new(0));
        self.attach("count_stamp", Box::new(BaseHooks), move |_prior, ev: &Event<T, Err>| match ev {
            Event::Next(v) => Signal::push((v.clone(), n.fetch_add(1, Ordering::SeqCst) + 1)),
            Event::Error(e) => Signal::Error(e.clone()),
            Event::Terminate(r) => Signal::terminate(r.clone()),
        })
    }
}
