//! Running accumulators: `min`, `max`, `count`, `sum`, `average` (spec
//! §4.3). Each re-emits its running value on every input, and replays that
//! value to a late-attaching child (spec §4.1).

use crate::event::Event;
use crate::node::StreamNode;
use crate::operators::filter::StatefulHooks;
use crate::signal::Signal;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

impl<T, Err> StreamNode<T, Err>
where
    T: Clone + Send + Sync + 'static,
    Err: Clone + Send + Sync + 'static,
{
    /// The running minimum seen so far.
    pub fn min(self: &Arc<Self>) -> Arc<StreamNode<T, Err>>
    where
        T: PartialOrd,
    {
        self.attach("min", Box::new(StatefulHooks), |prior, ev: &Event<T, Err>| match ev {
            Event::Next(v) => match prior {
                Some(p) if p <= v => Signal::push(p.clone()),
                _ => Signal::push(v.clone()),
            },
            Event::Error(e) => Signal::Error(e.clone()),
            Event::Terminate(r) => Signal::terminate(r.clone()),
        })
    }

    /// The running maximum seen so far.
    pub fn max(self: &Arc<Self>) -> Arc<StreamNode<T, Err>>
    where
        T: PartialOrd,
    {
        self.attach("max", Box::new(StatefulHooks), |prior, ev: &Event<T, Err>| match ev {
            Event::Next(v) => match prior {
                Some(p) if p >= v => Signal::push(p.clone()),
                _ => Signal::push(v.clone()),
            },
            Event::Error(e) => Signal::Error(e.clone()),
            Event::Terminate(r) => Signal::terminate(r.clone()),
        })
    }

    /// The running count of values seen so far.
    pub fn count(self: &Arc<Self>) -> Arc<StreamNode<usize, Err>> {
        let n = Arc::new(AtomicUsize::new(0));
        self.attach("count", Box::new(StatefulHooks), move |_prior, ev: &Event<T, Err>| match ev {
            Event::Next(_) => Signal::push(n.fetch_add(1, Ordering::SeqCst) + 1),
            Event::Error(e) => Signal::Error(e.clone()),
            Event::Terminate(r) => Signal::terminate(r.clone()),
        })
    }

    /// The running sum of values seen so far.
    pub fn sum(self: &Arc<Self>) -> Arc<StreamNode<T, Err>>
    where
        T: std::ops::Add<Output = T> + Default,
    {
        self.attach("sum", Box::new(StatefulHooks), |prior, ev: &Event<T, Err>| match ev {
            Event::Next(v) => {
                let total = match prior {
                    Some(p) => p.clone() + v.clone(),
                    None => T::default() + v.clone(),
                };
                Signal::push(total)
            }
            Event::Error(e) => Signal::Error(e.clone()),
            Event::Terminate(r) => Signal::terminate(r.clone()),
        })
    }

    /// Carry an accumulator through `f(acc, value)`, emitting the updated
    /// accumulator after every input. `scan(a, f).last() == reduce(a, f)`
    /// once the stream terminates.
    pub fn scan<A>(self: &Arc<Self>, seed: A, f: impl Fn(&A, &T) -> A + Send + Sync + 'static) -> Arc<StreamNode<A, Err>>
    where
        A: Clone + Send + Sync + 'static,
    {
        let acc = parking_lot::Mutex::new(seed);
        self.attach("scan", Box::new(StatefulHooks), move |_prior, ev: &Event<T, Err>| match ev {
            Event::Next(v) => {
                let mut acc = acc.lock();
                *acc = f(&acc, v);
                Signal::push(acc.clone())
            }
            Event::Error(e) => Signal::Error(e.clone()),
            Event::Terminate(r) => Signal::terminate(r.clone()),
        })
    }

    /// The running arithmetic mean of values seen so far.
    pub fn average(self: &Arc<Self>) -> Arc<StreamNode<f64, Err>>
    where
        T: Into<f64>,
    {
        let sum = Arc::new(parking_lot::Mutex::new(0.0_f64));
        let n = Arc::new(AtomicUsize::new(0));
        self.attach("average", Box::new(StatefulHooks), move |_prior, ev: &Event<T, Err>| match ev {
            Event::Next(v) => {
                let mut sum = sum.lock();
                *sum += v.clone().into();
                let count = n.fetch_add(1, Ordering::SeqCst) + 1;
                Signal::push(*sum / count as f64)
            }
            Event::Error(e) => Signal::Error(e.clone()),
            Event::Terminate(r) => Signal::terminate(r.clone()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::flavor::BaseHooks;

    fn root() -> Arc<StreamNode<i32, String>> {
        StreamNode::new_root("root", Box::new(BaseHooks))
    }

    #[test]
    fn scan_carries_the_accumulator_across_updates() {
        let input = root();
        let running = input.scan(0, |acc, v| acc + v);
        input.ingest(Event::Next(1));
        input.ingest(Event::Next(2));
        input.ingest(Event::Next(3));
        assert_eq!(running.last_value(), Some(6));
    }

    #[test]
    fn min_and_max_track_running_extremes() {
        let input = root();
        let min = input.min();
        let max = input.max();
        for v in [5, 1, 9, 3] {
            input.ingest(Event::Next(v));
        }
        assert_eq!(min.last_value(), Some(1));
        assert_eq!(max.last_value(), Some(9));
    }
}
