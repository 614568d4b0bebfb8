//! `merge`/`zip`/`combine` over two upstream streams (spec §4.6). The
//! replay-preserving design resolves spec §9's open question in favor of
//! [`Signal::Merging`] over a distinct `MergeError` variant: a side that has
//! terminated but whose counterpart hasn't yet just quietly waits.

use crate::either::{Either, EitherAnd};
use crate::event::{Event, TerminationReason};
use crate::node::flavor::BaseHooks;
use crate::node::StreamNode;
use crate::signal::Signal;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

struct TwoSided<L, R> {
    left_done: Option<bool>,
    right_done: Option<bool>,
    left_buffer: VecDeque<L>,
    right_buffer: VecDeque<R>,
}

impl<L, R> TwoSided<L, R> {
    fn new() -> Self {
        TwoSided {
            left_done: None,
            right_done: None,
            left_buffer: VecDeque::new(),
            right_buffer: VecDeque::new(),
        }
    }

    fn both_done(&self) -> bool {
        self.left_done.is_some() && self.right_done.is_some()
    }
}

/// Every value from either side, tagged by which one it came from. Only
/// terminates once both sides have terminated (spec §4.6, §8).
pub fn merge<L, R, Err>(
    left: &Arc<StreamNode<L, Err>>,
    right: &Arc<StreamNode<R, Err>>,
) -> Arc<StreamNode<Either<L, R>, Err>>
where
    L: Clone + Send + Sync + 'static,
    R: Clone + Send + Sync + 'static,
    Err: Clone + Send + Sync + 'static,
{
    let merged = StreamNode::new_root("merge", Box::new(BaseHooks));
    let state: Arc<Mutex<TwoSided<(), ()>>> = Arc::new(Mutex::new(TwoSided::new()));

    {
        let state = state.clone();
        left.attach_existing(merged.clone(), None, move |_prior, ev: &Event<L, Err>| {
            translate_side(&state, true, ev, Either::Left)
        });
    }
    {
        let state = state.clone();
        right.attach_existing(merged.clone(), None, move |_prior, ev: &Event<R, Err>| {
            translate_side(&state, false, ev, Either::Right)
        });
    }

    merged
}

fn translate_side<T, Err, U>(
    state: &Arc<Mutex<TwoSided<(), ()>>>,
    is_left: bool,
    ev: &Event<T, Err>,
    wrap: impl FnOnce(T) -> U,
) -> Signal<U, Err>
where
    T: Clone,
    Err: Clone,
{
    match ev {
        Event::Next(v) => Signal::push(wrap(v.clone())),
        Event::Error(e) => Signal::Error(e.clone()),
        Event::Terminate(reason) => {
            let mut state = state.lock();
            if is_left {
                state.left_done = Some(true);
            } else {
                state.right_done = Some(true);
            }
            if state.both_done() {
                Signal::terminate(reason.clone())
            } else {
                Signal::Merging
            }
        }
    }
}

/// Pairs up values from both sides in arrival order, buffering whichever
/// side runs ahead without limit. Terminates once either side terminates
/// and its buffer is exhausted (spec §4.6).
pub fn zip<L, R, Err>(
    left: &Arc<StreamNode<L, Err>>,
    right: &Arc<StreamNode<R, Err>>,
) -> Arc<StreamNode<(L, R), Err>>
where
    L: Clone + Send + Sync + 'static,
    R: Clone + Send + Sync + 'static,
    Err: Clone + Send + Sync + 'static,
{
    zip_buffered(left, right, None)
}

/// Like [`zip`], but once the leading side's buffer holds `buffer` unpaired
/// values, further arrivals on that side are dropped (return `Merging`)
/// instead of growing the buffer (spec §4.6, §8 "Zip with buffer=b").
pub fn zip_buffered<L, R, Err>(
    left: &Arc<StreamNode<L, Err>>,
    right: &Arc<StreamNode<R, Err>>,
    buffer: Option<usize>,
) -> Arc<StreamNode<(L, R), Err>>
where
    L: Clone + Send + Sync + 'static,
    R: Clone + Send + Sync + 'static,
    Err: Clone + Send + Sync + 'static,
{
    let zipped = StreamNode::new_root("zip", Box::new(BaseHooks));
    let state: Arc<Mutex<TwoSided<L, R>>> = Arc::new(Mutex::new(TwoSided::new()));

    {
        let state = state.clone();
        left.attach_existing(zipped.clone(), None, move |_prior, ev: &Event<L, Err>| {
            let mut state = state.lock();
            match ev {
                Event::Next(v) => {
                    if buffer.is_some_and(|b| state.left_buffer.len() >= b) {
                        return Signal::Merging;
                    }
                    state.left_buffer.push_back(v.clone());
                    pop_pair(&mut state)
                }
                Event::Error(e) => Signal::Error(e.clone()),
                Event::Terminate(reason) => {
                    state.left_done = Some(true);
                    finish_if_drained(&mut state, reason)
                }
            }
        });
    }
    {
        let state = state.clone();
        right.attach_existing(zipped.clone(), None, move |_prior, ev: &Event<R, Err>| {
            let mut state = state.lock();
            match ev {
                Event::Next(v) => {
                    if buffer.is_some_and(|b| state.right_buffer.len() >= b) {
                        return Signal::Merging;
                    }
                    state.right_buffer.push_back(v.clone());
                    pop_pair(&mut state)
                }
                Event::Error(e) => Signal::Error(e.clone()),
                Event::Terminate(reason) => {
                    state.right_done = Some(true);
                    finish_if_drained(&mut state, reason)
                }
            }
        });
    }

    zipped
}

fn pop_pair<L: Clone, R: Clone, Err>(state: &mut TwoSided<L, R>) -> Signal<(L, R), Err> {
    if !state.left_buffer.is_empty() && !state.right_buffer.is_empty() {
        let l = state.left_buffer.pop_front().unwrap();
        let r = state.right_buffer.pop_front().unwrap();
        Signal::push((l, r))
    } else {
        Signal::Merging
    }
}

fn finish_if_drained<L, R, Err: Clone>(
    state: &mut TwoSided<L, R>,
    reason: &TerminationReason<Err>,
) -> Signal<(L, R), Err> {
    let drained = state.left_buffer.is_empty() || state.right_buffer.is_empty();
    if drained {
        Signal::terminate(reason.clone())
    } else {
        Signal::Merging
    }
}

/// The latest value from each side, re-emitted as a pair whenever either
/// side updates, starting once both sides have produced at least one value.
/// Terminates once both sides have terminated (spec §4.6).
pub fn combine_latest<L, R, Err>(
    left: &Arc<StreamNode<L, Err>>,
    right: &Arc<StreamNode<R, Err>>,
) -> Arc<StreamNode<(L, R), Err>>
where
    L: Clone + Send + Sync + 'static,
    R: Clone + Send + Sync + 'static,
    Err: Clone + Send + Sync + 'static,
{
    let combined = StreamNode::new_root("combine", Box::new(BaseHooks));
    let state: Arc<Mutex<(Option<L>, Option<R>, bool, bool)>> =
        Arc::new(Mutex::new((None, None, false, false)));

    {
        let state = state.clone();
        left.attach_existing(combined.clone(), None, move |_prior, ev: &Event<L, Err>| {
            let mut s = state.lock();
            match ev {
                Event::Next(v) => {
                    s.0 = Some(v.clone());
                    match (&s.0, &s.1) {
                        (Some(l), Some(r)) => Signal::push((l.clone(), r.clone())),
                        _ => Signal::Merging,
                    }
                }
                Event::Error(e) => Signal::Error(e.clone()),
                Event::Terminate(reason) => {
                    s.2 = true;
                    if s.2 && s.3 {
                        Signal::terminate(reason.clone())
                    } else {
                        Signal::Merging
                    }
                }
            }
        });
    }
    {
        let state = state.clone();
        right.attach_existing(combined.clone(), None, move |_prior, ev: &Event<R, Err>| {
            let mut s = state.lock();
            match ev {
                Event::Next(v) => {
                    s.1 = Some(v.clone());
                    match (&s.0, &s.1) {
                        (Some(l), Some(r)) => Signal::push((l.clone(), r.clone())),
                        _ => Signal::Merging,
                    }
                }
                Event::Error(e) => Signal::Error(e.clone()),
                Event::Terminate(reason) => {
                    s.3 = true;
                    if s.2 && s.3 {
                        Signal::terminate(reason.clone())
                    } else {
                        Signal::Merging
                    }
                }
            }
        });
    }

    combined
}

/// Like [`combine_latest`], but emits the partial state immediately — only
/// the left side yet, only the right, or both — instead of waiting for
/// both sides before emitting anything (spec §4.6 `combineProgress`).
pub fn combine_progress<L, R, Err>(
    left: &Arc<StreamNode<L, Err>>,
    right: &Arc<StreamNode<R, Err>>,
) -> Arc<StreamNode<EitherAnd<L, R>, Err>>
where
    L: Clone + Send + Sync + 'static,
    R: Clone + Send + Sync + 'static,
    Err: Clone + Send + Sync + 'static,
{
    let combined = StreamNode::new_root("combine-progress", Box::new(BaseHooks));
    let state: Arc<Mutex<(Option<L>, Option<R>, bool, bool)>> =
        Arc::new(Mutex::new((None, None, false, false)));

    {
        let state = state.clone();
        left.attach_existing(combined.clone(), None, move |_prior, ev: &Event<L, Err>| {
            let mut s = state.lock();
            match ev {
                Event::Next(v) => {
                    s.0 = Some(v.clone());
                    Signal::push(progress_of(&s.0, &s.1))
                }
                Event::Error(e) => Signal::Error(e.clone()),
                Event::Terminate(reason) => {
                    s.2 = true;
                    if s.2 && s.3 {
                        Signal::terminate(reason.clone())
                    } else {
                        Signal::Merging
                    }
                }
            }
        });
    }
    {
        let state = state.clone();
        right.attach_existing(combined.clone(), None, move |_prior, ev: &Event<R, Err>| {
            let mut s = state.lock();
            match ev {
                Event::Next(v) => {
                    s.1 = Some(v.clone());
                    Signal::push(progress_of(&s.0, &s.1))
                }
                Event::Error(e) => Signal::Error(e.clone()),
                Event::Terminate(reason) => {
                    s.3 = true;
                    if s.2 && s.3 {
                        Signal::terminate(reason.clone())
                    } else {
                        Signal::Merging
                    }
                }
            }
        });
    }

    combined
}

fn progress_of<L: Clone, R: Clone>(l: &Option<L>, r: &Option<R>) -> EitherAnd<L, R> {
    match (l, r) {
        (Some(l), Some(r)) => EitherAnd::Both(l.clone(), r.clone()),
        (Some(l), None) => EitherAnd::Left(l.clone()),
        (None, Some(r)) => EitherAnd::Right(r.clone()),
        (None, None) => unreachable!("progress_of called before either side produced a value"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::flavor::BaseHooks as RootHooks;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn root<T: Clone + Send + Sync + 'static>() -> Arc<StreamNode<T, String>> {
        StreamNode::new_root("root", Box::new(RootHooks))
    }

    #[test]
    fn merge_forwards_both_sides_tagged() {
        let left = root::<i32>();
        let right = root::<&str>();
        let merged = merge(&left, &right);
        let seen = Arc::new(AtomicUsize::new(0));
        let seen2 = seen.clone();
        merged.attach("observe", Box::new(RootHooks), move |_prior, ev: &Event<Either<i32, &str>, String>| {
            if let Event::Next(_) = ev {
                seen2.fetch_add(1, Ordering::SeqCst);
            }
            Signal::push(match ev {
                Event::Next(v) => v.clone(),
                _ => Either::Left(0),
            })
        });
        left.ingest(Event::Next(1));
        right.ingest(Event::Next("a"));
        assert_eq!(seen.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn combine_latest_waits_for_both_sides() {
        let left = root::<i32>();
        let right = root::<i32>();
        let combined = combine_latest(&left, &right);
        let last = Arc::new(Mutex::new(None));
        let last2 = last.clone();
        combined.attach("observe", Box::new(RootHooks), move |_prior, ev: &Event<(i32, i32), String>| {
            if let Event::Next(v) = ev {
                *last2.lock() = Some(*v);
            }
            Signal::push((0, 0))
        });
        left.ingest(Event::Next(1));
        assert!(last.lock().is_none());
        right.ingest(Event::Next(2));
        assert_eq!(*last.lock(), Some((1, 2)));
    }

    #[test]
    fn zip_buffered_drops_arrivals_past_the_bound() {
        let left = root::<i32>();
        let right = root::<i32>();
        let zipped = zip_buffered(&left, &right, Some(1));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen2 = seen.clone();
        zipped.attach("observe", Box::new(RootHooks), move |_prior, ev: &Event<(i32, i32), String>| {
            if let Event::Next(v) = ev {
                seen2.lock().push(*v);
            }
            Signal::push((0, 0))
        });

        left.ingest(Event::Next(1));
        left.ingest(Event::Next(2));
        right.ingest(Event::Next(10));

        assert_eq!(*seen.lock(), vec![(1, 10)]);
    }
}
