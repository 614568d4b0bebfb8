//! Value-shape operators: `map`, `resultMap`, `asyncMap`, `flatMap`,
//! `flatten` (spec §4.3).

use crate::event::Event;
use crate::node::flavor::BaseHooks;
use crate::node::StreamNode;
use crate::signal::Signal;
use futures::future::BoxFuture;
use std::sync::Arc;
use tokio::runtime::Handle;

impl<T, Err> StreamNode<T, Err>
where
    T: Clone + Send + Sync + 'static,
    Err: Clone + Send + Sync + 'static,
{
    /// Transform every value with `f`.
    pub fn map<U>(self: &Arc<Self>, f: impl Fn(T) -> U + Send + Sync + 'static) -> Arc<StreamNode<U, Err>>
    where
        U: Clone + Send + Sync + 'static,
    {
        self.attach("map", Box::new(BaseHooks), move |_prior, ev: &Event<T, Err>| match ev {
            Event::Next(v) => Signal::push(f(v.clone())),
            Event::Error(e) => Signal::Error(e.clone()),
            Event::Terminate(r) => Signal::terminate(r.clone()),
        })
    }

    /// Transform every value with a fallible `f`; `Err(e)` becomes a
    /// non-terminating `Error(e)` rather than stopping the stream.
    pub fn result_map<U>(
        self: &Arc<Self>,
        f: impl Fn(T) -> Result<U, Err> + Send + Sync + 'static,
    ) -> Arc<StreamNode<U, Err>>
    where
        U: Clone + Send + Sync + 'static,
    {
        self.attach("result_map", Box::new(BaseHooks), move |_prior, ev: &Event<T, Err>| match ev {
            Event::Next(v) => match f(v.clone()) {
                Ok(u) => Signal::push(u),
                Err(e) => Signal::Error(e),
            },
            Event::Error(e) => Signal::Error(e.clone()),
            Event::Terminate(r) => Signal::terminate(r.clone()),
        })
    }

    /// Transform every value by running an async task, emitting its result
    /// once the task completes. At most one task is in flight per node; a
    /// termination that arrives mid-flight is stashed and applied once the
    /// in-flight task's completion has been delivered (spec §5 ordering).
    pub fn async_map<U>(
        self: &Arc<Self>,
        handle: Handle,
        f: impl Fn(T) -> BoxFuture<'static, U> + Send + Sync + 'static,
    ) -> Arc<StreamNode<U, Err>>
    where
        U: Clone + Send + Sync + 'static,
    {
        let child = StreamNode::new_root("async_map", Box::new(BaseHooks));
        let f = Arc::new(f);
        let edge_child = child.clone();
        self.attach_existing(child.clone(), None, move |_prior, ev: &Event<T, Err>| {
            match ev {
                Event::Next(v) => {
                    let out = edge_child.clone();
                    let fut = f(v.clone());
                    handle.spawn(async move {
                        let u = fut.await;
                        if let Some(pending) = out.take_pending_termination() {
                            out.ingest(Event::Next(u));
                            out.terminate(pending);
                        } else {
                            out.ingest(Event::Next(u));
                        }
                    });
                    Signal::Merging
                }
                Event::Error(e) => Signal::Error(e.clone()),
                Event::Terminate(r) => {
                    edge_child.stash_pending_termination(r.clone());
                    Signal::Merging
                }
            }
        });
        child
    }

    /// Transform every value into zero or more values, each emitted as if
    /// it had arrived on its own (spec §4.3 `flatMap`).
    pub fn flat_map<U>(
        self: &Arc<Self>,
        f: impl Fn(T) -> Vec<U> + Send + Sync + 'static,
    ) -> Arc<StreamNode<U, Err>>
    where
        U: Clone + Send + Sync + 'static,
    {
        self.attach("flat_map", Box::new(BaseHooks), move |_prior, ev: &Event<T, Err>| match ev {
            Event::Next(v) => Signal::flatten(f(v.clone())),
            Event::Error(e) => Signal::Error(e.clone()),
            Event::Terminate(r) => Signal::terminate(r.clone()),
        })
    }
}

impl<T, Err> StreamNode<Vec<T>, Err>
where
    T: Clone + Send + Sync + 'static,
    Err: Clone + Send + Sync + 'static,
{
    /// Flatten a stream of `Vec<T>` into a stream of `T`, emitting each
    /// element of an incoming batch in order (spec §4.3 `flatten`).
    pub fn flatten(self: &Arc<Self>) -> Arc<StreamNode<T, Err>> {
        self.attach("flatten", Box::new(BaseHooks), |_prior, ev: &Event<Vec<T>, Err>| match ev {
            Event::Next(vs) => Signal::flatten(vs.clone()),
            Event::Error(e) => Signal::Error(e.clone()),
            Event::Terminate(r) => Signal::terminate(r.clone()),
        })
    }
}
