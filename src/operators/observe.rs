//! Side-effecting observers: `on`, `onError`, `onTerminate`, `onTransition`
//! (spec §4.3). Each attaches a transparent passthrough child so the
//! original values keep flowing unchanged.

use crate::event::Event;
use crate::node::flavor::BaseHooks;
use crate::node::StreamNode;
use crate::operators::filter::StatefulHooks;
use crate::signal::Signal;
use std::sync::Arc;

impl<T, Err> StreamNode<T, Err>
where
    T: Clone + Send + Sync + 'static,
    Err: Clone + Send + Sync + 'static,
{
    /// Run `f` on every value, passing it through unchanged.
    pub fn on(self: &Arc<Self>, f: impl Fn(&T) + Send + Sync + 'static) -> Arc<StreamNode<T, Err>> {
        self.attach("on", Box::new(BaseHooks), move |_prior, ev: &Event<T, Err>| match ev {
            Event::Next(v) => {
                f(v);
                Signal::push(v.clone())
            }
            Event::Error(e) => Signal::Error(e.clone()),
            Event::Terminate(r) => Signal::terminate(r.clone()),
        })
    }

    /// Run `f` on every non-terminating error, passing it through unchanged.
    pub fn on_error(self: &Arc<Self>, f: impl Fn(&Err) + Send + Sync + 'static) -> Arc<StreamNode<T, Err>> {
        self.attach("on_error", Box::new(BaseHooks), move |_prior, ev: &Event<T, Err>| match ev {
            Event::Next(v) => Signal::push(v.clone()),
            Event::Error(e) => {
                f(e);
                Signal::Error(e.clone())
            }
            Event::Terminate(r) => Signal::terminate(r.clone()),
        })
    }

    /// Run `f` when the stream terminates, passing the termination through
    /// unchanged.
    pub fn on_terminate(
        self: &Arc<Self>,
        f: impl Fn(&crate::event::TerminationReason<Err>) + Send + Sync + 'static,
    ) -> Arc<StreamNode<T, Err>> {
        self.attach("on_terminate", Box::new(BaseHooks), move |_prior, ev: &Event<T, Err>| match ev {
            Event::Next(v) => Signal::push(v.clone()),
            Event::Error(e) => Signal::Error(e.clone()),
            Event::Terminate(r) => {
                f(r);
                Signal::terminate(r.clone())
            }
        })
    }

    /// Run `f(previous, current)` whenever a new value arrives and a
    /// previous one already exists, passing values through unchanged.
    pub fn on_transition(
        self: &Arc<Self>,
        f: impl Fn(&T, &T) + Send + Sync + 'static,
    ) -> Arc<StreamNode<T, Err>>
    where
        T: PartialEq,
    {
        self.attach("on_transition", Box::new(StatefulHooks), move |prior, ev: &Event<T, Err>| match ev {
            Event::Next(v) => {
                if let Some(p) = prior {
                    if p != v {
                        f(p, v);
                    }
                }
                Signal::push(v.clone())
            }
            Event::Error(e) => Signal::Error(e.clone()),
            Event::Terminate(r) => Signal::terminate(r.clone()),
        })
    }
}
