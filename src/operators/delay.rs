//! `delay`: re-emit every event after a fixed wait (spec §4.3).

use crate::event::Event;
use crate::node::flavor::BaseHooks;
use crate::node::StreamNode;
use crate::signal::Signal;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;

impl<T, Err> StreamNode<T, Err>
where
    T: Clone + Send + Sync + 'static,
    Err: Clone + Send + Sync + 'static,
{
    /// Re-emit every value, error, and termination after waiting `delay`.
    /// A termination that arrives while an earlier value's delay is still
    /// pending is stashed and only released once that value has been
    /// delivered, preserving arrival order (spec §5).
    pub fn delay(self: &Arc<Self>, delay: Duration, handle: Handle) -> Arc<StreamNode<T, Err>> {
        let child = StreamNode::new_root("delay", Box::new(BaseHooks));
        let edge_child = child.clone();
        self.attach_existing(child.clone(), None, move |_prior, ev: &Event<T, Err>| {
            match ev {
                Event::Next(v) => {
                    let out = edge_child.clone();
                    let v = v.clone();
                    let handle2 = handle.clone();
                    handle.spawn(async move {
                        tokio::time::sleep(delay).await;
                        out.ingest(Event::Next(v));
                        if let Some(pending) = out.take_pending_termination() {
                            let out2 = out.clone();
                            handle2.spawn(async move {
                                tokio::time::sleep(delay).await;
                                out2.terminate(pending);
                            });
                        }
                    });
                }
                Event::Error(e) => {
                    let out = edge_child.clone();
                    let e = e.clone();
                    handle.spawn(async move {
                        tokio::time::sleep(delay).await;
                        out.ingest(Event::Error(e));
                    });
                }
                Event::Terminate(r) => {
                    edge_child.stash_pending_termination(r.clone());
                }
            }
            Signal::Merging
        });
        child
    }
}
