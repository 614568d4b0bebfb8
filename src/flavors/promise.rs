//! Promise streams: a retryable Future wrapping an async task (spec §4.5).

use crate::event::Event;
use crate::node::flavor::{single_emission, FlavorHooks, FlavorKind, ReplayPolicy};
use crate::node::StreamNode;
use crate::retry::{RetryPolicy, RetryState};
use crate::signal::Signal;
use futures::future::BoxFuture;
use std::future::Future as StdFuture;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::debug;

struct PromiseHooks;

impl<T, Err> FlavorHooks<T, Err> for PromiseHooks {
    fn kind(&self) -> FlavorKind {
        FlavorKind::Promise
    }

    fn preprocess(&self, signal: Signal<T, Err>) -> Signal<T, Err> {
        single_emission(signal)
    }

    fn default_replay(&self) -> ReplayPolicy {
        ReplayPolicy::REPLAY
    }
}

type TaskFn<T, Err> = Arc<dyn Fn() -> BoxFuture<'static, Result<T, Err>> + Send + Sync>;

/// A Future backed by a retryable async task.
pub struct Promise<T, Err> {
    node: Arc<StreamNode<T, Err>>,
    task: TaskFn<T, Err>,
    handle: Handle,
    reuse: Arc<AtomicBool>,
}

impl<T, Err> Promise<T, Err>
where
    T: Clone + Send + Sync + 'static,
    Err: Clone + Send + Sync + 'static,
{
    /// Spawn `task` once on `handle`, resolving the Promise with its result.
    pub fn spawn<F, Fut>(descriptor: impl Into<String>, handle: Handle, task: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: StdFuture<Output = Result<T, Err>> + Send + 'static,
    {
        let node = StreamNode::new_root(descriptor, Box::new(PromiseHooks));
        let task: TaskFn<T, Err> = Arc::new(move || Box::pin(task()));
        let promise = Promise {
            node,
            task,
            handle,
            reuse: Arc::new(AtomicBool::new(false)),
        };
        promise.spawn_attempt(promise.node.clone());
        promise
    }

    /// When enabled, a future `retry`/`retry_on` call short-circuits to the
    /// last successful value instead of re-running the task, once this
    /// Promise has already resolved successfully (spec §4.4 `reuse(true)`).
    pub fn reuse(&self, enabled: bool) {
        self.reuse.store(enabled, Ordering::SeqCst);
    }

    fn memoized(&self) -> Option<Promise<T, Err>> {
        if !self.reuse.load(Ordering::SeqCst) {
            return None;
        }
        let value = self.value()?;
        let node = StreamNode::new_root("promise-retry", Box::new(PromiseHooks));
        node.ingest(Event::Next(value));
        Some(Promise {
            node,
            task: self.task.clone(),
            handle: self.handle.clone(),
            reuse: self.reuse.clone(),
        })
    }

    fn spawn_attempt(&self, node: Arc<StreamNode<T, Err>>) {
        let task = self.task.clone();
        self.handle.spawn(async move {
            match task().await {
                Ok(v) => node.ingest(Event::Next(v)),
                Err(e) => node.ingest(Event::Error(e)),
            }
        });
    }

    /// The stream handle to attach operators on.
    pub fn stream(&self) -> Arc<StreamNode<T, Err>> {
        self.node.clone()
    }

    /// The resolved value, once settled successfully.
    pub fn value(&self) -> Option<T> {
        self.node.last_value()
    }

    /// Build a new Promise that re-runs the same task up to `limit`
    /// additional times on failure, waiting according to `policy` between
    /// attempts (spec §4.5). The original Promise is left untouched; its
    /// first attempt already ran independently.
    pub fn retry(&self, limit: u32, policy: RetryPolicy) -> Promise<T, Err> {
        if let Some(memoized) = self.memoized() {
            return memoized;
        }
        let node = StreamNode::new_root("promise-retry", Box::new(PromiseHooks));
        let task = self.task.clone();
        let handle = self.handle.clone();
        let out_node = node.clone();
        handle.spawn(run_with_retry(task, out_node, limit, policy));
        Promise {
            node,
            task: self.task.clone(),
            handle: self.handle.clone(),
            reuse: self.reuse.clone(),
        }
    }

    /// Like [`retry`](Self::retry), but `should_retry` decides whether a
    /// given error is worth another attempt at all (spec §4.5 `retryOn`).
    pub fn retry_on(
        &self,
        limit: u32,
        policy: RetryPolicy,
        should_retry: impl Fn(&Err) -> bool + Send + Sync + 'static,
    ) -> Promise<T, Err> {
        if let Some(memoized) = self.memoized() {
            return memoized;
        }
        let node = StreamNode::new_root("promise-retry-on", Box::new(PromiseHooks));
        let task = self.task.clone();
        let handle = self.handle.clone();
        let out_node = node.clone();
        handle.spawn(run_with_conditional_retry(task, out_node, limit, policy, should_retry));
        Promise {
            node,
            task: self.task.clone(),
            handle: self.handle.clone(),
            reuse: self.reuse.clone(),
        }
    }
}

async fn run_with_retry<T, Err>(
    task: TaskFn<T, Err>,
    node: Arc<StreamNode<T, Err>>,
    limit: u32,
    policy: RetryPolicy,
) where
    T: Clone + Send + Sync + 'static,
    Err: Clone + Send + Sync + 'static,
{
    run_with_conditional_retry(task, node, limit, policy, |_| true).await
}

async fn run_with_conditional_retry<T, Err>(
    task: TaskFn<T, Err>,
    node: Arc<StreamNode<T, Err>>,
    limit: u32,
    policy: RetryPolicy,
    should_retry: impl Fn(&Err) -> bool,
) where
    T: Clone + Send + Sync + 'static,
    Err: Clone + Send + Sync + 'static,
{
    let mut state = RetryState::new(policy);
    let mut attempts_left = limit;
    loop {
        match task().await {
            Ok(v) => {
                node.ingest(Event::Next(v));
                return;
            }
            Err(e) => {
                if attempts_left == 0 || !should_retry(&e) {
                    node.ingest(Event::Error(e));
                    return;
                }
                attempts_left -= 1;
                let delay = state.next_delay();
                debug!(?delay, attempts_left, "retrying promise task");
                tokio::time::sleep(delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[tokio::test]
    async fn reuse_short_circuits_retry_to_the_memoized_value() {
        let handle = Handle::current();
        let runs = Arc::new(AtomicUsize::new(0));
        let runs2 = runs.clone();
        let promise = Promise::<i32, String>::spawn("reused", handle, move || {
            let runs = runs2.clone();
            async move {
                runs.fetch_add(1, Ordering::SeqCst);
                Ok(7)
            }
        });
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        assert_eq!(promise.value(), Some(7));

        promise.reuse(true);
        let retried = promise.retry(3, RetryPolicy::fixed(std::time::Duration::from_millis(0)));

        assert_eq!(retried.value(), Some(7));
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }
}
