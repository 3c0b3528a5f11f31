//! Request-scoped cancellation, deadlines and values
//!
//! Every async trait method takes a `Context` first. Long running work such
//! as state waiters watches [`Context::done`] and stops once it flips.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{watch, RwLock};

type Values = HashMap<String, Arc<dyn Any + Send + Sync>>;

#[derive(Clone)]
pub struct Context {
    inner: Arc<ContextInner>,
}

struct ContextInner {
    deadline: Option<Instant>,
    values: RwLock<Values>,
    done: watch::Receiver<bool>,
    done_tx: watch::Sender<bool>,
}

impl Context {
    pub fn new() -> Self {
        Self::build(None, Values::new())
    }

    fn build(deadline: Option<Instant>, values: Values) -> Self {
        let (done_tx, done) = watch::channel(false);
        Self {
            inner: Arc::new(ContextInner {
                deadline,
                values: RwLock::new(values),
                done,
                done_tx,
            }),
        }
    }

    /// Derives a context that is cancelled after `timeout` or when `self`
    /// is cancelled, whichever comes first. Values are inherited.
    pub async fn with_timeout(&self, timeout: Duration) -> Self {
        let mut deadline = Instant::now() + timeout;
        if let Some(parent) = self.inner.deadline {
            deadline = deadline.min(parent);
        }

        let values = self.inner.values.read().await.clone();
        let child = Self::build(Some(deadline), values);

        let tx = child.inner.done_tx.clone();
        let mut parent_done = self.done();
        tokio::spawn(async move {
            let parent_cancelled = async move {
                // A dropped parent can no longer be cancelled.
                if parent_done.wait_for(|cancelled| *cancelled).await.is_err() {
                    std::future::pending::<()>().await;
                }
            };
            tokio::select! {
                _ = tokio::time::sleep_until(deadline.into()) => {}
                _ = parent_cancelled => {}
                _ = tx.closed() => return,
            }
            let _ = tx.send(true);
        });

        child
    }

    pub async fn with_value<T: Send + Sync + 'static>(self, key: &str, value: T) -> Self {
        self.inner
            .values
            .write()
            .await
            .insert(key.to_string(), Arc::new(value));
        self
    }

    pub async fn get_value<T>(&self, key: &str) -> Option<T>
    where
        T: Send + Sync + Clone + 'static,
    {
        let values = self.inner.values.read().await;
        values.get(key).and_then(|v| v.downcast_ref::<T>()).cloned()
    }

    pub fn is_cancelled(&self) -> bool {
        *self.inner.done.borrow()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.inner.deadline
    }

    /// Time left before the deadline, if one is set.
    pub fn remaining(&self) -> Option<Duration> {
        self.inner
            .deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    /// Receiver that flips to `true` once the context is cancelled
    pub fn done(&self) -> watch::Receiver<bool> {
        self.inner.done.clone()
    }

    /// Resolves once the context is cancelled.
    pub async fn cancelled(&self) {
        let mut done = self.done();
        let _ = done.wait_for(|cancelled| *cancelled).await;
    }

    pub fn cancel(&self) {
        let _ = self.inner.done_tx.send(true);
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn context_stores_and_retrieves_values() {
        let ctx = Context::new()
            .with_value("api_key", "secret123".to_string())
            .await;

        let value: Option<String> = ctx.get_value("api_key").await;
        assert_eq!(value, Some("secret123".to_string()));

        let wrong: Option<u32> = ctx.get_value("api_key").await;
        assert!(wrong.is_none());
    }

    #[tokio::test]
    async fn timeout_context_inherits_values() {
        let ctx = Context::new().with_value("region", "am".to_string()).await;
        let child = ctx.with_timeout(Duration::from_secs(5)).await;

        let value: Option<String> = child.get_value("region").await;
        assert_eq!(value.as_deref(), Some("am"));
        assert!(child.remaining().is_some());
    }

    #[tokio::test]
    async fn context_timeout_cancels() {
        let ctx = Context::new()
            .with_timeout(Duration::from_millis(50))
            .await;
        assert!(!ctx.is_cancelled());

        tokio::time::timeout(Duration::from_secs(2), ctx.cancelled())
            .await
            .unwrap();
        assert!(ctx.is_cancelled());
    }

    #[tokio::test]
    async fn cancelling_parent_cancels_child() {
        let parent = Context::new();
        let child = parent.with_timeout(Duration::from_secs(60)).await;

        parent.cancel();

        tokio::time::timeout(Duration::from_secs(2), child.cancelled())
            .await
            .unwrap();
        assert!(child.is_cancelled());
    }

    #[tokio::test]
    async fn context_manual_cancel() {
        let ctx = Context::new();
        assert!(!ctx.is_cancelled());

        ctx.cancel();
        assert!(ctx.is_cancelled());
    }

    #[tokio::test]
    async fn child_deadline_never_exceeds_parent() {
        let parent = Context::new().with_timeout(Duration::from_secs(1)).await;
        let child = parent.with_timeout(Duration::from_secs(60)).await;

        assert_eq!(child.deadline(), parent.deadline());
        assert!(Context::new().deadline().is_none());
    }
}
