// SPDX-License-Identifier: GPL-3.0-only
use futures_util::future::BoxFuture;
use parking_lot::Mutex;
use std::fmt;
use std::future::Future;
use tracing::info;

use crate::error::SyncError;

type RetryFn = Box<dyn FnOnce() -> BoxFuture<'static, Result<(), SyncError>> + Send>;

/// A single user-initiated re-invocation of a failed operation.
///
/// Running consumes the action, so each offer can be retried once.
pub struct RetryAction {
    label: String,
    idempotent: bool,
    run: RetryFn,
}

impl RetryAction {
    pub fn new<F, Fut>(label: impl Into<String>, f: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), SyncError>> + Send + 'static,
    {
        Self {
            label: label.into(),
            idempotent: false,
            run: Box::new(move || Box::pin(f())),
        }
    }

    /// Mark the operation as safe to run more than once with the same effect
    pub fn idempotent(mut self) -> Self {
        self.idempotent = true;
        self
    }

    pub fn is_idempotent(&self) -> bool {
        self.idempotent
    }

    /// What this action re-runs, e.g. `toggle likes/42`
    pub fn label(&self) -> &str {
        &self.label
    }

    pub async fn run(self) -> Result<(), SyncError> {
        info!(operation = %self.label, "Retrying operation");
        (self.run)().await
    }
}

impl fmt::Debug for RetryAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryAction")
            .field("label", &self.label)
            .field("idempotent", &self.idempotent)
            .finish()
    }
}

/// Receives the retry offered for every failed coordinator operation
pub trait RetryHook: Send + Sync {
    fn offer(&self, retry: RetryAction, error: &SyncError);
}

#[derive(Debug)]
pub struct PendingRetry {
    pub error: SyncError,
    pub action: RetryAction,
}

/// Retry hook that parks offered retries until someone asks to run them.
///
/// A newer offer for the same idempotent operation replaces the older one.
/// Offers of other operations are all kept, since each run has an effect.
#[derive(Debug, Default)]
pub struct RetryQueue {
    pending: Mutex<Vec<PendingRetry>>,
}

impl RetryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Labels and errors of the parked retries, oldest first
    pub fn pending(&self) -> Vec<(String, SyncError)> {
        self.pending
            .lock()
            .iter()
            .map(|p| (p.action.label().to_string(), p.error.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.pending.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.lock().is_empty()
    }

    pub fn take_all(&self) -> Vec<PendingRetry> {
        std::mem::take(&mut *self.pending.lock())
    }

    /// Run every parked retry once; failures re-offered by the operation land back in the queue
    pub async fn run_all(&self) -> Vec<(String, Result<(), SyncError>)> {
        let mut results = Vec::new();
        for pending in self.take_all() {
            let label = pending.action.label().to_string();
            let result = pending.action.run().await;
            results.push((label, result));
        }
        results
    }
}

impl RetryHook for RetryQueue {
    fn offer(&self, retry: RetryAction, error: &SyncError) {
        let mut pending = self.pending.lock();
        if retry.is_idempotent() {
            pending.retain(|p| !(p.action.is_idempotent() && p.action.label() == retry.label()));
        }
        pending.push(PendingRetry {
            error: error.clone(),
            action: retry,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counting_action(label: &str, runs: &Arc<AtomicUsize>) -> RetryAction {
        let runs = Arc::clone(runs);
        RetryAction::new(label, move || async move {
            runs.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    }

    #[tokio::test]
    async fn test_run_invokes_once() {
        let runs = Arc::new(AtomicUsize::new(0));
        let action = counting_action("toggle likes/a", &runs);
        assert_eq!(action.label(), "toggle likes/a");

        action.run().await.unwrap();
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_queue_replaces_same_idempotent_operation() {
        let queue = RetryQueue::new();
        let runs = Arc::new(AtomicUsize::new(0));
        let error = SyncError::Network("timeout".to_string());

        queue.offer(counting_action("check likes/a", &runs).idempotent(), &error);
        queue.offer(counting_action("add cart/b", &runs).idempotent(), &error);
        queue.offer(counting_action("check likes/a", &runs).idempotent(), &error);

        let labels: Vec<String> = queue.pending().into_iter().map(|(label, _)| label).collect();
        assert_eq!(labels, ["add cart/b", "check likes/a"]);

        let results = queue.run_all().await;
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|(_, r)| r.is_ok()));
        assert_eq!(runs.load(Ordering::SeqCst), 2);
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn test_queue_keeps_every_toggle_offer() {
        let queue = RetryQueue::new();
        let runs = Arc::new(AtomicUsize::new(0));
        let error = SyncError::Network("timeout".to_string());

        queue.offer(counting_action("toggle likes/a", &runs), &error);
        queue.offer(counting_action("toggle likes/a", &runs), &error);

        assert_eq!(queue.len(), 2);
        queue.run_all().await;
        assert_eq!(runs.load(Ordering::SeqCst), 2);
    }
}
