// SPDX-License-Identifier: GPL-3.0-only
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

use crate::cache::{CacheEntry, MembershipCache};
use crate::coordinator::retry::{RetryAction, RetryHook};
use crate::error::SyncError;
use crate::events::{MembershipChange, SyncEvent, SyncEventBus};
use crate::store::{MembershipDocument, MembershipKey, RemoteSetStore, SetName};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mutation {
    Toggle,
    Set(bool),
}

impl std::fmt::Display for Mutation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mutation::Toggle => f.write_str("toggle"),
            Mutation::Set(true) => f.write_str("add"),
            Mutation::Set(false) => f.write_str("remove"),
        }
    }
}

struct MutationOutcome {
    is_member: bool,
    document: MembershipDocument,
    written: bool,
}

/// Result of a de-duplicated membership check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckOutcome {
    /// This call fetched the document
    Fetched(bool),
    /// Answered from an earlier check
    Cached(bool),
    /// Another check for the key is running; nothing was fetched
    InFlight,
}

impl CheckOutcome {
    pub fn is_member(self) -> Option<bool> {
        match self {
            CheckOutcome::Fetched(is_member) | CheckOutcome::Cached(is_member) => Some(is_member),
            CheckOutcome::InFlight => None,
        }
    }
}

/// One write lock per remote document
#[derive(Debug, Default)]
struct DocumentLocks {
    likes: Mutex<()>,
    cart: Mutex<()>,
}

impl DocumentLocks {
    fn get(&self, set: SetName) -> &Mutex<()> {
        match set {
            SetName::Likes => &self.likes,
            SetName::Cart => &self.cart,
        }
    }
}

/// Read-modify-write toggling of set membership against the remote store.
///
/// Every write replaces a whole document, so mutations of one set are
/// serialized: a second mutation waits for the first and then reads the
/// document the first one wrote. Mutations of different sets proceed
/// concurrently. Failures are returned untouched and a retry is offered to
/// the configured hook; nothing is retried automatically.
#[derive(Clone)]
pub struct ToggleCoordinator {
    store: Arc<dyn RemoteSetStore>,
    cache: Arc<MembershipCache>,
    bus: Arc<SyncEventBus>,
    retry_hook: Option<Arc<dyn RetryHook>>,
    key_locks: Arc<Mutex<HashMap<MembershipKey, Arc<Mutex<()>>>>>,
    document_locks: Arc<DocumentLocks>,
}

impl ToggleCoordinator {
    pub fn new(
        store: Arc<dyn RemoteSetStore>,
        cache: Arc<MembershipCache>,
        bus: Arc<SyncEventBus>,
    ) -> Self {
        Self {
            store,
            cache,
            bus,
            retry_hook: None,
            key_locks: Arc::new(Mutex::new(HashMap::new())),
            document_locks: Arc::new(DocumentLocks::default()),
        }
    }

    pub fn with_retry_hook(mut self, hook: Arc<dyn RetryHook>) -> Self {
        self.retry_hook = Some(hook);
        self
    }

    pub fn cache(&self) -> &Arc<MembershipCache> {
        &self.cache
    }

    pub fn bus(&self) -> &Arc<SyncEventBus> {
        &self.bus
    }

    pub fn store(&self) -> &Arc<dyn RemoteSetStore> {
        &self.store
    }

    /// Flip membership of `key` on the server; returns whether it is a member now
    pub async fn toggle(&self, key: &MembershipKey) -> Result<bool, SyncError> {
        self.mutate(key, Mutation::Toggle)
            .await
            .map(|(is_member, _)| is_member)
    }

    /// Make `key` a member (or not) on the server; returns the document as written.
    ///
    /// Nothing is written or published when the server already agrees.
    pub async fn set_membership(
        &self,
        key: &MembershipKey,
        is_member: bool,
    ) -> Result<MembershipDocument, SyncError> {
        self.mutate(key, Mutation::Set(is_member))
            .await
            .map(|(_, document)| document)
    }

    async fn mutate(
        &self,
        key: &MembershipKey,
        mutation: Mutation,
    ) -> Result<(bool, MembershipDocument), SyncError> {
        let lock = self.key_lock(key).await;

        let result = {
            let _key_guard = lock.lock().await;
            // Lock order: key, then document
            let _document_guard = self.document_locks.get(key.set).lock().await;
            let result = self.read_modify_write(key, mutation).await;
            if let Ok(ref outcome) = result {
                if outcome.written {
                    // Still under the document lock so events stay in write order
                    self.cache.invalidate(key);
                    self.bus.publish(SyncEvent::MembershipChanged(MembershipChange::new(
                        key,
                        outcome.is_member,
                    )));
                    debug!(key = %key, is_member = outcome.is_member, "Membership changed");
                }
            }
            result.map(|outcome| (outcome.is_member, outcome.document))
        };

        self.release_key_lock(key, lock).await;

        if let Err(ref error) = result {
            self.offer_retry(self.mutation_retry(key, mutation), error);
        }
        result
    }

    /// One fetch and at most one full-document write
    async fn read_modify_write(
        &self,
        key: &MembershipKey,
        mutation: Mutation,
    ) -> Result<MutationOutcome, SyncError> {
        let mut document = self.store.fetch_document(key.set).await?;
        let was_member = document.members().contains(&key.item_id);
        let is_member = match mutation {
            Mutation::Toggle => !was_member,
            Mutation::Set(wanted) => wanted,
        };

        if is_member == was_member {
            return Ok(MutationOutcome {
                is_member,
                document,
                written: false,
            });
        }

        document.members_mut().toggle(&key.item_id);
        self.store.replace_document(key.set, &document).await?;

        Ok(MutationOutcome {
            is_member,
            document,
            written: true,
        })
    }

    /// Check membership of `key`, fetching at most once per key at a time
    pub async fn check(&self, key: &MembershipKey) -> Result<CheckOutcome, SyncError> {
        if !self.cache.begin_check(key) {
            return Ok(match self.cache.state(key) {
                CacheEntry::Checked(is_member) => CheckOutcome::Cached(is_member),
                CacheEntry::Fetching | CacheEntry::Unchecked => CheckOutcome::InFlight,
            });
        }

        match self.store.fetch_document(key.set).await {
            Ok(document) => {
                let is_member = document.members().contains(&key.item_id);
                self.cache.complete_check(key, is_member);
                Ok(CheckOutcome::Fetched(is_member))
            }
            Err(error) => {
                // Back to Unchecked so the offered retry can run
                self.cache.invalidate(key);
                self.offer_retry(self.check_retry(key), &error);
                Err(error)
            }
        }
    }

    /// Number of keys with a toggle running or queued
    pub async fn toggles_in_flight(&self) -> usize {
        self.key_locks.lock().await.len()
    }

    async fn key_lock(&self, key: &MembershipKey) -> Arc<Mutex<()>> {
        let mut locks = self.key_locks.lock().await;
        Arc::clone(locks.entry(key.clone()).or_default())
    }

    async fn release_key_lock(&self, key: &MembershipKey, lock: Arc<Mutex<()>>) {
        let mut locks = self.key_locks.lock().await;
        // One reference in the table plus ours: nobody else is waiting
        if Arc::strong_count(&lock) == 2 {
            locks.remove(key);
        }
    }

    fn offer_retry(&self, retry: RetryAction, error: &SyncError) {
        if let Some(ref hook) = self.retry_hook {
            hook.offer(retry, error);
        }
    }

    fn mutation_retry(&self, key: &MembershipKey, mutation: Mutation) -> RetryAction {
        let coordinator = self.clone();
        let key = key.clone();
        let retry = RetryAction::new(format!("{} {}", mutation, key), move || async move {
            coordinator.mutate(&key, mutation).await.map(|_| ())
        });
        match mutation {
            Mutation::Set(_) => retry.idempotent(),
            Mutation::Toggle => retry,
        }
    }

    fn check_retry(&self, key: &MembershipKey) -> RetryAction {
        let coordinator = self.clone();
        let key = key.clone();
        RetryAction::new(format!("check {}", key), move || async move {
            coordinator.check(&key).await.map(|_| ())
        })
        .idempotent()
    }
}

impl std::fmt::Debug for ToggleCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToggleCoordinator")
            .field("cache", &self.cache)
            .field("bus", &self.bus)
            .field("retry_hook", &self.retry_hook.is_some())
            .finish()
    }
}
