// SPDX-License-Identifier: GPL-3.0-only
use parking_lot::Mutex;
use std::collections::HashMap;
use tracing::trace;

use crate::store::models::MembershipKey;

/// Check state of one (set, item) pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheEntry {
    #[default]
    Unchecked,
    Fetching,
    Checked(bool),
}

/// Process-local record of which memberships were already checked or are
/// being checked, so repeated queries for one item cost one fetch.
#[derive(Debug, Default)]
pub struct MembershipCache {
    entries: Mutex<HashMap<MembershipKey, CacheEntry>>,
}

impl MembershipCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self, key: &MembershipKey) -> CacheEntry {
        self.entries.lock().get(key).copied().unwrap_or_default()
    }

    /// Last confirmed membership, if any
    pub fn is_member(&self, key: &MembershipKey) -> Option<bool> {
        match self.state(key) {
            CacheEntry::Checked(is_member) => Some(is_member),
            CacheEntry::Unchecked | CacheEntry::Fetching => None,
        }
    }

    pub fn should_check(&self, key: &MembershipKey) -> bool {
        self.state(key) == CacheEntry::Unchecked
    }

    /// Move `Unchecked` to `Fetching`. Returns false, leaving the entry
    /// alone, when a check is already running or done; the caller must skip.
    pub fn begin_check(&self, key: &MembershipKey) -> bool {
        let mut entries = self.entries.lock();
        let entry = entries.entry(key.clone()).or_default();
        if *entry != CacheEntry::Unchecked {
            return false;
        }
        *entry = CacheEntry::Fetching;
        trace!(key = %key, "Membership check started");
        true
    }

    /// Record a check result; last write wins
    pub fn complete_check(&self, key: &MembershipKey, is_member: bool) {
        self.entries.lock().insert(key.clone(), CacheEntry::Checked(is_member));
        trace!(key = %key, is_member, "Membership check completed");
    }

    /// Forget what is known about `key` so the next read goes to the server
    pub fn invalidate(&self, key: &MembershipKey) {
        if self.entries.lock().remove(key).is_some() {
            trace!(key = %key, "Membership cache entry invalidated");
        }
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}
