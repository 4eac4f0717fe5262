// SPDX-License-Identifier: GPL-3.0-only
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::profile::models::Profile;
use crate::store::models::{MembershipKey, SetName};

/// A confirmed change of one item's membership
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MembershipChange {
    pub set: SetName,
    pub item_id: String,
    pub is_member: bool,
    pub changed_at: DateTime<Utc>,
}

impl MembershipChange {
    pub fn new(key: &MembershipKey, is_member: bool) -> Self {
        Self {
            set: key.set,
            item_id: key.item_id.clone(),
            is_member,
            changed_at: Utc::now(),
        }
    }

    pub fn key(&self) -> MembershipKey {
        MembershipKey::new(self.set, self.item_id.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum SyncEvent {
    /// An item was liked/unliked or added to/removed from the cart
    MembershipChanged(MembershipChange),
    /// The profile document was rewritten; carries the new snapshot
    ProfileUpdated(Profile),
}

impl SyncEvent {
    pub fn membership(&self) -> Option<&MembershipChange> {
        match self {
            SyncEvent::MembershipChanged(change) => Some(change),
            SyncEvent::ProfileUpdated(_) => None,
        }
    }

    pub fn is_set(&self, set: SetName) -> bool {
        self.membership().is_some_and(|change| change.set == set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serializes_tagged() {
        let event = SyncEvent::MembershipChanged(MembershipChange::new(&MembershipKey::cart("n1"), true));
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["type"], "MembershipChanged");
        assert_eq!(json["payload"]["set"], "cart");
        assert_eq!(json["payload"]["item_id"], "n1");
        assert_eq!(json["payload"]["is_member"], true);
    }

    #[test]
    fn test_is_set() {
        let event = SyncEvent::MembershipChanged(MembershipChange::new(&MembershipKey::like("a"), false));
        assert!(event.is_set(SetName::Likes));
        assert!(!event.is_set(SetName::Cart));
        assert_eq!(event.membership().unwrap().key(), MembershipKey::like("a"));
    }
}
