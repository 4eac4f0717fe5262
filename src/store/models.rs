// SPDX-License-Identifier: GPL-3.0-only
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::error::SyncError;

/// Server-held relations an item can be a member of
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SetName {
    /// Liked NFTs, stored in the profile document
    Likes,
    /// NFTs in the cart, stored in the order document
    Cart,
}

impl SetName {
    /// Field of the owning document that carries the member ids
    pub fn member_field(self) -> &'static str {
        match self {
            SetName::Likes => "likes",
            SetName::Cart => "nfts",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SetName::Likes => "likes",
            SetName::Cart => "cart",
        }
    }
}

impl fmt::Display for SetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MembershipKey {
    pub set: SetName,
    pub item_id: String,
}

impl MembershipKey {
    pub fn new(set: SetName, item_id: impl Into<String>) -> Self {
        Self {
            set,
            item_id: item_id.into(),
        }
    }

    pub fn like(item_id: impl Into<String>) -> Self {
        Self::new(SetName::Likes, item_id)
    }

    pub fn cart(item_id: impl Into<String>) -> Self {
        Self::new(SetName::Cart, item_id)
    }
}

impl fmt::Display for MembershipKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.set, self.item_id)
    }
}

/// Ordered, duplicate-free list of item ids
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct MembershipSet(Vec<String>);

impl MembershipSet {
    /// Build a set from server data, keeping the first occurrence of each id
    pub fn from_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut items: Vec<String> = Vec::new();
        for id in ids {
            let id = id.into();
            if !items.contains(&id) {
                items.push(id);
            }
        }
        Self(items)
    }

    pub fn contains(&self, item_id: &str) -> bool {
        self.0.iter().any(|id| id == item_id)
    }

    /// Flip membership of `item_id`; returns whether it is a member afterwards.
    ///
    /// Presence removes every occurrence, absence appends once.
    pub fn toggle(&mut self, item_id: &str) -> bool {
        if self.contains(item_id) {
            self.0.retain(|id| id != item_id);
            false
        } else {
            self.0.push(item_id.to_string());
            true
        }
    }

    pub fn remove(&mut self, item_id: &str) -> bool {
        let before = self.0.len();
        self.0.retain(|id| id != item_id);
        self.0.len() != before
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

impl<'de> Deserialize<'de> for MembershipSet {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let ids = Option::<Vec<String>>::deserialize(deserializer)?;
        Ok(MembershipSet::from_ids(ids.unwrap_or_default()))
    }
}

/// Profile or order resource: the member list plus every sibling field,
/// kept verbatim so a full-document write does not drop them.
#[derive(Debug, Clone, PartialEq)]
pub struct MembershipDocument {
    set: SetName,
    members: MembershipSet,
    fields: Map<String, Value>,
}

impl MembershipDocument {
    pub fn new(set: SetName, members: MembershipSet, mut fields: Map<String, Value>) -> Self {
        fields.remove(set.member_field());
        Self { set, members, fields }
    }

    /// Split a decoded JSON resource into its member list and sibling fields.
    ///
    /// A missing or `null` member field is an empty set; anything other than
    /// an array of strings is a decode error.
    pub fn from_json(set: SetName, value: Value) -> Result<Self, SyncError> {
        let Value::Object(mut fields) = value else {
            return Err(SyncError::Decode(format!("{} document is not a JSON object", set)));
        };

        let members = match fields.remove(set.member_field()) {
            None | Some(Value::Null) => MembershipSet::default(),
            Some(raw) => serde_json::from_value::<MembershipSet>(raw).map_err(|e| {
                SyncError::Decode(format!("invalid `{}` field: {}", set.member_field(), e))
            })?,
        };

        Ok(Self { set, members, fields })
    }

    /// Reassemble the full JSON resource
    pub fn to_json(&self) -> Value {
        let mut fields = self.fields.clone();
        fields.insert(
            self.set.member_field().to_string(),
            Value::Array(self.members.iter().map(|id| Value::String(id.to_string())).collect()),
        );
        Value::Object(fields)
    }

    pub fn set(&self) -> SetName {
        self.set
    }

    pub fn members(&self) -> &MembershipSet {
        &self.members
    }

    pub fn members_mut(&mut self) -> &mut MembershipSet {
        &mut self.members
    }

    /// Fields other than the member list
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }
}
