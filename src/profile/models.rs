// SPDX-License-Identifier: GPL-3.0-only
use serde::{Deserialize, Serialize};

use crate::error::SyncError;
use crate::store::models::{MembershipDocument, MembershipSet, SetName};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub avatar: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub website: Option<String>,

    /// NFTs owned by the user
    #[serde(default)]
    pub nfts: MembershipSet,

    /// NFTs the user marked as favorite
    #[serde(default)]
    pub likes: MembershipSet,
}

impl Profile {
    /// Typed view of a fetched profile document
    pub fn from_document(document: &MembershipDocument) -> Result<Self, SyncError> {
        if document.set() != SetName::Likes {
            return Err(SyncError::Unexpected(format!(
                "expected a profile document, got the {} document",
                document.set()
            )));
        }
        Ok(serde_json::from_value(document.to_json())?)
    }

    /// Rows of the profile screen table
    pub fn items(&self) -> Vec<ProfileItem> {
        vec![
            ProfileItem::new(format!("My NFTs ({})", self.nfts.len())),
            ProfileItem::new(format!("Favorite NFTs ({})", self.likes.len())),
            ProfileItem::new("About the developer"),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileItem {
    pub title: String,
}

impl ProfileItem {
    pub fn new(title: impl Into<String>) -> Self {
        Self { title: title.into() }
    }
}
