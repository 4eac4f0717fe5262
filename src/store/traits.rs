// SPDX-License-Identifier: GPL-3.0-only
use async_trait::async_trait;
use crate::error::SyncError;
use crate::store::models::{MembershipDocument, SetName};

#[async_trait]
pub trait RemoteSetStore: Send + Sync {
    /// Fetch the full document that owns `set`
    async fn fetch_document(&self, set: SetName) -> Result<MembershipDocument, SyncError>;

    /// Replace the whole document on the server; there is no partial update
    async fn replace_document(&self, set: SetName, document: &MembershipDocument) -> Result<(), SyncError>;
}
