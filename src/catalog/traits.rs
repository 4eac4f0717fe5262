// SPDX-License-Identifier: GPL-3.0-only
use async_trait::async_trait;
use crate::catalog::models::{Collection, Nft};
use crate::error::SyncError;

#[async_trait]
pub trait CatalogService: Send + Sync {
    /// List all NFT collections
    async fn collections(&self) -> Result<Vec<Collection>, SyncError>;

    /// Look up a single NFT by id
    async fn nft(&self, id: &str) -> Result<Nft, SyncError>;
}
