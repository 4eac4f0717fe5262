// SPDX-License-Identifier: GPL-3.0-only
use async_trait::async_trait;
use tracing::{debug, info};
use url::form_urlencoded;

use crate::catalog::models::{Collection, Nft};
use crate::catalog::traits::CatalogService;
use crate::error::SyncError;
use crate::network::{ApiClient, NetworkRequest};

#[derive(Debug, Clone)]
pub struct HttpCatalog {
    client: ApiClient,
}

impl HttpCatalog {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl CatalogService for HttpCatalog {
    async fn collections(&self) -> Result<Vec<Collection>, SyncError> {
        let collections: Vec<Collection> = self
            .client
            .send_json(NetworkRequest::get("api/v1/collections"))
            .await?;
        info!(count = collections.len(), "Fetched NFT collections");
        Ok(collections)
    }

    async fn nft(&self, id: &str) -> Result<Nft, SyncError> {
        let encoded: String = form_urlencoded::byte_serialize(id.as_bytes()).collect();
        let nft: Nft = self
            .client
            .send_json(NetworkRequest::get(format!("api/v1/nft/{}", encoded)))
            .await?;
        debug!(nft_id = %nft.id, "Fetched NFT");
        Ok(nft)
    }
}
