// SPDX-License-Identifier: GPL-3.0-only
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};

use crate::catalog::models::{Collection, Nft};
use crate::catalog::traits::CatalogService;
use crate::coordinator::{CheckOutcome, RetryQueue, ToggleCoordinator};
use crate::error::SyncError;
use crate::profile::Profile;
use crate::store::{MembershipKey, SetName};

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// How a membership answer was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MembershipSource {
    Fetched,
    Cached,
    InFlight,
    Toggled,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipStatus {
    pub set: SetName,
    pub id: String,
    /// `None` while another check for the same item is still running
    pub is_member: Option<bool>,
    pub source: MembershipSource,
}

impl MembershipStatus {
    fn from_check(key: MembershipKey, outcome: CheckOutcome) -> Self {
        let source = match outcome {
            CheckOutcome::Fetched(_) => MembershipSource::Fetched,
            CheckOutcome::Cached(_) => MembershipSource::Cached,
            CheckOutcome::InFlight => MembershipSource::InFlight,
        };
        Self {
            set: key.set,
            id: key.item_id,
            is_member: outcome.is_member(),
            source,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingRetryInfo {
    pub operation: String,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryResult {
    pub operation: String,
    pub success: bool,
    pub error: Option<String>,
}

/// Maps sync failures to the status the local API answers with
pub fn status_for(error: &SyncError) -> StatusCode {
    match error {
        SyncError::Network(_) | SyncError::Decode(_) => StatusCode::BAD_GATEWAY,
        SyncError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub struct ApiHandlers {
    coordinator: ToggleCoordinator,
    catalog: Arc<dyn CatalogService>,
    retries: Arc<RetryQueue>,
}

impl ApiHandlers {
    pub fn new(
        coordinator: ToggleCoordinator,
        catalog: Arc<dyn CatalogService>,
        retries: Arc<RetryQueue>,
    ) -> Self {
        Self {
            coordinator,
            catalog,
            retries,
        }
    }

    pub fn coordinator(&self) -> &ToggleCoordinator {
        &self.coordinator
    }
}

impl ApiHandlers {
    pub async fn health() -> Json<ApiResponse<&'static str>> {
        Json(ApiResponse::success("ok"))
    }

    pub async fn profile(&self) -> Result<Json<ApiResponse<Profile>>, StatusCode> {
        let result = match self.coordinator.store().fetch_document(SetName::Likes).await {
            Ok(document) => Profile::from_document(&document),
            Err(e) => Err(e),
        };
        match result {
            Ok(profile) => Ok(Json(ApiResponse::success(profile))),
            Err(e) => {
                error!(error = %e, "Failed to fetch profile");
                Err(status_for(&e))
            }
        }
    }

    pub async fn collections(&self) -> Result<Json<ApiResponse<Vec<Collection>>>, StatusCode> {
        match self.catalog.collections().await {
            Ok(collections) => Ok(Json(ApiResponse::success(collections))),
            Err(e) => {
                error!(error = %e, "Failed to list collections");
                Err(status_for(&e))
            }
        }
    }

    pub async fn nft(&self, id: &str) -> Result<Json<ApiResponse<Nft>>, StatusCode> {
        match self.catalog.nft(id).await {
            Ok(nft) => Ok(Json(ApiResponse::success(nft))),
            Err(e) => {
                error!(error = %e, nft_id = %id, "Failed to fetch NFT");
                Err(status_for(&e))
            }
        }
    }

    pub async fn check_membership(
        &self,
        set: SetName,
        id: String,
    ) -> Result<Json<ApiResponse<MembershipStatus>>, StatusCode> {
        let key = MembershipKey::new(set, id);
        match self.coordinator.check(&key).await {
            Ok(outcome) => Ok(Json(ApiResponse::success(MembershipStatus::from_check(key, outcome)))),
            Err(e) => {
                error!(error = %e, key = %key, "Membership check failed");
                Err(status_for(&e))
            }
        }
    }

    pub async fn toggle_membership(
        &self,
        set: SetName,
        id: String,
    ) -> Result<Json<ApiResponse<MembershipStatus>>, StatusCode> {
        let key = MembershipKey::new(set, id);
        info!(key = %key, "Toggle request received");

        match self.coordinator.toggle(&key).await {
            Ok(is_member) => Ok(Json(ApiResponse::success(MembershipStatus {
                set: key.set,
                id: key.item_id,
                is_member: Some(is_member),
                source: MembershipSource::Toggled,
            }))),
            Err(e) => {
                error!(error = %e, key = %key, "Toggle failed");
                Err(status_for(&e))
            }
        }
    }

    pub async fn pending_retries(&self) -> Json<ApiResponse<Vec<PendingRetryInfo>>> {
        let pending = self
            .retries
            .pending()
            .into_iter()
            .map(|(operation, error)| PendingRetryInfo {
                operation,
                error: error.to_string(),
            })
            .collect();
        Json(ApiResponse::success(pending))
    }

    /// Run every parked retry once
    pub async fn run_retries(&self) -> Json<ApiResponse<Vec<RetryResult>>> {
        let results: Vec<RetryResult> = self
            .retries
            .run_all()
            .await
            .into_iter()
            .map(|(operation, result)| RetryResult {
                operation,
                success: result.is_ok(),
                error: result.err().map(|e| e.to_string()),
            })
            .collect();
        info!(
            attempted = results.len(),
            succeeded = results.iter().filter(|r| r.success).count(),
            "Retries run"
        );
        Json(ApiResponse::success(results))
    }
}
