// SPDX-License-Identifier: GPL-3.0-only

/// Failures surfaced by the backend client and everything built on top of it.
///
/// `Clone` so a single failed round-trip can be handed to every caller that
/// was queued behind it.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl SyncError {
    pub fn is_network(&self) -> bool {
        matches!(self, SyncError::Network(_))
    }
}

impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            SyncError::Decode(err.to_string())
        } else if err.is_builder() {
            SyncError::Unexpected(err.to_string())
        } else {
            SyncError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        SyncError::Decode(err.to_string())
    }
}

impl From<url::ParseError> for SyncError {
    fn from(err: url::ParseError) -> Self {
        SyncError::Unexpected(format!("invalid request URL: {}", err))
    }
}
