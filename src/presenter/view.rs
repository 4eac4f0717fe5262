// SPDX-License-Identifier: GPL-3.0-only
use crate::catalog::models::Nft;
use crate::coordinator::RetryAction;
use crate::error::SyncError;
use crate::profile::models::{Profile, ProfileItem};

pub const NETWORK_ERROR_MESSAGE: &str = "A network error occurred. Please try again.";
pub const UNEXPECTED_ERROR_MESSAGE: &str = "An unexpected error occurred. Please try again.";
pub const RETRY_ACTION_TEXT: &str = "Retry";

/// User-facing error with the action that re-runs the failed operation
#[derive(Debug)]
pub struct ErrorModel {
    pub message: String,
    pub action_text: String,
    pub retry: RetryAction,
}

impl ErrorModel {
    pub fn new(error: &SyncError, retry: RetryAction) -> Self {
        let message = if error.is_network() {
            NETWORK_ERROR_MESSAGE
        } else {
            UNEXPECTED_ERROR_MESSAGE
        };
        Self {
            message: message.to_string(),
            action_text: RETRY_ACTION_TEXT.to_string(),
            retry,
        }
    }
}

/// Screen-side notifications. Presenters never read UI state back.
///
/// Methods may be called from any runtime worker; implementors hop onto
/// their own UI context before touching widgets.
pub trait View: Send + Sync {
    fn show_profile(&self, _profile: &Profile) {}

    fn show_profile_items(&self, _items: &[ProfileItem]) {}

    fn show_collection(&self, _nfts: &[Nft]) {}

    fn update_like_button_color(&self, _is_liked: bool, _nft_id: &str) {}

    fn update_cart_button_image(&self, _is_added: bool, _nft_id: &str) {}

    fn show_error(&self, _error: ErrorModel) {}

    fn set_loading(&self, _loading: bool) {}

    fn reload(&self) {}

    fn update_empty_view(&self) {}
}
