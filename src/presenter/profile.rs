// SPDX-License-Identifier: GPL-3.0-only
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{info, warn};

use crate::coordinator::{RetryAction, ToggleCoordinator};
use crate::error::SyncError;
use crate::events::{MembershipChange, SubscriptionHandle, SyncEvent};
use crate::presenter::view::{ErrorModel, View};
use crate::profile::{PendingChange, Profile};
use crate::store::{MembershipKey, SetName};

struct Inner {
    coordinator: ToggleCoordinator,
    view: Arc<dyn View>,
    profile: RwLock<Option<Profile>>,
}

/// Drives the profile screen and the favorites list
pub struct ProfilePresenter {
    inner: Arc<Inner>,
    subscription: SubscriptionHandle,
}

impl ProfilePresenter {
    pub fn new(coordinator: ToggleCoordinator, view: Arc<dyn View>) -> Self {
        let inner = Arc::new(Inner {
            coordinator,
            view,
            profile: RwLock::new(None),
        });

        let weak = Arc::downgrade(&inner);
        let subscription = inner.coordinator.bus().subscribe(
            |event| matches!(event, SyncEvent::ProfileUpdated(_)) || event.is_set(SetName::Likes),
            move |event| {
                let Some(inner) = weak.upgrade() else {
                    return;
                };
                match event {
                    SyncEvent::ProfileUpdated(profile) => inner.show(profile.clone()),
                    SyncEvent::MembershipChanged(change) => inner.apply_like_change(change),
                }
            },
        );

        Self { inner, subscription }
    }

    /// Last profile shown, if any
    pub fn profile(&self) -> Option<Profile> {
        self.inner.profile.read().clone()
    }

    pub async fn fetch_profile(&self) -> Result<Profile, SyncError> {
        Inner::fetch_profile(&self.inner).await
    }

    /// Optimistically drop `id` from the favorites, then write the profile.
    ///
    /// Returns `Ok(None)` when no profile is loaded or `id` is not a favorite.
    /// On failure the previous profile is shown again and the error is
    /// surfaced with a retry.
    pub async fn remove_favorite(&self, id: &str) -> Result<Option<PendingChange<Profile>>, SyncError> {
        Inner::remove_favorite(&self.inner, id.to_string()).await
    }
}

impl Drop for ProfilePresenter {
    fn drop(&mut self) {
        self.inner.coordinator.bus().unsubscribe(self.subscription);
    }
}

impl Inner {
    async fn fetch_profile(self: &Arc<Self>) -> Result<Profile, SyncError> {
        self.view.set_loading(true);
        let result = match self.coordinator.store().fetch_document(SetName::Likes).await {
            Ok(document) => Profile::from_document(&document),
            Err(error) => Err(error),
        };
        self.view.set_loading(false);

        match result {
            Ok(profile) => {
                info!(profile_id = %profile.id, likes = profile.likes.len(), "Profile loaded");
                self.show(profile.clone());
                Ok(profile)
            }
            Err(error) => {
                warn!(error = %error, "Failed to load profile");
                self.view.show_error(ErrorModel::new(&error, self.fetch_retry()));
                Err(error)
            }
        }
    }

    async fn remove_favorite(self: &Arc<Self>, id: String) -> Result<Option<PendingChange<Profile>>, SyncError> {
        let Some(previous) = self.profile.read().clone() else {
            return Ok(None);
        };
        if !previous.likes.contains(&id) {
            return Ok(None);
        }

        let mut local = previous.clone();
        local.likes.remove(&id);
        let change = PendingChange::begin(local, previous);
        self.show(change.visible().clone());

        self.view.set_loading(true);
        let key = MembershipKey::like(id.clone());
        let result = self.coordinator.set_membership(&key, false).await;
        self.view.set_loading(false);

        match result {
            Ok(document) => {
                let change = change.confirm();
                // The server may already have agreed, in which case nothing was written
                self.coordinator.cache().invalidate(&key);
                match Profile::from_document(&document) {
                    Ok(server) => {
                        self.coordinator.bus().publish(SyncEvent::ProfileUpdated(server));
                    }
                    Err(error) => warn!(error = %error, "Written profile could not be re-read"),
                }
                Ok(Some(change))
            }
            Err(error) => {
                let change = change.roll_back();
                warn!(nft_id = %id, error = %error, "Favorite removal rolled back");
                self.show(change.into_visible());
                self.view.show_error(ErrorModel::new(&error, self.remove_retry(id)));
                Err(error)
            }
        }
    }

    fn show(&self, profile: Profile) {
        self.view.show_profile(&profile);
        self.view.show_profile_items(&profile.items());
        *self.profile.write() = Some(profile);
    }

    /// Mirror likes toggled elsewhere into the loaded profile
    fn apply_like_change(&self, change: &MembershipChange) {
        let updated = {
            let mut guard = self.profile.write();
            let Some(profile) = guard.as_mut() else {
                return;
            };
            if profile.likes.contains(&change.item_id) == change.is_member {
                return;
            }
            profile.likes.toggle(&change.item_id);
            profile.clone()
        };
        self.view.show_profile_items(&updated.items());
    }

    fn fetch_retry(self: &Arc<Self>) -> RetryAction {
        let weak = Arc::downgrade(self);
        RetryAction::new("fetch profile", move || async move {
            match weak.upgrade() {
                Some(inner) => inner.fetch_profile().await.map(|_| ()),
                None => Ok(()),
            }
        })
        .idempotent()
    }

    fn remove_retry(self: &Arc<Self>, id: String) -> RetryAction {
        let weak = Arc::downgrade(self);
        RetryAction::new(format!("remove favorite {}", id), move || async move {
            match weak.upgrade() {
                Some(inner) => inner.remove_favorite(id).await.map(|_| ()),
                None => Ok(()),
            }
        })
        .idempotent()
    }
}
