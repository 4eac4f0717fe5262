// SPDX-License-Identifier: GPL-3.0-only
use futures_util::stream::{FuturesUnordered, StreamExt};
use parking_lot::RwLock;
use std::sync::{Arc, Weak};
use tokio::runtime::Handle;
use tracing::{debug, warn};

use crate::catalog::models::{Collection, Nft};
use crate::catalog::traits::CatalogService;
use crate::coordinator::{CheckOutcome, RetryAction, ToggleCoordinator};
use crate::error::SyncError;
use crate::events::{MembershipChange, SubscriptionHandle};
use crate::presenter::view::{ErrorModel, View};
use crate::store::{MembershipKey, SetName};

/// Everything a collection cell needs to render
#[derive(Debug, Clone, PartialEq)]
pub struct CellModel {
    pub id: String,
    pub name: String,
    pub image: Option<String>,
    pub rating: u8,
    pub price: f64,
    pub is_liked: bool,
    pub is_added_to_cart: bool,
}

struct Inner {
    collection: Collection,
    catalog: Arc<dyn CatalogService>,
    coordinator: ToggleCoordinator,
    view: Arc<dyn View>,
    nfts: RwLock<Vec<Nft>>,
}

/// Drives a collection screen: NFT loading, like/cart buttons and their toggles.
///
/// Button state is pushed from `MembershipChanged` events, so toggles made on
/// other screens show up here too. Dropping the presenter unsubscribes.
pub struct CollectionPresenter {
    inner: Arc<Inner>,
    subscription: SubscriptionHandle,
}

impl CollectionPresenter {
    pub fn new(
        collection: Collection,
        catalog: Arc<dyn CatalogService>,
        coordinator: ToggleCoordinator,
        view: Arc<dyn View>,
    ) -> Self {
        let inner = Arc::new(Inner {
            collection,
            catalog,
            coordinator,
            view,
            nfts: RwLock::new(Vec::new()),
        });

        let ids = inner.collection.nfts.clone();
        let weak = Arc::downgrade(&inner);
        let subscription = inner.coordinator.bus().subscribe(
            move |event| event.membership().is_some_and(|change| ids.contains(&change.item_id)),
            move |event| {
                if let (Some(inner), Some(change)) = (weak.upgrade(), event.membership()) {
                    inner.apply_change(change);
                }
            },
        );

        Self { inner, subscription }
    }

    pub fn collection(&self) -> &Collection {
        &self.inner.collection
    }

    /// NFTs loaded so far, in arrival order
    pub fn nfts(&self) -> Vec<Nft> {
        self.inner.nfts.read().clone()
    }

    pub fn nft_count(&self) -> usize {
        self.inner.nfts.read().len()
    }

    /// Fetch every NFT of the collection concurrently
    pub async fn load_nfts(&self) {
        let inner = &self.inner;
        if inner.collection.nfts.is_empty() {
            inner.view.update_empty_view();
            return;
        }

        inner.view.set_loading(true);
        let mut loads: FuturesUnordered<_> = inner
            .collection
            .nfts
            .iter()
            .map(|id| Inner::load_nft(inner, id.clone()))
            .collect();
        let mut failed = 0;
        while let Some(result) = loads.next().await {
            if result.is_err() {
                failed += 1;
            }
        }
        inner.view.set_loading(false);

        debug!(
            collection = %inner.collection.id,
            loaded = self.nft_count(),
            failed,
            "Collection loaded"
        );
    }

    /// Cell for the NFT at `index`, with whatever like/cart state is cached.
    ///
    /// Unknown states are checked in the background on the current tokio
    /// runtime; the buttons are updated when those checks resolve. Without a
    /// runtime the checks are skipped and left for a later call.
    pub fn cell_model(&self, index: usize) -> Option<CellModel> {
        let nft = self.inner.nfts.read().get(index).cloned()?;
        let cache = self.inner.coordinator.cache();
        let like = MembershipKey::like(nft.id.clone());
        let cart = MembershipKey::cart(nft.id.clone());

        let model = CellModel {
            is_liked: cache.is_member(&like).unwrap_or(false),
            is_added_to_cart: cache.is_member(&cart).unwrap_or(false),
            image: nft.cover_image().map(str::to_string),
            id: nft.id,
            name: nft.name,
            rating: nft.rating,
            price: nft.price,
        };

        let Ok(runtime) = Handle::try_current() else {
            debug!(nft_id = %model.id, "No runtime, membership checks deferred");
            return Some(model);
        };
        for key in [like, cart] {
            if cache.should_check(&key) {
                let inner = Arc::clone(&self.inner);
                runtime.spawn(async move { inner.check(&key).await });
            }
        }

        Some(model)
    }

    pub async fn change_like(&self, id: &str) -> Result<bool, SyncError> {
        Inner::change(&self.inner, MembershipKey::like(id)).await
    }

    pub async fn change_cart(&self, id: &str) -> Result<bool, SyncError> {
        Inner::change(&self.inner, MembershipKey::cart(id)).await
    }
}

impl Drop for CollectionPresenter {
    fn drop(&mut self) {
        self.inner.coordinator.bus().unsubscribe(self.subscription);
    }
}

impl Inner {
    async fn load_nft(self: &Arc<Self>, id: String) -> Result<(), SyncError> {
        match self.catalog.nft(&id).await {
            Ok(nft) => {
                let snapshot = {
                    let mut nfts = self.nfts.write();
                    nfts.retain(|loaded| loaded.id != nft.id);
                    nfts.push(nft);
                    nfts.clone()
                };
                self.view.show_collection(&snapshot);
                Ok(())
            }
            Err(error) => {
                warn!(nft_id = %id, error = %error, "Failed to load NFT");
                self.view.show_error(ErrorModel::new(&error, self.load_retry(id)));
                Err(error)
            }
        }
    }

    async fn check(&self, key: &MembershipKey) {
        match self.coordinator.check(key).await {
            Ok(CheckOutcome::Fetched(is_member)) => self.update_button(key.set, is_member, &key.item_id),
            // Someone else fetched or is fetching; their result reaches the cache
            Ok(CheckOutcome::Cached(_) | CheckOutcome::InFlight) => {}
            Err(error) => {
                // Entry is back to Unchecked; the next cell_model checks again
                warn!(key = %key, error = %error, "Membership check failed");
            }
        }
    }

    async fn change(self: &Arc<Self>, key: MembershipKey) -> Result<bool, SyncError> {
        match self.coordinator.toggle(&key).await {
            // The button itself is updated by the MembershipChanged subscription
            Ok(is_member) => Ok(is_member),
            Err(error) => {
                self.view.show_error(ErrorModel::new(&error, self.change_retry(key)));
                Err(error)
            }
        }
    }

    fn load_retry(self: &Arc<Self>, id: String) -> RetryAction {
        let weak = Arc::downgrade(self);
        RetryAction::new(format!("load nft {}", id), move || async move {
            match weak.upgrade() {
                Some(inner) => inner.load_nft(id).await,
                None => Ok(()),
            }
        })
        .idempotent()
    }

    fn change_retry(self: &Arc<Self>, key: MembershipKey) -> RetryAction {
        let weak: Weak<Self> = Arc::downgrade(self);
        RetryAction::new(format!("toggle {}", key), move || async move {
            match weak.upgrade() {
                Some(inner) => inner.change(key).await.map(|_| ()),
                None => Ok(()),
            }
        })
    }

    fn apply_change(&self, change: &MembershipChange) {
        self.update_button(change.set, change.is_member, &change.item_id);
    }

    fn update_button(&self, set: SetName, is_member: bool, id: &str) {
        match set {
            SetName::Likes => self.view.update_like_button_color(is_member, id),
            SetName::Cart => self.view.update_cart_button_image(is_member, id),
        }
    }
}
