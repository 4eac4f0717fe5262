// SPDX-License-Identifier: GPL-3.0-only
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::catalog::models::{Collection, Nft};
use crate::catalog::traits::CatalogService;
use crate::error::SyncError;
use crate::presenter::view::{ErrorModel, View};
use crate::profile::models::{Profile, ProfileItem};
use crate::store::{MembershipDocument, RemoteSetStore, SetName};

/// In-memory remote store with injectable latency and one-shot failures
#[derive(Default)]
pub struct ScriptedStore {
    documents: Mutex<HashMap<SetName, Value>>,
    fetch_failures: Mutex<VecDeque<SyncError>>,
    replace_failures: Mutex<VecDeque<SyncError>>,
    latency: Option<Duration>,
    fetch_calls: AtomicUsize,
    replace_calls: AtomicUsize,
}

impl ScriptedStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Profile document with the given likes
    pub fn with_likes(self, likes: &[&str]) -> Self {
        self.with_document(
            SetName::Likes,
            json!({
                "id": "1",
                "name": "Alice",
                "avatar": "https://example.com/alice.png",
                "description": "Collector",
                "website": "https://example.com",
                "nfts": ["owned-1", "owned-2"],
                "likes": likes,
            }),
        )
    }

    /// Order document with the given cart
    pub fn with_cart(self, cart: &[&str]) -> Self {
        self.with_document(SetName::Cart, json!({"id": "1", "nfts": cart}))
    }

    pub fn with_document(self, set: SetName, document: Value) -> Self {
        self.documents.lock().insert(set, document);
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn fail_next_fetch(&self, error: SyncError) {
        self.fetch_failures.lock().push_back(error);
    }

    pub fn fail_next_replace(&self, error: SyncError) {
        self.replace_failures.lock().push_back(error);
    }

    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    pub fn replace_calls(&self) -> usize {
        self.replace_calls.load(Ordering::SeqCst)
    }

    /// Current server-side JSON of `set`, `Null` if never seeded
    pub fn document(&self, set: SetName) -> Value {
        self.documents.lock().get(&set).cloned().unwrap_or(Value::Null)
    }

    pub fn members(&self, set: SetName) -> Vec<String> {
        self.document(set)[set.member_field()]
            .as_array()
            .map(|ids| ids.iter().filter_map(|id| id.as_str().map(str::to_string)).collect())
            .unwrap_or_default()
    }

    async fn delay(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl RemoteSetStore for ScriptedStore {
    async fn fetch_document(&self, set: SetName) -> Result<MembershipDocument, SyncError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        self.delay().await;
        if let Some(error) = self.fetch_failures.lock().pop_front() {
            return Err(error);
        }
        let document = self
            .documents
            .lock()
            .get(&set)
            .cloned()
            .ok_or_else(|| SyncError::Network("HTTP status 404".to_string()))?;
        MembershipDocument::from_json(set, document)
    }

    async fn replace_document(&self, set: SetName, document: &MembershipDocument) -> Result<(), SyncError> {
        self.replace_calls.fetch_add(1, Ordering::SeqCst);
        self.delay().await;
        if let Some(error) = self.replace_failures.lock().pop_front() {
            return Err(error);
        }
        self.documents.lock().insert(set, document.to_json());
        Ok(())
    }
}

/// Catalog serving a fixed set of NFTs, with one-shot failures per id
#[derive(Default)]
pub struct ScriptedCatalog {
    collections: Vec<Collection>,
    nfts: HashMap<String, Nft>,
    failures: Mutex<HashMap<String, SyncError>>,
}

impl ScriptedCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_collection(mut self, collection: Collection) -> Self {
        self.collections.push(collection);
        self
    }

    pub fn with_nft(mut self, nft: Nft) -> Self {
        self.nfts.insert(nft.id.clone(), nft);
        self
    }

    pub fn fail_next(&self, id: &str, error: SyncError) {
        self.failures.lock().insert(id.to_string(), error);
    }
}

#[async_trait]
impl CatalogService for ScriptedCatalog {
    async fn collections(&self) -> Result<Vec<Collection>, SyncError> {
        Ok(self.collections.clone())
    }

    async fn nft(&self, id: &str) -> Result<Nft, SyncError> {
        if let Some(error) = self.failures.lock().remove(id) {
            return Err(error);
        }
        self.nfts
            .get(id)
            .cloned()
            .ok_or_else(|| SyncError::Network("HTTP status 404".to_string()))
    }
}

pub fn test_nft(id: &str) -> Nft {
    Nft {
        id: id.to_string(),
        name: format!("NFT {}", id),
        images: vec![format!("https://example.com/{}.png", id)],
        rating: 3,
        price: 1.5,
        author: None,
        description: None,
        created_at: None,
    }
}

pub fn test_collection(ids: &[&str]) -> Collection {
    Collection {
        id: "c1".to_string(),
        name: "Peach".to_string(),
        cover: None,
        nfts: ids.iter().map(|id| id.to_string()).collect(),
        description: None,
        author: None,
        created_at: None,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ViewCall {
    ShowProfile(Profile),
    ShowProfileItems(Vec<String>),
    ShowCollection(Vec<String>),
    LikeButton(bool, String),
    CartButton(bool, String),
    ShowError(String),
    Loading(bool),
    Reload,
    EmptyView,
}

/// View that records every notification; error models are kept so tests can run their retries
#[derive(Default)]
pub struct RecordingView {
    calls: Mutex<Vec<ViewCall>>,
    errors: Mutex<Vec<ErrorModel>>,
}

impl RecordingView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<ViewCall> {
        self.calls.lock().clone()
    }

    pub fn take_errors(&self) -> Vec<ErrorModel> {
        std::mem::take(&mut *self.errors.lock())
    }

    pub fn profiles_shown(&self) -> Vec<Profile> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                ViewCall::ShowProfile(profile) => Some(profile),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: ViewCall) {
        self.calls.lock().push(call);
    }
}

impl View for RecordingView {
    fn show_profile(&self, profile: &Profile) {
        self.record(ViewCall::ShowProfile(profile.clone()));
    }

    fn show_profile_items(&self, items: &[ProfileItem]) {
        self.record(ViewCall::ShowProfileItems(items.iter().map(|i| i.title.clone()).collect()));
    }

    fn show_collection(&self, nfts: &[Nft]) {
        self.record(ViewCall::ShowCollection(nfts.iter().map(|n| n.id.clone()).collect()));
    }

    fn update_like_button_color(&self, is_liked: bool, nft_id: &str) {
        self.record(ViewCall::LikeButton(is_liked, nft_id.to_string()));
    }

    fn update_cart_button_image(&self, is_added: bool, nft_id: &str) {
        self.record(ViewCall::CartButton(is_added, nft_id.to_string()));
    }

    fn show_error(&self, error: ErrorModel) {
        self.record(ViewCall::ShowError(error.message.clone()));
        self.errors.lock().push(error);
    }

    fn set_loading(&self, loading: bool) {
        self.record(ViewCall::Loading(loading));
    }

    fn reload(&self) {
        self.record(ViewCall::Reload);
    }

    fn update_empty_view(&self) {
        self.record(ViewCall::EmptyView);
    }
}
