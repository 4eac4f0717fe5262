// SPDX-License-Identifier: GPL-3.0-only
use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info};
use url::form_urlencoded;

use crate::config::Config;
use crate::error::SyncError;
use crate::network::{ApiClient, NetworkRequest};
use crate::store::models::{MembershipDocument, SetName};
use crate::store::traits::RemoteSetStore;

/// Marker the backend reads as "clear this list"
const EMPTY_LIST_MARKER: &str = "null";

/// Remote set store backed by the profile and order endpoints
#[derive(Debug, Clone)]
pub struct HttpSetStore {
    client: ApiClient,
    profile_id: String,
    order_id: String,
}

impl HttpSetStore {
    pub fn new(client: ApiClient, profile_id: impl Into<String>, order_id: impl Into<String>) -> Self {
        Self {
            client,
            profile_id: profile_id.into(),
            order_id: order_id.into(),
        }
    }

    pub fn from_config(client: ApiClient, config: &Config) -> Self {
        Self::new(client, config.profile_id.clone(), config.order_id.clone())
    }

    fn document_path(&self, set: SetName) -> String {
        match set {
            SetName::Likes => format!("api/v1/profile/{}", self.profile_id),
            SetName::Cart => format!("api/v1/orders/{}", self.order_id),
        }
    }
}

#[async_trait]
impl RemoteSetStore for HttpSetStore {
    async fn fetch_document(&self, set: SetName) -> Result<MembershipDocument, SyncError> {
        let path = self.document_path(set);
        debug!(set = %set, path = %path, "Fetching membership document");

        let value: Value = self.client.send_json(NetworkRequest::get(path)).await?;
        let document = MembershipDocument::from_json(set, value)?;

        debug!(set = %set, members = document.members().len(), "Fetched membership document");
        Ok(document)
    }

    async fn replace_document(&self, set: SetName, document: &MembershipDocument) -> Result<(), SyncError> {
        let path = self.document_path(set);
        let body = encode_form(document);

        self.client.send(NetworkRequest::put_form(path, body)).await?;

        info!(set = %set, members = document.members().len(), "Replaced membership document");
        Ok(())
    }
}

/// Encode every field of `document` as an `application/x-www-form-urlencoded` body.
///
/// Arrays become one repeated key per element, nested objects are sent as JSON
/// text, `null` fields are omitted, and an empty list is sent as `key=null`.
pub fn encode_form(document: &MembershipDocument) -> String {
    let mut form = form_urlencoded::Serializer::new(String::new());

    for (key, value) in document.fields() {
        append_value(&mut form, key, value);
    }

    let member_field = document.set().member_field();
    if document.members().is_empty() {
        form.append_pair(member_field, EMPTY_LIST_MARKER);
    } else {
        for id in document.members().iter() {
            form.append_pair(member_field, id);
        }
    }

    form.finish()
}

fn append_value(form: &mut form_urlencoded::Serializer<'_, String>, key: &str, value: &Value) {
    match value {
        Value::Null => {}
        Value::String(text) => {
            form.append_pair(key, text);
        }
        Value::Bool(_) | Value::Number(_) | Value::Object(_) => {
            form.append_pair(key, &value.to_string());
        }
        Value::Array(items) if items.is_empty() => {
            form.append_pair(key, EMPTY_LIST_MARKER);
        }
        Value::Array(items) => {
            for item in items {
                match item {
                    Value::Null => {}
                    Value::String(text) => {
                        form.append_pair(key, text);
                    }
                    other => {
                        form.append_pair(key, &other.to_string());
                    }
                }
            }
        }
    }
}
