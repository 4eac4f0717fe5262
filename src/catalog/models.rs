// SPDX-License-Identifier: GPL-3.0-only
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Nft {
    pub id: String,

    pub name: String,

    #[serde(default)]
    pub images: Vec<String>,

    /// 0 to 5 stars
    #[serde(default)]
    pub rating: u8,

    #[serde(default)]
    pub price: f64,

    #[serde(default)]
    pub author: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub created_at: Option<String>,
}

impl Nft {
    pub fn cover_image(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
    pub id: String,

    pub name: String,

    #[serde(default)]
    pub cover: Option<String>,

    /// Ids of the NFTs in this collection
    #[serde(default)]
    pub nfts: Vec<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub author: Option<String>,

    #[serde(default)]
    pub created_at: Option<String>,
}
