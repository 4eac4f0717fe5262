// SPDX-License-Identifier: GPL-3.0-only
pub mod http;
pub mod models;
pub mod traits;

pub use http::HttpCatalog;
pub use models::{Collection, Nft};
pub use traits::CatalogService;
