// SPDX-License-Identifier: GPL-3.0-only
pub mod client;
pub mod request;

pub use client::ApiClient;
pub use request::{HttpMethod, NetworkRequest};
