// SPDX-License-Identifier: GPL-3.0-only
pub mod http;
pub mod models;
pub mod traits;

pub use http::HttpSetStore;
pub use models::{MembershipDocument, MembershipKey, MembershipSet, SetName};
pub use traits::RemoteSetStore;
