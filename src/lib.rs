// SPDX-License-Identifier: GPL-3.0-only
pub mod api;
pub mod cache;
pub mod catalog;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod events;
pub mod logging;
pub mod network;
pub mod presenter;
pub mod profile;
pub mod store;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use error::SyncError;
