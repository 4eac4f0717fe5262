// SPDX-License-Identifier: GPL-3.0-only
pub mod models;
pub mod pending;

pub use models::{Profile, ProfileItem};
pub use pending::PendingChange;
