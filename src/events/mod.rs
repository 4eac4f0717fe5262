// SPDX-License-Identifier: GPL-3.0-only
pub mod bus;
pub mod models;

pub use bus::{SubscriptionHandle, SyncEventBus};
pub use models::{MembershipChange, SyncEvent};
