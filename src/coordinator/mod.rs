// SPDX-License-Identifier: GPL-3.0-only
pub mod retry;
pub mod toggle;

pub use retry::{PendingRetry, RetryAction, RetryHook, RetryQueue};
pub use toggle::{CheckOutcome, ToggleCoordinator};
