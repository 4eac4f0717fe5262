// SPDX-License-Identifier: GPL-3.0-only

/// Optimistic local edit awaiting server confirmation.
///
/// A change starts `Pending` with the locally applied value shown to the user
/// and the value it replaced. It ends `Confirmed` once the write succeeds or
/// `RolledBack` to the previous value once it fails.
#[derive(Debug, Clone, PartialEq)]
pub enum PendingChange<T> {
    Pending { local: T, previous: T },
    Confirmed(T),
    RolledBack { attempted: T, restored: T },
}

impl<T> PendingChange<T> {
    pub fn begin(local: T, previous: T) -> Self {
        PendingChange::Pending { local, previous }
    }

    /// Settle a pending change as accepted; settled changes are returned as-is
    pub fn confirm(self) -> Self {
        match self {
            PendingChange::Pending { local, .. } => PendingChange::Confirmed(local),
            settled => settled,
        }
    }

    /// Settle a pending change as rejected; settled changes are returned as-is
    pub fn roll_back(self) -> Self {
        match self {
            PendingChange::Pending { local, previous } => PendingChange::RolledBack {
                attempted: local,
                restored: previous,
            },
            settled => settled,
        }
    }

    /// The value the user should currently see
    pub fn visible(&self) -> &T {
        match self {
            PendingChange::Pending { local, .. } => local,
            PendingChange::Confirmed(value) => value,
            PendingChange::RolledBack { restored, .. } => restored,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, PendingChange::Pending { .. })
    }

    pub fn into_visible(self) -> T {
        match self {
            PendingChange::Pending { local, .. } => local,
            PendingChange::Confirmed(value) => value,
            PendingChange::RolledBack { restored, .. } => restored,
        }
    }
}
