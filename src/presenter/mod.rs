// SPDX-License-Identifier: GPL-3.0-only
pub mod collection;
pub mod profile;
pub mod view;

pub use collection::{CellModel, CollectionPresenter};
pub use profile::ProfilePresenter;
pub use view::{ErrorModel, View};
