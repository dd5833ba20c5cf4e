//! Access scoping and view projection.
//!
//! A [`Principal`] resolves to an [`AccessScope`] that filters what it can
//! read or mutate, and a [`ViewPolicy`] that decides which fields it sees.

mod principal;
mod scope;
mod view;

pub use principal::Principal;
pub use scope::AccessScope;
pub use view::{TransactionView, ViewPolicy, WalletView};
