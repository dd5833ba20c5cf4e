//! Entity re-exports.

pub use super::accounts::Entity as Accounts;
pub use super::wallet_transactions::Entity as WalletTransactions;
pub use super::wallets::Entity as Wallets;
