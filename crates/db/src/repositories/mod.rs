//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.
//! Methods that must run inside a ledger unit take the connection explicitly.

pub mod account;
pub mod wallet;
pub mod wallet_transaction;

pub use account::AccountRepository;
pub use wallet::WalletRepository;
pub use wallet_transaction::WalletTransactionRepository;
