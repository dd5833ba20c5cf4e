//! `SeaORM` entity definitions.

pub mod prelude;

pub mod accounts;
pub mod wallet_transactions;
pub mod wallets;
