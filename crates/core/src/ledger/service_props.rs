//! Property-based tests for the ledger.
//!
//! - Balance integrity: every wallet balance equals the sum of its completed,
//!   balance-affecting rows after any history of deposits, withdrawals and
//!   transfers.
//! - Repeatable reads: listing twice without writes yields the same page.

use std::sync::Arc;

use proptest::prelude::*;
use rust_decimal::Decimal;
use walletd_shared::LedgerConfig;
use walletd_shared::types::{Amount, PageRequest, UserId};

use super::balance::ledger_balance;
use super::service::LedgerService;
use super::store::{LedgerStore, TransactionFilter};
use super::types::{Account, NewTransaction, NewTransfer, Wallet};
use crate::access::Principal;
use crate::memory::MemoryLedgerStore;

const WALLETS: usize = 3;

#[derive(Debug, Clone)]
enum Op {
    Apply { wallet: usize, cents: i64 },
    Transfer { from: usize, to: usize, cents: i64 },
}

/// Strategy to generate amounts (-999.99 to 999.99, zero included).
fn cents() -> impl Strategy<Value = i64> {
    -99_999i64..=99_999i64
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..WALLETS, cents()).prop_map(|(wallet, cents)| Op::Apply { wallet, cents }),
        (0..WALLETS, 0..WALLETS, 1i64..=99_999i64)
            .prop_map(|(from, to, cents)| Op::Transfer { from, to, cents }),
    ]
}

fn amount(cents: i64) -> Amount {
    Amount::new(Decimal::new(cents, 2)).unwrap()
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .unwrap()
}

async fn run_history(ops: &[Op]) -> (Arc<MemoryLedgerStore>, LedgerService, Principal, Vec<Wallet>) {
    let store = Arc::new(MemoryLedgerStore::new());
    let service = LedgerService::new(store.clone(), &LedgerConfig::default());
    let staff = Principal::staff(UserId::new(), None);

    let account = Account::new(UserId::new(), "Prop", "Test");
    store.insert_account(&account).await.unwrap();
    let mut wallets = Vec::with_capacity(WALLETS);
    for _ in 0..WALLETS {
        let wallet = Wallet::open(account.id);
        store.insert_wallet(&wallet).await.unwrap();
        wallets.push(wallet);
    }

    for op in ops {
        // Same-wallet transfers are rejected without a row; that is fine here.
        let _ = match *op {
            Op::Apply { wallet, cents } => service
                .create_transaction(
                    &staff,
                    NewTransaction {
                        wallet_id: wallets[wallet].id,
                        amount: amount(cents),
                        description: None,
                        extra_info: None,
                    },
                )
                .await
                .map(|_| ()),
            Op::Transfer { from, to, cents } => service
                .transfer(
                    &staff,
                    NewTransfer {
                        source_wallet_id: wallets[from].id,
                        destination_wallet_id: wallets[to].id,
                        amount: amount(cents),
                        description: None,
                    },
                )
                .await
                .map(|_| ()),
        };
    }

    (store, service, staff, wallets)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// *For any* history, each wallet balance equals its ledger sum and
    /// reconciliation reports it as consistent.
    #[test]
    fn prop_balance_equals_ledger_sum(ops in prop::collection::vec(op(), 0..40)) {
        runtime().block_on(async {
            let (store, service, staff, wallets) = run_history(&ops).await;
            let rows = store
                .list_transactions(TransactionFilter::default(), PageRequest::new(1, 100))
                .await
                .unwrap();

            for wallet in &wallets {
                let stored = store.find_wallet(wallet.id).await.unwrap().unwrap();
                let expected = ledger_balance(wallet.id, &rows).unwrap();
                prop_assert_eq!(stored.balance, expected);

                let report = service.reconcile(&staff, wallet.id).await.unwrap();
                prop_assert!(report.consistent);
            }
            Ok(())
        })?;
    }

    /// *For any* history, transfers never create or destroy money.
    #[test]
    fn prop_transfers_conserve_total(ops in prop::collection::vec(op(), 0..40)) {
        runtime().block_on(async {
            let (store, _, _, wallets) = run_history(&ops).await;
            let applied: Decimal = ops
                .iter()
                .filter_map(|op| match *op {
                    Op::Apply { cents, .. } => Some(Decimal::new(cents, 2)),
                    Op::Transfer { .. } => None,
                })
                .sum();

            let mut total = Decimal::ZERO;
            for wallet in &wallets {
                total += store.find_wallet(wallet.id).await.unwrap().unwrap().balance;
            }
            prop_assert_eq!(total, applied);
            Ok(())
        })?;
    }

    /// *For any* history, listing twice yields identical ordered pages.
    #[test]
    fn prop_listing_is_repeatable(ops in prop::collection::vec(op(), 0..20)) {
        runtime().block_on(async {
            let (_, service, staff, _) = run_history(&ops).await;
            let first = service
                .list_transactions(&staff, None, PageRequest::default())
                .await
                .unwrap();
            let second = service
                .list_transactions(&staff, None, PageRequest::default())
                .await
                .unwrap();
            prop_assert_eq!(first.data, second.data);
            prop_assert_eq!(first.meta, second.meta);
            Ok(())
        })?;
    }
}
