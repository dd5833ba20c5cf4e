//! Balance mutator.
//!
//! The only code path that changes a wallet balance. Every call runs in one
//! unit of work: lock, compute, stage the wallet and the transaction row,
//! commit. Any failure rolls the whole unit back.

use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;
use tokio::time::timeout;
use tracing::{debug, info, warn};
use walletd_shared::types::{Amount, WalletId};

use super::balance::ledger_balance;
use super::error::{LedgerError, StoreError};
use super::store::{LedgerStore, LedgerUnit};
use super::types::{INSUFFICIENT_FUNDS_MSG, Memo, Reconciliation, Wallet, WalletTransaction};

/// Outcome of a single-wallet mutation.
#[derive(Debug, Clone)]
pub struct Applied {
    /// The recorded row.
    pub transaction: WalletTransaction,
    /// The wallet after the mutation.
    pub wallet: Wallet,
}

/// Outcome of a transfer, including rejected ones.
#[derive(Debug, Clone)]
pub struct Transferred {
    /// The recorded row, against the source wallet.
    pub transaction: WalletTransaction,
    /// The source wallet after the transfer.
    pub source: Wallet,
    /// The destination wallet after the transfer.
    pub destination: Wallet,
}

/// Applies amounts to wallets under per-wallet exclusive locks.
#[derive(Clone)]
pub struct BalanceMutator {
    store: Arc<dyn LedgerStore>,
    lock_timeout: Duration,
}

impl std::fmt::Debug for BalanceMutator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BalanceMutator")
            .field("lock_timeout", &self.lock_timeout)
            .finish_non_exhaustive()
    }
}

impl BalanceMutator {
    /// Creates a mutator over `store`. Lock waits are bounded by `lock_timeout`.
    #[must_use]
    pub fn new(store: Arc<dyn LedgerStore>, lock_timeout: Duration) -> Self {
        Self {
            store,
            lock_timeout,
        }
    }

    /// Records `amount` against a wallet and moves its balance accordingly.
    ///
    /// Zero amounts are recorded as `testing` rows and leave the balance as is.
    pub async fn apply(
        &self,
        wallet_id: WalletId,
        amount: Amount,
        memo: Memo,
    ) -> Result<Applied, LedgerError> {
        let mut unit = self.store.begin().await?;
        let outcome = self.apply_in(unit.as_mut(), wallet_id, amount, memo).await;
        let applied = finish(unit, outcome).await?;

        info!(
            wallet_id = %applied.wallet.id,
            transaction_id = %applied.transaction.id,
            kind = %applied.transaction.kind,
            amount = %applied.transaction.amount,
            balance = %applied.wallet.balance,
            "wallet transaction committed"
        );
        Ok(applied)
    }

    async fn apply_in(
        &self,
        unit: &mut dyn LedgerUnit,
        wallet_id: WalletId,
        amount: Amount,
        memo: Memo,
    ) -> Result<Applied, LedgerError> {
        let mut wallet = self.lock(unit, wallet_id).await?;
        let transaction = WalletTransaction::record(wallet_id, amount, memo);

        if transaction.kind.affects_balance() {
            wallet.balance = shifted(&wallet, amount.value())?;
            wallet.updated_at = transaction.created_at;
            unit.save_wallet(&wallet).await?;
        }
        unit.insert_transaction(&transaction).await?;

        Ok(Applied {
            transaction,
            wallet,
        })
    }

    /// Moves a positive `amount` from `source_id` to `destination_id`.
    ///
    /// One row is recorded against the source with the negated amount. When the
    /// source cannot cover the amount neither balance changes and the row is
    /// recorded with `done = false`.
    pub async fn transfer(
        &self,
        source_id: WalletId,
        destination_id: WalletId,
        amount: Amount,
        memo: Memo,
    ) -> Result<Transferred, LedgerError> {
        if source_id == destination_id {
            return Err(LedgerError::SameWallet);
        }
        if !amount.is_positive() {
            return Err(LedgerError::InvalidAmount(
                "transfer amount must be positive".into(),
            ));
        }

        let mut unit = self.store.begin().await?;
        let outcome = self
            .transfer_in(unit.as_mut(), source_id, destination_id, amount, memo)
            .await;
        let transferred = finish(unit, outcome).await?;

        info!(
            source_wallet_id = %source_id,
            destination_wallet_id = %destination_id,
            transaction_id = %transferred.transaction.id,
            amount = %amount,
            done = transferred.transaction.done,
            "wallet transfer committed"
        );
        Ok(transferred)
    }

    async fn transfer_in(
        &self,
        unit: &mut dyn LedgerUnit,
        source_id: WalletId,
        destination_id: WalletId,
        amount: Amount,
        memo: Memo,
    ) -> Result<Transferred, LedgerError> {
        // Ascending id order so opposing transfers cannot deadlock.
        let (first_id, second_id) = if source_id < destination_id {
            (source_id, destination_id)
        } else {
            (destination_id, source_id)
        };
        let first = self.lock(unit, first_id).await?;
        let second = self.lock(unit, second_id).await?;
        let (mut source, mut destination) = if first_id == source_id {
            (first, second)
        } else {
            (second, first)
        };

        let mut transaction = WalletTransaction::record(source_id, amount.negate(), memo);
        transaction.counterparty_wallet_id = Some(destination_id);

        if source.balance < amount.value() {
            debug!(
                wallet_id = %source_id,
                balance = %source.balance,
                amount = %amount,
                "transfer rejected for insufficient funds"
            );
            transaction = transaction.rejected(INSUFFICIENT_FUNDS_MSG);
        } else {
            source.balance = shifted(&source, -amount.value())?;
            destination.balance = shifted(&destination, amount.value())?;
            source.updated_at = transaction.created_at;
            destination.updated_at = transaction.created_at;
            unit.save_wallet(&source).await?;
            unit.save_wallet(&destination).await?;
        }
        unit.insert_transaction(&transaction).await?;

        Ok(Transferred {
            transaction,
            source,
            destination,
        })
    }

    /// Recomputes a wallet balance from its ledger while holding its lock.
    pub async fn reconcile(&self, wallet_id: WalletId) -> Result<Reconciliation, LedgerError> {
        let mut unit = self.store.begin().await?;
        let outcome = self.reconcile_in(unit.as_mut(), wallet_id).await;
        if let Err(e) = unit.rollback().await {
            warn!(error = %e, wallet_id = %wallet_id, "failed to release reconciliation unit");
        }
        outcome
    }

    async fn reconcile_in(
        &self,
        unit: &mut dyn LedgerUnit,
        wallet_id: WalletId,
    ) -> Result<Reconciliation, LedgerError> {
        let wallet = self.lock(unit, wallet_id).await?;
        let history = unit.wallet_history(wallet_id).await?;
        let ledger = ledger_balance(wallet_id, &history)
            .ok_or(LedgerError::BalanceOverflow(wallet_id))?;

        let consistent = ledger == wallet.balance;
        if !consistent {
            warn!(
                wallet_id = %wallet_id,
                recorded = %wallet.balance,
                ledger = %ledger,
                "wallet balance disagrees with its ledger"
            );
        }

        Ok(Reconciliation {
            wallet_id,
            recorded_balance: wallet.balance,
            ledger_balance: ledger,
            transaction_count: history.len() as u64,
            consistent,
        })
    }

    async fn lock(
        &self,
        unit: &mut dyn LedgerUnit,
        wallet_id: WalletId,
    ) -> Result<Wallet, LedgerError> {
        match timeout(self.lock_timeout, unit.lock_wallet(wallet_id)).await {
            Ok(Ok(Some(wallet))) => Ok(wallet),
            Ok(Ok(None)) => Err(LedgerError::WalletNotFound(wallet_id)),
            Ok(Err(StoreError::LockTimeout)) | Err(_) => Err(LedgerError::LockTimeout(wallet_id)),
            Ok(Err(e)) => Err(e.into()),
        }
    }
}

fn shifted(wallet: &Wallet, delta: Decimal) -> Result<Decimal, LedgerError> {
    wallet
        .balance
        .checked_add(delta)
        .ok_or(LedgerError::BalanceOverflow(wallet.id))
}

async fn finish<T>(
    unit: Box<dyn LedgerUnit>,
    outcome: Result<T, LedgerError>,
) -> Result<T, LedgerError> {
    match outcome {
        Ok(value) => {
            if let Err(e) = unit.commit().await {
                warn!(error = %e, "ledger unit commit failed");
                return Err(e.into());
            }
            Ok(value)
        }
        Err(err) => {
            warn!(error = %err, "ledger unit rolled back");
            if let Err(e) = unit.rollback().await {
                warn!(error = %e, "ledger unit rollback failed");
            }
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::kind::Kind;
    use crate::ledger::store::TransactionFilter;
    use crate::ledger::types::Account;
    use crate::memory::MemoryLedgerStore;
    use rust_decimal_macros::dec;
    use walletd_shared::types::{PageRequest, UserId};

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn amount(s: &str) -> Amount {
        s.parse().unwrap()
    }

    async fn setup() -> (Arc<MemoryLedgerStore>, BalanceMutator, WalletId) {
        let store = Arc::new(MemoryLedgerStore::new());
        let wallet_id = open_wallet(&store).await;
        let mutator = BalanceMutator::new(store.clone(), TIMEOUT);
        (store, mutator, wallet_id)
    }

    async fn open_wallet(store: &MemoryLedgerStore) -> WalletId {
        let account = Account::new(UserId::new(), "Ada", "Lovelace");
        store.insert_account(&account).await.unwrap();
        let wallet = Wallet::open(account.id);
        store.insert_wallet(&wallet).await.unwrap();
        wallet.id
    }

    async fn balance(store: &MemoryLedgerStore, id: WalletId) -> Decimal {
        store.find_wallet(id).await.unwrap().unwrap().balance
    }

    async fn rows(store: &MemoryLedgerStore, id: WalletId) -> Vec<WalletTransaction> {
        let filter = TransactionFilter {
            wallet_id: Some(id),
            ..TransactionFilter::default()
        };
        store
            .list_transactions(filter, PageRequest::new(1, 100))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_deposit_moves_balance_and_records_row() {
        let (store, mutator, wallet_id) = setup().await;

        let applied = mutator
            .apply(wallet_id, amount("10.00"), Memo::described("top up"))
            .await
            .unwrap();

        assert_eq!(applied.transaction.kind, Kind::Deposit);
        assert!(applied.transaction.done);
        assert_eq!(applied.transaction.error_msg, None);
        assert_eq!(applied.wallet.balance, dec!(10.00));
        assert_eq!(balance(&store, wallet_id).await, dec!(10.00));
        assert_eq!(rows(&store, wallet_id).await, vec![applied.transaction]);
    }

    #[tokio::test]
    async fn test_withdraw_uses_negative_amount() {
        let (store, mutator, wallet_id) = setup().await;
        mutator
            .apply(wallet_id, amount("10.00"), Memo::default())
            .await
            .unwrap();

        let applied = mutator
            .apply(wallet_id, amount("-5.50"), Memo::default())
            .await
            .unwrap();

        assert_eq!(applied.transaction.kind, Kind::Withdraw);
        assert_eq!(balance(&store, wallet_id).await, dec!(4.50));
    }

    #[tokio::test]
    async fn test_zero_amount_is_recorded_without_balance_change() {
        let (store, mutator, wallet_id) = setup().await;

        let applied = mutator
            .apply(wallet_id, Amount::ZERO, Memo::default())
            .await
            .unwrap();

        assert_eq!(applied.transaction.kind, Kind::Testing);
        assert!(applied.transaction.done);
        assert_eq!(balance(&store, wallet_id).await, Decimal::ZERO);
        assert_eq!(rows(&store, wallet_id).await.len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_wallet_records_nothing() {
        let (store, mutator, _) = setup().await;
        let missing = WalletId::new();

        let result = mutator.apply(missing, amount("1.00"), Memo::default()).await;

        assert!(matches!(result, Err(LedgerError::WalletNotFound(id)) if id == missing));
        assert!(rows(&store, missing).await.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_mutations_serialize_per_wallet() {
        let (store, mutator, wallet_id) = setup().await;
        mutator
            .apply(wallet_id, amount("100.00"), Memo::default())
            .await
            .unwrap();

        let n = 50;
        let mut handles = Vec::with_capacity(n);
        for _ in 0..n {
            let mutator = mutator.clone();
            handles.push(tokio::spawn(async move {
                mutator
                    .apply(wallet_id, amount("2.50"), Memo::default())
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(balance(&store, wallet_id).await, dec!(225.00));
        assert_eq!(rows(&store, wallet_id).await.len(), n + 1);
    }

    #[tokio::test]
    async fn test_insert_failure_rolls_back_balance() {
        let (store, mutator, wallet_id) = setup().await;
        mutator
            .apply(wallet_id, amount("10.00"), Memo::default())
            .await
            .unwrap();

        store.fail_next_insert();
        let result = mutator
            .apply(wallet_id, amount("5.00"), Memo::default())
            .await;

        assert!(matches!(
            result,
            Err(LedgerError::Store(StoreError::Backend(_)))
        ));
        assert_eq!(balance(&store, wallet_id).await, dec!(10.00));
        assert_eq!(rows(&store, wallet_id).await.len(), 1);
    }

    #[tokio::test]
    async fn test_commit_failure_leaves_no_trace() {
        let (store, mutator, wallet_id) = setup().await;

        store.fail_next_commit();
        let result = mutator
            .apply(wallet_id, amount("7.00"), Memo::default())
            .await;

        assert!(result.is_err());
        assert_eq!(balance(&store, wallet_id).await, Decimal::ZERO);
        assert!(rows(&store, wallet_id).await.is_empty());

        mutator
            .apply(wallet_id, amount("7.00"), Memo::default())
            .await
            .unwrap();
        assert_eq!(balance(&store, wallet_id).await, dec!(7.00));
    }

    #[tokio::test]
    async fn test_lock_wait_is_bounded() {
        let (store, _, wallet_id) = setup().await;
        let impatient = BalanceMutator::new(store.clone(), Duration::from_millis(50));

        let mut holder = store.begin().await.unwrap();
        holder.lock_wallet(wallet_id).await.unwrap();

        let result = impatient
            .apply(wallet_id, amount("1.00"), Memo::default())
            .await;
        assert!(matches!(result, Err(LedgerError::LockTimeout(id)) if id == wallet_id));
        assert!(rows(&store, wallet_id).await.is_empty());

        drop(holder);
        impatient
            .apply(wallet_id, amount("1.00"), Memo::default())
            .await
            .unwrap();
        assert_eq!(balance(&store, wallet_id).await, dec!(1.00));
    }

    #[tokio::test]
    async fn test_cancelled_mutation_leaves_no_trace() {
        let (store, mutator, wallet_id) = setup().await;

        let mut holder = store.begin().await.unwrap();
        holder.lock_wallet(wallet_id).await.unwrap();

        let pending = mutator.apply(wallet_id, amount("3.00"), Memo::default());
        let cancelled = timeout(Duration::from_millis(20), pending).await;
        assert!(cancelled.is_err());
        drop(holder);

        assert_eq!(balance(&store, wallet_id).await, Decimal::ZERO);
        assert!(rows(&store, wallet_id).await.is_empty());
    }

    #[tokio::test]
    async fn test_transfer_moves_funds() {
        let (store, mutator, source) = setup().await;
        let destination = open_wallet(&store).await;
        mutator
            .apply(source, amount("20.00"), Memo::default())
            .await
            .unwrap();

        let transferred = mutator
            .transfer(source, destination, amount("15.00"), Memo::described("rent"))
            .await
            .unwrap();

        let row = &transferred.transaction;
        assert!(row.done);
        assert_eq!(row.wallet_id, source);
        assert_eq!(row.counterparty_wallet_id, Some(destination));
        assert_eq!(row.amount, amount("-15.00"));
        assert_eq!(row.kind, Kind::Withdraw);
        assert_eq!(balance(&store, source).await, dec!(5.00));
        assert_eq!(balance(&store, destination).await, dec!(15.00));
    }

    #[tokio::test]
    async fn test_transfer_with_insufficient_funds_is_recorded_not_applied() {
        let (store, mutator, source) = setup().await;
        let destination = open_wallet(&store).await;
        mutator
            .apply(source, amount("10.00"), Memo::default())
            .await
            .unwrap();

        let transferred = mutator
            .transfer(source, destination, amount("15.00"), Memo::default())
            .await
            .unwrap();

        let row = &transferred.transaction;
        assert!(!row.done);
        assert_eq!(row.error_msg.as_deref(), Some(INSUFFICIENT_FUNDS_MSG));
        assert_eq!(balance(&store, source).await, dec!(10.00));
        assert_eq!(balance(&store, destination).await, Decimal::ZERO);
        assert_eq!(rows(&store, source).await.len(), 2);
        assert_eq!(rows(&store, destination).await.len(), 1);
    }

    #[tokio::test]
    async fn test_transfer_insert_failure_rolls_back_both_wallets() {
        let (store, mutator, source) = setup().await;
        let destination = open_wallet(&store).await;
        mutator
            .apply(source, amount("20.00"), Memo::default())
            .await
            .unwrap();

        store.fail_next_insert();
        let result = mutator
            .transfer(source, destination, amount("15.00"), Memo::default())
            .await;

        assert!(matches!(
            result,
            Err(LedgerError::Store(StoreError::Backend(_)))
        ));
        assert_eq!(balance(&store, source).await, dec!(20.00));
        assert_eq!(balance(&store, destination).await, Decimal::ZERO);
        assert_eq!(rows(&store, source).await.len(), 1);
        assert!(rows(&store, destination).await.is_empty());
    }

    #[tokio::test]
    async fn test_transfer_commit_failure_rolls_back_both_wallets() {
        let (store, mutator, source) = setup().await;
        let destination = open_wallet(&store).await;
        mutator
            .apply(source, amount("20.00"), Memo::default())
            .await
            .unwrap();

        store.fail_next_commit();
        let result = mutator
            .transfer(source, destination, amount("15.00"), Memo::default())
            .await;

        assert!(result.is_err());
        assert_eq!(balance(&store, source).await, dec!(20.00));
        assert_eq!(balance(&store, destination).await, Decimal::ZERO);
        assert_eq!(rows(&store, source).await.len(), 1);
        assert!(rows(&store, destination).await.is_empty());

        mutator
            .transfer(source, destination, amount("15.00"), Memo::default())
            .await
            .unwrap();
        assert_eq!(balance(&store, source).await, dec!(5.00));
        assert_eq!(balance(&store, destination).await, dec!(15.00));
    }

    #[tokio::test]
    async fn test_transfer_rejects_same_wallet_and_non_positive_amounts() {
        let (_, mutator, source) = setup().await;

        let same = mutator
            .transfer(source, source, amount("1.00"), Memo::default())
            .await;
        assert!(matches!(same, Err(LedgerError::SameWallet)));

        let negative = mutator
            .transfer(source, WalletId::new(), amount("-1.00"), Memo::default())
            .await;
        assert!(matches!(negative, Err(LedgerError::InvalidAmount(_))));
    }

    #[tokio::test]
    async fn test_transfer_to_missing_wallet_changes_nothing() {
        let (store, mutator, source) = setup().await;
        mutator
            .apply(source, amount("10.00"), Memo::default())
            .await
            .unwrap();

        let result = mutator
            .transfer(source, WalletId::new(), amount("1.00"), Memo::default())
            .await;

        assert!(matches!(result, Err(LedgerError::WalletNotFound(_))));
        assert_eq!(balance(&store, source).await, dec!(10.00));
        assert_eq!(rows(&store, source).await.len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_opposing_transfers_do_not_deadlock() {
        let (store, mutator, a) = setup().await;
        let b = open_wallet(&store).await;
        mutator.apply(a, amount("500.00"), Memo::default()).await.unwrap();
        mutator.apply(b, amount("500.00"), Memo::default()).await.unwrap();

        let mut handles = Vec::new();
        for i in 0..40 {
            let mutator = mutator.clone();
            let (from, to) = if i % 2 == 0 { (a, b) } else { (b, a) };
            handles.push(tokio::spawn(async move {
                mutator
                    .transfer(from, to, amount("1.00"), Memo::default())
                    .await
            }));
        }
        for handle in handles {
            assert!(handle.await.unwrap().unwrap().transaction.done);
        }

        assert_eq!(balance(&store, a).await, dec!(500.00));
        assert_eq!(balance(&store, b).await, dec!(500.00));
    }

    #[tokio::test]
    async fn test_reconcile_matches_history() {
        let (store, mutator, source) = setup().await;
        let destination = open_wallet(&store).await;
        mutator.apply(source, amount("12.00"), Memo::default()).await.unwrap();
        mutator.apply(source, Amount::ZERO, Memo::default()).await.unwrap();
        mutator
            .transfer(source, destination, amount("2.00"), Memo::default())
            .await
            .unwrap();
        mutator
            .transfer(source, destination, amount("50.00"), Memo::default())
            .await
            .unwrap();

        let report = mutator.reconcile(source).await.unwrap();
        assert!(report.consistent);
        assert_eq!(report.recorded_balance, dec!(10.00));
        assert_eq!(report.transaction_count, 4);

        let report = mutator.reconcile(destination).await.unwrap();
        assert!(report.consistent);
        assert_eq!(report.ledger_balance, dec!(2.00));
        assert_eq!(report.transaction_count, 2);
    }
}
