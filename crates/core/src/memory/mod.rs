//! In-memory `LedgerStore`.
//!
//! Wallet locks are async mutexes keyed by wallet id, so units on different
//! wallets never contend. Units stage their writes and only publish them on
//! commit. Used by tests and by the API test harness.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use walletd_shared::types::{AccountId, PageRequest, TransactionId, WalletId};

use crate::ledger::error::StoreError;
use crate::ledger::store::{LedgerStore, LedgerUnit, TransactionFilter, WalletFilter};
use crate::ledger::types::{Account, Wallet, WalletTransaction};

#[derive(Default)]
struct Inner {
    accounts: DashMap<AccountId, Account>,
    wallets: DashMap<WalletId, Wallet>,
    transactions: DashMap<TransactionId, WalletTransaction>,
    locks: DashMap<WalletId, Arc<Mutex<()>>>,
    fail_next_insert: AtomicBool,
    fail_next_commit: AtomicBool,
    fail_next_count: AtomicBool,
}

impl Inner {
    fn owner_of(&self, wallet_id: WalletId) -> Option<AccountId> {
        self.wallets.get(&wallet_id).map(|w| w.account_id)
    }

    fn matches(&self, row: &WalletTransaction, filter: TransactionFilter) -> bool {
        if let Some(wallet_id) = filter.wallet_id {
            if !row.touches(wallet_id) {
                return false;
            }
        }
        if let Some(account_id) = filter.account_id {
            let own = self.owner_of(row.wallet_id) == Some(account_id);
            let counterparty = row
                .counterparty_wallet_id
                .and_then(|id| self.owner_of(id))
                == Some(account_id);
            if !own && !counterparty {
                return false;
            }
        }
        true
    }

    fn sorted_transactions(&self, filter: TransactionFilter) -> Vec<WalletTransaction> {
        let mut rows: Vec<WalletTransaction> = self
            .transactions
            .iter()
            .filter(|r| self.matches(r.value(), filter))
            .map(|r| r.value().clone())
            .collect();
        rows.sort_by_key(|r| (r.created_at, r.id));
        rows
    }

    fn sorted_wallets(&self, filter: WalletFilter) -> Vec<Wallet> {
        let mut wallets: Vec<Wallet> = self
            .wallets
            .iter()
            .filter(|w| filter.account_id.is_none_or(|a| w.account_id == a))
            .map(|w| w.value().clone())
            .collect();
        wallets.sort_by_key(|w| (w.created_at, w.id));
        wallets
    }
}

/// Thread-safe in-memory ledger store.
#[derive(Clone, Default)]
pub struct MemoryLedgerStore {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for MemoryLedgerStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryLedgerStore")
            .field("wallets", &self.inner.wallets.len())
            .field("transactions", &self.inner.transactions.len())
            .finish_non_exhaustive()
    }
}

impl MemoryLedgerStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `insert_transaction` call fail.
    pub fn fail_next_insert(&self) {
        self.inner.fail_next_insert.store(true, Ordering::SeqCst);
    }

    /// Makes the next `commit` call fail.
    pub fn fail_next_commit(&self) {
        self.inner.fail_next_commit.store(true, Ordering::SeqCst);
    }

    /// Makes the next `count_wallets` call fail.
    pub fn fail_next_count(&self) {
        self.inner.fail_next_count.store(true, Ordering::SeqCst);
    }
}

fn page_of<T>(items: Vec<T>, page: PageRequest) -> Vec<T> {
    let offset = usize::try_from(page.offset()).unwrap_or(usize::MAX);
    let limit = usize::try_from(page.limit()).unwrap_or(usize::MAX);
    items.into_iter().skip(offset).take(limit).collect()
}

#[async_trait]
impl LedgerStore for MemoryLedgerStore {
    async fn begin(&self) -> Result<Box<dyn LedgerUnit>, StoreError> {
        Ok(Box::new(MemoryUnit {
            inner: self.inner.clone(),
            guards: HashMap::new(),
            staged_wallets: HashMap::new(),
            staged_transactions: Vec::new(),
        }))
    }

    async fn find_account(&self, id: AccountId) -> Result<Option<Account>, StoreError> {
        Ok(self.inner.accounts.get(&id).map(|a| a.value().clone()))
    }

    async fn insert_account(&self, account: &Account) -> Result<(), StoreError> {
        if self
            .inner
            .accounts
            .iter()
            .any(|a| a.user_id == account.user_id)
        {
            return Err(StoreError::Backend(format!(
                "user {} already has an account",
                account.user_id
            )));
        }
        self.inner.accounts.insert(account.id, account.clone());
        Ok(())
    }

    async fn find_wallet(&self, id: WalletId) -> Result<Option<Wallet>, StoreError> {
        Ok(self.inner.wallets.get(&id).map(|w| w.value().clone()))
    }

    async fn insert_wallet(&self, wallet: &Wallet) -> Result<(), StoreError> {
        if !self.inner.accounts.contains_key(&wallet.account_id) {
            return Err(StoreError::Backend(format!(
                "account {} does not exist",
                wallet.account_id
            )));
        }
        self.inner.wallets.insert(wallet.id, wallet.clone());
        Ok(())
    }

    async fn list_wallets(
        &self,
        filter: WalletFilter,
        page: PageRequest,
    ) -> Result<Vec<Wallet>, StoreError> {
        Ok(page_of(self.inner.sorted_wallets(filter), page))
    }

    async fn count_wallets(&self, filter: WalletFilter) -> Result<u64, StoreError> {
        if self.inner.fail_next_count.swap(false, Ordering::SeqCst) {
            return Err(StoreError::Backend("injected count failure".into()));
        }
        Ok(self.inner.sorted_wallets(filter).len() as u64)
    }

    async fn find_transaction(
        &self,
        id: TransactionId,
    ) -> Result<Option<WalletTransaction>, StoreError> {
        Ok(self.inner.transactions.get(&id).map(|t| t.value().clone()))
    }

    async fn list_transactions(
        &self,
        filter: TransactionFilter,
        page: PageRequest,
    ) -> Result<Vec<WalletTransaction>, StoreError> {
        Ok(page_of(self.inner.sorted_transactions(filter), page))
    }

    async fn count_transactions(&self, filter: TransactionFilter) -> Result<u64, StoreError> {
        Ok(self.inner.sorted_transactions(filter).len() as u64)
    }
}

struct MemoryUnit {
    inner: Arc<Inner>,
    guards: HashMap<WalletId, OwnedMutexGuard<()>>,
    staged_wallets: HashMap<WalletId, Wallet>,
    staged_transactions: Vec<WalletTransaction>,
}

#[async_trait]
impl LedgerUnit for MemoryUnit {
    async fn lock_wallet(&mut self, id: WalletId) -> Result<Option<Wallet>, StoreError> {
        if !self.guards.contains_key(&id) {
            if !self.inner.wallets.contains_key(&id) {
                return Ok(None);
            }
            let lock = self.inner.locks.entry(id).or_default().value().clone();
            let guard = lock.lock_owned().await;
            self.guards.insert(id, guard);
        }

        if let Some(staged) = self.staged_wallets.get(&id) {
            return Ok(Some(staged.clone()));
        }
        Ok(self.inner.wallets.get(&id).map(|w| w.value().clone()))
    }

    async fn save_wallet(&mut self, wallet: &Wallet) -> Result<(), StoreError> {
        if !self.guards.contains_key(&wallet.id) {
            return Err(StoreError::Backend(format!(
                "wallet {} saved without holding its lock",
                wallet.id
            )));
        }
        self.staged_wallets.insert(wallet.id, wallet.clone());
        Ok(())
    }

    async fn wallet_history(
        &mut self,
        wallet_id: WalletId,
    ) -> Result<Vec<WalletTransaction>, StoreError> {
        Ok(self.inner.sorted_transactions(TransactionFilter {
            wallet_id: Some(wallet_id),
            account_id: None,
        }))
    }

    async fn insert_transaction(
        &mut self,
        transaction: &WalletTransaction,
    ) -> Result<(), StoreError> {
        if self.inner.fail_next_insert.swap(false, Ordering::SeqCst) {
            return Err(StoreError::Backend("injected insert failure".into()));
        }
        self.staged_transactions.push(transaction.clone());
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        if self.inner.fail_next_commit.swap(false, Ordering::SeqCst) {
            return Err(StoreError::Backend("injected commit failure".into()));
        }
        let MemoryUnit {
            inner,
            guards,
            staged_wallets,
            staged_transactions,
        } = *self;

        for (id, wallet) in staged_wallets {
            inner.wallets.insert(id, wallet);
        }
        for transaction in staged_transactions {
            inner.transactions.insert(transaction.id, transaction);
        }
        drop(guards);
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        Ok(())
    }
}
