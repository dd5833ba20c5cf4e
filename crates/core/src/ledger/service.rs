//! Ledger service façade.
//!
//! Every operation resolves the caller's scope first. Entities outside the
//! scope are reported as not found before any lock is taken.

use std::sync::Arc;

use tracing::info;
use walletd_shared::LedgerConfig;
use walletd_shared::types::{AccountId, PageRequest, PageResponse, TransactionId, WalletId};

use super::error::LedgerError;
use super::mutator::BalanceMutator;
use super::store::{LedgerStore, TransactionFilter};
use super::types::{
    MAX_TEXT_LEN, Memo, NewTransaction, NewTransfer, Reconciliation, Wallet, WalletTransaction,
};
use crate::access::{AccessScope, Principal, TransactionView, WalletView};

/// Composes scoping, projection and the balance mutator.
#[derive(Clone)]
pub struct LedgerService {
    store: Arc<dyn LedgerStore>,
    mutator: BalanceMutator,
}

impl std::fmt::Debug for LedgerService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LedgerService")
            .field("mutator", &self.mutator)
            .finish_non_exhaustive()
    }
}

impl LedgerService {
    /// Creates a service over `store`.
    #[must_use]
    pub fn new(store: Arc<dyn LedgerStore>, config: &LedgerConfig) -> Self {
        let mutator = BalanceMutator::new(store.clone(), config.lock_timeout());
        Self { store, mutator }
    }

    /// Returns the underlying store.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn LedgerStore> {
        &self.store
    }

    /// Opens an empty wallet.
    ///
    /// Regular principals may only open wallets for their own account; when
    /// `account_id` is omitted the principal's own account is used.
    pub async fn create_wallet(
        &self,
        principal: &Principal,
        account_id: Option<AccountId>,
    ) -> Result<WalletView, LedgerError> {
        let account_id = account_id.or(principal.account_id).ok_or_else(|| {
            LedgerError::InvalidInput("account_id is required".into())
        })?;
        if !principal.scope().permits_account(account_id) {
            return Err(LedgerError::AccountNotFound(account_id));
        }
        if self.store.find_account(account_id).await?.is_none() {
            return Err(LedgerError::AccountNotFound(account_id));
        }

        let wallet = Wallet::open(account_id);
        self.store.insert_wallet(&wallet).await?;

        info!(wallet_id = %wallet.id, account_id = %account_id, "wallet opened");
        Ok(principal.view_policy().wallet(&wallet))
    }

    /// Lists the wallets visible to `principal`.
    pub async fn list_wallets(
        &self,
        principal: &Principal,
        page: PageRequest,
    ) -> Result<PageResponse<WalletView>, LedgerError> {
        let page = page.clamped();
        let Some(filter) = principal.scope().wallet_filter() else {
            return Ok(PageResponse::new(Vec::new(), page, 0));
        };

        let wallets = self.store.list_wallets(filter, page).await?;
        let total = self.store.count_wallets(filter).await?;
        let policy = principal.view_policy();
        Ok(PageResponse::new(
            wallets.iter().map(|w| policy.wallet(w)).collect(),
            page,
            total,
        ))
    }

    /// Returns one wallet.
    pub async fn get_wallet(
        &self,
        principal: &Principal,
        wallet_id: WalletId,
    ) -> Result<WalletView, LedgerError> {
        let wallet = self.scoped_wallet(principal, wallet_id).await?;
        Ok(principal.view_policy().wallet(&wallet))
    }

    /// Records an amount against a wallet in scope.
    pub async fn create_transaction(
        &self,
        principal: &Principal,
        input: NewTransaction,
    ) -> Result<TransactionView, LedgerError> {
        validate_text("description", input.description.as_deref())?;
        if input.extra_info.is_some() && !principal.is_privileged {
            return Err(LedgerError::InvalidInput(
                "extra_info may only be set by staff".into(),
            ));
        }
        let wallet = self.scoped_wallet(principal, input.wallet_id).await?;

        let memo = Memo {
            description: input.description,
            extra_info: input.extra_info,
        };
        let applied = self.mutator.apply(wallet.id, input.amount, memo).await?;
        Ok(principal.view_policy().transaction(&applied.transaction))
    }

    /// Moves funds from a wallet in scope to any existing wallet.
    pub async fn transfer(
        &self,
        principal: &Principal,
        input: NewTransfer,
    ) -> Result<TransactionView, LedgerError> {
        validate_text("description", input.description.as_deref())?;
        let source = self
            .scoped_wallet(principal, input.source_wallet_id)
            .await?;

        let memo = Memo {
            description: input.description,
            extra_info: None,
        };
        let transferred = self
            .mutator
            .transfer(source.id, input.destination_wallet_id, input.amount, memo)
            .await?;
        Ok(principal.view_policy().transaction(&transferred.transaction))
    }

    /// Lists visible transaction rows, optionally only those touching one wallet.
    pub async fn list_transactions(
        &self,
        principal: &Principal,
        wallet_id: Option<WalletId>,
        page: PageRequest,
    ) -> Result<PageResponse<TransactionView>, LedgerError> {
        let page = page.clamped();
        let filter = match wallet_id {
            Some(id) => {
                self.scoped_wallet(principal, id).await?;
                Some(TransactionFilter {
                    account_id: None,
                    wallet_id: Some(id),
                })
            }
            None => principal.scope().transaction_filter(),
        };
        let Some(filter) = filter else {
            return Ok(PageResponse::new(Vec::new(), page, 0));
        };

        let rows = self.store.list_transactions(filter, page).await?;
        let total = self.store.count_transactions(filter).await?;
        let policy = principal.view_policy();
        Ok(PageResponse::new(
            rows.iter().map(|r| policy.transaction(r)).collect(),
            page,
            total,
        ))
    }

    /// Returns one transaction row.
    pub async fn get_transaction(
        &self,
        principal: &Principal,
        transaction_id: TransactionId,
    ) -> Result<TransactionView, LedgerError> {
        let not_found = || LedgerError::TransactionNotFound(transaction_id);
        let row = self
            .store
            .find_transaction(transaction_id)
            .await?
            .ok_or_else(not_found)?;
        if !self.row_visible(principal.scope(), &row).await? {
            return Err(not_found());
        }
        Ok(principal.view_policy().transaction(&row))
    }

    /// Recomputes a wallet balance from its ledger.
    pub async fn reconcile(
        &self,
        principal: &Principal,
        wallet_id: WalletId,
    ) -> Result<Reconciliation, LedgerError> {
        let wallet = self.scoped_wallet(principal, wallet_id).await?;
        self.mutator.reconcile(wallet.id).await
    }

    async fn scoped_wallet(
        &self,
        principal: &Principal,
        wallet_id: WalletId,
    ) -> Result<Wallet, LedgerError> {
        self.store
            .find_wallet(wallet_id)
            .await?
            .filter(|w| principal.scope().permits_wallet(w))
            .ok_or(LedgerError::WalletNotFound(wallet_id))
    }

    async fn row_visible(
        &self,
        scope: AccessScope,
        row: &WalletTransaction,
    ) -> Result<bool, LedgerError> {
        match scope {
            AccessScope::All => Ok(true),
            AccessScope::Empty => Ok(false),
            AccessScope::Owner(_) => {
                let sides = std::iter::once(row.wallet_id).chain(row.counterparty_wallet_id);
                for wallet_id in sides {
                    if let Some(wallet) = self.store.find_wallet(wallet_id).await? {
                        if scope.permits_wallet(&wallet) {
                            return Ok(true);
                        }
                    }
                }
                Ok(false)
            }
        }
    }
}

fn validate_text(field: &str, value: Option<&str>) -> Result<(), LedgerError> {
    match value {
        Some(text) if text.chars().count() > MAX_TEXT_LEN => Err(LedgerError::InvalidInput(
            format!("{field} must be at most {MAX_TEXT_LEN} characters"),
        )),
        _ => Ok(()),
    }
}
