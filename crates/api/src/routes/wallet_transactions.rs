//! Wallet transaction routes.
//!
//! Rows are created by recording an amount or a transfer. There are no
//! update or delete routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use serde::Deserialize;
use walletd_core::TransactionView;
use walletd_core::ledger::{NewTransaction, NewTransfer};
use walletd_shared::types::{PageRequest, PageResponse, TransactionId, WalletId};

use crate::extractors::{ValidatedJson, ValidatedQuery};
use crate::{ApiError, AppState, middleware::AuthUser};

/// Creates the wallet transaction routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/wallet-transactions",
            get(list_transactions).post(create_transaction),
        )
        .route("/wallet-transactions/transfers", post(create_transfer))
        .route("/wallet-transactions/{transaction_id}", get(get_transaction))
}

/// Query parameters for listing wallet transactions.
#[derive(Debug, Default, Deserialize)]
pub struct ListTransactionsQuery {
    /// Page number (1-indexed).
    pub page: Option<u32>,
    /// Items per page.
    pub per_page: Option<u32>,
    /// Only rows touching this wallet.
    pub wallet_id: Option<WalletId>,
}

impl ListTransactionsQuery {
    fn page(&self) -> PageRequest {
        let default = PageRequest::default();
        PageRequest::new(
            self.page.unwrap_or(default.page),
            self.per_page.unwrap_or(default.per_page),
        )
    }
}

/// POST `/wallet-transactions` - Record a signed amount against a wallet.
async fn create_transaction(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(payload): ValidatedJson<NewTransaction>,
) -> Result<(StatusCode, Json<TransactionView>), ApiError> {
    let row = state
        .ledger
        .create_transaction(&auth.principal(), payload)
        .await?;
    Ok((StatusCode::CREATED, Json(row)))
}

/// POST `/wallet-transactions/transfers` - Move funds between two wallets.
///
/// A transfer refused for lack of funds is still recorded and returned with
/// `done: false`.
async fn create_transfer(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(payload): ValidatedJson<NewTransfer>,
) -> Result<(StatusCode, Json<TransactionView>), ApiError> {
    let row = state.ledger.transfer(&auth.principal(), payload).await?;
    Ok((StatusCode::CREATED, Json(row)))
}

/// GET `/wallet-transactions` - List rows in the caller's scope.
async fn list_transactions(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedQuery(query): ValidatedQuery<ListTransactionsQuery>,
) -> Result<Json<PageResponse<TransactionView>>, ApiError> {
    let rows = state
        .ledger
        .list_transactions(&auth.principal(), query.wallet_id, query.page())
        .await?;
    Ok(Json(rows))
}

/// GET `/wallet-transactions/{transaction_id}` - Retrieve one row.
async fn get_transaction(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(transaction_id): Path<TransactionId>,
) -> Result<Json<TransactionView>, ApiError> {
    let row = state
        .ledger
        .get_transaction(&auth.principal(), transaction_id)
        .await?;
    Ok(Json(row))
}
