//! Wallet routes.
//!
//! Wallets are created empty and never updated or deleted through the API.
//! Their balance only moves through wallet transactions.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use serde::Deserialize;
use tracing::info;
use walletd_core::WalletView;
use walletd_core::ledger::Reconciliation;
use walletd_shared::types::{AccountId, PageRequest, PageResponse, WalletId};

use crate::extractors::{ValidatedJson, ValidatedQuery};
use crate::{ApiError, AppState, middleware::AuthUser};

/// Creates the wallet routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/wallets", get(list_wallets).post(create_wallet))
        .route("/wallets/{wallet_id}", get(get_wallet))
        .route("/wallets/{wallet_id}/reconciliation", get(reconcile_wallet))
}

/// Request body for creating a wallet.
#[derive(Debug, Default, Deserialize)]
pub struct CreateWalletRequest {
    /// Owning account. Defaults to the caller's own account.
    #[serde(default)]
    pub account_id: Option<AccountId>,
}

/// POST `/wallets` - Open an empty wallet.
async fn create_wallet(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(payload): ValidatedJson<CreateWalletRequest>,
) -> Result<(StatusCode, Json<WalletView>), ApiError> {
    let wallet = state
        .ledger
        .create_wallet(&auth.principal(), payload.account_id)
        .await?;
    info!(wallet_id = %wallet.id, user_id = %auth.claims().user_id(), "Wallet created");
    Ok((StatusCode::CREATED, Json(wallet)))
}

/// GET `/wallets` - List wallets in the caller's scope.
async fn list_wallets(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedQuery(page): ValidatedQuery<PageRequest>,
) -> Result<Json<PageResponse<WalletView>>, ApiError> {
    let wallets = state.ledger.list_wallets(&auth.principal(), page).await?;
    Ok(Json(wallets))
}

/// GET `/wallets/{wallet_id}` - Retrieve one wallet.
async fn get_wallet(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(wallet_id): Path<WalletId>,
) -> Result<Json<WalletView>, ApiError> {
    let wallet = state.ledger.get_wallet(&auth.principal(), wallet_id).await?;
    Ok(Json(wallet))
}

/// GET `/wallets/{wallet_id}/reconciliation` - Recompute the balance from the ledger.
async fn reconcile_wallet(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(wallet_id): Path<WalletId>,
) -> Result<Json<Reconciliation>, ApiError> {
    let report = state.ledger.reconcile(&auth.principal(), wallet_id).await?;
    if !report.consistent {
        tracing::error!(
            wallet_id = %wallet_id,
            recorded = %report.recorded_balance,
            ledger = %report.ledger_balance,
            "Wallet balance disagrees with its ledger"
        );
    }
    Ok(Json(report))
}
