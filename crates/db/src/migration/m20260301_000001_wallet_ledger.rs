//! Wallet ledger schema.
//!
//! Creates accounts, wallets and the append-only wallet_transactions table.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(TABLES_SQL).await?;
        db.execute_unprepared(TRIGGERS_SQL).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_SQL).await?;
        Ok(())
    }
}

const TABLES_SQL: &str = r"
-- Identity-bound profiles, one per external user
CREATE TABLE accounts (
    id UUID PRIMARY KEY,
    user_id UUID NOT NULL UNIQUE,
    name VARCHAR(100) NOT NULL,
    surname VARCHAR(100) NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE TABLE wallets (
    id UUID PRIMARY KEY,
    account_id UUID NOT NULL REFERENCES accounts(id) ON DELETE CASCADE,
    balance NUMERIC(65, 2) NOT NULL DEFAULT 0,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_wallets_account ON wallets(account_id, created_at);

-- Ledger rows. Transfers are recorded once, against the source wallet.
-- The counterparty reference has no cascade so removing one account
-- cannot silently rewrite another wallet's history.
CREATE TABLE wallet_transactions (
    id UUID PRIMARY KEY,
    wallet_id UUID NOT NULL REFERENCES wallets(id) ON DELETE CASCADE,
    counterparty_wallet_id UUID REFERENCES wallets(id),
    description VARCHAR(250),
    amount NUMERIC(7, 2) NOT NULL,
    done BOOLEAN NOT NULL DEFAULT TRUE,
    kind SMALLINT NOT NULL,
    error_msg VARCHAR(250),
    extra_info TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_kind_known CHECK (kind BETWEEN 0 AND 3),
    CONSTRAINT chk_kind_matches_sign CHECK (
        kind = 0
        OR (kind = 1 AND amount = 0)
        OR (kind = 2 AND amount > 0)
        OR (kind = 3 AND amount < 0)
    ),
    CONSTRAINT chk_counterparty_differs CHECK (
        counterparty_wallet_id IS NULL OR counterparty_wallet_id <> wallet_id
    ),
    CONSTRAINT chk_rejected_has_reason CHECK (done OR error_msg IS NOT NULL)
);

CREATE INDEX idx_wallet_transactions_wallet ON wallet_transactions(wallet_id, created_at);
CREATE INDEX idx_wallet_transactions_counterparty
    ON wallet_transactions(counterparty_wallet_id, created_at)
    WHERE counterparty_wallet_id IS NOT NULL;
";

const TRIGGERS_SQL: &str = r"
CREATE OR REPLACE FUNCTION reject_wallet_transaction_update()
RETURNS TRIGGER AS $$
BEGIN
    RAISE EXCEPTION 'wallet transactions are append-only';
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_wallet_transactions_append_only
    BEFORE UPDATE ON wallet_transactions
    FOR EACH ROW
    EXECUTE FUNCTION reject_wallet_transaction_update();

CREATE OR REPLACE FUNCTION touch_updated_at()
RETURNS TRIGGER AS $$
BEGIN
    NEW.updated_at = now();
    RETURN NEW;
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_accounts_updated_at
    BEFORE UPDATE ON accounts
    FOR EACH ROW
    EXECUTE FUNCTION touch_updated_at();

CREATE TRIGGER trg_wallets_updated_at
    BEFORE UPDATE ON wallets
    FOR EACH ROW
    EXECUTE FUNCTION touch_updated_at();
";

const DROP_SQL: &str = r"
DROP TABLE IF EXISTS wallet_transactions CASCADE;
DROP TABLE IF EXISTS wallets CASCADE;
DROP TABLE IF EXISTS accounts CASCADE;
DROP FUNCTION IF EXISTS reject_wallet_transaction_update();
DROP FUNCTION IF EXISTS touch_updated_at();
";
