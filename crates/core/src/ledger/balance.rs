//! Balance derivation from ledger rows.

use rust_decimal::Decimal;
use walletd_shared::types::WalletId;

use super::types::WalletTransaction;

/// Recomputes a wallet balance from the rows that touch it.
///
/// Only completed rows of a balance-affecting kind count. A row adds its
/// amount to `wallet_id` and subtracts it from `counterparty_wallet_id`.
/// Returns `None` on overflow.
#[must_use]
pub fn ledger_balance<'a>(
    wallet_id: WalletId,
    rows: impl IntoIterator<Item = &'a WalletTransaction>,
) -> Option<Decimal> {
    let mut total = Decimal::ZERO;
    for row in rows.into_iter().filter(|r| r.is_effective()) {
        let amount = row.amount.value();
        if row.wallet_id == wallet_id {
            total = total.checked_add(amount)?;
        }
        if row.counterparty_wallet_id == Some(wallet_id) {
            total = total.checked_sub(amount)?;
        }
    }
    Some(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::types::Memo;
    use rust_decimal_macros::dec;
    use walletd_shared::types::Amount;

    fn row(wallet: WalletId, amount: Decimal) -> WalletTransaction {
        WalletTransaction::record(wallet, Amount::new(amount).unwrap(), Memo::default())
    }

    #[test]
    fn test_sums_deposits_and_withdrawals() {
        let w = WalletId::new();
        let rows = vec![row(w, dec!(10.00)), row(w, dec!(-3.25)), row(w, dec!(0))];
        assert_eq!(ledger_balance(w, &rows), Some(dec!(6.75)));
    }

    #[test]
    fn test_ignores_rejected_rows() {
        let w = WalletId::new();
        let rows = vec![
            row(w, dec!(10.00)),
            row(w, dec!(-50.00)).rejected("Transaction error: insufficient funds"),
        ];
        assert_eq!(ledger_balance(w, &rows), Some(dec!(10.00)));
    }

    #[test]
    fn test_transfer_row_counts_for_both_sides() {
        let source = WalletId::new();
        let destination = WalletId::new();
        let mut transfer = row(source, dec!(-4.00));
        transfer.counterparty_wallet_id = Some(destination);

        let rows = vec![row(source, dec!(10.00)), transfer];
        assert_eq!(ledger_balance(source, &rows), Some(dec!(6.00)));
        assert_eq!(ledger_balance(destination, &rows), Some(dec!(4.00)));
    }

    #[test]
    fn test_rows_of_other_wallets_are_ignored() {
        let w = WalletId::new();
        let rows = vec![row(WalletId::new(), dec!(99.00))];
        assert_eq!(ledger_balance(w, &rows), Some(Decimal::ZERO));
    }
}
