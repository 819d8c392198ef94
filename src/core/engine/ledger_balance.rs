use crate::core::models::ledger::{LedgerTransaction, TransactionWithBalance};
use chrono::NaiveDate;
use log::debug;
use rust_decimal::Decimal;

/// Orders transactions the way statements are listed: newest date first,
/// later ids first within a day.
pub fn sort_newest_first(transactions: &mut [LedgerTransaction]) {
    transactions.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| b.id.cmp(&a.id)));
}

/// Walks backward from the current stored balance. `transactions` must be
/// newest first and must be the account's complete history after the oldest
/// listed row, otherwise the values drift by whatever is missing.
pub fn running_balances(current_balance: Decimal, transactions: &[LedgerTransaction]) -> Vec<TransactionWithBalance> {
    let mut running = current_balance;
    let rows = transactions
        .iter()
        .map(|tx| {
            let balance_after = running;
            running -= tx.amount;
            TransactionWithBalance {
                transaction: tx.clone(),
                balance_before: running,
                balance_after,
            }
        })
        .collect::<Vec<_>>();
    debug!(
        "Running balances over {} transactions: current {}, opening {}",
        rows.len(),
        current_balance,
        running
    );
    rows
}

/// Balance at the end of `date`: the current balance minus everything booked after it.
pub fn balance_at(current_balance: Decimal, transactions: &[LedgerTransaction], date: NaiveDate) -> Decimal {
    let later: Decimal = transactions.iter().filter(|tx| tx.date > date).map(|tx| tx.amount).sum();
    current_balance - later
}
