mod api_tests;
mod matcher_tests;
mod shared_account_tests;

use crate::core::models::ledger::{LedgerTransaction, TransactionSource};
use crate::core::services::ReconcilioService;
use crate::infrastructure::cache::in_memory::InMemoryCache;
use crate::infrastructure::logging::in_memory::InMemoryLogging;
use crate::infrastructure::storage::in_memory::InMemoryStorage;
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;

pub const TEST_SECRET: &str = "test_secret";

pub fn create_test_service() -> ReconcilioService<InMemoryLogging, InMemoryStorage, InMemoryCache> {
    let storage = InMemoryStorage::new();
    let logging = InMemoryLogging::new();
    let cache = InMemoryCache::new();
    ReconcilioService::new(storage, logging, cache, TEST_SECRET.to_string())
}

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

pub fn dec(value: &str) -> Decimal {
    value.parse().unwrap()
}

pub fn ledger_tx(id: u64, on: NaiveDate, amount: &str, description: &str) -> LedgerTransaction {
    LedgerTransaction {
        id,
        account_id: 1,
        date: on,
        amount: dec(amount),
        description: description.to_string(),
        category: None,
        notes: None,
        confirmed: false,
        source: TransactionSource::Manual,
        created_at: Utc::now(),
    }
}
