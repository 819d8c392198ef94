use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub type AccountId = u64;
pub type TransactionId = u64;

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct Account {
    pub id: AccountId,
    pub name: String,
    pub currency: String,
    /// Current stored balance, including every recorded transaction.
    pub balance: Decimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TransactionSource {
    Manual,
    Import,
    Reconciliation,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct LedgerTransaction {
    pub id: TransactionId,
    pub account_id: AccountId,
    pub date: NaiveDate,
    pub amount: Decimal,
    pub description: String,
    pub category: Option<String>,
    pub notes: Option<String>,
    /// Set once a reconciliation has confirmed this transaction against the bank.
    pub confirmed: bool,
    pub source: TransactionSource,
    pub created_at: DateTime<Utc>,
}

/// A transaction before the store has assigned it an id.
#[derive(Clone, Debug, PartialEq)]
pub struct NewLedgerTransaction {
    pub account_id: AccountId,
    pub date: NaiveDate,
    pub amount: Decimal,
    pub description: String,
    pub category: Option<String>,
    pub notes: Option<String>,
    pub confirmed: bool,
    pub source: TransactionSource,
}

/// Fields of a recorded transaction that may be edited. Missing fields keep their value.
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct TransactionChanges {
    pub date: Option<NaiveDate>,
    pub amount: Option<Decimal>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub notes: Option<String>,
}

impl TransactionChanges {
    pub fn apply(self, transaction: &mut LedgerTransaction) {
        if let Some(date) = self.date {
            transaction.date = date;
        }
        if let Some(amount) = self.amount {
            transaction.amount = amount;
        }
        if let Some(description) = self.description {
            transaction.description = description;
        }
        if self.category.is_some() {
            transaction.category = self.category;
        }
        if self.notes.is_some() {
            transaction.notes = self.notes;
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct TransactionWithBalance {
    #[serde(flatten)]
    pub transaction: LedgerTransaction,
    pub balance_before: Decimal,
    pub balance_after: Decimal,
}
