pub mod in_memory;

use crate::core::errors::ReconcilioError;
use crate::core::models::{
    ledger::{Account, AccountId, LedgerTransaction, NewLedgerTransaction, TransactionChanges, TransactionId},
    reconciliation::{Match, MatchAction, ReconciliationSession},
    shared_account::{Member, SharedAccount, SplitTransaction},
};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;

/// Everything one resolve call writes. The store applies it as a single unit:
/// either the match, the ledger and the session counters all change, or nothing does.
#[derive(Clone, Debug)]
pub struct ResolutionCommit {
    pub match_id: String,
    pub action: MatchAction,
    pub notes: Option<String>,
    /// Ledger transaction to record for `create_transaction`.
    pub new_transaction: Option<NewLedgerTransaction>,
    pub resolved_at: DateTime<Utc>,
}

#[async_trait]
pub trait Storage: Send + Sync {
    async fn create_account(&self, name: String, currency: String, opening_balance: Decimal)
    -> Result<Account, ReconcilioError>;
    async fn get_account(&self, account_id: AccountId) -> Result<Option<Account>, ReconcilioError>;
    async fn list_accounts(&self) -> Result<Vec<Account>, ReconcilioError>;
    async fn rename_account(&self, account_id: AccountId, name: String) -> Result<Account, ReconcilioError>;
    /// Removes the account with its transactions and completed sessions.
    /// Fails with `AccountHasOpenReconciliation` while a session is still open.
    async fn delete_account(&self, account_id: AccountId) -> Result<(), ReconcilioError>;
    /// Records the transaction and adds its amount to the account balance.
    async fn create_transaction(&self, transaction: NewLedgerTransaction) -> Result<LedgerTransaction, ReconcilioError>;
    async fn get_transaction(&self, transaction_id: TransactionId) -> Result<Option<LedgerTransaction>, ReconcilioError>;
    /// Applies the changes and moves the account balance by the amount difference.
    /// Fails with `TransactionLocked` while an open session references the transaction.
    async fn update_transaction(
        &self,
        transaction_id: TransactionId,
        changes: TransactionChanges,
    ) -> Result<LedgerTransaction, ReconcilioError>;
    /// Removes the transaction and takes its amount back out of the account balance.
    async fn delete_transaction(&self, transaction_id: TransactionId) -> Result<LedgerTransaction, ReconcilioError>;
    /// Current balance minus every transaction dated after `date`, read as one snapshot.
    async fn balance_at(&self, account_id: AccountId, date: NaiveDate) -> Result<Decimal, ReconcilioError>;
    async fn get_account_transactions(&self, account_id: AccountId) -> Result<Vec<LedgerTransaction>, ReconcilioError>;
    /// Transactions dated within `[start, end]`, ordered by id.
    async fn get_transactions_in_range(
        &self,
        account_id: AccountId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<LedgerTransaction>, ReconcilioError>;

    async fn save_session(&self, session: ReconciliationSession) -> Result<(), ReconcilioError>;
    async fn get_session(&self, session_id: &str) -> Result<Option<ReconciliationSession>, ReconcilioError>;
    async fn list_sessions(&self, account_id: Option<AccountId>) -> Result<Vec<ReconciliationSession>, ReconcilioError>;
    async fn delete_session(&self, session_id: &str) -> Result<bool, ReconcilioError>;
    /// Re-checks that the match is still unresolved before writing anything.
    async fn commit_resolution(
        &self,
        session_id: &str,
        commit: ResolutionCommit,
    ) -> Result<(ReconciliationSession, Match), ReconcilioError>;

    async fn save_shared_account(&self, account: SharedAccount) -> Result<(), ReconcilioError>;
    async fn get_shared_account(&self, shared_account_id: &str) -> Result<Option<SharedAccount>, ReconcilioError>;
    async fn list_shared_accounts(&self) -> Result<Vec<SharedAccount>, ReconcilioError>;
    /// Appends the member unless the identifier is already present (`AlreadyMember`).
    async fn add_shared_member(&self, shared_account_id: &str, member: Member) -> Result<SharedAccount, ReconcilioError>;
    async fn save_split_transaction(&self, split: SplitTransaction) -> Result<(), ReconcilioError>;
    async fn get_split_transactions(&self, shared_account_id: &str) -> Result<Vec<SplitTransaction>, ReconcilioError>;
}
