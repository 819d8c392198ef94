use crate::core::engine::ledger_balance::balance_at;
use crate::core::errors::ReconcilioError;
use crate::core::models::{
    ledger::{Account, AccountId, LedgerTransaction, NewLedgerTransaction, TransactionChanges, TransactionId},
    reconciliation::{Match, MatchAction, ReconciliationSession, SessionStatus},
    shared_account::{Member, SharedAccount, SplitTransaction},
};
use crate::infrastructure::storage::{ResolutionCommit, Storage};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;

// Lock order, wherever more than one is held: accounts, transactions, sessions.
#[derive(Clone)]
pub struct InMemoryStorage {
    account_seq: Arc<AtomicU64>,
    transaction_seq: Arc<AtomicU64>,
    accounts: Arc<RwLock<HashMap<AccountId, Account>>>,
    transactions: Arc<RwLock<HashMap<TransactionId, LedgerTransaction>>>,
    sessions: Arc<RwLock<HashMap<String, ReconciliationSession>>>,
    shared_accounts: Arc<RwLock<HashMap<String, SharedAccount>>>,
    split_transactions: Arc<RwLock<HashMap<String, Vec<SplitTransaction>>>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        InMemoryStorage {
            account_seq: Arc::new(AtomicU64::new(1)),
            transaction_seq: Arc::new(AtomicU64::new(1)),
            accounts: Arc::new(RwLock::new(HashMap::new())),
            transactions: Arc::new(RwLock::new(HashMap::new())),
            sessions: Arc::new(RwLock::new(HashMap::new())),
            shared_accounts: Arc::new(RwLock::new(HashMap::new())),
            split_transactions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    fn materialize(&self, transaction: NewLedgerTransaction) -> LedgerTransaction {
        LedgerTransaction {
            id: self.transaction_seq.fetch_add(1, Ordering::SeqCst),
            account_id: transaction.account_id,
            date: transaction.date,
            amount: transaction.amount,
            description: transaction.description,
            category: transaction.category,
            notes: transaction.notes,
            confirmed: transaction.confirmed,
            source: transaction.source,
            created_at: Utc::now(),
        }
    }
}

/// The first open session with a match that points at the transaction.
fn open_session_holding(sessions: &HashMap<String, ReconciliationSession>, transaction_id: TransactionId) -> Option<String> {
    sessions
        .values()
        .filter(|s| s.status != SessionStatus::Completed)
        .find(|s| {
            s.matches
                .iter()
                .any(|m| m.ledger_transaction.as_ref().is_some_and(|t| t.id == transaction_id))
        })
        .map(|s| s.id.clone())
}

impl Default for InMemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    async fn create_account(
        &self,
        name: String,
        currency: String,
        opening_balance: Decimal,
    ) -> Result<Account, ReconcilioError> {
        let mut accounts = self.accounts.write().await;
        let account = Account {
            id: self.account_seq.fetch_add(1, Ordering::SeqCst),
            name,
            currency,
            balance: opening_balance,
            created_at: Utc::now(),
        };
        accounts.insert(account.id, account.clone());
        Ok(account)
    }

    async fn get_account(&self, account_id: AccountId) -> Result<Option<Account>, ReconcilioError> {
        let accounts = self.accounts.read().await;
        Ok(accounts.get(&account_id).cloned())
    }

    async fn list_accounts(&self) -> Result<Vec<Account>, ReconcilioError> {
        let accounts = self.accounts.read().await;
        let mut found: Vec<Account> = accounts.values().cloned().collect();
        found.sort_by_key(|a| a.id);
        Ok(found)
    }

    async fn rename_account(&self, account_id: AccountId, name: String) -> Result<Account, ReconcilioError> {
        let mut accounts = self.accounts.write().await;
        let account = accounts
            .get_mut(&account_id)
            .ok_or(ReconcilioError::AccountNotFound(account_id))?;
        account.name = name;
        Ok(account.clone())
    }

    async fn delete_account(&self, account_id: AccountId) -> Result<(), ReconcilioError> {
        let mut accounts = self.accounts.write().await;
        let mut transactions = self.transactions.write().await;
        let mut sessions = self.sessions.write().await;

        if !accounts.contains_key(&account_id) {
            return Err(ReconcilioError::AccountNotFound(account_id));
        }
        if let Some(open) = sessions
            .values()
            .find(|s| s.account_id == account_id && s.status != SessionStatus::Completed)
        {
            return Err(ReconcilioError::AccountHasOpenReconciliation {
                account_id,
                session_id: open.id.clone(),
            });
        }
        sessions.retain(|_, s| s.account_id != account_id);
        transactions.retain(|_, t| t.account_id != account_id);
        accounts.remove(&account_id);
        Ok(())
    }

    async fn create_transaction(&self, transaction: NewLedgerTransaction) -> Result<LedgerTransaction, ReconcilioError> {
        let mut accounts = self.accounts.write().await;
        let mut transactions = self.transactions.write().await;
        let account = accounts
            .get_mut(&transaction.account_id)
            .ok_or(ReconcilioError::AccountNotFound(transaction.account_id))?;
        let created = self.materialize(transaction);
        account.balance += created.amount;
        transactions.insert(created.id, created.clone());
        Ok(created)
    }

    async fn get_transaction(&self, transaction_id: TransactionId) -> Result<Option<LedgerTransaction>, ReconcilioError> {
        let transactions = self.transactions.read().await;
        Ok(transactions.get(&transaction_id).cloned())
    }

    async fn update_transaction(
        &self,
        transaction_id: TransactionId,
        changes: TransactionChanges,
    ) -> Result<LedgerTransaction, ReconcilioError> {
        let mut accounts = self.accounts.write().await;
        let mut transactions = self.transactions.write().await;
        let sessions = self.sessions.read().await;

        let transaction = transactions
            .get_mut(&transaction_id)
            .ok_or(ReconcilioError::TransactionNotFound(transaction_id))?;
        if let Some(session_id) = open_session_holding(&sessions, transaction_id) {
            return Err(ReconcilioError::TransactionLocked {
                transaction_id,
                session_id,
            });
        }
        let account = accounts
            .get_mut(&transaction.account_id)
            .ok_or(ReconcilioError::AccountNotFound(transaction.account_id))?;

        let previous_amount = transaction.amount;
        changes.apply(transaction);
        account.balance += transaction.amount - previous_amount;
        Ok(transaction.clone())
    }

    async fn delete_transaction(&self, transaction_id: TransactionId) -> Result<LedgerTransaction, ReconcilioError> {
        let mut accounts = self.accounts.write().await;
        let mut transactions = self.transactions.write().await;
        let sessions = self.sessions.read().await;

        let account_id = transactions
            .get(&transaction_id)
            .map(|t| t.account_id)
            .ok_or(ReconcilioError::TransactionNotFound(transaction_id))?;
        if let Some(session_id) = open_session_holding(&sessions, transaction_id) {
            return Err(ReconcilioError::TransactionLocked {
                transaction_id,
                session_id,
            });
        }
        let account = accounts
            .get_mut(&account_id)
            .ok_or(ReconcilioError::AccountNotFound(account_id))?;
        let removed = transactions
            .remove(&transaction_id)
            .ok_or(ReconcilioError::TransactionNotFound(transaction_id))?;
        account.balance -= removed.amount;
        Ok(removed)
    }

    async fn balance_at(&self, account_id: AccountId, date: NaiveDate) -> Result<Decimal, ReconcilioError> {
        let accounts = self.accounts.read().await;
        let transactions = self.transactions.read().await;
        let account = accounts
            .get(&account_id)
            .ok_or(ReconcilioError::AccountNotFound(account_id))?;
        let history: Vec<LedgerTransaction> = transactions
            .values()
            .filter(|t| t.account_id == account_id)
            .cloned()
            .collect();
        Ok(balance_at(account.balance, &history, date))
    }

    async fn get_account_transactions(&self, account_id: AccountId) -> Result<Vec<LedgerTransaction>, ReconcilioError> {
        let transactions = self.transactions.read().await;
        let mut found: Vec<LedgerTransaction> = transactions
            .values()
            .filter(|t| t.account_id == account_id)
            .cloned()
            .collect();
        found.sort_by_key(|t| t.id);
        Ok(found)
    }

    async fn get_transactions_in_range(
        &self,
        account_id: AccountId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<LedgerTransaction>, ReconcilioError> {
        let transactions = self.transactions.read().await;
        let mut found: Vec<LedgerTransaction> = transactions
            .values()
            .filter(|t| t.account_id == account_id && t.date >= start && t.date <= end)
            .cloned()
            .collect();
        found.sort_by_key(|t| t.id);
        Ok(found)
    }

    async fn save_session(&self, session: ReconciliationSession) -> Result<(), ReconcilioError> {
        let mut sessions = self.sessions.write().await;
        sessions.insert(session.id.clone(), session);
        Ok(())
    }

    async fn get_session(&self, session_id: &str) -> Result<Option<ReconciliationSession>, ReconcilioError> {
        let sessions = self.sessions.read().await;
        Ok(sessions.get(session_id).cloned())
    }

    async fn list_sessions(&self, account_id: Option<AccountId>) -> Result<Vec<ReconciliationSession>, ReconcilioError> {
        let sessions = self.sessions.read().await;
        let mut found: Vec<ReconciliationSession> = sessions
            .values()
            .filter(|s| account_id.is_none_or(|id| s.account_id == id))
            .cloned()
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(found)
    }

    async fn delete_session(&self, session_id: &str) -> Result<bool, ReconcilioError> {
        let mut sessions = self.sessions.write().await;
        Ok(sessions.remove(session_id).is_some())
    }

    async fn commit_resolution(
        &self,
        session_id: &str,
        commit: ResolutionCommit,
    ) -> Result<(ReconciliationSession, Match), ReconcilioError> {
        let mut accounts = self.accounts.write().await;
        let mut transactions = self.transactions.write().await;
        let mut sessions = self.sessions.write().await;

        // Stage every change on copies; nothing below the staging block can fail.
        let mut session = sessions
            .get(session_id)
            .cloned()
            .ok_or_else(|| ReconcilioError::SessionNotFound(session_id.to_string()))?;
        let mut account = accounts
            .get(&session.account_id)
            .cloned()
            .ok_or(ReconcilioError::AccountNotFound(session.account_id))?;
        let target = session.find_match(&commit.match_id)?;
        target.check_action(commit.action)?;

        let linked = match commit.action {
            MatchAction::Accept => {
                let linked_id = target
                    .ledger_transaction
                    .as_ref()
                    .map(|t| t.id)
                    .ok_or_else(|| ReconcilioError::MatchNotFound(commit.match_id.clone()))?;
                let mut confirmed = transactions
                    .get(&linked_id)
                    .cloned()
                    .ok_or(ReconcilioError::TransactionNotFound(linked_id))?;
                confirmed.confirmed = true;
                Some(confirmed)
            }
            MatchAction::Ignore => None,
            MatchAction::CreateTransaction => {
                let new_transaction = commit.new_transaction.ok_or_else(|| {
                    ReconcilioError::InternalServerError("create_transaction commit without a transaction".into())
                })?;
                let created = self.materialize(new_transaction);
                account.balance += created.amount;
                Some(created)
            }
        };

        let resolved = session.apply_resolution(
            &commit.match_id,
            commit.action,
            commit.notes,
            linked.clone(),
            commit.resolved_at,
        )?;

        if let Some(tx) = linked {
            transactions.insert(tx.id, tx);
        }
        let history: Vec<LedgerTransaction> = transactions
            .values()
            .filter(|t| t.account_id == account.id)
            .cloned()
            .collect();
        session.set_app_balance(Some(balance_at(account.balance, &history, session.period_end)));
        accounts.insert(account.id, account);
        sessions.insert(session.id.clone(), session.clone());

        Ok((session, resolved))
    }

    async fn save_shared_account(&self, account: SharedAccount) -> Result<(), ReconcilioError> {
        let mut shared_accounts = self.shared_accounts.write().await;
        shared_accounts.insert(account.id.clone(), account);
        Ok(())
    }

    async fn get_shared_account(&self, shared_account_id: &str) -> Result<Option<SharedAccount>, ReconcilioError> {
        let shared_accounts = self.shared_accounts.read().await;
        Ok(shared_accounts.get(shared_account_id).cloned())
    }

    async fn list_shared_accounts(&self) -> Result<Vec<SharedAccount>, ReconcilioError> {
        let shared_accounts = self.shared_accounts.read().await;
        let mut found: Vec<SharedAccount> = shared_accounts.values().cloned().collect();
        found.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(found)
    }

    async fn add_shared_member(&self, shared_account_id: &str, member: Member) -> Result<SharedAccount, ReconcilioError> {
        let mut shared_accounts = self.shared_accounts.write().await;
        let account = shared_accounts
            .get_mut(shared_account_id)
            .ok_or_else(|| ReconcilioError::SharedAccountNotFound(shared_account_id.to_string()))?;
        if account.is_member(&member.user_identifier) {
            return Err(ReconcilioError::AlreadyMember(member.user_identifier));
        }
        account.members.push(member);
        Ok(account.clone())
    }

    async fn save_split_transaction(&self, split: SplitTransaction) -> Result<(), ReconcilioError> {
        let mut split_transactions = self.split_transactions.write().await;
        split_transactions
            .entry(split.shared_account_id.clone())
            .or_insert_with(Vec::new)
            .push(split);
        Ok(())
    }

    async fn get_split_transactions(&self, shared_account_id: &str) -> Result<Vec<SplitTransaction>, ReconcilioError> {
        let split_transactions = self.split_transactions.read().await;
        Ok(split_transactions.get(shared_account_id).cloned().unwrap_or_default())
    }
}
