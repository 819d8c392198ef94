use super::ReconcilioService;
use crate::core::constants::{
    ACCOUNT_CREATED, ACCOUNT_DELETED, ACCOUNT_UPDATED, MAX_DESCRIPTION_LENGTH, MAX_NAME_LENGTH, TRANSACTION_ADDED,
    TRANSACTION_DELETED, TRANSACTION_UPDATED,
};
use crate::core::engine::ledger_balance::{running_balances, sort_newest_first};
use crate::core::errors::ReconcilioError;
use crate::core::models::currency::Currency;
use crate::core::models::ledger::{
    Account, AccountId, LedgerTransaction, NewLedgerTransaction, TransactionChanges, TransactionId, TransactionSource,
    TransactionWithBalance,
};
use crate::infrastructure::cache::Cache;
use crate::infrastructure::logging::LoggingService;
use crate::infrastructure::storage::Storage;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::json;
use tracing::info;

impl<L: LoggingService, S: Storage, C: Cache> ReconcilioService<L, S, C> {
    pub async fn create_account(
        &self,
        name: String,
        currency: String,
        opening_balance: Decimal,
        created_by: &str,
    ) -> Result<Account, ReconcilioError> {
        self.validate_string_input("name", &name, MAX_NAME_LENGTH)?;
        let currency = Currency::lookup(&currency)?;
        currency.to_minor_units("opening_balance", opening_balance)?;

        let account = self
            .storage
            .create_account(name, currency.code.to_string(), opening_balance)
            .await?;
        info!("Created account {} ({})", account.id, account.currency);

        self.log_action(
            ACCOUNT_CREATED,
            json!({
                "account_id": account.id,
                "name": account.name,
                "currency": account.currency,
                "opening_balance": account.balance,
            }),
            created_by,
        )
        .await?;
        Ok(account)
    }

    pub async fn get_account(&self, account_id: AccountId) -> Result<Account, ReconcilioError> {
        self.storage
            .get_account(account_id)
            .await?
            .ok_or(ReconcilioError::AccountNotFound(account_id))
    }

    pub async fn list_accounts(&self) -> Result<Vec<Account>, ReconcilioError> {
        self.storage.list_accounts().await
    }

    /// Only the name can change; currency and balance follow from the transactions.
    pub async fn update_account(
        &self,
        account_id: AccountId,
        name: String,
        updated_by: &str,
    ) -> Result<Account, ReconcilioError> {
        self.validate_string_input("name", &name, MAX_NAME_LENGTH)?;
        let account = self.storage.rename_account(account_id, name).await?;

        self.log_action(
            ACCOUNT_UPDATED,
            json!({ "account_id": account.id, "name": account.name }),
            updated_by,
        )
        .await?;
        Ok(account)
    }

    pub async fn delete_account(&self, account_id: AccountId, deleted_by: &str) -> Result<(), ReconcilioError> {
        self.storage.delete_account(account_id).await?;
        info!("Deleted account {} with its transactions", account_id);

        self.log_action(ACCOUNT_DELETED, json!({ "account_id": account_id }), deleted_by)
            .await?;
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn add_transaction(
        &self,
        account_id: AccountId,
        date: NaiveDate,
        amount: Decimal,
        description: String,
        category: Option<String>,
        notes: Option<String>,
        created_by: &str,
    ) -> Result<LedgerTransaction, ReconcilioError> {
        let account = self.get_account(account_id).await?;
        self.validate_string_input("description", &description, MAX_DESCRIPTION_LENGTH)?;
        self.validate_optional_string("category", category.as_deref(), MAX_NAME_LENGTH)?;
        self.validate_optional_string("notes", notes.as_deref(), MAX_DESCRIPTION_LENGTH)?;
        Currency::lookup(&account.currency)?.to_minor_units("amount", amount)?;

        let transaction = self
            .storage
            .create_transaction(NewLedgerTransaction {
                account_id,
                date,
                amount,
                description,
                category,
                notes,
                confirmed: false,
                source: TransactionSource::Manual,
            })
            .await?;

        self.log_action(
            TRANSACTION_ADDED,
            json!({
                "account_id": account_id,
                "transaction_id": transaction.id,
                "date": transaction.date,
                "amount": transaction.amount,
            }),
            created_by,
        )
        .await?;
        Ok(transaction)
    }

    pub async fn get_transaction(&self, transaction_id: TransactionId) -> Result<LedgerTransaction, ReconcilioError> {
        self.storage
            .get_transaction(transaction_id)
            .await?
            .ok_or(ReconcilioError::TransactionNotFound(transaction_id))
    }

    /// Edits a recorded transaction and moves the account balance by the amount
    /// difference. Transactions referenced by an open reconciliation are locked.
    pub async fn update_transaction(
        &self,
        transaction_id: TransactionId,
        changes: TransactionChanges,
        updated_by: &str,
    ) -> Result<LedgerTransaction, ReconcilioError> {
        let current = self.get_transaction(transaction_id).await?;
        let account = self.get_account(current.account_id).await?;
        if let Some(description) = changes.description.as_deref() {
            self.validate_string_input("description", description, MAX_DESCRIPTION_LENGTH)?;
        }
        self.validate_optional_string("category", changes.category.as_deref(), MAX_NAME_LENGTH)?;
        self.validate_optional_string("notes", changes.notes.as_deref(), MAX_DESCRIPTION_LENGTH)?;
        if let Some(amount) = changes.amount {
            Currency::lookup(&account.currency)?.to_minor_units("amount", amount)?;
        }

        let updated = self.storage.update_transaction(transaction_id, changes).await?;
        info!(
            "Updated transaction {} on account {}: amount {} -> {}",
            transaction_id, updated.account_id, current.amount, updated.amount
        );

        self.log_action(
            TRANSACTION_UPDATED,
            json!({
                "account_id": updated.account_id,
                "transaction_id": transaction_id,
                "previous_amount": current.amount,
                "amount": updated.amount,
                "date": updated.date,
            }),
            updated_by,
        )
        .await?;
        Ok(updated)
    }

    pub async fn delete_transaction(&self, transaction_id: TransactionId, deleted_by: &str) -> Result<(), ReconcilioError> {
        let removed = self.storage.delete_transaction(transaction_id).await?;

        self.log_action(
            TRANSACTION_DELETED,
            json!({
                "account_id": removed.account_id,
                "transaction_id": removed.id,
                "amount": removed.amount,
            }),
            deleted_by,
        )
        .await?;
        Ok(())
    }

    /// Newest first, each row carrying the balance before and after it.
    pub async fn list_transactions_with_balance(
        &self,
        account_id: AccountId,
    ) -> Result<Vec<TransactionWithBalance>, ReconcilioError> {
        let account = self.get_account(account_id).await?;
        let mut transactions = self.storage.get_account_transactions(account_id).await?;
        sort_newest_first(&mut transactions);
        Ok(running_balances(account.balance, &transactions))
    }
}
