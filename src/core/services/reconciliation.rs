use super::ReconcilioService;
use crate::core::constants::{
    MATCH_RESOLVED, MAX_DESCRIPTION_LENGTH, MAX_NAME_LENGTH, RECONCILIATION_COMPLETED, RECONCILIATION_CREATED,
    RECONCILIATION_DELETED,
};
use crate::core::engine::matcher::match_transactions;
use crate::core::errors::ReconcilioError;
use crate::core::models::currency::Currency;
use crate::core::models::ledger::{AccountId, LedgerTransaction, NewLedgerTransaction, TransactionSource};
use crate::core::models::reconciliation::{
    BankRow, Match, MatchAction, ReconciliationOverview, ReconciliationSession, Resolution, SessionStatus,
    SessionSummary, TransactionData,
};
use crate::infrastructure::cache::Cache;
use crate::infrastructure::logging::LoggingService;
use crate::infrastructure::storage::{ResolutionCommit, Storage};
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

impl<L: LoggingService, S: Storage, C: Cache> ReconcilioService<L, S, C> {
    pub async fn create_reconciliation(
        &self,
        account_id: AccountId,
        period_start: NaiveDate,
        period_end: NaiveDate,
        bank_rows: Vec<BankRow>,
        bank_balance: Option<Decimal>,
        created_by: &str,
    ) -> Result<ReconciliationOverview, ReconcilioError> {
        if period_end < period_start {
            return Err(ReconcilioError::InvalidPeriod {
                start: period_start.to_string(),
                end: period_end.to_string(),
            });
        }
        let account = self.get_account(account_id).await?;
        let currency = Currency::lookup(&account.currency)?;
        for row in &bank_rows {
            currency.to_minor_units("bank_rows.amount", row.amount)?;
        }
        if let Some(balance) = bank_balance {
            currency.to_minor_units("bank_balance", balance)?;
        }

        let (in_range, app_balance) = futures::try_join!(
            self.storage.get_transactions_in_range(account_id, period_start, period_end),
            self.storage.balance_at(account_id, period_end),
        )?;
        // Transactions confirmed by an earlier reconciliation are already settled.
        let candidates: Vec<LedgerTransaction> = in_range.into_iter().filter(|t| !t.confirmed).collect();

        let matches: Vec<Match> = match_transactions(&bank_rows, &candidates)
            .into_iter()
            .map(|outcome| Match {
                id: Uuid::new_v4().to_string(),
                bank_row: outcome.bank_row,
                ledger_transaction: outcome.ledger_transaction,
                status: outcome.status,
                confidence: outcome.confidence,
                match_type: outcome.match_type,
                resolution: Resolution::Unresolved,
            })
            .collect();

        let mut session = ReconciliationSession {
            id: Uuid::new_v4().to_string(),
            account_id,
            period_start,
            period_end,
            bank_balance,
            app_balance: None,
            difference: None,
            status: SessionStatus::Pending,
            summary: SessionSummary::from_matches(&matches),
            matches,
            created_at: Utc::now(),
            completed_at: None,
        };
        session.set_app_balance(Some(app_balance));

        self.storage.save_session(session.clone()).await?;
        info!(
            "Reconciliation {} created for account {}: {} bank rows, {} matched",
            session.id, account_id, session.summary.total_bank_transactions, session.summary.matched_count
        );

        self.log_action(
            RECONCILIATION_CREATED,
            json!({
                "reconciliation_id": session.id,
                "account_id": account_id,
                "period_start": period_start,
                "period_end": period_end,
                "total_bank_transactions": session.summary.total_bank_transactions,
                "matched_count": session.summary.matched_count,
            }),
            created_by,
        )
        .await?;

        Ok(ReconciliationOverview::from(&session))
    }

    pub async fn get_reconciliation(&self, session_id: &str) -> Result<ReconciliationSession, ReconcilioError> {
        let mut session = self
            .storage
            .get_session(session_id)
            .await?
            .ok_or_else(|| ReconcilioError::SessionNotFound(session_id.to_string()))?;
        self.refresh_app_balance(&mut session).await?;
        Ok(session)
    }

    pub async fn list_reconciliations(
        &self,
        account_id: Option<AccountId>,
    ) -> Result<Vec<ReconciliationOverview>, ReconcilioError> {
        let mut sessions = self.storage.list_sessions(account_id).await?;
        for session in sessions.iter_mut() {
            self.refresh_app_balance(session).await?;
        }
        Ok(sessions.iter().map(ReconciliationOverview::from).collect())
    }

    /// Open sessions report the ledger as it stands now, so edits made after
    /// creation show up in `app_balance` and `difference`. Completed sessions
    /// keep the figures they were closed with.
    async fn refresh_app_balance(&self, session: &mut ReconciliationSession) -> Result<(), ReconcilioError> {
        if session.status == SessionStatus::Completed {
            return Ok(());
        }
        let app_balance = self.storage.balance_at(session.account_id, session.period_end).await?;
        session.set_app_balance(Some(app_balance));
        Ok(())
    }

    pub async fn delete_reconciliation(&self, session_id: &str, deleted_by: &str) -> Result<(), ReconcilioError> {
        let _guard = self.session_locks.lock(session_id).await?;

        if !self.storage.delete_session(session_id).await? {
            return Err(ReconcilioError::SessionNotFound(session_id.to_string()));
        }

        self.log_action(
            RECONCILIATION_DELETED,
            json!({ "reconciliation_id": session_id }),
            deleted_by,
        )
        .await?;
        Ok(())
    }

    pub async fn complete_reconciliation(
        &self,
        session_id: &str,
        completed_by: &str,
    ) -> Result<ReconciliationSession, ReconcilioError> {
        let _guard = self.session_locks.lock(session_id).await?;

        let mut session = self.get_reconciliation(session_id).await?;
        session.ensure_open()?;
        session.status = SessionStatus::Completed;
        session.completed_at = Some(Utc::now());
        self.storage.save_session(session.clone()).await?;

        if session.summary.resolved_count < session.matches.len() {
            warn!(
                "Reconciliation {} completed with {} of {} matches unresolved",
                session.id,
                session.matches.len() - session.summary.resolved_count,
                session.matches.len()
            );
        }

        self.log_action(
            RECONCILIATION_COMPLETED,
            json!({
                "reconciliation_id": session.id,
                "difference": session.difference,
                "resolved_count": session.summary.resolved_count,
            }),
            completed_by,
        )
        .await?;
        Ok(session)
    }

    /// Applies a terminal action to one match. Resolves on the same session are
    /// serialized, and the store re-checks the match before committing.
    pub async fn resolve_match(
        &self,
        session_id: &str,
        match_id: &str,
        action: MatchAction,
        transaction_data: Option<TransactionData>,
        notes: Option<String>,
        resolved_by: &str,
    ) -> Result<Match, ReconcilioError> {
        self.validate_optional_string("notes", notes.as_deref(), MAX_DESCRIPTION_LENGTH)?;

        let _guard = self.session_locks.lock(session_id).await?;

        let session = self.get_reconciliation(session_id).await?;
        session.ensure_open()?;
        let target = session.find_match(match_id)?;
        target.check_action(action)?;

        let new_transaction = match action {
            MatchAction::CreateTransaction => Some(
                self.transaction_from_bank_row(&session, target, transaction_data.unwrap_or_default())
                    .await?,
            ),
            MatchAction::Accept | MatchAction::Ignore => None,
        };

        let (session, resolved) = self
            .storage
            .commit_resolution(
                session_id,
                ResolutionCommit {
                    match_id: match_id.to_string(),
                    action,
                    notes,
                    new_transaction,
                    resolved_at: Utc::now(),
                },
            )
            .await?;
        info!(
            "Match {} in reconciliation {} resolved with {}; {} of {} resolved",
            match_id,
            session_id,
            action,
            session.summary.resolved_count,
            session.matches.len()
        );

        self.log_action(
            MATCH_RESOLVED,
            json!({
                "reconciliation_id": session_id,
                "match_id": match_id,
                "action": action,
                "ledger_transaction_id": resolved.ledger_transaction.as_ref().map(|t| t.id),
            }),
            resolved_by,
        )
        .await?;
        Ok(resolved)
    }

    async fn transaction_from_bank_row(
        &self,
        session: &ReconciliationSession,
        target: &Match,
        data: TransactionData,
    ) -> Result<NewLedgerTransaction, ReconcilioError> {
        let row = target.bank_row.as_ref().ok_or_else(|| ReconcilioError::InvalidActionForState {
            action: MatchAction::CreateTransaction.to_string(),
            state: target.status.to_string(),
        })?;
        let account = self.get_account(session.account_id).await?;

        let amount = data.amount.unwrap_or(row.amount);
        let description = data.description.unwrap_or_else(|| row.description.clone());
        Currency::lookup(&account.currency)?.to_minor_units("amount", amount)?;
        self.validate_string_input("description", &description, MAX_DESCRIPTION_LENGTH)?;
        self.validate_optional_string("category", data.category.as_deref(), MAX_NAME_LENGTH)?;
        self.validate_optional_string("notes", data.notes.as_deref(), MAX_DESCRIPTION_LENGTH)?;

        Ok(NewLedgerTransaction {
            account_id: session.account_id,
            date: data.date.unwrap_or(row.date),
            amount,
            description,
            category: data.category,
            notes: data.notes,
            confirmed: true,
            source: TransactionSource::Reconciliation,
        })
    }
}
