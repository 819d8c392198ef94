use super::ledger::{AccountId, LedgerTransaction};
use crate::core::errors::ReconcilioError;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One canonical row of a bank statement, as produced by the statement normalizer.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct BankRow {
    pub date: NaiveDate,
    pub amount: Decimal,
    pub description: String,
    #[serde(default)]
    pub reference: Option<String>,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    Matched,
    UnmatchedBank,
    UnmatchedApp,
    Pending,
}

impl std::fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            MatchStatus::Matched => "matched",
            MatchStatus::UnmatchedBank => "unmatched_bank",
            MatchStatus::UnmatchedApp => "unmatched_app",
            MatchStatus::Pending => "pending",
        };
        write!(f, "{}", s)
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    Exact,
    FuzzyAmountDate,
    FuzzyDescription,
    /// Linked by a user action rather than by the matcher.
    Manual,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MatchAction {
    Accept,
    Ignore,
    CreateTransaction,
}

impl std::fmt::Display for MatchAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            MatchAction::Accept => "accept",
            MatchAction::Ignore => "ignore",
            MatchAction::CreateTransaction => "create_transaction",
        };
        write!(f, "{}", s)
    }
}

/// Terminal user decision on a match. Once `Resolved`, a match never changes again.
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Resolution {
    #[default]
    Unresolved,
    Resolved {
        action: MatchAction,
        resolved_at: DateTime<Utc>,
        notes: Option<String>,
    },
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct Match {
    pub id: String,
    /// Absent for `unmatched_app` residue.
    pub bank_row: Option<BankRow>,
    pub ledger_transaction: Option<LedgerTransaction>,
    pub status: MatchStatus,
    pub confidence: u8,
    pub match_type: Option<MatchType>,
    #[serde(default)]
    pub resolution: Resolution,
}

impl Match {
    pub fn action(&self) -> Option<MatchAction> {
        match self.resolution {
            Resolution::Unresolved => None,
            Resolution::Resolved { action, .. } => Some(action),
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self.resolution, Resolution::Resolved { .. })
    }

    /// The single guard for every resolution transition.
    pub fn check_action(&self, action: MatchAction) -> Result<(), ReconcilioError> {
        if self.is_resolved() {
            return Err(ReconcilioError::AlreadyResolved(self.id.clone()));
        }
        let allowed = match action {
            MatchAction::Accept => self.status == MatchStatus::Matched && self.ledger_transaction.is_some(),
            MatchAction::Ignore => matches!(self.status, MatchStatus::UnmatchedBank | MatchStatus::UnmatchedApp),
            MatchAction::CreateTransaction => self.ledger_transaction.is_none() && self.bank_row.is_some(),
        };
        if !allowed {
            return Err(ReconcilioError::InvalidActionForState {
                action: action.to_string(),
                state: self.status.to_string(),
            });
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Pending,
    InReview,
    Completed,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct SessionSummary {
    pub total_bank_transactions: usize,
    pub matched_count: usize,
    pub unmatched_bank_count: usize,
    pub unmatched_app_count: usize,
    pub resolved_count: usize,
}

impl SessionSummary {
    pub fn from_matches(matches: &[Match]) -> Self {
        let mut summary = SessionSummary::default();
        for m in matches {
            if m.bank_row.is_some() {
                summary.total_bank_transactions += 1;
            }
            match m.status {
                MatchStatus::Matched => summary.matched_count += 1,
                MatchStatus::UnmatchedBank => summary.unmatched_bank_count += 1,
                MatchStatus::UnmatchedApp => summary.unmatched_app_count += 1,
                MatchStatus::Pending => {}
            }
            if m.is_resolved() {
                summary.resolved_count += 1;
            }
        }
        summary
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct ReconciliationSession {
    pub id: String,
    pub account_id: AccountId,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub bank_balance: Option<Decimal>,
    pub app_balance: Option<Decimal>,
    /// `app_balance - bank_balance` when both are known.
    pub difference: Option<Decimal>,
    pub status: SessionStatus,
    pub summary: SessionSummary,
    pub matches: Vec<Match>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl ReconciliationSession {
    pub fn find_match(&self, match_id: &str) -> Result<&Match, ReconcilioError> {
        self.matches
            .iter()
            .find(|m| m.id == match_id)
            .ok_or_else(|| ReconcilioError::MatchNotFound(match_id.to_string()))
    }

    pub fn ensure_open(&self) -> Result<(), ReconcilioError> {
        if self.status == SessionStatus::Completed {
            return Err(ReconcilioError::SessionCompleted(self.id.clone()));
        }
        Ok(())
    }

    pub fn set_app_balance(&mut self, app_balance: Option<Decimal>) {
        self.app_balance = app_balance;
        self.difference = match (self.app_balance, self.bank_balance) {
            (Some(app), Some(bank)) => Some(app - bank),
            _ => None,
        };
    }

    pub fn refresh_summary(&mut self) {
        self.summary = SessionSummary::from_matches(&self.matches);
    }

    /// Applies a user action to one match. `linked` carries the ledger transaction
    /// the action produced or confirmed, as persisted by the ledger store.
    pub fn apply_resolution(
        &mut self,
        match_id: &str,
        action: MatchAction,
        notes: Option<String>,
        linked: Option<LedgerTransaction>,
        resolved_at: DateTime<Utc>,
    ) -> Result<Match, ReconcilioError> {
        self.ensure_open()?;
        let target = self
            .matches
            .iter_mut()
            .find(|m| m.id == match_id)
            .ok_or_else(|| ReconcilioError::MatchNotFound(match_id.to_string()))?;
        target.check_action(action)?;

        match action {
            MatchAction::Accept => {
                if let Some(tx) = linked {
                    target.ledger_transaction = Some(tx);
                } else if let Some(tx) = target.ledger_transaction.as_mut() {
                    tx.confirmed = true;
                }
            }
            MatchAction::Ignore => {}
            MatchAction::CreateTransaction => {
                let tx = linked.ok_or_else(|| {
                    ReconcilioError::InternalServerError("create_transaction without a created transaction".into())
                })?;
                target.ledger_transaction = Some(tx);
                target.status = MatchStatus::Matched;
                target.match_type = Some(MatchType::Manual);
                target.confidence = 100;
            }
        }
        target.resolution = Resolution::Resolved {
            action,
            resolved_at,
            notes,
        };
        let resolved = target.clone();

        self.status = SessionStatus::InReview;
        self.refresh_summary();
        Ok(resolved)
    }
}

/// Compact view of a session, used by create and list responses.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct ReconciliationOverview {
    pub id: String,
    pub account_id: AccountId,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub status: SessionStatus,
    pub bank_balance: Option<Decimal>,
    pub app_balance: Option<Decimal>,
    pub difference: Option<Decimal>,
    #[serde(flatten)]
    pub summary: SessionSummary,
    pub created_at: DateTime<Utc>,
}

impl From<&ReconciliationSession> for ReconciliationOverview {
    fn from(session: &ReconciliationSession) -> Self {
        ReconciliationOverview {
            id: session.id.clone(),
            account_id: session.account_id,
            period_start: session.period_start,
            period_end: session.period_end,
            status: session.status,
            bank_balance: session.bank_balance,
            app_balance: session.app_balance,
            difference: session.difference,
            summary: session.summary.clone(),
            created_at: session.created_at,
        }
    }
}

/// Overrides for the ledger transaction created by `create_transaction`.
/// Missing fields default from the bank row.
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct TransactionData {
    pub date: Option<NaiveDate>,
    pub amount: Option<Decimal>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub notes: Option<String>,
}
