use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Serialize)]
pub struct FieldError {
    pub field: String,
    pub title: String,
    pub description: String,
}

impl FieldError {
    pub fn new(field: &str, title: impl Into<String>, description: impl Into<String>) -> Self {
        FieldError {
            field: field.to_string(),
            title: title.into(),
            description: description.into(),
        }
    }
}

#[derive(Error, Debug, Serialize)]
pub enum ReconcilioError {
    /// Reconciliation period ends before it starts
    #[error("Invalid period: {end} is before {start}")]
    InvalidPeriod { start: String, end: String },

    #[error("Reconciliation {0} not found")]
    SessionNotFound(String),

    #[error("Match {0} not found")]
    MatchNotFound(String),

    /// The match already carries a terminal action
    #[error("Match {0} already resolved")]
    AlreadyResolved(String),

    #[error("Action `{action}` is not allowed for a match in state `{state}`")]
    InvalidActionForState { action: String, state: String },

    #[error("Reconciliation {0} is already completed")]
    SessionCompleted(String),

    #[error("Split type `{0}` is not supported")]
    UnsupportedSplitType(String),

    #[error("A split needs at least one member")]
    NoMembers,

    /// Shares did not add up to the transaction total. This is a defect, never a user error.
    #[error("Rounding invariant violated: shares sum to {actual} minor units, expected {expected}")]
    RoundingInvariantViolation { expected: i128, actual: i128 },

    #[error("Account {0} not found")]
    AccountNotFound(u64),

    #[error("Transaction {0} not found")]
    TransactionNotFound(u64),

    /// Matches of an open reconciliation still point at the transaction
    #[error("Transaction {transaction_id} is part of open reconciliation {session_id}")]
    TransactionLocked { transaction_id: u64, session_id: String },

    #[error("Account {account_id} has open reconciliation {session_id}")]
    AccountHasOpenReconciliation { account_id: u64, session_id: String },

    #[error("Shared account {0} not found")]
    SharedAccountNotFound(String),

    #[error("User {0} is not a member of the shared account")]
    NotMember(String),

    #[error("User {0} is already a member of the shared account")]
    AlreadyMember(String),

    #[error("Unsupported currency: {0}")]
    UnsupportedCurrency(String),

    /// Generic input validation error with detailed field information
    #[error("Invalid input for field `{0}`: {1:?}")]
    InvalidInput(String, FieldError),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Internal server error: {0}")]
    InternalServerError(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Logging error: {0}")]
    LoggingError(String),

    #[error("Cache error: {0}")]
    CacheError(String),
}

impl ReconcilioError {
    pub fn invalid_input(field: &str, title: impl Into<String>, description: impl Into<String>) -> Self {
        ReconcilioError::InvalidInput(field.to_string(), FieldError::new(field, title, description))
    }
}
