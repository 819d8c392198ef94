use axum::{Json, http::StatusCode, response::IntoResponse};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::core::errors::ReconcilioError;
use crate::core::models::ledger::AccountId;
use crate::core::models::reconciliation::{BankRow, MatchAction, TransactionData};
use crate::core::models::shared_account::{MemberRole, NewMember, SplitType};

// Request structs for JSON payloads
#[derive(Deserialize, ToSchema)]
pub struct CreateAccountRequest {
    pub name: String,
    pub currency: String,
    #[serde(default)]
    pub opening_balance: Decimal,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateAccountRequest {
    pub name: String,
}

#[derive(Deserialize, ToSchema)]
pub struct AddTransactionRequest {
    pub date: NaiveDate,
    pub amount: Decimal,
    pub description: String,
    pub category: Option<String>,
    pub notes: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct CreateReconciliationRequest {
    pub account_id: AccountId,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    /// Statement rows, already normalized.
    pub bank_rows: Vec<BankRow>,
    pub bank_balance: Option<Decimal>,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListReconciliationsQuery {
    pub account_id: Option<AccountId>,
}

#[derive(Deserialize, ToSchema)]
pub struct ResolveMatchRequest {
    pub action: MatchAction,
    pub transaction_data: Option<TransactionData>,
    pub notes: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct CreateSharedAccountRequest {
    pub name: String,
    pub description: Option<String>,
    pub currency: String,
    #[serde(default)]
    pub members: Vec<NewMember>,
}

#[derive(Deserialize, ToSchema)]
pub struct AddSharedMemberRequest {
    pub user_identifier: String,
    pub role: Option<MemberRole>,
}

#[derive(Deserialize, ToSchema)]
pub struct AddSplitTransactionRequest {
    pub paid_by: String,
    pub total_amount: Decimal,
    pub date: NaiveDate,
    pub description: Option<String>,
    pub category: Option<String>,
    #[serde(default)]
    pub split_type: SplitType,
}

// Error response struct
#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

// Newtype wrapper for ReconcilioError to implement IntoResponse
#[derive(Debug)]
pub struct ApiError(pub ReconcilioError);

impl From<ReconcilioError> for ApiError {
    fn from(err: ReconcilioError) -> Self {
        ApiError(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            ReconcilioError::SessionNotFound(_)
            | ReconcilioError::MatchNotFound(_)
            | ReconcilioError::AccountNotFound(_)
            | ReconcilioError::TransactionNotFound(_)
            | ReconcilioError::SharedAccountNotFound(_) => StatusCode::NOT_FOUND,
            ReconcilioError::AlreadyResolved(_)
            | ReconcilioError::AlreadyMember(_)
            | ReconcilioError::SessionCompleted(_)
            | ReconcilioError::TransactionLocked { .. }
            | ReconcilioError::AccountHasOpenReconciliation { .. } => StatusCode::CONFLICT,
            ReconcilioError::InvalidPeriod { .. }
            | ReconcilioError::InvalidActionForState { .. }
            | ReconcilioError::UnsupportedSplitType(_)
            | ReconcilioError::NoMembers
            | ReconcilioError::NotMember(_)
            | ReconcilioError::UnsupportedCurrency(_)
            | ReconcilioError::InvalidInput(..) => StatusCode::BAD_REQUEST,
            ReconcilioError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ReconcilioError::RoundingInvariantViolation { .. }
            | ReconcilioError::InternalServerError(_)
            | ReconcilioError::StorageError(_)
            | ReconcilioError::LoggingError(_)
            | ReconcilioError::CacheError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        let error = match &self.0 {
            ReconcilioError::InvalidInput(_, field_error) => {
                format!("{}: {}", field_error.title, field_error.description)
            }
            other => other.to_string(),
        };
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self.0);
        }
        (status, Json(ErrorResponse { error })).into_response()
    }
}
