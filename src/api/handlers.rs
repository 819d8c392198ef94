use crate::{
    api::models::*,
    auth::jwt::Claims,
    core::{
        errors::ReconcilioError,
        models::{
            audit::AppLog,
            ledger::{Account, AccountId, LedgerTransaction, TransactionChanges, TransactionId, TransactionWithBalance},
            reconciliation::{Match, ReconciliationOverview, ReconciliationSession},
            shared_account::{MemberBalance, SharedAccount, SplitTransaction, Transfer},
        },
        services::ReconcilioService,
    },
    infrastructure::{
        cache::in_memory::InMemoryCache, logging::in_memory::InMemoryLogging, storage::in_memory::InMemoryStorage,
    },
};
use axum::{
    Extension, Json, Router,
    extract::{Path, Query, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::IntoResponse,
    routing::{get, post},
};
use http::header;
use std::sync::Arc;

pub type AppService = ReconcilioService<InMemoryLogging, InMemoryStorage, InMemoryCache>;

/// Validates the bearer token and exposes its claims to the handlers.
async fn auth_middleware(
    State(service): State<Arc<AppService>>,
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Result<impl IntoResponse, ApiError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| ReconcilioError::Unauthorized("Missing Authorization header".to_string()))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| ReconcilioError::Unauthorized("Invalid Authorization header".to_string()))?;

    let claims = service.validate_token(token)?;
    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

pub fn api_routes(service: Arc<AppService>) -> Router {
    Router::new()
        .route("/accounts", post(create_account).get(list_accounts))
        .route(
            "/accounts/{account_id}",
            get(get_account).put(update_account).delete(delete_account),
        )
        .route(
            "/accounts/{account_id}/transactions",
            post(add_transaction).get(list_transactions),
        )
        .route(
            "/transactions/{transaction_id}",
            get(get_transaction).put(update_transaction).delete(delete_transaction),
        )
        .route(
            "/reconciliation",
            post(create_reconciliation).get(list_reconciliations),
        )
        .route(
            "/reconciliation/{reconciliation_id}",
            get(get_reconciliation).delete(delete_reconciliation),
        )
        .route(
            "/reconciliation/{reconciliation_id}/resolve/{match_id}",
            post(resolve_match),
        )
        .route(
            "/reconciliation/{reconciliation_id}/complete",
            post(complete_reconciliation),
        )
        .route(
            "/shared-accounts",
            post(create_shared_account).get(list_shared_accounts),
        )
        .route("/shared-accounts/{shared_account_id}", get(get_shared_account))
        .route("/shared-accounts/{shared_account_id}/members", post(add_shared_member))
        .route(
            "/shared-accounts/{shared_account_id}/split-transactions",
            post(add_split_transaction).get(list_split_transactions),
        )
        .route("/shared-accounts/{shared_account_id}/balance", get(get_shared_balances))
        .route("/shared-accounts/{shared_account_id}/settle", post(settle_shared_account))
        .route("/logs", get(get_app_logs))
        .route_layer(middleware::from_fn_with_state(service.clone(), auth_middleware))
        .with_state(service)
}

#[utoipa::path(
    post,
    path = "/api/accounts",
    request_body = CreateAccountRequest,
    responses(
        (status = 201, description = "Account created", body = Account),
        (status = 400, description = "Invalid name, currency or balance", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
async fn create_account(
    State(service): State<Arc<AppService>>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateAccountRequest>,
) -> Result<(StatusCode, Json<Account>), ApiError> {
    let account = service
        .create_account(req.name, req.currency, req.opening_balance, &claims.sub)
        .await?;
    Ok((StatusCode::CREATED, Json(account)))
}

#[utoipa::path(
    get,
    path = "/api/accounts/{account_id}",
    params(
        ("account_id" = u64, Path, description = "ID of the ledger account")
    ),
    responses(
        (status = 200, description = "Account retrieved", body = Account),
        (status = 404, description = "Account not found", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
async fn get_account(
    State(service): State<Arc<AppService>>,
    Path(account_id): Path<AccountId>,
) -> Result<Json<Account>, ApiError> {
    Ok(Json(service.get_account(account_id).await?))
}

#[utoipa::path(
    get,
    path = "/api/accounts",
    responses(
        (status = 200, description = "All ledger accounts by id", body = Vec<Account>)
    ),
    security(("Bearer" = []))
)]
async fn list_accounts(State(service): State<Arc<AppService>>) -> Result<Json<Vec<Account>>, ApiError> {
    Ok(Json(service.list_accounts().await?))
}

#[utoipa::path(
    put,
    path = "/api/accounts/{account_id}",
    request_body = UpdateAccountRequest,
    params(
        ("account_id" = u64, Path, description = "ID of the ledger account")
    ),
    responses(
        (status = 200, description = "Account renamed", body = Account),
        (status = 400, description = "Invalid name", body = ErrorResponse),
        (status = 404, description = "Account not found", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
async fn update_account(
    State(service): State<Arc<AppService>>,
    Extension(claims): Extension<Claims>,
    Path(account_id): Path<AccountId>,
    Json(req): Json<UpdateAccountRequest>,
) -> Result<Json<Account>, ApiError> {
    Ok(Json(service.update_account(account_id, req.name, &claims.sub).await?))
}

#[utoipa::path(
    delete,
    path = "/api/accounts/{account_id}",
    params(
        ("account_id" = u64, Path, description = "ID of the ledger account")
    ),
    responses(
        (status = 204, description = "Account and its transactions deleted"),
        (status = 404, description = "Account not found", body = ErrorResponse),
        (status = 409, description = "Account has an open reconciliation", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
async fn delete_account(
    State(service): State<Arc<AppService>>,
    Extension(claims): Extension<Claims>,
    Path(account_id): Path<AccountId>,
) -> Result<StatusCode, ApiError> {
    service.delete_account(account_id, &claims.sub).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/transactions/{transaction_id}",
    params(
        ("transaction_id" = u64, Path, description = "ID of the ledger transaction")
    ),
    responses(
        (status = 200, description = "Transaction retrieved", body = LedgerTransaction),
        (status = 404, description = "Transaction not found", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
async fn get_transaction(
    State(service): State<Arc<AppService>>,
    Path(transaction_id): Path<TransactionId>,
) -> Result<Json<LedgerTransaction>, ApiError> {
    Ok(Json(service.get_transaction(transaction_id).await?))
}

#[utoipa::path(
    put,
    path = "/api/transactions/{transaction_id}",
    request_body = TransactionChanges,
    params(
        ("transaction_id" = u64, Path, description = "ID of the ledger transaction")
    ),
    responses(
        (status = 200, description = "Transaction updated", body = LedgerTransaction),
        (status = 400, description = "Bad request", body = ErrorResponse),
        (status = 404, description = "Transaction not found", body = ErrorResponse),
        (status = 409, description = "Transaction is part of an open reconciliation", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
async fn update_transaction(
    State(service): State<Arc<AppService>>,
    Extension(claims): Extension<Claims>,
    Path(transaction_id): Path<TransactionId>,
    Json(changes): Json<TransactionChanges>,
) -> Result<Json<LedgerTransaction>, ApiError> {
    Ok(Json(
        service
            .update_transaction(transaction_id, changes, &claims.sub)
            .await?,
    ))
}

#[utoipa::path(
    delete,
    path = "/api/transactions/{transaction_id}",
    params(
        ("transaction_id" = u64, Path, description = "ID of the ledger transaction")
    ),
    responses(
        (status = 204, description = "Transaction deleted"),
        (status = 404, description = "Transaction not found", body = ErrorResponse),
        (status = 409, description = "Transaction is part of an open reconciliation", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
async fn delete_transaction(
    State(service): State<Arc<AppService>>,
    Extension(claims): Extension<Claims>,
    Path(transaction_id): Path<TransactionId>,
) -> Result<StatusCode, ApiError> {
    service.delete_transaction(transaction_id, &claims.sub).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/accounts/{account_id}/transactions",
    request_body = AddTransactionRequest,
    params(
        ("account_id" = u64, Path, description = "ID of the ledger account")
    ),
    responses(
        (status = 201, description = "Transaction recorded", body = LedgerTransaction),
        (status = 400, description = "Bad request", body = ErrorResponse),
        (status = 404, description = "Account not found", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
async fn add_transaction(
    State(service): State<Arc<AppService>>,
    Extension(claims): Extension<Claims>,
    Path(account_id): Path<AccountId>,
    Json(req): Json<AddTransactionRequest>,
) -> Result<(StatusCode, Json<LedgerTransaction>), ApiError> {
    let transaction = service
        .add_transaction(
            account_id,
            req.date,
            req.amount,
            req.description,
            req.category,
            req.notes,
            &claims.sub,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(transaction)))
}

#[utoipa::path(
    get,
    path = "/api/accounts/{account_id}/transactions",
    params(
        ("account_id" = u64, Path, description = "ID of the ledger account")
    ),
    responses(
        (status = 200, description = "Transactions newest first with running balances", body = Vec<TransactionWithBalance>),
        (status = 404, description = "Account not found", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
async fn list_transactions(
    State(service): State<Arc<AppService>>,
    Path(account_id): Path<AccountId>,
) -> Result<Json<Vec<TransactionWithBalance>>, ApiError> {
    Ok(Json(service.list_transactions_with_balance(account_id).await?))
}

#[utoipa::path(
    post,
    path = "/api/reconciliation",
    request_body = CreateReconciliationRequest,
    responses(
        (status = 201, description = "Reconciliation created and matched", body = ReconciliationOverview),
        (status = 400, description = "Invalid period or amounts", body = ErrorResponse),
        (status = 404, description = "Account not found", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
async fn create_reconciliation(
    State(service): State<Arc<AppService>>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateReconciliationRequest>,
) -> Result<(StatusCode, Json<ReconciliationOverview>), ApiError> {
    let overview = service
        .create_reconciliation(
            req.account_id,
            req.period_start,
            req.period_end,
            req.bank_rows,
            req.bank_balance,
            &claims.sub,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(overview)))
}

#[utoipa::path(
    get,
    path = "/api/reconciliation",
    params(ListReconciliationsQuery),
    responses(
        (status = 200, description = "Reconciliations newest first", body = Vec<ReconciliationOverview>)
    ),
    security(("Bearer" = []))
)]
async fn list_reconciliations(
    State(service): State<Arc<AppService>>,
    Query(query): Query<ListReconciliationsQuery>,
) -> Result<Json<Vec<ReconciliationOverview>>, ApiError> {
    Ok(Json(service.list_reconciliations(query.account_id).await?))
}

#[utoipa::path(
    get,
    path = "/api/reconciliation/{reconciliation_id}",
    params(
        ("reconciliation_id" = String, Path, description = "ID of the reconciliation")
    ),
    responses(
        (status = 200, description = "Reconciliation with all matches", body = ReconciliationSession),
        (status = 404, description = "Reconciliation not found", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
async fn get_reconciliation(
    State(service): State<Arc<AppService>>,
    Path(reconciliation_id): Path<String>,
) -> Result<Json<ReconciliationSession>, ApiError> {
    Ok(Json(service.get_reconciliation(&reconciliation_id).await?))
}

#[utoipa::path(
    delete,
    path = "/api/reconciliation/{reconciliation_id}",
    params(
        ("reconciliation_id" = String, Path, description = "ID of the reconciliation")
    ),
    responses(
        (status = 204, description = "Reconciliation deleted"),
        (status = 404, description = "Reconciliation not found", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
async fn delete_reconciliation(
    State(service): State<Arc<AppService>>,
    Extension(claims): Extension<Claims>,
    Path(reconciliation_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    service.delete_reconciliation(&reconciliation_id, &claims.sub).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/reconciliation/{reconciliation_id}/resolve/{match_id}",
    request_body = ResolveMatchRequest,
    params(
        ("reconciliation_id" = String, Path, description = "ID of the reconciliation"),
        ("match_id" = String, Path, description = "ID of the match to resolve")
    ),
    responses(
        (status = 200, description = "Match resolved", body = Match),
        (status = 400, description = "Action not allowed for this match", body = ErrorResponse),
        (status = 404, description = "Reconciliation or match not found", body = ErrorResponse),
        (status = 409, description = "Match already resolved or reconciliation completed", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
async fn resolve_match(
    State(service): State<Arc<AppService>>,
    Extension(claims): Extension<Claims>,
    Path((reconciliation_id, match_id)): Path<(String, String)>,
    Json(req): Json<ResolveMatchRequest>,
) -> Result<Json<Match>, ApiError> {
    let resolved = service
        .resolve_match(
            &reconciliation_id,
            &match_id,
            req.action,
            req.transaction_data,
            req.notes,
            &claims.sub,
        )
        .await?;
    Ok(Json(resolved))
}

#[utoipa::path(
    post,
    path = "/api/reconciliation/{reconciliation_id}/complete",
    params(
        ("reconciliation_id" = String, Path, description = "ID of the reconciliation")
    ),
    responses(
        (status = 200, description = "Reconciliation completed", body = ReconciliationSession),
        (status = 404, description = "Reconciliation not found", body = ErrorResponse),
        (status = 409, description = "Reconciliation already completed", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
async fn complete_reconciliation(
    State(service): State<Arc<AppService>>,
    Extension(claims): Extension<Claims>,
    Path(reconciliation_id): Path<String>,
) -> Result<Json<ReconciliationSession>, ApiError> {
    Ok(Json(
        service
            .complete_reconciliation(&reconciliation_id, &claims.sub)
            .await?,
    ))
}

#[utoipa::path(
    post,
    path = "/api/shared-accounts",
    request_body = CreateSharedAccountRequest,
    responses(
        (status = 201, description = "Shared account created", body = SharedAccount),
        (status = 400, description = "Bad request", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
async fn create_shared_account(
    State(service): State<Arc<AppService>>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateSharedAccountRequest>,
) -> Result<(StatusCode, Json<SharedAccount>), ApiError> {
    let account = service
        .create_shared_account(req.name, req.description, req.currency, req.members, &claims.sub)
        .await?;
    Ok((StatusCode::CREATED, Json(account)))
}

#[utoipa::path(
    get,
    path = "/api/shared-accounts",
    responses(
        (status = 200, description = "All shared accounts", body = Vec<SharedAccount>)
    ),
    security(("Bearer" = []))
)]
async fn list_shared_accounts(State(service): State<Arc<AppService>>) -> Result<Json<Vec<SharedAccount>>, ApiError> {
    Ok(Json(service.list_shared_accounts().await?))
}

#[utoipa::path(
    get,
    path = "/api/shared-accounts/{shared_account_id}",
    params(
        ("shared_account_id" = String, Path, description = "ID of the shared account")
    ),
    responses(
        (status = 200, description = "Shared account retrieved", body = SharedAccount),
        (status = 404, description = "Shared account not found", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
async fn get_shared_account(
    State(service): State<Arc<AppService>>,
    Path(shared_account_id): Path<String>,
) -> Result<Json<SharedAccount>, ApiError> {
    Ok(Json(service.get_shared_account(&shared_account_id).await?))
}

#[utoipa::path(
    post,
    path = "/api/shared-accounts/{shared_account_id}/members",
    request_body = AddSharedMemberRequest,
    params(
        ("shared_account_id" = String, Path, description = "ID of the shared account")
    ),
    responses(
        (status = 200, description = "Member added", body = SharedAccount),
        (status = 404, description = "Shared account not found", body = ErrorResponse),
        (status = 409, description = "Already a member", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
async fn add_shared_member(
    State(service): State<Arc<AppService>>,
    Extension(claims): Extension<Claims>,
    Path(shared_account_id): Path<String>,
    Json(req): Json<AddSharedMemberRequest>,
) -> Result<Json<SharedAccount>, ApiError> {
    let account = service
        .add_member(&shared_account_id, req.user_identifier, req.role, &claims.sub)
        .await?;
    Ok(Json(account))
}

#[utoipa::path(
    post,
    path = "/api/shared-accounts/{shared_account_id}/split-transactions",
    request_body = AddSplitTransactionRequest,
    params(
        ("shared_account_id" = String, Path, description = "ID of the shared account")
    ),
    responses(
        (status = 201, description = "Split transaction recorded", body = SplitTransaction),
        (status = 400, description = "Payer not a member or split type unsupported", body = ErrorResponse),
        (status = 404, description = "Shared account not found", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
async fn add_split_transaction(
    State(service): State<Arc<AppService>>,
    Extension(claims): Extension<Claims>,
    Path(shared_account_id): Path<String>,
    Json(req): Json<AddSplitTransactionRequest>,
) -> Result<(StatusCode, Json<SplitTransaction>), ApiError> {
    let split = service
        .add_split_transaction(
            &shared_account_id,
            req.paid_by,
            req.total_amount,
            req.date,
            req.description,
            req.category,
            req.split_type,
            &claims.sub,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(split)))
}

#[utoipa::path(
    get,
    path = "/api/shared-accounts/{shared_account_id}/split-transactions",
    params(
        ("shared_account_id" = String, Path, description = "ID of the shared account")
    ),
    responses(
        (status = 200, description = "Split transactions in insertion order", body = Vec<SplitTransaction>),
        (status = 404, description = "Shared account not found", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
async fn list_split_transactions(
    State(service): State<Arc<AppService>>,
    Path(shared_account_id): Path<String>,
) -> Result<Json<Vec<SplitTransaction>>, ApiError> {
    Ok(Json(service.list_split_transactions(&shared_account_id).await?))
}

#[utoipa::path(
    get,
    path = "/api/shared-accounts/{shared_account_id}/balance",
    params(
        ("shared_account_id" = String, Path, description = "ID of the shared account")
    ),
    responses(
        (status = 200, description = "Net balance per member", body = Vec<MemberBalance>),
        (status = 404, description = "Shared account not found", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
async fn get_shared_balances(
    State(service): State<Arc<AppService>>,
    Path(shared_account_id): Path<String>,
) -> Result<Json<Vec<MemberBalance>>, ApiError> {
    Ok(Json(service.get_shared_balances(&shared_account_id).await?))
}

#[utoipa::path(
    post,
    path = "/api/shared-accounts/{shared_account_id}/settle",
    params(
        ("shared_account_id" = String, Path, description = "ID of the shared account")
    ),
    responses(
        (status = 200, description = "Transfers that settle every balance", body = Vec<Transfer>),
        (status = 404, description = "Shared account not found", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
async fn settle_shared_account(
    State(service): State<Arc<AppService>>,
    Extension(claims): Extension<Claims>,
    Path(shared_account_id): Path<String>,
) -> Result<Json<Vec<Transfer>>, ApiError> {
    Ok(Json(
        service
            .settle_shared_account(&shared_account_id, &claims.sub)
            .await?,
    ))
}

#[utoipa::path(
    get,
    path = "/api/logs",
    responses(
        (status = 200, description = "Application logs retrieved successfully", body = Vec<AppLog>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
async fn get_app_logs(State(service): State<Arc<AppService>>) -> Result<Json<Vec<AppLog>>, ApiError> {
    let logs = service.get_app_logs().await?;
    Ok(Json(logs))
}
