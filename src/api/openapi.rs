use utoipa::OpenApi;

use crate::{
    api::models::{
        AddSharedMemberRequest, AddSplitTransactionRequest, AddTransactionRequest, CreateAccountRequest,
        CreateReconciliationRequest, CreateSharedAccountRequest, ErrorResponse, ResolveMatchRequest,
        UpdateAccountRequest,
    },
    core::models::{
        audit::AppLog,
        ledger::{Account, LedgerTransaction, TransactionChanges, TransactionWithBalance},
        reconciliation::{BankRow, Match, ReconciliationOverview, ReconciliationSession, TransactionData},
        shared_account::{MemberBalance, NewMember, SharedAccount, SplitTransaction, Transfer},
    },
};

#[derive(OpenApi)]
#[openapi(
    paths(
        super::handlers::create_account,
        super::handlers::list_accounts,
        super::handlers::get_account,
        super::handlers::update_account,
        super::handlers::delete_account,
        super::handlers::add_transaction,
        super::handlers::list_transactions,
        super::handlers::get_transaction,
        super::handlers::update_transaction,
        super::handlers::delete_transaction,
        super::handlers::create_reconciliation,
        super::handlers::list_reconciliations,
        super::handlers::get_reconciliation,
        super::handlers::delete_reconciliation,
        super::handlers::resolve_match,
        super::handlers::complete_reconciliation,
        super::handlers::create_shared_account,
        super::handlers::list_shared_accounts,
        super::handlers::get_shared_account,
        super::handlers::add_shared_member,
        super::handlers::add_split_transaction,
        super::handlers::list_split_transactions,
        super::handlers::get_shared_balances,
        super::handlers::settle_shared_account,
        super::handlers::get_app_logs
    ),
    components(schemas(
        CreateAccountRequest,
        UpdateAccountRequest,
        AddTransactionRequest,
        TransactionChanges,
        CreateReconciliationRequest,
        ResolveMatchRequest,
        CreateSharedAccountRequest,
        AddSharedMemberRequest,
        AddSplitTransactionRequest,
        ErrorResponse,
        Account,
        LedgerTransaction,
        TransactionWithBalance,
        BankRow,
        Match,
        TransactionData,
        ReconciliationOverview,
        ReconciliationSession,
        NewMember,
        SharedAccount,
        SplitTransaction,
        MemberBalance,
        Transfer,
        AppLog
    )),
    info(
        title = "Reconcilio API",
        description = "Bank statement reconciliation and shared-account settlement",
        version = "0.1.0"
    )
)]
pub struct ApiDoc;
