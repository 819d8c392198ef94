use super::{TEST_SECRET, create_test_service};
use crate::api::models::ApiError;
use crate::auth::jwt::JwtService;
use crate::core::errors::ReconcilioError;
use axum::http::StatusCode;
use axum::response::IntoResponse;

#[test]
fn test_error_status_mapping() {
    let cases = vec![
        (ReconcilioError::SessionNotFound("s".into()), StatusCode::NOT_FOUND),
        (ReconcilioError::MatchNotFound("m".into()), StatusCode::NOT_FOUND),
        (ReconcilioError::AccountNotFound(1), StatusCode::NOT_FOUND),
        (ReconcilioError::SharedAccountNotFound("x".into()), StatusCode::NOT_FOUND),
        (ReconcilioError::AlreadyResolved("m".into()), StatusCode::CONFLICT),
        (ReconcilioError::AlreadyMember("a".into()), StatusCode::CONFLICT),
        (ReconcilioError::SessionCompleted("s".into()), StatusCode::CONFLICT),
        (
            ReconcilioError::TransactionLocked {
                transaction_id: 7,
                session_id: "s".into(),
            },
            StatusCode::CONFLICT,
        ),
        (
            ReconcilioError::AccountHasOpenReconciliation {
                account_id: 1,
                session_id: "s".into(),
            },
            StatusCode::CONFLICT,
        ),
        (ReconcilioError::TransactionNotFound(7), StatusCode::NOT_FOUND),
        (
            ReconcilioError::InvalidPeriod {
                start: "2024-06-30".into(),
                end: "2024-06-01".into(),
            },
            StatusCode::BAD_REQUEST,
        ),
        (
            ReconcilioError::InvalidActionForState {
                action: "accept".into(),
                state: "unmatched_bank".into(),
            },
            StatusCode::BAD_REQUEST,
        ),
        (ReconcilioError::UnsupportedSplitType("custom".into()), StatusCode::BAD_REQUEST),
        (ReconcilioError::NoMembers, StatusCode::BAD_REQUEST),
        (ReconcilioError::NotMember("z".into()), StatusCode::BAD_REQUEST),
        (
            ReconcilioError::invalid_input("amount", "Invalid Amount", "too precise"),
            StatusCode::BAD_REQUEST,
        ),
        (ReconcilioError::Unauthorized("no token".into()), StatusCode::UNAUTHORIZED),
        (
            ReconcilioError::RoundingInvariantViolation {
                expected: 100,
                actual: 99,
            },
            StatusCode::INTERNAL_SERVER_ERROR,
        ),
        (ReconcilioError::StorageError("down".into()), StatusCode::INTERNAL_SERVER_ERROR),
    ];

    for (error, expected) in cases {
        let message = error.to_string();
        let api_error = ApiError::from(error);
        assert_eq!(api_error.status(), expected, "{}", message);
        assert_eq!(api_error.into_response().status(), expected);
    }
}

#[test]
fn test_issued_tokens_validate() {
    let jwt = JwtService::new(TEST_SECRET.to_string());
    let token = jwt.generate_token("alice", "USER").unwrap();

    let claims = jwt.validate_token(&token).unwrap();
    assert_eq!(claims.sub, "alice");
    assert_eq!(claims.role, "USER");

    let other = JwtService::new("another_secret".to_string());
    assert!(matches!(other.validate_token(&token), Err(ReconcilioError::Unauthorized(_))));
    assert!(matches!(jwt.validate_token("not-a-token"), Err(ReconcilioError::Unauthorized(_))));
}

#[test]
fn test_service_accepts_its_own_tokens() {
    let service = create_test_service();
    let token = service.issue_token("bob", "USER").unwrap();
    assert_eq!(service.validate_token(&token).unwrap().sub, "bob");
}
