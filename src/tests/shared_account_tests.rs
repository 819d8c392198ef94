use super::{TEST_SECRET, create_test_service, date, dec};
use crate::core::constants::{MEMBER_ADDED, SHARED_ACCOUNT_CREATED, SPLIT_TRANSACTION_ADDED};
use crate::core::errors::ReconcilioError;
use crate::core::models::shared_account::{BalanceStatus, MemberBalance, MemberRole, NewMember, SplitType};
use crate::core::services::ReconcilioService;
use crate::infrastructure::cache::Cache;
use crate::infrastructure::cache::in_memory::InMemoryCache;
use crate::infrastructure::logging::in_memory::InMemoryLogging;
use crate::infrastructure::storage::in_memory::InMemoryStorage;
use async_trait::async_trait;
use std::time::Duration;

/// Cache whose writes land late, leaving room for a concurrent split.
#[derive(Clone, Default)]
struct SlowWriteCache {
    inner: InMemoryCache,
}

#[async_trait]
impl Cache for SlowWriteCache {
    async fn get_shared_balances(&self, shared_account_id: &str) -> Result<Option<Vec<MemberBalance>>, ReconcilioError> {
        self.inner.get_shared_balances(shared_account_id).await
    }

    async fn save_shared_balances(
        &self,
        shared_account_id: &str,
        balances: &[MemberBalance],
        ttl: Duration,
    ) -> Result<(), ReconcilioError> {
        tokio::time::sleep(Duration::from_millis(50)).await;
        self.inner.save_shared_balances(shared_account_id, balances, ttl).await
    }

    async fn invalidate_shared_balances(&self, shared_account_id: &str) -> Result<(), ReconcilioError> {
        self.inner.invalidate_shared_balances(shared_account_id).await
    }
}

fn member(user_identifier: &str) -> NewMember {
    NewMember {
        user_identifier: user_identifier.to_string(),
        role: MemberRole::Member,
    }
}

#[tokio::test]
async fn test_create_shared_account_makes_creator_owner() {
    let _ = env_logger::try_init();
    let service = create_test_service();

    let account = service
        .create_shared_account(
            "Flat".to_string(),
            Some("Rent and groceries".to_string()),
            "chf".to_string(),
            vec![
                member("B"),
                NewMember {
                    user_identifier: "C".to_string(),
                    role: MemberRole::Viewer,
                },
                member("B"),
                member("A"),
            ],
            "A",
        )
        .await
        .unwrap();

    assert_eq!(account.currency, "CHF");
    assert_eq!(account.member_ids(), vec!["A", "B", "C"]);
    assert_eq!(account.members[0].role, MemberRole::Owner);
    assert_eq!(account.members[2].role, MemberRole::Viewer);

    let fetched = service.get_shared_account(&account.id).await.unwrap();
    assert_eq!(fetched, account);
    assert_eq!(service.list_shared_accounts().await.unwrap().len(), 1);

    let logs = service.get_app_logs().await.unwrap();
    assert_eq!(logs[0].action, SHARED_ACCOUNT_CREATED);
    assert_eq!(logs[0].user_id.as_deref(), Some("A"));

    let result = service
        .create_shared_account("Trip".to_string(), None, "DOGE".to_string(), vec![], "A")
        .await;
    assert!(matches!(result, Err(ReconcilioError::UnsupportedCurrency(_))));
}

#[tokio::test]
async fn test_add_member() {
    let _ = env_logger::try_init();
    let service = create_test_service();
    let account = service
        .create_shared_account("Flat".to_string(), None, "EUR".to_string(), vec![], "A")
        .await
        .unwrap();

    let account = service
        .add_member(&account.id, "B".to_string(), None, "A")
        .await
        .unwrap();
    assert_eq!(account.member_ids(), vec!["A", "B"]);
    assert_eq!(account.members[1].role, MemberRole::Member);

    let result = service.add_member(&account.id, "B".to_string(), None, "A").await;
    assert!(matches!(result, Err(ReconcilioError::AlreadyMember(user)) if user == "B"));

    let result = service.add_member("missing", "C".to_string(), None, "A").await;
    assert!(matches!(result, Err(ReconcilioError::SharedAccountNotFound(_))));

    let logs = service.get_app_logs().await.unwrap();
    assert_eq!(logs.last().map(|l| l.action.as_str()), Some(MEMBER_ADDED));
}

#[tokio::test]
async fn test_equal_split_transaction() {
    let _ = env_logger::try_init();
    let service = create_test_service();
    let account = service
        .create_shared_account(
            "Flat".to_string(),
            None,
            "CHF".to_string(),
            vec![member("B"), member("C")],
            "A",
        )
        .await
        .unwrap();

    let split = service
        .add_split_transaction(
            &account.id,
            "B".to_string(),
            dec("100.00"),
            date(2024, 6, 1),
            Some("Groceries".to_string()),
            None,
            SplitType::Equal,
            "B",
        )
        .await
        .unwrap();

    assert_eq!(split.shares["A"], dec("33.33"));
    assert_eq!(split.shares["B"], dec("33.34"));
    assert_eq!(split.shares["C"], dec("33.33"));
    assert_eq!(split.shares.values().copied().sum::<rust_decimal::Decimal>(), dec("100.00"));

    let listed = service.list_split_transactions(&account.id).await.unwrap();
    assert_eq!(listed, vec![split]);

    let logs = service.get_app_logs().await.unwrap();
    assert_eq!(logs.last().map(|l| l.action.as_str()), Some(SPLIT_TRANSACTION_ADDED));
}

#[tokio::test]
async fn test_split_transaction_rejections() {
    let _ = env_logger::try_init();
    let service = create_test_service();
    let account = service
        .create_shared_account("Flat".to_string(), None, "CHF".to_string(), vec![member("B")], "A")
        .await
        .unwrap();

    let service = &service;
    let account_id = account.id.as_str();
    let attempt = move |paid_by: &str, amount: &str, split_type: SplitType| {
        service.add_split_transaction(
            account_id,
            paid_by.to_string(),
            dec(amount),
            date(2024, 6, 1),
            None,
            None,
            split_type,
            "A",
        )
    };

    assert!(matches!(
        attempt("Z", "10.00", SplitType::Equal).await,
        Err(ReconcilioError::NotMember(user)) if user == "Z"
    ));
    assert!(matches!(
        attempt("A", "10.00", SplitType::Percentage).await,
        Err(ReconcilioError::UnsupportedSplitType(_))
    ));
    assert!(matches!(
        attempt("A", "10.00", SplitType::Custom).await,
        Err(ReconcilioError::UnsupportedSplitType(_))
    ));
    assert!(matches!(
        attempt("A", "0", SplitType::Equal).await,
        Err(ReconcilioError::InvalidInput(field, _)) if field == "total_amount"
    ));
    assert!(matches!(
        attempt("A", "10.001", SplitType::Equal).await,
        Err(ReconcilioError::InvalidInput(field, _)) if field == "total_amount"
    ));
    assert!(service.list_split_transactions(&account.id).await.unwrap().is_empty());

    let result = service.list_split_transactions("missing").await;
    assert!(matches!(result, Err(ReconcilioError::SharedAccountNotFound(_))));
}

#[tokio::test]
async fn test_balances_and_settlement() {
    let _ = env_logger::try_init();
    let service = create_test_service();
    let account = service
        .create_shared_account(
            "Trip".to_string(),
            None,
            "CHF".to_string(),
            vec![member("B"), member("C")],
            "A",
        )
        .await
        .unwrap();
    service
        .add_split_transaction(
            &account.id,
            "A".to_string(),
            dec("90.00"),
            date(2024, 6, 1),
            Some("Dinner".to_string()),
            None,
            SplitType::Equal,
            "A",
        )
        .await
        .unwrap();

    let balances = service.get_shared_balances(&account.id).await.unwrap();
    let summary: Vec<_> = balances
        .iter()
        .map(|b| (b.user.as_str(), b.amount, b.status))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("A", dec("60.00"), BalanceStatus::Owed),
            ("B", dec("-30.00"), BalanceStatus::Owes),
            ("C", dec("-30.00"), BalanceStatus::Owes),
        ]
    );

    let transfers = service.settle_shared_account(&account.id, "A").await.unwrap();
    assert_eq!(transfers.len(), 2);
    assert!(transfers.iter().all(|t| t.to == "A" && t.amount == dec("30.00")));
    assert_eq!(transfers[0].from, "B");
    assert_eq!(transfers[1].from, "C");
}

#[tokio::test]
async fn test_balances_refresh_after_changes() {
    let _ = env_logger::try_init();
    let service = create_test_service();
    let account = service
        .create_shared_account("Flat".to_string(), None, "EUR".to_string(), vec![member("B")], "A")
        .await
        .unwrap();

    let balances = service.get_shared_balances(&account.id).await.unwrap();
    assert!(balances.iter().all(|b| b.status == BalanceStatus::Settled));

    service
        .add_split_transaction(
            &account.id,
            "B".to_string(),
            dec("40.00"),
            date(2024, 6, 2),
            None,
            None,
            SplitType::Equal,
            "B",
        )
        .await
        .unwrap();
    let balances = service.get_shared_balances(&account.id).await.unwrap();
    assert_eq!(balances[0].user, "B");
    assert_eq!(balances[0].amount, dec("20.00"));

    service.add_member(&account.id, "C".to_string(), None, "A").await.unwrap();
    let balances = service.get_shared_balances(&account.id).await.unwrap();
    assert_eq!(balances.len(), 3);
    let c = balances.iter().find(|b| b.user == "C").unwrap();
    assert_eq!(c.status, BalanceStatus::Settled);

    let result = service.get_shared_balances("missing").await;
    assert!(matches!(result, Err(ReconcilioError::SharedAccountNotFound(_))));
}

#[tokio::test(start_paused = true)]
async fn test_split_added_during_balance_refresh_is_not_lost() {
    let _ = env_logger::try_init();
    let service = ReconcilioService::new(
        InMemoryStorage::new(),
        InMemoryLogging::new(),
        SlowWriteCache::default(),
        TEST_SECRET.to_string(),
    );
    let account = service
        .create_shared_account("Flat".to_string(), None, "CHF".to_string(), vec![member("B")], "A")
        .await
        .unwrap();
    service
        .add_split_transaction(
            &account.id,
            "A".to_string(),
            dec("90.00"),
            date(2024, 6, 1),
            None,
            None,
            SplitType::Equal,
            "A",
        )
        .await
        .unwrap();

    let (before, split) = tokio::join!(service.get_shared_balances(&account.id), async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        service
            .add_split_transaction(
                &account.id,
                "B".to_string(),
                dec("30.00"),
                date(2024, 6, 2),
                None,
                None,
                SplitType::Equal,
                "B",
            )
            .await
    });
    assert_eq!(before.unwrap()[0].amount, dec("45.00"));
    split.unwrap();

    let balances = service.get_shared_balances(&account.id).await.unwrap();
    assert_eq!(balances[0].user, "A");
    assert_eq!(balances[0].amount, dec("30.00"));
    let transfers = service.settle_shared_account(&account.id, "A").await.unwrap();
    assert_eq!(transfers.len(), 1);
    assert_eq!(transfers[0].from, "B");
    assert_eq!(transfers[0].amount, dec("30.00"));
    assert_eq!(service.tracked_lock_count(), 0);
}
