use super::ReconcilioService;
use crate::core::constants::{
    MAX_DESCRIPTION_LENGTH, MAX_NAME_LENGTH, MEMBER_ADDED, SETTLEMENT_CALCULATED, SHARED_ACCOUNT_CREATED,
    SPLIT_TRANSACTION_ADDED,
};
use crate::core::engine::settlement::{compute_balances, settle};
use crate::core::engine::split::split_shares;
use crate::core::errors::ReconcilioError;
use crate::core::models::currency::Currency;
use crate::core::models::shared_account::{
    Member, MemberBalance, MemberRole, NewMember, SharedAccount, SplitTransaction, SplitType, Transfer,
};
use crate::infrastructure::cache::Cache;
use crate::infrastructure::logging::LoggingService;
use crate::infrastructure::storage::Storage;
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde_json::json;
use std::collections::BTreeMap;
use tracing::{debug, info};
use uuid::Uuid;

impl<L: LoggingService, S: Storage, C: Cache> ReconcilioService<L, S, C> {
    /// The creator joins as owner; listed members keep the role they were given.
    pub async fn create_shared_account(
        &self,
        name: String,
        description: Option<String>,
        currency: String,
        members: Vec<NewMember>,
        created_by: &str,
    ) -> Result<SharedAccount, ReconcilioError> {
        self.validate_string_input("name", &name, MAX_NAME_LENGTH)?;
        self.validate_optional_string("description", description.as_deref(), MAX_DESCRIPTION_LENGTH)?;
        self.validate_string_input("created_by", created_by, MAX_NAME_LENGTH)?;
        let currency = Currency::lookup(&currency)?;

        let now = Utc::now();
        let mut account_members = vec![Member {
            user_identifier: created_by.to_string(),
            role: MemberRole::Owner,
            joined_at: now,
        }];
        for member in members {
            self.validate_string_input("user_identifier", &member.user_identifier, MAX_NAME_LENGTH)?;
            if account_members.iter().any(|m| m.user_identifier == member.user_identifier) {
                continue;
            }
            account_members.push(Member {
                user_identifier: member.user_identifier,
                role: member.role,
                joined_at: now,
            });
        }

        let account = SharedAccount {
            id: Uuid::new_v4().to_string(),
            name,
            description,
            currency: currency.code.to_string(),
            members: account_members,
            created_at: now,
        };
        self.storage.save_shared_account(account.clone()).await?;
        info!("Shared account {} created with {} members", account.id, account.members.len());

        self.log_action(
            SHARED_ACCOUNT_CREATED,
            json!({
                "shared_account_id": account.id,
                "name": account.name,
                "currency": account.currency,
                "member_ids": account.member_ids(),
            }),
            created_by,
        )
        .await?;
        Ok(account)
    }

    pub async fn list_shared_accounts(&self) -> Result<Vec<SharedAccount>, ReconcilioError> {
        self.storage.list_shared_accounts().await
    }

    pub async fn get_shared_account(&self, shared_account_id: &str) -> Result<SharedAccount, ReconcilioError> {
        self.storage
            .get_shared_account(shared_account_id)
            .await?
            .ok_or_else(|| ReconcilioError::SharedAccountNotFound(shared_account_id.to_string()))
    }

    pub async fn add_member(
        &self,
        shared_account_id: &str,
        user_identifier: String,
        role: Option<MemberRole>,
        added_by: &str,
    ) -> Result<SharedAccount, ReconcilioError> {
        self.validate_string_input("user_identifier", &user_identifier, MAX_NAME_LENGTH)?;
        let role = role.unwrap_or_default();
        let _guard = self.shared_account_locks.lock(shared_account_id).await?;

        let account = self
            .storage
            .add_shared_member(
                shared_account_id,
                Member {
                    user_identifier: user_identifier.clone(),
                    role,
                    joined_at: Utc::now(),
                },
            )
            .await?;
        self.cache.invalidate_shared_balances(shared_account_id).await?;

        self.log_action(
            MEMBER_ADDED,
            json!({
                "shared_account_id": shared_account_id,
                "user_identifier": user_identifier,
                "role": role,
            }),
            added_by,
        )
        .await?;
        Ok(account)
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn add_split_transaction(
        &self,
        shared_account_id: &str,
        paid_by: String,
        total_amount: Decimal,
        date: NaiveDate,
        description: Option<String>,
        category: Option<String>,
        split_type: SplitType,
        created_by: &str,
    ) -> Result<SplitTransaction, ReconcilioError> {
        let _guard = self.shared_account_locks.lock(shared_account_id).await?;
        let account = self.get_shared_account(shared_account_id).await?;
        self.validate_optional_string("description", description.as_deref(), MAX_DESCRIPTION_LENGTH)?;
        self.validate_optional_string("category", category.as_deref(), MAX_NAME_LENGTH)?;
        if total_amount <= Decimal::ZERO {
            return Err(ReconcilioError::invalid_input(
                "total_amount",
                "Invalid Amount",
                "Amount must be greater than 0",
            ));
        }
        if !account.is_member(&paid_by) {
            return Err(ReconcilioError::NotMember(paid_by));
        }

        let currency = Currency::lookup(&account.currency)?;
        let total_minor = currency.to_minor_units("total_amount", total_amount)?;
        let shares = split_shares(split_type, &paid_by, total_minor, &account.member_ids())?
            .into_iter()
            .map(|(user, minor)| Ok((user, currency.from_minor_units(minor)?)))
            .collect::<Result<BTreeMap<String, Decimal>, ReconcilioError>>()?;

        let split = SplitTransaction {
            id: Uuid::new_v4().to_string(),
            shared_account_id: account.id.clone(),
            paid_by,
            total_amount,
            date,
            description,
            category,
            split_type,
            shares,
            created_at: Utc::now(),
        };
        self.storage.save_split_transaction(split.clone()).await?;
        self.cache.invalidate_shared_balances(&account.id).await?;
        info!(
            "Split transaction {} of {} {} added to shared account {}",
            split.id, split.total_amount, account.currency, account.id
        );

        self.log_action(
            SPLIT_TRANSACTION_ADDED,
            json!({
                "shared_account_id": account.id,
                "split_transaction_id": split.id,
                "paid_by": split.paid_by,
                "total_amount": split.total_amount,
                "shares": split.shares,
            }),
            created_by,
        )
        .await?;
        Ok(split)
    }

    pub async fn list_split_transactions(
        &self,
        shared_account_id: &str,
    ) -> Result<Vec<SplitTransaction>, ReconcilioError> {
        self.get_shared_account(shared_account_id).await?;
        self.storage.get_split_transactions(shared_account_id).await
    }

    /// Net position of every member, largest creditor first. A miss recomputes
    /// under the account lock, so a split saved meanwhile cannot be cached over.
    pub async fn get_shared_balances(&self, shared_account_id: &str) -> Result<Vec<MemberBalance>, ReconcilioError> {
        if let Some(balances) = self.cache.get_shared_balances(shared_account_id).await? {
            debug!("Balance cache hit for shared account {}", shared_account_id);
            return Ok(balances);
        }
        let _guard = self.shared_account_locks.lock(shared_account_id).await?;

        let (account, splits) = futures::try_join!(
            self.get_shared_account(shared_account_id),
            self.storage.get_split_transactions(shared_account_id),
        )?;
        let currency = Currency::lookup(&account.currency)?;
        let balances = compute_balances(&account.member_ids(), &splits, &currency)?;

        self.cache
            .save_shared_balances(shared_account_id, &balances, self.balance_cache_ttl)
            .await?;
        Ok(balances)
    }

    pub async fn settle_shared_account(
        &self,
        shared_account_id: &str,
        requested_by: &str,
    ) -> Result<Vec<Transfer>, ReconcilioError> {
        let account = self.get_shared_account(shared_account_id).await?;
        let currency = Currency::lookup(&account.currency)?;
        let balances = self.get_shared_balances(shared_account_id).await?;
        let transfers = settle(&balances, &currency)?;

        self.log_action(
            SETTLEMENT_CALCULATED,
            json!({
                "shared_account_id": shared_account_id,
                "transfers": transfers,
            }),
            requested_by,
        )
        .await?;
        Ok(transfers)
    }
}
