use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MemberRole {
    Owner,
    #[default]
    Member,
    Viewer,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct Member {
    pub user_identifier: String,
    pub role: MemberRole,
    pub joined_at: DateTime<Utc>,
}

/// A member as listed when creating a shared account.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct NewMember {
    pub user_identifier: String,
    #[serde(default)]
    pub role: MemberRole,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct SharedAccount {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub currency: String,
    pub members: Vec<Member>,
    pub created_at: DateTime<Utc>,
}

impl SharedAccount {
    pub fn is_member(&self, user_identifier: &str) -> bool {
        self.members.iter().any(|m| m.user_identifier == user_identifier)
    }

    pub fn member_ids(&self) -> Vec<String> {
        self.members.iter().map(|m| m.user_identifier.clone()).collect()
    }
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SplitType {
    #[default]
    Equal,
    Percentage,
    Custom,
}

impl std::fmt::Display for SplitType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SplitType::Equal => "equal",
            SplitType::Percentage => "percentage",
            SplitType::Custom => "custom",
        };
        write!(f, "{}", s)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct SplitTransaction {
    pub id: String,
    pub shared_account_id: String,
    pub paid_by: String,
    pub total_amount: Decimal,
    pub date: NaiveDate,
    pub description: Option<String>,
    pub category: Option<String>,
    pub split_type: SplitType,
    /// Member identifier to owed share; sums to `total_amount` exactly.
    pub shares: BTreeMap<String, Decimal>,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BalanceStatus {
    Owed,
    Owes,
    Settled,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct MemberBalance {
    pub user: String,
    /// Positive when the member is owed money, negative when they owe.
    pub amount: Decimal,
    pub status: BalanceStatus,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct Transfer {
    pub from: String,
    pub to: String,
    pub amount: Decimal,
}
