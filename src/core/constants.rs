pub const ACCOUNT_CREATED: &str = "ACCOUNT_CREATED";
pub const ACCOUNT_UPDATED: &str = "ACCOUNT_UPDATED";
pub const ACCOUNT_DELETED: &str = "ACCOUNT_DELETED";
pub const TRANSACTION_ADDED: &str = "TRANSACTION_ADDED";
pub const TRANSACTION_UPDATED: &str = "TRANSACTION_UPDATED";
pub const TRANSACTION_DELETED: &str = "TRANSACTION_DELETED";
pub const RECONCILIATION_CREATED: &str = "RECONCILIATION_CREATED";
pub const MATCH_RESOLVED: &str = "MATCH_RESOLVED";
pub const RECONCILIATION_COMPLETED: &str = "RECONCILIATION_COMPLETED";
pub const RECONCILIATION_DELETED: &str = "RECONCILIATION_DELETED";
pub const SHARED_ACCOUNT_CREATED: &str = "SHARED_ACCOUNT_CREATED";
pub const MEMBER_ADDED: &str = "MEMBER_ADDED";
pub const SPLIT_TRANSACTION_ADDED: &str = "SPLIT_TRANSACTION_ADDED";
pub const SETTLEMENT_CALCULATED: &str = "SETTLEMENT_CALCULATED";

pub const MAX_NAME_LENGTH: usize = 100;
pub const MAX_DESCRIPTION_LENGTH: usize = 500;
