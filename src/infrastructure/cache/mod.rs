pub mod cache_keys;
pub mod in_memory;

use crate::core::errors::ReconcilioError;
use crate::core::models::shared_account::MemberBalance;
use async_trait::async_trait;

#[async_trait]
pub trait Cache: Send + Sync {
    async fn get_shared_balances(&self, shared_account_id: &str) -> Result<Option<Vec<MemberBalance>>, ReconcilioError>;
    async fn save_shared_balances(
        &self,
        shared_account_id: &str,
        balances: &[MemberBalance],
        ttl: std::time::Duration,
    ) -> Result<(), ReconcilioError>;
    async fn invalidate_shared_balances(&self, shared_account_id: &str) -> Result<(), ReconcilioError>;
}
