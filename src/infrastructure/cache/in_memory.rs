use crate::core::errors::ReconcilioError;
use crate::core::models::shared_account::MemberBalance;
use crate::infrastructure::cache::Cache;
use crate::infrastructure::cache::cache_keys::shared_balances_key;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Clone, Default)]
pub struct InMemoryCache {
    cache: Arc<RwLock<HashMap<String, (Vec<MemberBalance>, DateTime<Utc>)>>>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        InMemoryCache {
            cache: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

#[async_trait]
impl Cache for InMemoryCache {
    async fn get_shared_balances(&self, shared_account_id: &str) -> Result<Option<Vec<MemberBalance>>, ReconcilioError> {
        let cache = self.cache.read().await;
        let key = shared_balances_key(shared_account_id);
        Ok(cache
            .get(&key)
            .filter(|(_, expiry)| *expiry > Utc::now())
            .map(|(balances, _)| balances.clone()))
    }

    async fn save_shared_balances(
        &self,
        shared_account_id: &str,
        balances: &[MemberBalance],
        ttl: std::time::Duration,
    ) -> Result<(), ReconcilioError> {
        let expiry = Utc::now()
            + chrono::Duration::from_std(ttl)
                .map_err(|e| ReconcilioError::CacheError(format!("Failed to convert TTL: {}", e)))?;
        let mut cache = self.cache.write().await;
        cache.insert(shared_balances_key(shared_account_id), (balances.to_vec(), expiry));
        Ok(())
    }

    async fn invalidate_shared_balances(&self, shared_account_id: &str) -> Result<(), ReconcilioError> {
        let mut cache = self.cache.write().await;
        cache.remove(&shared_balances_key(shared_account_id));
        cache.retain(|_, (_, expiry)| *expiry > Utc::now());
        Ok(())
    }
}
