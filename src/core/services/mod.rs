mod ledger;
mod reconciliation;
mod shared_accounts;

use crate::auth::jwt::{Claims, JwtService};
use crate::config::CONFIG;
use crate::core::errors::ReconcilioError;
use crate::core::models::audit::AppLog;
use crate::infrastructure::cache::Cache;
use crate::infrastructure::logging::LoggingService;
use crate::infrastructure::storage::Storage;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::OwnedMutexGuard;

/// Async mutexes handed out by key. An entry lives only while a caller holds
/// or waits for it, so unknown keys leave nothing behind.
#[derive(Default)]
struct KeyedLocks {
    locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

struct KeyedGuard<'a> {
    owner: &'a KeyedLocks,
    key: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl KeyedLocks {
    async fn lock(&self, key: &str) -> Result<KeyedGuard<'_>, ReconcilioError> {
        // Built before waiting so a cancelled wait still releases the entry.
        let mut held = KeyedGuard {
            owner: self,
            key: key.to_string(),
            guard: None,
        };
        let mutex = {
            let mut locks = self
                .locks
                .lock()
                .map_err(|e| ReconcilioError::InternalServerError(format!("Lock table poisoned: {}", e)))?;
            locks.entry(key.to_string()).or_default().clone()
        };
        held.guard = Some(mutex.lock_owned().await);
        Ok(held)
    }

    fn len(&self) -> usize {
        self.locks.lock().map(|locks| locks.len()).unwrap_or_default()
    }
}

impl Drop for KeyedGuard<'_> {
    fn drop(&mut self) {
        self.guard.take();
        if let Ok(mut locks) = self.owner.locks.lock() {
            // Clones are only taken under this mutex, so a count of one means no holder or waiter is left.
            if locks.get(&self.key).is_some_and(|m| Arc::strong_count(m) == 1) {
                locks.remove(&self.key);
            }
        }
    }
}

pub struct ReconcilioService<L: LoggingService, S: Storage, C: Cache> {
    storage: S,
    logging: L,
    cache: C,
    jwt_service: JwtService,
    balance_cache_ttl: Duration,
    /// Writes to one reconciliation session run one at a time.
    session_locks: KeyedLocks,
    /// Serializes split writes with balance recomputation per shared account.
    shared_account_locks: KeyedLocks,
}

impl<L: LoggingService, S: Storage, C: Cache> ReconcilioService<L, S, C> {
    pub fn new(storage: S, logging: L, cache: C, jwt_secret: String) -> Self {
        ReconcilioService {
            storage,
            logging,
            cache,
            jwt_service: JwtService::new(jwt_secret),
            balance_cache_ttl: Duration::from_secs(CONFIG.balance_cache_ttl_secs),
            session_locks: KeyedLocks::default(),
            shared_account_locks: KeyedLocks::default(),
        }
    }

    pub fn validate_token(&self, token: &str) -> Result<Claims, ReconcilioError> {
        self.jwt_service.validate_token(token)
    }

    pub fn issue_token(&self, user_id: &str, role: &str) -> Result<String, ReconcilioError> {
        self.jwt_service.generate_token(user_id, role)
    }

    pub async fn get_app_logs(&self) -> Result<Vec<AppLog>, ReconcilioError> {
        self.logging.get_logs().await
    }

    /// Number of lock entries currently tracked, sessions and shared accounts together.
    pub fn tracked_lock_count(&self) -> usize {
        self.session_locks.len() + self.shared_account_locks.len()
    }

    async fn log_action(&self, action: &str, details: serde_json::Value, user_id: &str) -> Result<(), ReconcilioError> {
        self.logging.log_action(action, details, Some(user_id)).await
    }

    fn validate_string_input(&self, field: &str, value: &str, max_length: usize) -> Result<(), ReconcilioError> {
        if value.trim().is_empty() {
            return Err(ReconcilioError::invalid_input(
                field,
                format!("Invalid {}", field),
                format!("{} cannot be empty", field),
            ));
        }
        if value.chars().count() > max_length {
            return Err(ReconcilioError::invalid_input(
                field,
                format!("{} Too Long", field),
                format!("{} cannot exceed {} characters", field, max_length),
            ));
        }
        if value.chars().any(|c| c.is_control()) {
            return Err(ReconcilioError::invalid_input(
                field,
                format!("Invalid {}", field),
                format!("{} contains invalid characters", field),
            ));
        }
        Ok(())
    }

    fn validate_optional_string(&self, field: &str, value: Option<&str>, max_length: usize) -> Result<(), ReconcilioError> {
        match value {
            Some(v) => self.validate_string_input(field, v, max_length),
            None => Ok(()),
        }
    }
}
