pub mod in_memory;

use crate::core::errors::ReconcilioError;
use crate::core::models::audit::AppLog;
use async_trait::async_trait;

/// Audit trail of state-changing operations.
#[async_trait]
pub trait LoggingService: Send + Sync {
    /// `details` must be a JSON object; its fields become the entry's detail map.
    async fn log_action(
        &self,
        action: &str,
        details: serde_json::Value,
        user_id: Option<&str>,
    ) -> Result<(), ReconcilioError>;
    /// Entries in the order they were recorded.
    async fn get_logs(&self) -> Result<Vec<AppLog>, ReconcilioError>;
}
