use crate::core::errors::ReconcilioError;
use crate::core::models::audit::AppLog;
use crate::infrastructure::logging::LoggingService;
use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Append-only audit trail. Every entry is also emitted on the `audit` tracing target.
#[derive(Clone, Default)]
pub struct InMemoryLogging {
    entries: Arc<RwLock<Vec<AppLog>>>,
}

impl InMemoryLogging {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LoggingService for InMemoryLogging {
    async fn log_action(&self, action: &str, details: Value, user_id: Option<&str>) -> Result<(), ReconcilioError> {
        let Value::Object(fields) = details else {
            return Err(ReconcilioError::LoggingError(format!(
                "Audit details for {} must be a JSON object",
                action
            )));
        };
        let entry = AppLog {
            id: Uuid::new_v4().to_string(),
            action: action.to_string(),
            user_id: user_id.map(String::from),
            details: fields.into_iter().collect(),
            timestamp: Utc::now(),
        };
        tracing::info!(target: "audit", action = %entry.action, user = ?entry.user_id, id = %entry.id, "recorded");

        self.entries.write().await.push(entry);
        Ok(())
    }

    async fn get_logs(&self) -> Result<Vec<AppLog>, ReconcilioError> {
        Ok(self.entries.read().await.clone())
    }
}
