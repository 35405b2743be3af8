//! Notification sink interface.

use crate::services::ServiceError;
use tracing::info;

/// Receives user-facing `(title, body, detail)` notifications on trade
/// success, failure and validation rejection. How they are displayed is
/// the host's concern.
#[async_trait::async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify(&self, title: &str, body: &str, detail: &str) -> Result<(), ServiceError>;
}

/// Default sink that forwards notifications to the log.
pub struct LogNotificationSink;

#[async_trait::async_trait]
impl NotificationSink for LogNotificationSink {
    async fn notify(&self, title: &str, body: &str, detail: &str) -> Result<(), ServiceError> {
        info!(title = %title, body = %body, detail = %detail, "notification");
        Ok(())
    }
}
