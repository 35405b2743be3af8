//! Upstream AI signal provider interface.

use crate::models::AiAnalysis;
use crate::services::ServiceError;

/// Serves the latest AI-generated directional analysis for a symbol.
#[async_trait::async_trait]
pub trait AiSignalProvider: Send + Sync {
    async fn get_latest_analysis(&self, symbol: &str) -> Result<AiAnalysis, ServiceError>;
}
