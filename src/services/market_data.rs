//! Market data provider interface.

use crate::models::Candle;
use crate::services::ServiceError;

/// Supplies historical candles for a symbol. Implementations may return
/// candles in either ascending or descending time order; consumers
/// normalize through [`crate::candles::prepare`].
#[async_trait::async_trait]
pub trait MarketDataProvider: Send + Sync {
    async fn get_candles(
        &self,
        symbol: &str,
        timeframe: &str,
        limit: usize,
    ) -> Result<Vec<Candle>, ServiceError>;
}
