//! Candle series normalization and timeframe aggregation.
//!
//! Upstream feeds deliver candles in either ascending or descending time
//! order and occasionally contain malformed rows. Everything downstream
//! (indicators, classifier) assumes a clean ascending series, so callers
//! run raw feeds through [`prepare`] first.

use crate::models::Candle;
use chrono::{DateTime, Datelike, Utc};
use tracing::warn;

/// Normalize a raw candle feed: drop malformed candles with a warning,
/// sort ascending by timestamp and collapse duplicate timestamps (last
/// write wins, matching how exchanges re-push an in-progress candle).
pub fn prepare(raw: Vec<Candle>) -> Vec<Candle> {
    let total = raw.len();
    let mut candles: Vec<Candle> = raw
        .into_iter()
        .filter(|c| {
            if c.is_valid() {
                true
            } else {
                warn!(
                    timestamp = %c.timestamp,
                    open = c.open,
                    high = c.high,
                    low = c.low,
                    close = c.close,
                    "dropping malformed candle"
                );
                false
            }
        })
        .collect();

    if candles.len() < total {
        warn!(
            dropped = total - candles.len(),
            kept = candles.len(),
            "candle feed contained malformed rows"
        );
    }

    candles.sort_by_key(|c| c.timestamp);
    // dedup_by keeps the earlier element; swap first so the re-pushed
    // (later) row survives.
    candles.dedup_by(|a, b| {
        if a.timestamp == b.timestamp {
            std::mem::swap(a, b);
            true
        } else {
            false
        }
    });
    candles
}

/// Group an ascending candle series into buckets and collapse each bucket
/// into one candle: first open, last close, max high, min low, summed
/// volume. A single-candle bucket reduces to that candle unchanged.
pub fn aggregate_by<K, F>(candles: &[Candle], bucket_key: F) -> Vec<Candle>
where
    K: PartialEq,
    F: Fn(&DateTime<Utc>) -> K,
{
    let mut out: Vec<Candle> = Vec::new();
    let mut current_key: Option<K> = None;

    for candle in candles {
        let key = bucket_key(&candle.timestamp);
        match (&current_key, out.last_mut()) {
            (Some(k), Some(bucket)) if *k == key => {
                bucket.high = bucket.high.max(candle.high);
                bucket.low = bucket.low.min(candle.low);
                bucket.close = candle.close;
                bucket.volume += candle.volume;
            }
            _ => {
                current_key = Some(key);
                out.push(candle.clone());
            }
        }
    }

    out
}

/// Roll a fine-grained series into daily candles keyed by UTC date.
pub fn aggregate_daily(candles: &[Candle]) -> Vec<Candle> {
    aggregate_by(candles, |ts| (ts.year(), ts.ordinal()))
}
