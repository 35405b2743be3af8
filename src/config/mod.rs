//! Environment-based configuration helpers.
//!
//! Hosts load a `.env` via `dotenvy` before calling into these; everything
//! has a sandbox-friendly default.

use std::env;
use std::time::Duration;

/// Deployment environment (`production`, `sandbox`, ...). Controls log
/// formatting.
pub fn get_environment() -> String {
    env::var("ENVIRONMENT").unwrap_or_else(|_| "sandbox".to_string())
}

/// Base URL of the host API backing the REST service implementations.
pub fn api_base_url() -> String {
    env::var("API_BASE_URL").unwrap_or_else(|_| "http://localhost:8080/api".to_string())
}

/// Timeout applied to upstream API calls. A timed-out call skips the
/// current cycle, it never stops the scheduler.
pub fn api_timeout() -> Duration {
    let seconds = env::var("API_TIMEOUT_SECONDS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(60);
    Duration::from_secs(seconds)
}
