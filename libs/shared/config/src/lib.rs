use std::env;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_address: String,
    pub port: u16,
    /// Upper bound for waiting on a professional's booking lock before the
    /// attempt is surfaced as a timeout instead of blocking the caller.
    pub commit_lock_timeout_ms: u64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            bind_address: env::var("SCHEDULE_BIND_ADDRESS")
                .unwrap_or_else(|_| {
                    warn!("SCHEDULE_BIND_ADDRESS not set, using 0.0.0.0");
                    "0.0.0.0".to_string()
                }),
            port: env::var("SCHEDULE_PORT")
                .ok()
                .and_then(|value| value.parse().ok())
                .unwrap_or_else(|| {
                    warn!("SCHEDULE_PORT not set or invalid, using 3000");
                    3000
                }),
            commit_lock_timeout_ms: env::var("SCHEDULE_COMMIT_LOCK_TIMEOUT_MS")
                .ok()
                .and_then(|value| value.parse().ok())
                .unwrap_or(5_000),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 3000,
            commit_lock_timeout_ms: 5_000,
        }
    }
}
