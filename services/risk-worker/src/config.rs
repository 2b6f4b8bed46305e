//! Worker configuration

use std::env;

/// Risk worker configuration
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Six-field cron expression (seconds first)
    pub schedule: String,
    /// Most pending reservations re-scored per run
    pub batch_size: i64,
}

impl WorkerConfig {
    /// Create a new WorkerConfig from environment variables
    ///
    /// # Environment Variables
    /// - `RISK_SCHEDULE`: Cron schedule (default: "0 0 * * * *", hourly)
    /// - `RISK_BATCH_SIZE`: Reservations per run (default: 500)
    pub fn from_env() -> Self {
        let schedule = env::var("RISK_SCHEDULE").unwrap_or_else(|_| "0 0 * * * *".to_string());
        let batch_size = env::var("RISK_BATCH_SIZE")
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|size: &i64| *size > 0)
            .unwrap_or(500);

        Self {
            schedule,
            batch_size,
        }
    }
}
