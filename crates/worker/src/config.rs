use std::time::Duration;

use jobrelay_core::jobs::{scale_delay, SIMULATED_DELAYS};
use jobrelay_db::ConfigError;

/// Worker configuration loaded from environment variables.
///
/// | Env Var                          | Default |
/// |----------------------------------|---------|
/// | `WORKER_CONCURRENCY`             | `4`     |
/// | `WORKER_POLL_INTERVAL_MS`        | `500`   |
/// | `WORKER_VISIBILITY_TIMEOUT_SECS` | `300`   |
/// | `WORKER_DELAY_SCALE`             | `1.0`   |
#[derive(Debug, Clone, PartialEq)]
pub struct WorkerConfig {
    /// Number of independent polling slots in this process.
    pub concurrency: usize,
    /// Sleep between polls when the queue is empty.
    pub poll_interval: Duration,
    /// How long a claimed message stays hidden from other workers.
    pub visibility_timeout: Duration,
    /// Multiplier applied to every job's simulated delay (`0` disables).
    pub delay_scale: f64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            concurrency: 4,
            poll_interval: Duration::from_millis(500),
            visibility_timeout: Duration::from_secs(300),
            delay_scale: 1.0,
        }
    }
}

impl WorkerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let concurrency = parse_or(&lookup, "WORKER_CONCURRENCY", defaults.concurrency)?;
        if concurrency == 0 {
            return Err(ConfigError::Invalid {
                var: "WORKER_CONCURRENCY",
                message: "must be at least 1".to_string(),
            });
        }

        let poll_interval = Duration::from_millis(parse_or(
            &lookup,
            "WORKER_POLL_INTERVAL_MS",
            defaults.poll_interval.as_millis() as u64,
        )?);

        let visibility_timeout = Duration::from_secs(parse_or(
            &lookup,
            "WORKER_VISIBILITY_TIMEOUT_SECS",
            defaults.visibility_timeout.as_secs(),
        )?);

        let delay_scale: f64 = parse_or(&lookup, "WORKER_DELAY_SCALE", defaults.delay_scale)?;
        if !delay_scale.is_finite() || delay_scale < 0.0 {
            return Err(ConfigError::Invalid {
                var: "WORKER_DELAY_SCALE",
                message: format!("must be a non-negative number, got {delay_scale}"),
            });
        }
        if SIMULATED_DELAYS
            .iter()
            .any(|&delay| scale_delay(delay, delay_scale).is_none())
        {
            return Err(ConfigError::Invalid {
                var: "WORKER_DELAY_SCALE",
                message: format!("{delay_scale} scales a job delay past the maximum duration"),
            });
        }

        Ok(Self {
            concurrency,
            poll_interval,
            visibility_timeout,
            delay_scale,
        })
    }
}

fn parse_or<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(var) {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
            var,
            message: format!("could not parse '{raw}'"),
        }),
        None => Ok(default),
    }
}
