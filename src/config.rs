// src/config.rs
use std::time::Duration;

use crate::errors::RestyleError;

/// Options for the exponential-backoff retrier.
///
/// Defaults: 3 retries, 1s initial delay, 10s cap, doubling. No jitter.
#[derive(Debug, Clone)]
pub struct RetryOptions {
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub backoff_multiplier: f64,
}

impl Default for RetryOptions {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(10000),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryOptions {
    /// Zero-delay variant for tests; same attempt accounting, no sleeping.
    pub fn immediate(max_retries: u32) -> Self {
        Self {
            max_retries,
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            backoff_multiplier: 2.0,
        }
    }
}

/// Budget for one status-polling loop: fixed interval, bounded attempts.
#[derive(Debug, Clone)]
pub struct PollOptions {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl PollOptions {
    pub fn new(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_attempts,
        }
    }

    /// Zero-interval variant for tests.
    pub fn immediate(max_attempts: u32) -> Self {
        Self::new(Duration::ZERO, max_attempts)
    }
}

/// Configuration for the Bria API client.
///
/// Constructed explicitly (rather than read from module-level constants) so
/// tests can inject a mock base URL and zero-delay retry/poll options.
#[derive(Debug, Clone)]
pub struct BriaConfig {
    pub base_url: String,
    pub api_token: String,
    /// Style-extraction polling: 2s interval, 30 attempts (60s ceiling).
    pub extraction_poll: PollOptions,
    /// Generation polling: 2s interval, 60 attempts (2 minute ceiling).
    pub generation_poll: PollOptions,
    /// Preview polling: same budget as generation.
    pub preview_poll: PollOptions,
    pub retry: RetryOptions,
}

const DEFAULT_BASE_URL: &str = "https://engine.prod.bria-api.com/v1";

impl BriaConfig {
    pub fn new(base_url: impl Into<String>, api_token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_token: api_token.into(),
            extraction_poll: PollOptions::new(Duration::from_secs(2), 30),
            generation_poll: PollOptions::new(Duration::from_secs(2), 60),
            preview_poll: PollOptions::new(Duration::from_secs(2), 60),
            retry: RetryOptions::default(),
        }
    }

    /// Reads `BRIA_API_TOKEN` (required) and `BRIA_API_URL` (optional) from
    /// the environment.
    pub fn from_env() -> Result<Self, RestyleError> {
        let api_token = std::env::var("BRIA_API_TOKEN").map_err(|_| {
            RestyleError::Configuration("BRIA_API_TOKEN must be set".to_string())
        })?;
        let base_url =
            std::env::var("BRIA_API_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

        Ok(Self::new(base_url, api_token))
    }
}
