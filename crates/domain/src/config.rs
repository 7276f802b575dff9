//! Configuration management

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_HOST, DEFAULT_MAX_RETRIES, DEFAULT_PORT, DEFAULT_RETRY_DELAY_MS, DEFAULT_TIMEOUT_SECS,
};

/// Tally ERP connection settings
///
/// Tally trusts network-level access, so there are no credentials here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TallyConfig {
    pub host: String,
    pub port: u16,
    /// Company used when a call does not override it. Empty means "whatever
    /// company Tally has open".
    pub company: String,
    pub timeout_secs: u64,
    /// Retries after the first attempt; a call makes at most
    /// `max_retries + 1` attempts.
    pub max_retries: u32,
    /// Initial backoff, doubled for every further retry.
    pub retry_delay_ms: u64,
}

impl Default for TallyConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            company: String::new(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay_ms: DEFAULT_RETRY_DELAY_MS,
        }
    }
}

impl TallyConfig {
    /// `http://{host}:{port}`
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub const fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    /// Configured company, or `None` when left blank.
    pub fn company(&self) -> Option<&str> {
        let company = self.company.trim();
        if company.is_empty() {
            None
        } else {
            Some(company)
        }
    }
}
