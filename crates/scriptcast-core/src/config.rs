//! Configuration module
//!
//! Client settings come from the environment (and a `.env` file when present).

use std::env;
use std::num::NonZeroUsize;
use std::time::Duration;

use crate::constants::{
    DEFAULT_ACTIVITY_LOG_CAPACITY, DEFAULT_API_PREFIX, DEFAULT_API_URL, DEFAULT_TIMEOUT_SECS,
    DEFAULT_VOICE,
};
use crate::models::Emotion;

const MAX_TIMEOUT_SECS: u64 = 300;
const MAX_ACTIVITY_LOG_CAPACITY: usize = 10_000;

#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub api_url: String,
    pub api_prefix: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
    pub default_voice: String,
    pub default_emotion: Emotion,
    pub default_batch_size: Option<NonZeroUsize>,
    pub activity_log_capacity: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_prefix: DEFAULT_API_PREFIX.to_string(),
            api_key: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            default_voice: DEFAULT_VOICE.to_string(),
            default_emotion: Emotion::Friendly,
            default_batch_size: None,
            activity_log_capacity: DEFAULT_ACTIVITY_LOG_CAPACITY,
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Build from an arbitrary variable source. `from_env` uses the process environment.
    pub fn from_vars<F>(var: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_url = var("SCRIPTCAST_API_URL")
            .or_else(|| var("API_URL"))
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let api_prefix = var("SCRIPTCAST_API_PREFIX")
            .unwrap_or_else(|| DEFAULT_API_PREFIX.to_string());

        let default_emotion = match var("SCRIPTCAST_DEFAULT_EMOTION") {
            Some(raw) => raw.parse().map_err(|_| {
                anyhow::anyhow!("SCRIPTCAST_DEFAULT_EMOTION is not a known emotion: {}", raw)
            })?,
            None => Emotion::Friendly,
        };

        let default_batch_size = match var("SCRIPTCAST_BATCH_SIZE") {
            Some(raw) => Some(raw.trim().parse::<NonZeroUsize>().map_err(|_| {
                anyhow::anyhow!("SCRIPTCAST_BATCH_SIZE must be a positive integer")
            })?),
            None => None,
        };

        let config = ClientConfig {
            api_url: api_url.trim_end_matches('/').to_string(),
            api_prefix: normalize_prefix(&api_prefix),
            api_key: var("SCRIPTCAST_API_KEY").filter(|s| !s.is_empty()),
            timeout_secs: var("SCRIPTCAST_TIMEOUT_SECS")
                .unwrap_or_else(|| DEFAULT_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(DEFAULT_TIMEOUT_SECS),
            default_voice: var("SCRIPTCAST_DEFAULT_VOICE")
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_VOICE.to_string()),
            default_emotion,
            default_batch_size,
            activity_log_capacity: var("SCRIPTCAST_ACTIVITY_LOG_CAPACITY")
                .unwrap_or_else(|| DEFAULT_ACTIVITY_LOG_CAPACITY.to_string())
                .parse()
                .unwrap_or(DEFAULT_ACTIVITY_LOG_CAPACITY),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if !(self.api_url.starts_with("http://") || self.api_url.starts_with("https://")) {
            return Err(anyhow::anyhow!(
                "SCRIPTCAST_API_URL must be an http:// or https:// URL"
            ));
        }

        if self.timeout_secs == 0 || self.timeout_secs > MAX_TIMEOUT_SECS {
            return Err(anyhow::anyhow!(
                "SCRIPTCAST_TIMEOUT_SECS must be between 1 and {}",
                MAX_TIMEOUT_SECS
            ));
        }

        if self.activity_log_capacity == 0 || self.activity_log_capacity > MAX_ACTIVITY_LOG_CAPACITY
        {
            return Err(anyhow::anyhow!(
                "SCRIPTCAST_ACTIVITY_LOG_CAPACITY must be between 1 and {}",
                MAX_ACTIVITY_LOG_CAPACITY
            ));
        }

        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{}", trimmed)
    }
}
