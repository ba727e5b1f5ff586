//! Runtime settings for the shared HTTP client.

use anyhow::{Context, Result};
use std::time::Duration;

pub const TIMEOUT_ENV: &str = "HTTP_JOB_TIMEOUT_SECS";
pub const CONNECT_TIMEOUT_ENV: &str = "HTTP_JOB_CONNECT_TIMEOUT_SECS";

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Deadlines applied to every request sent by the client.
///
/// A `None` timeout means the request may wait indefinitely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub timeout: Option<Duration>,
    pub connect_timeout: Option<Duration>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            timeout: Some(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
            connect_timeout: Some(Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS)),
        }
    }
}

impl Settings {
    /// Reads settings from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads settings through `lookup`, falling back to defaults for unset
    /// variables. A value of `0` disables the corresponding timeout.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Ok(Self {
            timeout: read_secs(&lookup, TIMEOUT_ENV)?.map_or(defaults.timeout, secs),
            connect_timeout: read_secs(&lookup, CONNECT_TIMEOUT_ENV)?
                .map_or(defaults.connect_timeout, secs),
        })
    }

    /// Applies CLI overrides on top of the environment values.
    pub fn with_overrides(mut self, timeout: Option<u64>, connect_timeout: Option<u64>) -> Self {
        if let Some(t) = timeout {
            self.timeout = secs(t);
        }
        if let Some(t) = connect_timeout {
            self.connect_timeout = secs(t);
        }
        self
    }
}

fn secs(value: u64) -> Option<Duration> {
    (value > 0).then(|| Duration::from_secs(value))
}

fn read_secs<F>(lookup: &F, name: &str) -> Result<Option<u64>>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .map(|raw| {
            raw.trim()
                .parse::<u64>()
                .with_context(|| format!("{name} must be a whole number of seconds, got '{raw}'"))
        })
        .transpose()
}
