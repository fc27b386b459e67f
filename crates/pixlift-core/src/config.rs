//! Configuration module
//!
//! Scheduler and telemetry settings, read from `PIXLIFT_*` environment variables
//! (a `.env` file is honoured). Configuration is fixed once a scheduler is built.

use anyhow::Context;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_MAX_CONCURRENT: usize = 3;
const CONNECT_TIMEOUT_SECS: u64 = 60;
const REQUEST_TIMEOUT_SECS: u64 = 300;
const RESOURCE_TIMEOUT_SECS: u64 = 1800;
const DEFAULT_LOG_FILTER: &str = "pixlift=info";

/// Scheduler and transport configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Worker slots. `None` means "recommend from system memory".
    pub max_concurrent: Option<usize>,
    pub connect_timeout: Duration,
    /// Idle/read budget for a single request.
    pub request_timeout: Duration,
    /// Budget for the whole transfer, body upload included.
    pub resource_timeout: Duration,
    /// Directory for re-encoded temporary files.
    pub temp_dir: PathBuf,
    pub user_agent: String,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_concurrent: Some(DEFAULT_MAX_CONCURRENT),
            connect_timeout: Duration::from_secs(CONNECT_TIMEOUT_SECS),
            request_timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
            resource_timeout: Duration::from_secs(RESOURCE_TIMEOUT_SECS),
            temp_dir: env::temp_dir(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_user_agent() -> String {
    format!("pixlift/{}", env!("CARGO_PKG_VERSION"))
}

impl SchedulerConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary variable source. Unset variables take defaults;
    /// set but unparseable variables are errors.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let max_concurrent = match lookup("PIXLIFT_MAX_CONCURRENT") {
            None => defaults.max_concurrent,
            Some(value) if value.trim().eq_ignore_ascii_case("auto") => None,
            Some(value) => {
                let parsed: usize = value
                    .trim()
                    .parse()
                    .with_context(|| format!("PIXLIFT_MAX_CONCURRENT is not a number: {value}"))?;
                (parsed > 0).then_some(parsed)
            }
        };

        let connect_timeout = secs_var(&lookup, "PIXLIFT_CONNECT_TIMEOUT_SECS", CONNECT_TIMEOUT_SECS)?;
        let request_timeout = secs_var(&lookup, "PIXLIFT_REQUEST_TIMEOUT_SECS", REQUEST_TIMEOUT_SECS)?;
        let resource_timeout =
            secs_var(&lookup, "PIXLIFT_RESOURCE_TIMEOUT_SECS", RESOURCE_TIMEOUT_SECS)?;

        let temp_dir = lookup("PIXLIFT_TEMP_DIR")
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.temp_dir);

        let user_agent = lookup("PIXLIFT_USER_AGENT")
            .filter(|value| !value.trim().is_empty())
            .unwrap_or(defaults.user_agent);

        Ok(Self {
            max_concurrent,
            connect_timeout,
            request_timeout,
            resource_timeout,
            temp_dir,
            user_agent,
        })
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.connect_timeout.is_zero()
            || self.request_timeout.is_zero()
            || self.resource_timeout.is_zero()
        {
            return Err(anyhow::anyhow!("Transport timeouts must be greater than zero"));
        }

        if self.resource_timeout < self.request_timeout {
            return Err(anyhow::anyhow!(
                "PIXLIFT_RESOURCE_TIMEOUT_SECS ({}s) must not be shorter than PIXLIFT_REQUEST_TIMEOUT_SECS ({}s)",
                self.resource_timeout.as_secs(),
                self.request_timeout.as_secs()
            ));
        }

        if self.user_agent.trim().is_empty() {
            return Err(anyhow::anyhow!("PIXLIFT_USER_AGENT must not be empty"));
        }

        Ok(())
    }

    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = Some(max_concurrent.max(1));
        self
    }

    /// Concrete slot count, asking `recommend` when set to auto.
    pub fn resolve_max_concurrent(&self, recommend: impl FnOnce() -> usize) -> usize {
        self.max_concurrent.unwrap_or_else(recommend).max(1)
    }
}

fn secs_var<F>(lookup: &F, key: &str, default: u64) -> Result<Duration, anyhow::Error>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(Duration::from_secs(default)),
        Some(value) => value
            .trim()
            .parse::<u64>()
            .map(Duration::from_secs)
            .with_context(|| format!("{key} is not a whole number of seconds: {value}")),
    }
}

/// Log output format.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(anyhow::anyhow!("Unknown log format: {other}")),
        }
    }
}

/// Logging configuration
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TelemetryConfig {
    pub format: LogFormat,
    /// Filter used when `RUST_LOG` is unset.
    pub default_filter: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            default_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl TelemetryConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let format = match lookup("PIXLIFT_LOG_FORMAT") {
            Some(value) => value.parse().context("Invalid PIXLIFT_LOG_FORMAT")?,
            None => LogFormat::default(),
        };

        Ok(Self {
            format,
            ..Self::default()
        })
    }
}
