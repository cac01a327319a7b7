use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use chrono_tz::Tz;

use crate::errors::{ChronosError, Result};

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:5000";
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;
pub const DEFAULT_POLL_MAX_ATTEMPTS: u32 = 300;
pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 60;
pub const DEFAULT_TIMEZONE: &str = "America/New_York";
pub const DEFAULT_STORE_LOCATION: &str = "./data";

/// Raw `KEY=VALUE` pairs read from the file named by `CONFIG_FILE`.
#[derive(Debug, Default, Clone)]
pub struct AppConfig {
    values: HashMap<String, String>,
}

impl AppConfig {
    pub fn from_file(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let mut values = HashMap::new();
        for (idx, line) in content.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let trimmed = trimmed.strip_prefix("export ").unwrap_or(trimmed);
            let Some((key, value)) = trimmed.split_once('=') else {
                return Err(ChronosError::Config(format!(
                    "Invalid config line {}: {}",
                    idx + 1,
                    line
                )));
            };
            let key = key.trim();
            let mut value = value.trim().to_string();
            if value.len() >= 2
                && ((value.starts_with('"') && value.ends_with('"'))
                    || (value.starts_with('\'') && value.ends_with('\'')))
            {
                value = value[1..value.len() - 1].to_string();
            }
            values.insert(key.to_string(), value);
        }
        Ok(Self { values })
    }

    /// Loads `CONFIG_FILE` when set; a missing variable yields an empty config.
    pub fn load() -> Result<Self> {
        match env::var("CONFIG_FILE") {
            Ok(path) => Self::from_file(&path),
            Err(_) => Ok(Self::default()),
        }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    /// File value first, then the process environment.
    pub fn get_prop(&self, key: &str) -> Option<String> {
        self.get(key).or_else(|| env::var(key).ok())
    }

    pub fn settings(&self) -> Result<Settings> {
        Settings::from_lookup(|key| self.get_prop(key))
    }
}

/// Typed view over [`AppConfig`].
#[derive(Debug, Clone)]
pub struct Settings {
    pub api_url: String,
    pub login_url: String,
    pub poll_interval: Duration,
    pub poll_max_attempts: u32,
    pub refresh_interval: Duration,
    pub timezone: Tz,
    pub store_location: PathBuf,
    pub log_level: String,
}

impl Settings {
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_url = lookup("CHRONOS_API_URL")
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        let login_url = lookup("CHRONOS_LOGIN_URL").unwrap_or_else(|| format!("{}/login", api_url));
        let poll_interval_ms = parse_number("POLL_INTERVAL_MS", lookup("POLL_INTERVAL_MS"), DEFAULT_POLL_INTERVAL_MS)?;
        let poll_max_attempts = parse_number("POLL_MAX_ATTEMPTS", lookup("POLL_MAX_ATTEMPTS"), DEFAULT_POLL_MAX_ATTEMPTS)?;
        let refresh_secs = parse_number(
            "REFRESH_INTERVAL_SECS",
            lookup("REFRESH_INTERVAL_SECS"),
            DEFAULT_REFRESH_INTERVAL_SECS,
        )?;
        let tz_name = lookup("DISPLAY_TIMEZONE").unwrap_or_else(|| DEFAULT_TIMEZONE.to_string());
        let timezone: Tz = tz_name
            .parse()
            .map_err(|_| ChronosError::Config(format!("Unknown timezone {}", tz_name)))?;
        let store_location = PathBuf::from(
            lookup("STORE_LOCATION").unwrap_or_else(|| DEFAULT_STORE_LOCATION.to_string()),
        );
        let log_level = lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string());

        if poll_max_attempts == 0 {
            return Err(ChronosError::Config("POLL_MAX_ATTEMPTS must be at least 1".to_string()));
        }
        if poll_interval_ms == 0 {
            return Err(ChronosError::Config("POLL_INTERVAL_MS must be at least 1".to_string()));
        }
        if refresh_secs == 0 {
            return Err(ChronosError::Config("REFRESH_INTERVAL_SECS must be at least 1".to_string()));
        }

        Ok(Self {
            api_url,
            login_url,
            poll_interval: Duration::from_millis(poll_interval_ms),
            poll_max_attempts,
            refresh_interval: Duration::from_secs(refresh_secs),
            timezone,
            store_location,
            log_level,
        })
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            login_url: format!("{}/login", DEFAULT_API_URL),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            poll_max_attempts: DEFAULT_POLL_MAX_ATTEMPTS,
            refresh_interval: Duration::from_secs(DEFAULT_REFRESH_INTERVAL_SECS),
            timezone: chrono_tz::America::New_York,
            store_location: PathBuf::from(DEFAULT_STORE_LOCATION),
            log_level: "info".to_string(),
        }
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, raw: Option<String>, default: T) -> Result<T> {
    match raw {
        Some(value) => value
            .trim()
            .parse::<T>()
            .map_err(|_| ChronosError::Config(format!("{} must be a number, got {}", key, value))),
        None => Ok(default),
    }
}
