//! # Configuration
//!
//! [`ConsoleConfig::load`] reads the process environment, after loading an optional
//! `.env` file. Parsing itself goes through [`ConsoleConfig::from_lookup`], which takes
//! any `name -> value` function so it can be tested without touching the environment.
//!
//! | Variable | Default |
//! |----------|---------|
//! | `CONSOLE_API_BASE_URL` | `http://localhost:8080/api/` |
//! | `CONSOLE_API_TOKEN` | unset (no `Authorization` header) |
//! | `CONSOLE_REQUEST_TIMEOUT_SECS` | `30` |
//! | `CONSOLE_PAGE_SIZE` | `20` |
//! | `CONSOLE_EXPORT_DIR` | `./exports` |
//! | `CONSOLE_RESTORE_FAILED_DELETES` | `false` |
//! | `CONSOLE_CHANNEL_CAPACITY` | `64` |

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use url::Url;

const DEFAULT_BASE_URL: &str = "http://localhost:8080/api/";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid {name} value '{value}': {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("{0} must be greater than zero")]
    NotPositive(&'static str),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConsoleConfig {
    /// Always ends with `/` so resource paths can be joined onto it.
    pub api_base_url: Url,
    pub api_token: Option<String>,
    pub request_timeout: Duration,
    pub page_size: u32,
    pub export_dir: PathBuf,
    pub restore_failed_deletes: bool,
    /// Capacity of the notification broadcast channel.
    pub channel_capacity: usize,
}

impl ConsoleConfig {
    pub fn load() -> Result<Self, ConfigError> {
        // A missing .env file is normal outside development.
        let _ = dotenvy::dotenv();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let lookup = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty())
        };

        let raw_url =
            lookup("CONSOLE_API_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_owned());
        let api_base_url = parse_base_url(&raw_url)?;
        let api_token = lookup("CONSOLE_API_TOKEN");
        let timeout_secs: u64 = parse_or(
            "CONSOLE_REQUEST_TIMEOUT_SECS",
            lookup("CONSOLE_REQUEST_TIMEOUT_SECS"),
            30,
        )?;
        let page_size: u32 = parse_or("CONSOLE_PAGE_SIZE", lookup("CONSOLE_PAGE_SIZE"), 20)?;
        let export_dir = lookup("CONSOLE_EXPORT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./exports"));
        let restore_failed_deletes = parse_flag(
            "CONSOLE_RESTORE_FAILED_DELETES",
            lookup("CONSOLE_RESTORE_FAILED_DELETES"),
        )?;
        let channel_capacity: usize = parse_or(
            "CONSOLE_CHANNEL_CAPACITY",
            lookup("CONSOLE_CHANNEL_CAPACITY"),
            64,
        )?;

        if timeout_secs == 0 {
            return Err(ConfigError::NotPositive("CONSOLE_REQUEST_TIMEOUT_SECS"));
        }
        if page_size == 0 {
            return Err(ConfigError::NotPositive("CONSOLE_PAGE_SIZE"));
        }
        if channel_capacity == 0 {
            return Err(ConfigError::NotPositive("CONSOLE_CHANNEL_CAPACITY"));
        }

        Ok(Self {
            api_base_url,
            api_token,
            request_timeout: Duration::from_secs(timeout_secs),
            page_size,
            export_dir,
            restore_failed_deletes,
            channel_capacity,
        })
    }
}

fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let invalid = |reason: String| ConfigError::Invalid {
        name: "CONSOLE_API_BASE_URL",
        value: raw.to_owned(),
        reason,
    };
    let with_slash = if raw.ends_with('/') {
        raw.to_owned()
    } else {
        format!("{raw}/")
    };
    let url = Url::parse(&with_slash).map_err(|error| invalid(error.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid("scheme must be http or https".to_owned()));
    }
    Ok(url)
}

fn parse_or<T>(name: &'static str, value: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match value {
        Some(value) => value.parse::<T>().map_err(|error| ConfigError::Invalid {
            name,
            reason: error.to_string(),
            value,
        }),
        None => Ok(default),
    }
}

fn parse_flag(name: &'static str, value: Option<String>) -> Result<bool, ConfigError> {
    match value.as_deref().map(str::to_ascii_lowercase).as_deref() {
        None => Ok(false),
        Some("1" | "true" | "yes" | "on") => Ok(true),
        Some("0" | "false" | "no" | "off") => Ok(false),
        Some(_) => Err(ConfigError::Invalid {
            name,
            value: value.unwrap_or_default(),
            reason: "expected true or false".to_owned(),
        }),
    }
}
