use std::path::PathBuf;
use std::time::Duration;

use chrono_tz::Tz;

use crate::errors::ConfigError;

const DEFAULT_SESSION_FILE: &str = ".hafalan-session.json";
const DEFAULT_TIMEZONE: &str = "Asia/Jakarta";
const DEFAULT_TIMEOUT_SECS: u64 = 15;

#[derive(Debug, Clone)]
pub struct Config {
    api_url: Option<String>,
    pub session_file: PathBuf,
    pub export_dir: PathBuf,
    pub timezone: Tz,
    pub http_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_url = lookup("HAFALAN_API_URL").filter(|value| !value.trim().is_empty());
        if let Some(url) = &api_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::Invalid {
                    name: "HAFALAN_API_URL",
                    value: url.clone(),
                    reason: "expected an http:// or https:// URL".to_string(),
                });
            }
        }

        let session_file = lookup("HAFALAN_SESSION_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SESSION_FILE));
        let export_dir = lookup("HAFALAN_EXPORT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));

        let timezone_name =
            lookup("HAFALAN_TIMEZONE").unwrap_or_else(|| DEFAULT_TIMEZONE.to_string());
        let timezone = timezone_name
            .parse::<Tz>()
            .map_err(|reason| ConfigError::Invalid {
                name: "HAFALAN_TIMEZONE",
                value: timezone_name.clone(),
                reason: reason.to_string(),
            })?;

        let http_timeout = match lookup("HAFALAN_HTTP_TIMEOUT_SECS") {
            Some(raw) => {
                let secs = raw.parse::<u64>().map_err(|err| ConfigError::Invalid {
                    name: "HAFALAN_HTTP_TIMEOUT_SECS",
                    value: raw.clone(),
                    reason: err.to_string(),
                })?;
                Duration::from_secs(secs.max(1))
            }
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        Ok(Self {
            api_url,
            session_file,
            export_dir,
            timezone,
            http_timeout,
        })
    }

    /// Only commands that call the API need a base URL.
    pub fn api_url(&self) -> Result<&str, ConfigError> {
        self.api_url
            .as_deref()
            .ok_or(ConfigError::Missing("HAFALAN_API_URL"))
    }
}
