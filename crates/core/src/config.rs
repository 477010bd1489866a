//! Client runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into the API client. The
//! environment is never read while a request is being handled.

use crate::constants::{API_BASE_URL_ENV, DEFAULT_HTTP_TIMEOUT, HTTP_TIMEOUT_ENV};
use crate::error::{ApiError, SchedulerError, SchedulerResult};
use reqwest::Url;
use std::time::Duration;

/// Client configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    base_url: Url,
    timeout: Duration,
}

impl ClientConfig {
    /// Create a new `ClientConfig`.
    ///
    /// The base URL must be an absolute `http` or `https` URL. A trailing slash is added to its
    /// path so that endpoint paths are resolved beneath it rather than replacing its last
    /// segment (`https://host/api` + `slots` = `https://host/api/slots`).
    ///
    /// # Errors
    ///
    /// Returns `SchedulerError::Config` for an empty or unparseable URL, a non-HTTP scheme, or
    /// a zero timeout.
    pub fn new(base_url: &str, timeout: Duration) -> SchedulerResult<Self> {
        let trimmed = base_url.trim();
        if trimmed.is_empty() {
            return Err(SchedulerError::Config(format!(
                "{API_BASE_URL_ENV} cannot be empty"
            )));
        }

        let mut url = Url::parse(trimmed)
            .map_err(|e| SchedulerError::Config(format!("invalid base URL '{trimmed}': {e}")))?;

        if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
            return Err(SchedulerError::Config(format!(
                "base URL must be an http(s) URL, got '{trimmed}'"
            )));
        }

        if timeout.is_zero() {
            return Err(SchedulerError::Config(
                "request timeout must be greater than zero".into(),
            ));
        }

        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        url.set_query(None);
        url.set_fragment(None);

        Ok(Self {
            base_url: url,
            timeout,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Resolve an endpoint path against the base URL.
    pub fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.base_url
            .join(path)
            .map_err(|e| ApiError::InvalidUrl(format!("{path}: {e}")))
    }
}

/// Parse the request timeout from an optional environment value.
///
/// `None` or blank yields [`DEFAULT_HTTP_TIMEOUT`].
pub fn timeout_from_env_value(value: Option<String>) -> SchedulerResult<Duration> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());

    match value {
        None => Ok(DEFAULT_HTTP_TIMEOUT),
        Some(v) => v.parse::<u64>().map(Duration::from_secs).map_err(|_| {
            SchedulerError::Config(format!(
                "{HTTP_TIMEOUT_ENV} must be a whole number of seconds, got '{v}'"
            ))
        }),
    }
}

/// Build a [`ClientConfig`] from raw environment values.
///
/// `explicit_base_url` (e.g. a command-line flag) takes precedence over `env_base_url`.
pub fn config_from_env_values(
    explicit_base_url: Option<String>,
    env_base_url: Option<String>,
    env_timeout: Option<String>,
) -> SchedulerResult<ClientConfig> {
    let base_url = explicit_base_url.or(env_base_url).ok_or_else(|| {
        SchedulerError::Config(format!(
            "{API_BASE_URL_ENV} is not set and no base URL was given"
        ))
    })?;
    let timeout = timeout_from_env_value(env_timeout)?;
    ClientConfig::new(&base_url, timeout)
}
