//! Connection settings for the Port API

use crate::{ClientError, Result};
use std::fmt;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.getport.io/v1";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_PAGE_SIZE: usize = 1000;

pub const ENV_CLIENT_ID: &str = "PORT_CLIENT_ID";
pub const ENV_CLIENT_SECRET: &str = "PORT_CLIENT_SECRET";
pub const ENV_BASE_URL: &str = "PORT_BASE_URL";
pub const ENV_TIMEOUT_SECS: &str = "PORT_TIMEOUT_SECS";
pub const ENV_PAGE_SIZE: &str = "PORT_PAGE_SIZE";

/// Credentials and transport settings
#[derive(Clone)]
pub struct PortConfig {
    pub client_id: String,
    client_secret: String,
    /// API root, without a trailing slash
    pub base_url: String,
    /// Per-request timeout
    pub timeout: Duration,
    /// Items requested per page on list endpoints
    pub page_size: usize,
}

impl PortConfig {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Read settings from `PORT_*` environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through `lookup`, falling back to defaults for unset or
    /// unparsable values. Missing credentials are left empty for
    /// [`validate`](Self::validate) to report.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::new(
            lookup(ENV_CLIENT_ID).unwrap_or_default(),
            lookup(ENV_CLIENT_SECRET).unwrap_or_default(),
        );
        if let Some(url) = lookup(ENV_BASE_URL).filter(|v| !v.trim().is_empty()) {
            config = config.with_base_url(url);
        }
        if let Some(secs) = lookup(ENV_TIMEOUT_SECS).and_then(|v| v.trim().parse::<u64>().ok()) {
            config = config.with_timeout(Duration::from_secs(secs));
        }
        if let Some(size) = lookup(ENV_PAGE_SIZE).and_then(|v| v.trim().parse::<usize>().ok()) {
            config = config.with_page_size(size);
        }
        config
    }

    /// Builder: set the API root; trailing slashes are dropped
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Builder: set the page size (at least 1)
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn client_secret(&self) -> &str {
        &self.client_secret
    }

    /// Check credentials and base URL before any request is made
    pub fn validate(&self) -> Result<()> {
        if self.client_id.trim().is_empty() {
            return Err(ClientError::MissingCredentials(ENV_CLIENT_ID));
        }
        if self.client_secret.trim().is_empty() {
            return Err(ClientError::MissingCredentials(ENV_CLIENT_SECRET));
        }
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(ClientError::Config(format!(
                "base URL must start with http:// or https://, got {:?}",
                self.base_url
            )));
        }
        if self.timeout.is_zero() {
            return Err(ClientError::Config("timeout must be greater than zero".into()));
        }
        Ok(())
    }
}

impl fmt::Debug for PortConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PortConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("page_size", &self.page_size)
            .finish()
    }
}
