use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

use crate::domain::errors::{StorageError, StorageResult};

pub const DEFAULT_REGION: &str = "us-east-1";

/// Connection settings of an S3-compatible backend
#[derive(Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    #[serde(default = "default_url")]
    pub url: String,
    #[serde(default)]
    pub access_key: String,
    #[serde(default)]
    pub secret_key: String,
    #[serde(default = "default_region")]
    pub region: String,
    #[serde(default)]
    pub proxy: ProxySettings,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_write_timeout")]
    pub write_timeout_secs: u64,
    #[serde(default = "default_read_timeout")]
    pub read_timeout_secs: u64,
}

fn default_url() -> String {
    "http://localhost:9000".to_string()
}

fn default_region() -> String {
    DEFAULT_REGION.to_string()
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_write_timeout() -> u64 {
    60
}

fn default_read_timeout() -> u64 {
    10
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            access_key: String::new(),
            secret_key: String::new(),
            region: default_region(),
            proxy: ProxySettings::default(),
            connect_timeout_secs: default_connect_timeout(),
            write_timeout_secs: default_write_timeout(),
            read_timeout_secs: default_read_timeout(),
        }
    }
}

impl std::fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("url", &self.url)
            .field("access_key", &self.access_key)
            .field("secret_key", &"***")
            .field("region", &self.region)
            .field("proxy", &self.proxy)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("write_timeout_secs", &self.write_timeout_secs)
            .field("read_timeout_secs", &self.read_timeout_secs)
            .finish()
    }
}

impl ConnectionConfig {
    pub fn new(
        url: impl Into<String>,
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            access_key: access_key.into(),
            secret_key: secret_key.into(),
            ..Self::default()
        }
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    pub fn with_proxy(mut self, proxy: ProxySettings) -> Self {
        self.proxy = proxy;
        self
    }

    /// Parse the endpoint; only `http` and `https` URLs with a host are accepted
    pub fn endpoint(&self) -> StorageResult<Url> {
        let invalid = || StorageError::invalid_configuration("url", "http(s)://host[:port]");

        let url = Url::parse(self.url.trim()).map_err(|_| invalid())?;
        if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
            return Err(invalid());
        }
        Ok(url)
    }

    pub fn connect_timeout(&self) -> Option<Duration> {
        timeout(self.connect_timeout_secs)
    }

    pub fn write_timeout(&self) -> Option<Duration> {
        timeout(self.write_timeout_secs)
    }

    pub fn read_timeout(&self) -> Option<Duration> {
        timeout(self.read_timeout_secs)
    }
}

/// A timeout of zero seconds disables that timeout
fn timeout(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

/// Proxy settings as written in configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxySettings {
    #[serde(default = "default_proxy_type")]
    pub proxy_type: String,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub port: Option<String>,
}

fn default_proxy_type() -> String {
    "HTTP".to_string()
}

impl Default for ProxySettings {
    fn default() -> Self {
        Self {
            proxy_type: default_proxy_type(),
            host: None,
            port: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyType {
    Http,
    Https,
}

impl ProxyType {
    pub fn scheme(&self) -> &'static str {
        match self {
            ProxyType::Http => "http",
            ProxyType::Https => "https",
        }
    }
}

/// A validated proxy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyConfig {
    pub proxy_type: ProxyType,
    pub host: String,
    pub port: u16,
}

impl ProxyConfig {
    pub fn url(&self) -> String {
        format!("{}://{}:{}", self.proxy_type.scheme(), self.host, self.port)
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

impl ProxySettings {
    pub fn new(
        proxy_type: impl Into<String>,
        host: impl Into<String>,
        port: impl Into<String>,
    ) -> Self {
        Self {
            proxy_type: proxy_type.into(),
            host: Some(host.into()),
            port: Some(port.into()),
        }
    }

    /// Validate the settings.
    ///
    /// Returns `None` unless both host and port are non-blank; a proxy that
    /// is configured must have a port in 1-65535 and a type of `HTTP` or
    /// `HTTPS`.
    pub fn resolve(&self) -> StorageResult<Option<ProxyConfig>> {
        let (host, port) = match (non_blank(&self.host), non_blank(&self.port)) {
            (Some(host), Some(port)) => (host, port),
            _ => return Ok(None),
        };

        let port = port
            .parse::<u16>()
            .ok()
            .filter(|port| *port != 0)
            .ok_or_else(|| StorageError::invalid_configuration("proxyPort", "valid port (ex: 9000)"))?;

        let proxy_type = match self.proxy_type.trim() {
            "HTTP" => ProxyType::Http,
            "HTTPS" => ProxyType::Https,
            _ => return Err(StorageError::invalid_configuration("proxyType", "HTTP | HTTPS")),
        };

        Ok(Some(ProxyConfig {
            proxy_type,
            host: host.to_string(),
            port,
        }))
    }
}
