//! URL format check and best-effort reachability probe

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crate::content::validate_web_url;

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("request timed out")]
    Timeout,

    #[error("too many redirects")]
    TooManyRedirects,

    #[error("request failed: {0}")]
    RequestFailed(String),
}

/// HTTP client configuration for the probe
#[derive(Debug, Clone)]
pub struct ProbeConfig {
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
            user_agent: concat!("qrstudio/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Issues a HEAD request and reports the final status code
#[async_trait]
pub trait UrlProbe: Send + Sync {
    async fn head(&self, url: &str) -> Result<u16, ProbeError>;
}

pub struct HttpProbe {
    client: Client,
}

impl HttpProbe {
    pub fn new(config: &ProbeConfig) -> Result<Self, ProbeError> {
        let client = Client::builder()
            .connect_timeout(config.timeout)
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(|e| ProbeError::RequestFailed(e.to_string()))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl UrlProbe for HttpProbe {
    async fn head(&self, url: &str) -> Result<u16, ProbeError> {
        debug!(url, "Probing URL");

        let response = self.client.head(url).send().await.map_err(|e| {
            if e.is_timeout() {
                ProbeError::Timeout
            } else if e.is_redirect() {
                ProbeError::TooManyRedirects
            } else {
                ProbeError::RequestFailed(e.to_string())
            }
        })?;

        Ok(response.status().as_u16())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Reachability {
    Reachable,
    ErrorStatus,
    /// The probe itself failed; says nothing about the URL.
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UrlCheck {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reachability: Option<Reachability>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    pub message: String,
}

/// Validate the URL format, then probe it. Network failures never make a URL invalid.
pub async fn check_url(probe: &dyn UrlProbe, raw: &str) -> UrlCheck {
    let raw = raw.trim();
    if raw.is_empty() {
        return UrlCheck {
            valid: false,
            reachability: None,
            status: None,
            message: "Please enter a URL".to_string(),
        };
    }

    if let Err(e) = validate_web_url(raw) {
        return UrlCheck {
            valid: false,
            reachability: None,
            status: None,
            message: format!("Invalid URL format: {e}"),
        };
    }

    match probe.head(raw).await {
        Ok(status) if status < 400 => UrlCheck {
            valid: true,
            reachability: Some(Reachability::Reachable),
            status: Some(status),
            message: "URL is reachable".to_string(),
        },
        Ok(status) => UrlCheck {
            valid: true,
            reachability: Some(Reachability::ErrorStatus),
            status: Some(status),
            message: format!("URL returned status {status}"),
        },
        Err(e) => {
            warn!(url = raw, error = %e, "URL probe failed");
            UrlCheck {
                valid: true,
                reachability: Some(Reachability::Unknown),
                status: None,
                message: "URL format valid (connectivity check failed)".to_string(),
            }
        }
    }
}
