//! reqwest client construction and response checks shared by both connectors

use crate::{EgressError, Result};
use reqwest::cookie::Jar;
use reqwest::{Client, ClientBuilder, RequestBuilder, Response};
use std::sync::Arc;
use std::time::Duration;

/// User agent presented to both portals
pub const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Limits and identity applied to every portal client
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Request timeout in seconds, covering redirects and body
    pub timeout_secs: u64,

    /// TCP + TLS connect limit in seconds
    pub connect_timeout_secs: u64,

    pub pool_max_idle_per_host: usize,

    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            connect_timeout_secs: 10,
            pool_max_idle_per_host: 8,
            user_agent: BROWSER_USER_AGENT.to_string(),
        }
    }
}

/// Create a configured HTTP client.
///
/// Portal handshakes pass a cookie jar so cookies set along redirect chains
/// are kept; plain API calls pass `None` and send cookies explicitly.
pub fn create_client(config: &HttpClientConfig, jar: Option<Arc<Jar>>) -> Result<Client> {
    let mut builder = ClientBuilder::new()
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .pool_max_idle_per_host(config.pool_max_idle_per_host)
        .pool_idle_timeout(Duration::from_secs(90))
        .user_agent(&config.user_agent)
        .use_rustls_tls();

    if let Some(jar) = jar {
        builder = builder.cookie_provider(jar);
    }

    builder
        .build()
        .map_err(|e| EgressError::ConfigError(format!("portal client: {}", e)))
}

/// Send a request, reporting timeouts with the configured limit
pub(crate) async fn send(request: RequestBuilder, config: &HttpClientConfig) -> Result<Response> {
    request.send().await.map_err(|e| {
        if e.is_timeout() {
            EgressError::Timeout(config.timeout_secs)
        } else {
            EgressError::HttpError(e)
        }
    })
}

/// Fail on non-2xx statuses
pub(crate) fn ensure_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(EgressError::UpstreamStatus {
            status_code: status.as_u16(),
            url: response.url().to_string(),
        })
    }
}
