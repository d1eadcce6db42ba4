//! Identity portal connector (primary login)

use crate::bearer::{extract_bearer_token, strip_bearer_scheme};
use crate::cas::submit_credentials;
use crate::client::{create_client, ensure_success, send};
use crate::config::PortalConfig;
use crate::student::{PROFILE_PATH, StudentApiCall};
use crate::{EgressError, Result, cookies_for};
use campusgate_core::CookieSet;
use campusgate_core::masking::{mask_cookie, mask_sensitive};
use reqwest::cookie::Jar;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, COOKIE, ORIGIN, REFERER};
use reqwest::{Client, Method, RequestBuilder, StatusCode, Url};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

const SESSION_COOKIE: &str = "SESSION";
const BYTE_ORDER_MARK: char = '\u{FEFF}';

/// Result of a successful primary login
#[derive(Debug, Clone)]
pub struct PrimaryLogin {
    /// Cookies scoped to the student app
    pub cookies: CookieSet,
    pub bearer_token: Option<String>,
    /// Student info snapshot; `None` when the app refused to share it
    pub profile: Option<Value>,
}

/// Logs users into the identity portal on behalf of the student app
pub struct IdentityConnector {
    config: PortalConfig,
    api_client: Client,
}

impl IdentityConnector {
    pub fn new(config: PortalConfig) -> Result<Self> {
        config.validate()?;
        let api_client = create_client(&config.client_config, None)?;
        Ok(Self { config, api_client })
    }

    /// Run the CAS handshake for the student app, then fetch the student profile.
    ///
    /// A missing bearer token or profile does not fail the login.
    #[instrument(skip(self, username, password))]
    pub async fn perform_primary_login(&self, username: &str, password: &str) -> Result<PrimaryLogin> {
        let jar = Arc::new(Jar::default());
        let client = create_client(&self.config.client_config, Some(jar.clone()))?;

        let service = self.config.app_service_url()?;
        let response = submit_credentials(&client, &self.config, &service, username, password).await?;
        let landing = response.text().await?;

        let mut bearer_token = match extract_bearer_token(&landing) {
            Some((source, token)) => {
                debug!("Found bearer token via {}: {}", source, mask_sensitive(&token, 6));
                Some(token)
            }
            None => {
                debug!("No bearer token in landing page");
                None
            }
        };

        let cookies = cookies_for(&jar, &self.config.app_url("/app")?);
        debug!("Cookies for /app: {}", mask_cookie(cookies.header_value()));
        if !cookies.contains(SESSION_COOKIE) {
            let root = cookies_for(&jar, &self.config.app_url("/")?);
            warn!(
                "{} cookie missing for /app, root cookies: {}",
                SESSION_COOKIE,
                mask_cookie(root.header_value())
            );
        }

        let (profile, header_token) = self.fetch_profile(&cookies, bearer_token.as_deref()).await;
        if header_token.is_some() {
            debug!("Bearer token replaced by profile response header");
            bearer_token = header_token;
        }

        info!("Primary login completed (profile: {})", profile.is_some());
        Ok(PrimaryLogin {
            cookies,
            bearer_token,
            profile,
        })
    }

    /// Fetch the student profile; returns it with any token the API handed back
    async fn fetch_profile(
        &self,
        cookies: &CookieSet,
        bearer_token: Option<&str>,
    ) -> (Option<Value>, Option<String>) {
        let request = match self.profile_request(cookies, bearer_token) {
            Ok(request) => request,
            Err(e) => {
                warn!("Cannot build profile request: {}", e);
                return (None, None);
            }
        };

        let response = match send(request, &self.config.client_config).await {
            Ok(response) => response,
            Err(e) => {
                warn!("Profile request failed: {}", e);
                return (None, None);
            }
        };

        if !response.status().is_success() {
            warn!("Profile request returned status {}", response.status());
            return (None, None);
        }

        let header_token = response
            .headers()
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .map(|value| strip_bearer_scheme(value).to_string())
            .filter(|token| !token.is_empty());

        let profile = match response.text().await {
            Ok(body) => profile_from_body(&body),
            Err(e) => {
                warn!("Cannot read profile body: {}", e);
                None
            }
        };

        (profile, header_token)
    }

    /// Replay a student app API call with the cookies and token of a primary login.
    ///
    /// The app's JSON comes back untouched. A bounce to the login page or a
    /// 401/403 means the app no longer accepts the session.
    #[instrument(skip(self, cookies, bearer_token, call), fields(operation = call.operation()))]
    pub async fn fetch_student_data(
        &self,
        cookies: &CookieSet,
        bearer_token: Option<&str>,
        call: &StudentApiCall,
    ) -> Result<Value> {
        let url = self.config.app_url(&call.path()?)?;
        let mut request =
            self.api_request(call.method(), url, call.referer_path(), cookies, bearer_token)?;
        if call.sends_json() {
            request = request.header(CONTENT_TYPE, "application/json");
        }
        if let Some(body) = call.body() {
            request = request.body(body);
        }

        let response = send(request, &self.config.client_config).await?;
        if self.config.is_login_page(response.url())
            || matches!(
                response.status(),
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN
            )
        {
            return Err(EgressError::AppSessionRejected);
        }

        let body = ensure_success(response)?.text().await?;
        let body = body.strip_prefix(BYTE_ORDER_MARK).unwrap_or(&body);
        serde_json::from_str(body.trim()).map_err(|e| {
            debug!("{} reply is not JSON: {}", call.operation(), e);
            EgressError::UnexpectedMarkup(format!("{} reply is not JSON", call.operation()))
        })
    }

    fn profile_request(
        &self,
        cookies: &CookieSet,
        bearer_token: Option<&str>,
    ) -> Result<RequestBuilder> {
        let url = self.config.app_url(PROFILE_PATH)?;
        self.api_request(Method::GET, url, "/app/", cookies, bearer_token)
    }

    /// Request carrying the headers the student app sends with its own API calls
    fn api_request(
        &self,
        method: Method,
        url: Url,
        referer_path: &str,
        cookies: &CookieSet,
        bearer_token: Option<&str>,
    ) -> Result<RequestBuilder> {
        let mut request = self
            .api_client
            .request(method, url)
            .header(ACCEPT, "application/json")
            .header(REFERER, self.config.app_url(referer_path)?.as_str())
            .header(ORIGIN, self.config.app_base_url.trim_end_matches('/'))
            .header(COOKIE, cookies.header_value());

        if let Some(token) = bearer_token {
            request = request.header(AUTHORIZATION, format!("Bearer {}", token));
        }
        Ok(request)
    }
}

fn profile_from_body(body: &str) -> Option<Value> {
    match serde_json::from_str(body) {
        Ok(json) => accepted_profile(&json),
        Err(e) => {
            warn!("Profile response is not JSON: {}", e);
            None
        }
    }
}

/// Unwrap the `{code, data}` envelope of a profile reply.
///
/// A `code` other than 200 means the API refused to share the profile.
pub fn accepted_profile(reply: &Value) -> Option<Value> {
    let accepted = match reply.get("code") {
        None | Some(Value::Null) => true,
        Some(Value::String(code)) => code == "200",
        Some(Value::Number(code)) => code.as_u64() == Some(200),
        Some(_) => false,
    };
    if !accepted {
        let msg = reply.get("msg").and_then(serde_json::Value::as_str).unwrap_or_default();
        warn!("Profile denied: {} - {}", reply["code"], msg);
        return None;
    }

    match reply.get("data") {
        Some(data) if !data.is_null() => Some(data.clone()),
        _ => Some(reply.clone()),
    }
}
