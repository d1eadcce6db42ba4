//! Portal endpoints

use crate::client::HttpClientConfig;
use crate::{EgressError, Result};
use reqwest::Url;

pub const DEFAULT_IDENTITY_LOGIN_URL: &str = "https://sso.hcmut.edu.vn/cas/login";
pub const DEFAULT_APP_BASE_URL: &str = "https://mybk.hcmut.edu.vn";

/// Where the identity (CAS) portal and the application host live
#[derive(Debug, Clone)]
pub struct PortalConfig {
    /// CAS login page
    pub identity_login_url: String,

    /// Host serving the student app, its JSON API and the registration portal
    pub app_base_url: String,

    /// HTTP client configuration
    pub client_config: HttpClientConfig,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            identity_login_url: DEFAULT_IDENTITY_LOGIN_URL.to_string(),
            app_base_url: DEFAULT_APP_BASE_URL.to_string(),
            client_config: HttpClientConfig::default(),
        }
    }
}

impl PortalConfig {
    /// Set the identity portal login page
    pub fn with_identity_login_url(mut self, url: impl Into<String>) -> Self {
        self.identity_login_url = url.into();
        self
    }

    /// Set the application host
    pub fn with_app_base_url(mut self, url: impl Into<String>) -> Self {
        self.app_base_url = url.into();
        self
    }

    pub fn with_client_config(mut self, client_config: HttpClientConfig) -> Self {
        self.client_config = client_config;
        self
    }

    /// Check that both base URLs parse
    pub fn validate(&self) -> Result<()> {
        self.identity_login()?;
        self.app_url("/")?;
        Ok(())
    }

    fn identity_login(&self) -> Result<Url> {
        Url::parse(&self.identity_login_url).map_err(|e| {
            EgressError::ConfigError(format!(
                "invalid identity login URL {}: {}",
                self.identity_login_url, e
            ))
        })
    }

    /// Absolute URL of a path on the application host
    pub fn app_url(&self, path: &str) -> Result<Url> {
        let joined = format!("{}{}", self.app_base_url.trim_end_matches('/'), path);
        Url::parse(&joined).map_err(|e| {
            EgressError::ConfigError(format!("invalid application URL {}: {}", joined, e))
        })
    }

    /// CAS login page asking for a ticket for `service`
    pub fn login_url_for(&self, service: &Url) -> Result<Url> {
        let mut url = self.identity_login()?;
        url.query_pairs_mut().append_pair("service", service.as_str());
        Ok(url)
    }

    /// Origin of the identity portal (cookie scope of the SSO host)
    pub fn identity_origin(&self) -> Result<Url> {
        let mut url = self.identity_login()?;
        url.set_path("/");
        url.set_query(None);
        Ok(url)
    }

    /// Service the student app registers with CAS
    pub fn app_service_url(&self) -> Result<Url> {
        self.app_url("/app/login/cas")
    }

    /// Service the registration portal registers with CAS
    pub fn registration_service_url(&self) -> Result<Url> {
        self.app_url("/my/homeSSO.action")
    }

    /// Registration form page, also the referer of every registration call
    pub fn registration_form_url(&self) -> Result<Url> {
        self.app_url("/dkmh/dangKyMonHocForm.action")
    }

    /// Whether `url` is the identity portal's login page
    pub fn is_login_page(&self, url: &Url) -> bool {
        let Ok(login) = self.identity_login() else {
            return false;
        };
        url.host_str() == login.host_str()
            && url.port_or_known_default() == login.port_or_known_default()
            && url.path().trim_end_matches('/') == login.path().trim_end_matches('/')
    }
}
