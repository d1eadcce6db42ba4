//! Course registration portal connector
//!
//! The registration portal keeps its own Java session behind a second CAS
//! login. Once logged in, every call is a form POST under `/dkmh/` that
//! returns an HTML fragment; the portal also remembers which period and
//! round the user last opened, so calls must be replayed in order.

use crate::cas::submit_credentials;
use crate::client::{create_client, ensure_success, send};
use crate::config::PortalConfig;
use crate::{EgressError, Result, cookies_for};
use campusgate_core::CookieSet;
use campusgate_core::masking::{mask_cookie, mask_url};
use reqwest::cookie::Jar;
use reqwest::header::{ACCEPT, CONTENT_TYPE, ORIGIN, REFERER};
use reqwest::{Client, Url};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

const HTML_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded; charset=UTF-8";

/// Cookies established by a successful registration portal login
#[derive(Debug, Clone)]
pub struct SecondaryLogin {
    pub cookies: CookieSet,
}

pub struct RegistrationConnector {
    config: PortalConfig,
}

impl RegistrationConnector {
    pub fn new(config: PortalConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Log into the registration portal with its own client and cookie jar
    #[instrument(skip(self, username, password))]
    pub async fn perform_secondary_login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<SecondaryLogin> {
        let jar = Arc::new(Jar::default());
        let client = create_client(&self.config.client_config, Some(jar.clone()))?;

        let service = self.config.registration_service_url()?;
        let response = submit_credentials(&client, &self.config, &service, username, password).await?;
        if !response.url().path().ends_with("homeSSO.action") {
            debug!("Did not land on homeSSO: {}", mask_url(response.url().as_str()));
        }

        let steps = [
            self.config.app_url("/dkmh/")?,
            self.config.app_url("/dkmh/home.action")?,
            self.config.registration_form_url()?,
        ];
        let mut referer = service;
        for step in steps {
            let request = client
                .get(step)
                .header(ACCEPT, HTML_ACCEPT)
                .header(REFERER, referer.as_str());
            let response = send(request, &self.config.client_config).await?;
            debug!("Registration portal step landed on {}", mask_url(response.url().as_str()));
            referer = response.url().clone();
        }

        if self.config.is_login_page(&referer) {
            warn!("Registration portal sent us back to the login page");
            return Err(EgressError::SecondaryLoginRejected);
        }

        let identity = cookies_for(&jar, &self.config.identity_origin()?);
        let portal = cookies_for(&jar, &self.config.app_url("/dkmh")?);
        let app = cookies_for(&jar, &self.config.app_url("/")?);
        let cookies = identity.merged_with(&portal).merged_with(&app);

        info!("Registration portal login completed");
        debug!("Registration portal cookies: {}", mask_cookie(cookies.header_value()));
        Ok(SecondaryLogin { cookies })
    }

    /// Open a session on the registration portal from stored cookies
    pub fn session(&self, cookies: &CookieSet) -> Result<RegistrationSession> {
        let jar = Arc::new(Jar::default());
        let root = self.config.app_url("/")?;
        for (name, value) in cookies.pairs() {
            jar.add_cookie_str(&format!("{}={}", name, value), &root);
        }

        let client = create_client(&self.config.client_config, Some(jar.clone()))?;
        Ok(RegistrationSession {
            config: self.config.clone(),
            client,
            jar,
            portal_root: self.config.app_url("/dkmh")?,
            app_root: root,
        })
    }
}

/// An authenticated conversation with the registration portal.
///
/// Calls on one session share a cookie jar, so the server-side selection of
/// period and round made by one call is visible to the next.
pub struct RegistrationSession {
    config: PortalConfig,
    client: Client,
    jar: Arc<Jar>,
    app_root: Url,
    portal_root: Url,
}

impl RegistrationSession {
    /// Current cookies, including any the portal refreshed during this session
    pub fn cookies(&self) -> CookieSet {
        let app = cookies_for(&self.jar, &self.app_root);
        let portal = cookies_for(&self.jar, &self.portal_root);
        app.merged_with(&portal)
    }

    /// Registration form page listing the periods
    pub async fn registration_form(&self) -> Result<String> {
        let request = self
            .client
            .get(self.config.registration_form_url()?)
            .header(ACCEPT, HTML_ACCEPT)
            .header(REFERER, self.config.app_url("/dkmh/home.action")?.as_str());
        self.read(request).await
    }

    /// Select a period and open its registration result view
    pub async fn open_period(&self, period_id: &str) -> Result<String> {
        self.post("ketQuaDangKyView.action", &[("hocKyId", period_id)]).await
    }

    /// Rounds of the selected period
    pub async fn period_rounds(&self, period_id: &str) -> Result<String> {
        self.post("getDanhSachDotDK.action", &[("hocKyId", period_id)]).await
    }

    /// Registration window of a round
    pub async fn round_schedule(&self, round_id: &str, round_student_id: &str) -> Result<String> {
        self.post(
            "getLichDangKy.action",
            &[("dotDKId", round_id), ("dotDKHocVienId", round_student_id)],
        )
        .await
    }

    /// Courses offered in a round; also selects the round server-side
    pub async fn round_courses(&self, round_id: &str) -> Result<String> {
        self.post("getDanhSachMonHocDangKy.action", &[("dotDKId", round_id)]).await
    }

    /// Courses registered in the selected round
    pub async fn registration_result(&self) -> Result<String> {
        self.post("getKetQuaDangKy.action", &[]).await
    }

    pub async fn search_courses(&self, query: &str) -> Result<String> {
        self.post("searchMonHocDangKy.action", &[("msmh", query)]).await
    }

    pub async fn class_groups(&self, course_id: &str) -> Result<String> {
        self.post("getThongTinNhomLopMonHoc.action", &[("monHocId", course_id)]).await
    }

    /// Register the selected group; the portal answers with JSON
    pub async fn register(&self, group_id: &str) -> Result<String> {
        self.post("dangKy.action", &[("NLMHId", group_id)]).await
    }

    pub async fn cancel(&self, entry_id: &str) -> Result<String> {
        self.post("xoaKetQuaDangKy.action", &[("ketquaId", entry_id)]).await
    }

    async fn post(&self, action: &str, form: &[(&str, &str)]) -> Result<String> {
        let body = serde_urlencoded::to_string(form)
            .map_err(|e| EgressError::ConfigError(format!("cannot encode form: {}", e)))?;
        let url = self.config.app_url(&format!("/dkmh/{}", action))?;
        debug!("POST {}", action);

        let request = self
            .client
            .post(url)
            .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
            .header(ORIGIN, self.config.app_base_url.trim_end_matches('/'))
            .header(REFERER, self.config.registration_form_url()?.as_str())
            .body(body);
        self.read(request).await
    }

    async fn read(&self, request: reqwest::RequestBuilder) -> Result<String> {
        let response = send(request, &self.config.client_config).await?;
        if self.config.is_login_page(response.url()) {
            return Err(EgressError::SessionRejected);
        }
        Ok(ensure_success(response)?.text().await?)
    }
}
