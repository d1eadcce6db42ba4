//! Authentication orchestrator
//!
//! Ties the portal connectors, the session store and the parser together:
//! - `login` runs the identity portal handshake, mints a session and starts the
//!   registration portal login in the background
//! - `fetch_and_parse` replays registration portal calls with the stored
//!   cookies and turns the returned HTML into domain records
//! - `fetch_student_data` relays student app API reads made with the primary
//!   login's cookies and bearer token

use crate::request::{RegistrationData, RegistrationRequest, StudentRequest};
use campusgate_core::masking::mask_student_id;
use campusgate_core::records::{CancellationOutcome, PeriodOverview, RoundIds};
use campusgate_core::{
    CookieSet, Error, PeriodContext, Result, SecondaryLoginState, SessionRecord, SessionStore,
    SessionUpdate,
};
use campusgate_egress::{
    EgressError, IdentityConnector, PortalConfig, RegistrationConnector, RegistrationSession,
    StudentApiCall, accepted_profile,
};
use campusgate_observability::Metrics;
use campusgate_parser::{
    parse_class_groups_html, parse_period_details_html, parse_registration_periods_html,
    parse_registration_response, parse_round_ids, parse_schedule_html, parse_search_results_html,
};
use chrono::{FixedOffset, NaiveDateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::{Instrument, debug, info, info_span, instrument, warn};

/// The portals print local time (UTC+7)
const PORTAL_UTC_OFFSET_SECS: i32 = 7 * 3600;

/// Result of a successful login
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginOutcome {
    pub token: String,
    pub profile: Option<Value>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatus {
    pub has_secondary_auth: bool,
    pub username: String,
    pub secondary_state: SecondaryLoginState,
}

pub struct AuthenticationOrchestrator {
    store: Arc<dyn SessionStore>,
    identity: IdentityConnector,
    registration: Arc<RegistrationConnector>,
    metrics: Arc<Metrics>,
}

impl AuthenticationOrchestrator {
    pub fn new(
        store: Arc<dyn SessionStore>,
        portals: PortalConfig,
        metrics: Arc<Metrics>,
    ) -> Result<Self> {
        let identity = IdentityConnector::new(portals.clone())?;
        let registration = Arc::new(RegistrationConnector::new(portals)?);
        Ok(Self {
            store,
            identity,
            registration,
            metrics,
        })
    }

    /// Log into the identity portal and open a session.
    ///
    /// The registration portal login is started in the background and never
    /// delays or fails this call.
    #[instrument(skip(self, username, password), fields(user = %mask_student_id(username)))]
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginOutcome> {
        let result = self.create_session(username.trim(), password).await;
        if let Err(e) = &result {
            self.metrics.record_login(e.code());
        }
        result
    }

    async fn create_session(&self, username: &str, password: &str) -> Result<LoginOutcome> {
        if username.is_empty() || password.is_empty() {
            return Err(Error::InvalidRequest(
                "Username and password are required".to_string(),
            ));
        }

        if !self.store.can_create_session().await {
            warn!("Session capacity reached, refusing login");
            return Err(Error::CapacityExceeded {
                max_sessions: self.store.max_sessions(),
            });
        }

        let primary = self
            .identity
            .perform_primary_login(username, password)
            .await?;

        let token = self.store.generate_secure_token()?;
        let record = SessionRecord::new(
            token.clone(),
            username,
            primary.cookies,
            primary.bearer_token,
            primary.profile.clone(),
        );
        self.store.save_session(record).await?;

        self.metrics.record_login("success");
        self.metrics
            .set_active_sessions(self.store.active_sessions().await);
        info!("Session created");

        self.spawn_secondary_login(token.clone(), username, password);
        Ok(LoginOutcome {
            token,
            profile: primary.profile,
        })
    }

    fn spawn_secondary_login(&self, token: String, username: &str, password: &str) {
        let store = self.store.clone();
        let registration = self.registration.clone();
        let metrics = self.metrics.clone();
        let username = username.to_string();
        let password = password.to_string();
        let span = info_span!("secondary_login", user = %mask_student_id(&username));

        tokio::spawn(
            async move {
                let update = match registration
                    .perform_secondary_login(&username, &password)
                    .await
                {
                    Ok(login) => {
                        metrics.record_secondary_login("success");
                        SessionUpdate::SecondaryEstablished(login.cookies)
                    }
                    Err(e) => {
                        warn!("Registration portal login failed: {}", e);
                        metrics.record_secondary_login("failure");
                        SessionUpdate::SecondaryFailed
                    }
                };

                if !store.update_session(&token, update).await {
                    debug!("Session ended before the registration portal login finished");
                }
            }
            .instrument(span),
        );
    }

    /// Drop a session; unknown tokens are ignored
    pub async fn logout(&self, token: &str) {
        if self.store.delete_session(token).await {
            info!("Session closed");
        }
        self.metrics
            .set_active_sessions(self.store.active_sessions().await);
    }

    pub async fn session_status(&self, token: &str) -> Result<SessionStatus> {
        let record = self.resolve(token).await?;
        Ok(SessionStatus {
            has_secondary_auth: record.secondary_logged_in(),
            username: record.username,
            secondary_state: record.secondary,
        })
    }

    /// Run one registration portal operation for the session behind `token`
    #[instrument(skip(self, token, request), fields(operation = request.operation()))]
    pub async fn fetch_and_parse(
        &self,
        token: &str,
        request: RegistrationRequest,
    ) -> Result<RegistrationData> {
        request.validate()?;
        let record = self.resolve(token).await?;
        let cookies = registration_cookies(&record)?;

        // The portal keeps the selected period and round against JSESSIONID, so
        // the stored context only proves the details step ran on this session.
        if let Some(period_id) = request.period_id()
            && request.needs_period_context()
            && !record.periods.contains_key(period_id)
        {
            return Err(Error::InvalidRequest(format!(
                "Period {} not loaded, fetch its details first",
                period_id
            )));
        }

        let operation = request.operation();
        let started = Instant::now();
        let session = self.registration.session(&cookies)?;
        let result = execute(&session, request).await;

        let outcome = match &result {
            Ok(_) => "success",
            Err(e) => error_label(e),
        };
        self.metrics
            .record_upstream(operation, outcome, started.elapsed().as_secs_f64());

        match result {
            Ok((data, period)) => {
                if let Some(period) = period {
                    self.store
                        .update_session(token, SessionUpdate::Period(period))
                        .await;
                }
                self.store
                    .update_session(token, SessionUpdate::SecondaryCookies(session.cookies()))
                    .await;
                Ok(data)
            }
            Err(EgressError::SessionRejected) => {
                warn!("Registration portal session expired");
                self.store
                    .update_session(token, SessionUpdate::SecondaryExpired)
                    .await;
                Err(EgressError::SessionRejected.into())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Relay one student app read for the session behind `token`.
    ///
    /// An accepted profile read refreshes the profile kept on the session.
    #[instrument(skip(self, token, request))]
    pub async fn fetch_student_data(&self, token: &str, request: StudentRequest) -> Result<Value> {
        request.validate()?;
        let record = self.resolve(token).await?;
        let call = request.into_call(&record.username);
        let operation = call.operation();

        let started = Instant::now();
        let result = self
            .identity
            .fetch_student_data(
                &record.primary_cookies,
                record.bearer_token.as_deref(),
                &call,
            )
            .await;

        let outcome = match &result {
            Ok(_) => "success",
            Err(e) => error_label(e),
        };
        self.metrics
            .record_upstream(operation, outcome, started.elapsed().as_secs_f64());

        let data = result?;
        if call == StudentApiCall::Info
            && let Some(profile) = accepted_profile(&data)
        {
            self.store
                .update_session(token, SessionUpdate::Profile(profile))
                .await;
        }
        Ok(data)
    }

    async fn resolve(&self, token: &str) -> Result<SessionRecord> {
        self.store
            .get_session(token)
            .await
            .ok_or_else(|| Error::Unauthorized("Invalid or expired session".to_string()))
    }
}

/// Registration portal cookies of a session whose background login succeeded
fn registration_cookies(record: &SessionRecord) -> Result<CookieSet> {
    match (&record.secondary, &record.secondary_cookies) {
        (SecondaryLoginState::Established, Some(cookies)) => Ok(cookies.clone()),
        (SecondaryLoginState::Pending, _) => Err(Error::Unauthorized(
            "Registration portal login still in progress".to_string(),
        )),
        (SecondaryLoginState::Expired, _) => Err(Error::SessionExpired(
            "Registration portal session expired, please log in again".to_string(),
        )),
        _ => Err(Error::Unauthorized(
            "Registration portal session not found".to_string(),
        )),
    }
}

fn error_label(error: &EgressError) -> &'static str {
    match error {
        EgressError::SessionRejected | EgressError::AppSessionRejected => "session_rejected",
        EgressError::UpstreamStatus { .. } => "upstream_status",
        EgressError::Timeout(_) => "timeout",
        EgressError::HttpError(_) => "http_error",
        EgressError::UnexpectedMarkup(_) => "unexpected_markup",
        _ => "error",
    }
}

/// Current wall-clock time as the portals print it
fn portal_now() -> NaiveDateTime {
    match FixedOffset::east_opt(PORTAL_UTC_OFFSET_SECS) {
        Some(offset) => Utc::now().with_timezone(&offset).naive_local(),
        None => Utc::now().naive_utc(),
    }
}

/// Replay the upstream call sequence of `request` on one portal session
async fn execute(
    session: &RegistrationSession,
    request: RegistrationRequest,
) -> campusgate_egress::Result<(RegistrationData, Option<PeriodContext>)> {
    let data = match request {
        RegistrationRequest::Periods => {
            let html = session.registration_form().await?;
            RegistrationData::Periods(parse_registration_periods_html(&html, portal_now()))
        }

        RegistrationRequest::PeriodDetails { period_id } => {
            session.open_period(&period_id).await?;

            let rounds = session.period_rounds(&period_id).await?;
            let ids = parse_round_ids(&rounds).unwrap_or_else(|| {
                debug!("No round ids for period {}, falling back to period id", period_id);
                RoundIds {
                    round_student_id: period_id.clone(),
                    round_id: period_id.clone(),
                }
            });

            let window = session
                .round_schedule(&ids.round_id, &ids.round_student_id)
                .await?;
            session.round_courses(&ids.round_id).await?;
            let result = session.registration_result().await?;

            let context = PeriodContext {
                period_id: period_id.clone(),
                round_id: ids.round_id.clone(),
                round_student_id: ids.round_student_id,
            };
            let overview = PeriodOverview {
                period_id,
                round_id: ids.round_id,
                summary: parse_period_details_html(&result),
                window: parse_schedule_html(&window),
            };
            return Ok((RegistrationData::PeriodDetails(overview), Some(context)));
        }

        RegistrationRequest::SearchCourses { query, force, .. } => {
            if !force {
                session.registration_result().await?;
            }
            let html = session.search_courses(query.trim()).await?;
            RegistrationData::SearchResults(parse_search_results_html(&html))
        }

        RegistrationRequest::ClassGroups { course_id, .. } => {
            let html = session.class_groups(&course_id).await?;
            RegistrationData::ClassGroups(parse_class_groups_html(&html))
        }

        RegistrationRequest::RegistrationResult { .. } => {
            let html = session.registration_result().await?;
            RegistrationData::RegistrationResult(parse_period_details_html(&html))
        }

        RegistrationRequest::Register {
            group_id,
            course_id,
            force,
            ..
        } => {
            if let Some(course_id) = course_id.as_deref().filter(|_| !force) {
                session.class_groups(course_id).await?;
            }
            let reply = session.register(&group_id).await?;
            let outcome = parse_registration_response(&reply, force);
            if outcome.success && !force {
                session.registration_result().await?;
            }
            info!(
                "Register group {}: success={} forced={}",
                group_id, outcome.success, outcome.forced
            );
            RegistrationData::Registration(outcome)
        }

        RegistrationRequest::Cancel {
            entry_id,
            course_code,
            ..
        } => {
            session.cancel(&entry_id).await?;
            let message = match course_code {
                Some(code) if !code.trim().is_empty() => {
                    format!("Hủy đăng ký {} thành công", code.trim())
                }
                _ => "Hủy đăng ký thành công".to_string(),
            };
            RegistrationData::Cancellation(CancellationOutcome {
                success: true,
                entry_id,
                message,
            })
        }
    };

    Ok((data, None))
}
