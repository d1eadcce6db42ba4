//! JSON API routes
//!
//! - `/api/auth/*` - login, logout and session status
//! - `/api/dkmh/*` - registration portal operations for the session in the
//!   `Authorization: Bearer` header
//! - `/api/student/*`, `/api/schedule/*` - student app reads relayed as the
//!   app returned them

use axum::{
    Extension, Json, Router,
    extract::{
        Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::{HeaderMap, HeaderValue, Method, header},
    middleware,
    routing::{get, post},
};
use campusgate_core::Error;
use campusgate_gateway::{AuthenticationOrchestrator, RegistrationRequest, StudentRequest};
use serde::{Deserialize, Deserializer};
use serde_json::{Value, json};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::error::ApiError;
use crate::middleware::{REQUEST_ID_HEADER, RequestId, request_id_middleware};

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<AuthenticationOrchestrator>,
}

type ApiResult = Result<Json<Value>, ApiError>;

/// API router with request ids and CORS; `extra` (health endpoints) is merged in
pub fn app(state: AppState, extra: Router, cors_origin: Option<&str>) -> Router {
    Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/auth/logout", post(logout))
        .route("/api/auth/status", get(status))
        .route("/api/dkmh/periods", get(periods))
        .route("/api/dkmh/period-details", post(period_details))
        .route("/api/dkmh/search", post(search))
        .route("/api/dkmh/class-groups", post(class_groups))
        .route("/api/dkmh/registration-result", post(registration_result))
        .route("/api/dkmh/register", post(register))
        .route("/api/dkmh/cancel", post(cancel))
        .route("/api/student/info", get(student_info))
        .route("/api/student/schedule", get(student_schedule))
        .route("/api/student/exam-schedule", get(exam_schedule))
        .route("/api/student/gpa/summary", post(gpa_summary))
        .route("/api/student/gpa/detail", post(gpa_detail))
        .route("/api/schedule/get-schedule", get(student_schedule))
        .route("/api/schedule/get-schedule-by-sem", get(schedule_by_semester))
        .route("/api/schedule/get-exam-schedule", get(exam_schedule))
        .route("/api/schedule/get-gpa", get(gpa))
        .route("/api/schedule/get-transcript", get(transcript))
        .route("/api/schedule/get-transcript-summary", get(transcript_summary))
        .with_state(state)
        .merge(extra)
        .layer(middleware::from_fn(request_id_middleware))
        .layer(cors_layer(cors_origin))
}

fn cors_layer(origin: Option<&str>) -> CorsLayer {
    let allow_origin = match origin.map(HeaderValue::from_str) {
        Some(Ok(origin)) => AllowOrigin::exact(origin),
        Some(Err(e)) => {
            tracing::warn!("Ignoring invalid CORS origin: {}", e);
            AllowOrigin::any()
        }
        None => AllowOrigin::any(),
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, REQUEST_ID_HEADER])
        .expose_headers([REQUEST_ID_HEADER])
}

/// Session token from `Authorization: Bearer <token>`
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

fn require_token<'a>(headers: &'a HeaderMap, request_id: &RequestId) -> Result<&'a str, ApiError> {
    bearer_token(headers).ok_or_else(|| {
        ApiError::new(
            Error::Unauthorized("Missing session token".to_string()),
            request_id,
        )
    })
}

fn body<T>(payload: Result<Json<T>, JsonRejection>, request_id: &RequestId) -> Result<T, ApiError> {
    payload
        .map(|Json(body)| body)
        .map_err(|e| ApiError::new(Error::InvalidRequest(e.body_text()), request_id))
}

fn query<T>(
    params: Result<Query<T>, QueryRejection>,
    request_id: &RequestId,
) -> Result<T, ApiError> {
    params
        .map(|Query(params)| params)
        .map_err(|e| ApiError::new(Error::InvalidRequest(e.body_text()), request_id))
}

/// Ids arrive as JSON strings or numbers
fn id_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(u64),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(text) => text,
        Id::Number(number) => number.to_string(),
    })
}

fn optional_id_string<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    #[derive(Deserialize)]
    struct Wrapped(#[serde(deserialize_with = "id_string")] String);

    Ok(Option::<Wrapped>::deserialize(deserializer)?.map(|Wrapped(id)| id))
}

#[derive(Debug, Deserialize)]
struct LoginBody {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PeriodBody {
    #[serde(deserialize_with = "id_string")]
    period_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchBody {
    #[serde(deserialize_with = "id_string")]
    period_id: String,
    query: String,
    #[serde(default)]
    force_mode: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClassGroupsBody {
    #[serde(deserialize_with = "id_string")]
    period_id: String,
    #[serde(deserialize_with = "id_string")]
    mon_hoc_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegisterBody {
    #[serde(deserialize_with = "id_string")]
    period_id: String,
    #[serde(deserialize_with = "id_string")]
    nlmh_id: String,
    #[serde(default, deserialize_with = "optional_id_string")]
    mon_hoc_id: Option<String>,
    #[serde(default)]
    force_mode: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CancelBody {
    #[serde(deserialize_with = "id_string")]
    period_id: String,
    #[serde(deserialize_with = "id_string")]
    ketqua_id: String,
    #[serde(default)]
    mon_hoc_ma: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScheduleParams {
    student_id: Option<String>,
    semester_year: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SemesterParams {
    student_id: Option<String>,
    sem: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExamParams {
    student_id: Option<String>,
    #[serde(default)]
    namhoc: String,
    #[serde(default)]
    hocky: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StudentParams {
    student_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StudentBody {
    #[serde(default, deserialize_with = "optional_id_string")]
    student_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GpaDetailBody {
    #[serde(default, deserialize_with = "optional_id_string")]
    student_id: Option<String>,
    #[serde(deserialize_with = "id_string")]
    hoc_ky_id: String,
}

async fn login(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    payload: Result<Json<LoginBody>, JsonRejection>,
) -> ApiResult {
    let body = body(payload, &request_id)?;
    let outcome = state
        .orchestrator
        .login(&body.username, &body.password)
        .await
        .map_err(|e| ApiError::new(e, &request_id))?;

    Ok(Json(json!({
        "success": true,
        "token": outcome.token,
        "user": outcome.profile,
    })))
}

async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Json<Value> {
    if let Some(token) = bearer_token(&headers) {
        state.orchestrator.logout(token).await;
    }
    Json(json!({ "success": true }))
}

async fn status(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    headers: HeaderMap,
) -> ApiResult {
    let token = require_token(&headers, &request_id)?;
    let status = state
        .orchestrator
        .session_status(token)
        .await
        .map_err(|e| ApiError::new(e, &request_id))?;

    Ok(Json(json!({
        "authenticated": true,
        "hasSecondaryAuth": status.has_secondary_auth,
        "username": status.username,
        "secondaryState": status.secondary_state,
    })))
}

async fn run(
    state: &AppState,
    headers: &HeaderMap,
    request_id: &RequestId,
    request: RegistrationRequest,
) -> ApiResult {
    let token = require_token(headers, request_id)?;
    let data = state
        .orchestrator
        .fetch_and_parse(token, request)
        .await
        .map_err(|e| ApiError::new(e, request_id))?;

    Ok(Json(json!({ "success": true, "data": data })))
}

async fn periods(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    headers: HeaderMap,
) -> ApiResult {
    run(&state, &headers, &request_id, RegistrationRequest::Periods).await
}

async fn period_details(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    headers: HeaderMap,
    payload: Result<Json<PeriodBody>, JsonRejection>,
) -> ApiResult {
    let body = body(payload, &request_id)?;
    let request = RegistrationRequest::PeriodDetails {
        period_id: body.period_id,
    };
    run(&state, &headers, &request_id, request).await
}

async fn search(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    headers: HeaderMap,
    payload: Result<Json<SearchBody>, JsonRejection>,
) -> ApiResult {
    let body = body(payload, &request_id)?;
    let request = RegistrationRequest::SearchCourses {
        period_id: body.period_id,
        query: body.query,
        force: body.force_mode,
    };
    run(&state, &headers, &request_id, request).await
}

async fn class_groups(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    headers: HeaderMap,
    payload: Result<Json<ClassGroupsBody>, JsonRejection>,
) -> ApiResult {
    let body = body(payload, &request_id)?;
    let request = RegistrationRequest::ClassGroups {
        period_id: body.period_id,
        course_id: body.mon_hoc_id,
    };
    run(&state, &headers, &request_id, request).await
}

async fn registration_result(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    headers: HeaderMap,
    payload: Result<Json<PeriodBody>, JsonRejection>,
) -> ApiResult {
    let body = body(payload, &request_id)?;
    let request = RegistrationRequest::RegistrationResult {
        period_id: body.period_id,
    };
    run(&state, &headers, &request_id, request).await
}

async fn register(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    headers: HeaderMap,
    payload: Result<Json<RegisterBody>, JsonRejection>,
) -> ApiResult {
    let body = body(payload, &request_id)?;
    let request = RegistrationRequest::Register {
        period_id: body.period_id,
        group_id: body.nlmh_id,
        course_id: body.mon_hoc_id,
        force: body.force_mode,
    };
    run(&state, &headers, &request_id, request).await
}

async fn cancel(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    headers: HeaderMap,
    payload: Result<Json<CancelBody>, JsonRejection>,
) -> ApiResult {
    let body = body(payload, &request_id)?;
    let request = RegistrationRequest::Cancel {
        period_id: body.period_id,
        entry_id: body.ketqua_id,
        course_code: body.mon_hoc_ma,
    };
    run(&state, &headers, &request_id, request).await
}

/// Relay a student app read; the app's JSON is the response body
async fn relay(
    state: &AppState,
    headers: &HeaderMap,
    request_id: &RequestId,
    request: StudentRequest,
) -> ApiResult {
    let token = require_token(headers, request_id)?;
    let data = state
        .orchestrator
        .fetch_student_data(token, request)
        .await
        .map_err(|e| ApiError::new(e, request_id))?;

    Ok(Json(data))
}

async fn student_info(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    headers: HeaderMap,
) -> ApiResult {
    relay(&state, &headers, &request_id, StudentRequest::Info).await
}

async fn student_schedule(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    headers: HeaderMap,
    params: Result<Query<ScheduleParams>, QueryRejection>,
) -> ApiResult {
    let params = query(params, &request_id)?;
    let request = StudentRequest::Schedule {
        student_id: params.student_id,
        semester: params.semester_year,
    };
    relay(&state, &headers, &request_id, request).await
}

async fn schedule_by_semester(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    headers: HeaderMap,
    params: Result<Query<SemesterParams>, QueryRejection>,
) -> ApiResult {
    let params = query(params, &request_id)?;
    let request = StudentRequest::Schedule {
        student_id: params.student_id,
        semester: params.sem,
    };
    relay(&state, &headers, &request_id, request).await
}

async fn exam_schedule(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    headers: HeaderMap,
    params: Result<Query<ExamParams>, QueryRejection>,
) -> ApiResult {
    let params = query(params, &request_id)?;
    let request = StudentRequest::ExamSchedule {
        student_id: params.student_id,
        year: params.namhoc,
        semester: params.hocky,
    };
    relay(&state, &headers, &request_id, request).await
}

async fn gpa_summary(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    headers: HeaderMap,
    payload: Result<Json<StudentBody>, JsonRejection>,
) -> ApiResult {
    let body = body(payload, &request_id)?;
    let request = StudentRequest::GpaSummary {
        student_id: body.student_id,
    };
    relay(&state, &headers, &request_id, request).await
}

async fn gpa_detail(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    headers: HeaderMap,
    payload: Result<Json<GpaDetailBody>, JsonRejection>,
) -> ApiResult {
    let body = body(payload, &request_id)?;
    let request = StudentRequest::GpaDetail {
        student_id: body.student_id,
        semester_id: body.hoc_ky_id,
    };
    relay(&state, &headers, &request_id, request).await
}

async fn gpa(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    headers: HeaderMap,
    params: Result<Query<StudentParams>, QueryRejection>,
) -> ApiResult {
    let params = query(params, &request_id)?;
    let request = StudentRequest::GpaSummary {
        student_id: params.student_id,
    };
    relay(&state, &headers, &request_id, request).await
}

async fn transcript(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    headers: HeaderMap,
    params: Result<Query<SemesterParams>, QueryRejection>,
) -> ApiResult {
    let params = query(params, &request_id)?;
    let request = StudentRequest::GpaDetail {
        student_id: params.student_id,
        semester_id: params.sem.unwrap_or_default(),
    };
    relay(&state, &headers, &request_id, request).await
}

async fn transcript_summary(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    headers: HeaderMap,
    params: Result<Query<StudentParams>, QueryRejection>,
) -> ApiResult {
    let params = query(params, &request_id)?;
    let request = StudentRequest::TranscriptSummary {
        student_id: params.student_id,
    };
    relay(&state, &headers, &request_id, request).await
}
