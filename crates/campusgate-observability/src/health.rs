//! Liveness, readiness and metrics endpoints
//!
//! `/healthz` answers as long as the process serves requests, `/readyz` turns
//! 503 once no further login can be accepted, `/metrics` is the Prometheus
//! text exposition of [`Metrics`].

use async_trait::async_trait;
use axum::{
    Json, Router,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use campusgate_core::SessionStore;
use prometheus::TextEncoder;
use serde::Serialize;
use std::sync::Arc;

use crate::metrics::Metrics;

const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4";

#[derive(Debug, Clone, Serialize)]
pub struct LivenessResponse {
    pub status: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReadinessResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<ComponentStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ComponentStatus {
    pub name: String,
    pub status: String,
    /// Share of capacity in use (0.0-1.0)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub utilization: Option<f64>,
}

/// Decides whether the gateway should receive new logins
#[async_trait]
pub trait ReadinessChecker: Send + Sync {
    async fn is_ready(&self) -> bool;

    async fn component_statuses(&self) -> Vec<ComponentStatus>;
}

/// Not ready while the session store has no room for another login
pub struct SessionCapacityCheck {
    store: Arc<dyn SessionStore>,
}

impl SessionCapacityCheck {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ReadinessChecker for SessionCapacityCheck {
    async fn is_ready(&self) -> bool {
        self.store.can_create_session().await
    }

    async fn component_statuses(&self) -> Vec<ComponentStatus> {
        let active = self.store.active_sessions().await;
        let max = self.store.max_sessions();
        let status = if active < max { "available" } else { "full" };
        vec![ComponentStatus {
            name: "session_store".to_string(),
            status: status.to_string(),
            utilization: (max > 0).then(|| active as f64 / max as f64),
        }]
    }
}

#[derive(Clone)]
pub struct HealthState {
    metrics: Arc<Metrics>,
    readiness_checker: Option<Arc<dyn ReadinessChecker>>,
}

impl HealthState {
    pub fn new(metrics: Arc<Metrics>) -> Self {
        Self {
            metrics,
            readiness_checker: None,
        }
    }

    pub fn with_readiness_checker(
        metrics: Arc<Metrics>,
        checker: Arc<dyn ReadinessChecker>,
    ) -> Self {
        Self {
            metrics,
            readiness_checker: Some(checker),
        }
    }
}

pub fn health_router(state: HealthState) -> Router {
    Router::new()
        .route("/healthz", get(liveness))
        .route("/readyz", get(readiness))
        .route("/metrics", get(prometheus_metrics))
        .with_state(state)
}

async fn liveness() -> Json<LivenessResponse> {
    Json(LivenessResponse { status: "ok" })
}

async fn readiness(State(state): State<HealthState>) -> Response {
    let (ready, components) = match &state.readiness_checker {
        Some(checker) => (checker.is_ready().await, checker.component_statuses().await),
        None => (true, Vec::new()),
    };

    let (code, body) = if ready {
        (
            StatusCode::OK,
            ReadinessResponse {
                status: "ready",
                components,
                reason: None,
            },
        )
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            ReadinessResponse {
                status: "not_ready",
                components,
                reason: Some("Session capacity reached".to_string()),
            },
        )
    };
    (code, Json(body)).into_response()
}

async fn prometheus_metrics(State(state): State<HealthState>) -> Response {
    let families = state.metrics.registry().gather();
    match TextEncoder::new().encode_to_string(&families) {
        Ok(text) => ([(header::CONTENT_TYPE, PROMETHEUS_CONTENT_TYPE)], text).into_response(),
        Err(e) => {
            tracing::error!("Metrics encoding failed: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use campusgate_core::{CookieSet, SessionRecord};
    use campusgate_session::InMemorySessionStore;
    use std::time::Duration;
    use tower::ServiceExt;

    fn full_store() -> Arc<dyn SessionStore> {
        Arc::new(InMemorySessionStore::with_limits(1, Duration::from_secs(60)))
    }

    async fn get(app: Router, uri: &str) -> Response {
        app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_healthz() {
        let metrics = Arc::new(Metrics::new().unwrap());
        let response = get(health_router(HealthState::new(metrics)), "/healthz").await;

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_readyz_with_room() {
        let metrics = Arc::new(Metrics::new().unwrap());
        let checker = Arc::new(SessionCapacityCheck::new(full_store()));
        let state = HealthState::with_readiness_checker(metrics, checker);

        let response = get(health_router(state), "/readyz").await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_readyz_at_capacity() {
        let store = full_store();
        store
            .save_session(SessionRecord::new(
                "tok",
                "2110123",
                CookieSet::default(),
                None,
                None,
            ))
            .await
            .unwrap();

        let metrics = Arc::new(Metrics::new().unwrap());
        let checker = Arc::new(SessionCapacityCheck::new(store));
        let state = HealthState::with_readiness_checker(metrics, checker);

        let response = get(health_router(state), "/readyz").await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_readyz_no_checker() {
        let metrics = Arc::new(Metrics::new().unwrap());
        let response = get(health_router(HealthState::new(metrics)), "/readyz").await;

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_capacity_component_status() {
        let store = full_store();
        let checker = SessionCapacityCheck::new(store.clone());

        let statuses = checker.component_statuses().await;
        assert_eq!(statuses[0].status, "available");
        assert_eq!(statuses[0].utilization, Some(0.0));

        store
            .save_session(SessionRecord::new(
                "tok",
                "2110123",
                CookieSet::default(),
                None,
                None,
            ))
            .await
            .unwrap();
        let statuses = checker.component_statuses().await;
        assert_eq!(statuses[0].status, "full");
        assert_eq!(statuses[0].utilization, Some(1.0));
    }

    #[tokio::test]
    async fn test_metrics() {
        let metrics = Arc::new(Metrics::new().unwrap());
        metrics.record_login("success");
        let response = get(health_router(HealthState::new(metrics)), "/metrics").await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            PROMETHEUS_CONTENT_TYPE
        );
    }

    #[test]
    fn test_readiness_response_serialization() {
        let response = ReadinessResponse {
            status: "ready",
            components: vec![ComponentStatus {
                name: "session_store".to_string(),
                status: "available".to_string(),
                utilization: Some(0.25),
            }],
            reason: None,
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["status"], "ready");
        assert_eq!(json["components"][0]["utilization"], 0.25);
        assert!(json.get("reason").is_none());
    }
}
