//! CampusGate Observability
//!
//! Prometheus metrics for logins, upstream portal calls and session counts,
//! plus the `/healthz`, `/readyz` and `/metrics` router. Readiness follows
//! session capacity.

pub mod health;
pub mod metrics;

pub use health::{
    ComponentStatus, HealthState, ReadinessChecker, SessionCapacityCheck, health_router,
};
pub use metrics::Metrics;
