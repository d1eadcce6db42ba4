//! Metrics collection with Prometheus
//!
//! This module provides Prometheus metrics for CampusGate:
//! - Primary and secondary login outcomes
//! - Registration portal calls (counts and latency per operation)
//! - Session gauge and expiry counter

use prometheus::{Counter, CounterVec, Gauge, HistogramOpts, HistogramVec, Opts, Registry};
use std::sync::Arc;

/// Metrics collector for CampusGate
#[derive(Clone)]
pub struct Metrics {
    /// Prometheus registry
    registry: Arc<Registry>,

    /// Primary logins by outcome
    pub logins_total: CounterVec,
    /// Background registration portal logins by outcome
    pub secondary_logins_total: CounterVec,

    /// Registration portal calls by operation and outcome
    pub upstream_requests_total: CounterVec,
    /// Registration portal call duration
    pub upstream_duration_seconds: HistogramVec,

    /// Sessions currently held
    pub active_sessions: Gauge,
    /// Sessions removed by expiry
    pub sessions_expired_total: Counter,
}

impl Metrics {
    /// Create a new metrics collector
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let logins_total = CounterVec::new(
            Opts::new("campusgate_logins_total", "Total number of login attempts"),
            &["outcome"],
        )?;

        let secondary_logins_total = CounterVec::new(
            Opts::new(
                "campusgate_secondary_logins_total",
                "Total number of registration portal logins",
            ),
            &["outcome"],
        )?;

        let upstream_requests_total = CounterVec::new(
            Opts::new(
                "campusgate_upstream_requests_total",
                "Total number of registration portal operations",
            ),
            &["operation", "outcome"],
        )?;

        let upstream_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "campusgate_upstream_duration_seconds",
                "Registration portal operation duration in seconds",
            )
            .buckets(vec![0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
            &["operation"],
        )?;

        let active_sessions = Gauge::with_opts(Opts::new(
            "campusgate_active_sessions",
            "Number of sessions currently held",
        ))?;

        let sessions_expired_total = Counter::with_opts(Opts::new(
            "campusgate_sessions_expired_total",
            "Total number of sessions removed by expiry",
        ))?;

        registry.register(Box::new(logins_total.clone()))?;
        registry.register(Box::new(secondary_logins_total.clone()))?;
        registry.register(Box::new(upstream_requests_total.clone()))?;
        registry.register(Box::new(upstream_duration_seconds.clone()))?;
        registry.register(Box::new(active_sessions.clone()))?;
        registry.register(Box::new(sessions_expired_total.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            logins_total,
            secondary_logins_total,
            upstream_requests_total,
            upstream_duration_seconds,
            active_sessions,
            sessions_expired_total,
        })
    }

    /// Get the Prometheus registry for exporting metrics
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Record a primary login; `outcome` is `success` or an error code
    pub fn record_login(&self, outcome: &str) {
        self.logins_total.with_label_values(&[outcome]).inc();
    }

    pub fn record_secondary_login(&self, outcome: &str) {
        self.secondary_logins_total
            .with_label_values(&[outcome])
            .inc();
    }

    /// Record one registration portal operation
    pub fn record_upstream(&self, operation: &str, outcome: &str, duration_secs: f64) {
        self.upstream_requests_total
            .with_label_values(&[operation, outcome])
            .inc();
        self.upstream_duration_seconds
            .with_label_values(&[operation])
            .observe(duration_secs);
    }

    pub fn set_active_sessions(&self, count: usize) {
        self.active_sessions.set(count as f64);
    }

    pub fn record_sessions_expired(&self, count: usize) {
        if count > 0 {
            self.sessions_expired_total.inc_by(count as f64);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_creation() {
        let metrics = Metrics::new().unwrap();
        // Vec metrics only show up once a label set is used
        let names: Vec<String> = metrics
            .registry()
            .gather()
            .iter()
            .map(|m| m.name().to_string())
            .collect();
        assert!(names.contains(&"campusgate_active_sessions".to_string()));
        assert!(names.contains(&"campusgate_sessions_expired_total".to_string()));
    }

    #[test]
    fn test_record_login() {
        let metrics = Metrics::new().unwrap();
        metrics.record_login("success");
        metrics.record_login("success");
        metrics.record_login("AUTH_FAILURE");

        assert_eq!(metrics.logins_total.with_label_values(&["success"]).get(), 2.0);
        assert_eq!(
            metrics.logins_total.with_label_values(&["AUTH_FAILURE"]).get(),
            1.0
        );
    }

    #[test]
    fn test_record_secondary_login() {
        let metrics = Metrics::new().unwrap();
        metrics.record_secondary_login("failure");

        assert_eq!(
            metrics
                .secondary_logins_total
                .with_label_values(&["failure"])
                .get(),
            1.0
        );
    }

    #[test]
    fn test_record_upstream() {
        let metrics = Metrics::new().unwrap();
        metrics.record_upstream("period_details", "success", 0.8);
        metrics.record_upstream("period_details", "SESSION_EXPIRED", 0.2);

        assert_eq!(
            metrics
                .upstream_requests_total
                .with_label_values(&["period_details", "success"])
                .get(),
            1.0
        );
        let histogram = metrics
            .upstream_duration_seconds
            .with_label_values(&["period_details"]);
        assert_eq!(histogram.get_sample_count(), 2);
        assert!((histogram.get_sample_sum() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_session_gauges() {
        let metrics = Metrics::new().unwrap();
        metrics.set_active_sessions(12);
        metrics.record_sessions_expired(0);
        metrics.record_sessions_expired(3);

        assert_eq!(metrics.active_sessions.get(), 12.0);
        assert_eq!(metrics.sessions_expired_total.get(), 3.0);
    }

    #[test]
    fn test_metrics_encode() {
        let metrics = Metrics::new().unwrap();
        metrics.record_login("success");

        let body = prometheus::TextEncoder::new()
            .encode_to_string(&metrics.registry().gather())
            .unwrap();
        assert!(body.contains("campusgate_logins_total{outcome=\"success\"} 1"));
    }
}
