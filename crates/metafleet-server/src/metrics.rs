use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;

#[derive(Debug, Default)]
pub struct Metrics {
    request_total: AtomicU64,
    request_success: AtomicU64,
    request_error: AtomicU64,
    events_applied: AtomicU64,
    events_ignored: AtomicU64,
    broadcasts_attempted: AtomicU64,
    broadcasts_failed: AtomicU64,
    logins_success: AtomicU64,
    logins_provisioning: AtomicU64,
    logins_failed: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_request(&self) {
        self.request_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_success(&self) {
        self.request_success.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_error(&self) {
        self.request_error.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_event_applied(&self) {
        self.events_applied.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_event_ignored(&self) {
        self.events_ignored.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_broadcasts(&self, attempted: usize, failed: usize) {
        self.broadcasts_attempted
            .fetch_add(attempted as u64, Ordering::Relaxed);
        self.broadcasts_failed
            .fetch_add(failed as u64, Ordering::Relaxed);
    }

    pub fn record_login_success(&self) {
        self.logins_success.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_login_provisioning(&self) {
        self.logins_provisioning.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_login_failure(&self) {
        self.logins_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn request_total(&self) -> u64 {
        self.request_total.load(Ordering::Relaxed)
    }

    pub fn request_success(&self) -> u64 {
        self.request_success.load(Ordering::Relaxed)
    }

    pub fn request_error(&self) -> u64 {
        self.request_error.load(Ordering::Relaxed)
    }

    pub fn events_applied(&self) -> u64 {
        self.events_applied.load(Ordering::Relaxed)
    }

    pub fn events_ignored(&self) -> u64 {
        self.events_ignored.load(Ordering::Relaxed)
    }

    pub fn broadcasts_attempted(&self) -> u64 {
        self.broadcasts_attempted.load(Ordering::Relaxed)
    }

    pub fn broadcasts_failed(&self) -> u64 {
        self.broadcasts_failed.load(Ordering::Relaxed)
    }

    pub fn logins_success(&self) -> u64 {
        self.logins_success.load(Ordering::Relaxed)
    }

    pub fn logins_provisioning(&self) -> u64 {
        self.logins_provisioning.load(Ordering::Relaxed)
    }

    pub fn logins_failed(&self) -> u64 {
        self.logins_failed.load(Ordering::Relaxed)
    }

    pub fn render_prometheus(&self) -> String {
        let mut output = String::new();
        let mut counter = |name: &str, help: &str, value: u64| {
            output.push_str(&format!("# HELP {name} {help}\n"));
            output.push_str(&format!("# TYPE {name} counter\n"));
            output.push_str(&format!("{name} {value}\n"));
        };
        counter(
            "metafleet_requests_total",
            "Total number of HTTP requests.",
            self.request_total(),
        );
        counter(
            "metafleet_requests_success_total",
            "Total successful requests.",
            self.request_success(),
        );
        counter(
            "metafleet_requests_error_total",
            "Total failed requests.",
            self.request_error(),
        );
        counter(
            "metafleet_events_applied_total",
            "Metadata change events applied to the local caches.",
            self.events_applied(),
        );
        counter(
            "metafleet_events_ignored_total",
            "Metadata change events acknowledged but not recognized.",
            self.events_ignored(),
        );
        counter(
            "metafleet_broadcasts_attempted_total",
            "Invalidation requests sent to peers.",
            self.broadcasts_attempted(),
        );
        counter(
            "metafleet_broadcasts_failed_total",
            "Invalidation requests that did not reach their peer.",
            self.broadcasts_failed(),
        );
        counter(
            "metafleet_logins_success_total",
            "Successful login attempts.",
            self.logins_success(),
        );
        counter(
            "metafleet_logins_provisioning_total",
            "Login attempts resolved to tenant provisioning.",
            self.logins_provisioning(),
        );
        counter(
            "metafleet_logins_failed_total",
            "Failed login attempts.",
            self.logins_failed(),
        );
        output
    }
}

pub async fn metrics_handler(State(metrics): State<Arc<Metrics>>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
        metrics.render_prometheus(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_metrics_are_zero() {
        let m = Metrics::new();
        assert_eq!(m.request_total(), 0);
        assert_eq!(m.events_applied(), 0);
        assert_eq!(m.broadcasts_attempted(), 0);
        assert_eq!(m.logins_success(), 0);
    }

    #[test]
    fn record_increments_counters() {
        let m = Metrics::new();
        m.record_request();
        m.record_request();
        m.record_success();
        m.record_error();
        m.record_event_applied();
        m.record_event_ignored();
        m.record_broadcasts(3, 1);
        m.record_login_success();
        m.record_login_provisioning();
        m.record_login_failure();

        assert_eq!(m.request_total(), 2);
        assert_eq!(m.request_success(), 1);
        assert_eq!(m.request_error(), 1);
        assert_eq!(m.events_applied(), 1);
        assert_eq!(m.events_ignored(), 1);
        assert_eq!(m.broadcasts_attempted(), 3);
        assert_eq!(m.broadcasts_failed(), 1);
        assert_eq!(m.logins_success(), 1);
        assert_eq!(m.logins_provisioning(), 1);
        assert_eq!(m.logins_failed(), 1);
    }

    #[test]
    fn render_prometheus_format() {
        let m = Metrics::new();
        m.record_request();
        m.record_success();
        m.record_broadcasts(2, 0);

        let output = m.render_prometheus();

        assert!(output.contains("# TYPE metafleet_requests_total counter"));
        assert!(output.contains("metafleet_requests_total 1"));
        assert!(output.contains("metafleet_broadcasts_attempted_total 2"));
        assert!(output.contains("metafleet_broadcasts_failed_total 0"));
    }

    #[tokio::test]
    async fn metrics_endpoint_returns_prometheus_text() {
        let metrics = Arc::new(Metrics::new());
        metrics.record_request();
        metrics.record_request();
        metrics.record_event_applied();

        let app = axum::Router::new()
            .route("/metrics", axum::routing::get(metrics_handler))
            .with_state(metrics);

        let server = axum_test::TestServer::new(app).unwrap();
        let response = server.get("/metrics").await;

        response.assert_status_ok();
        let body = response.text();
        assert!(body.contains("metafleet_requests_total 2"));
        assert!(body.contains("metafleet_events_applied_total 1"));
    }
}
