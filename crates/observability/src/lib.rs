use std::io;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::OnceCell;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

static TRACING_INIT: OnceCell<()> = OnceCell::new();

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Default)]
pub struct AppMetrics {
    requests_total: AtomicU64,
    fallback_total: AtomicU64,
    error_total: AtomicU64,
    not_loaded_total: AtomicU64,
    provider_calls_total: AtomicU64,
    classifier_inference_total: AtomicU64,
    latency_sum_millis: AtomicU64,
    latency_max_millis: AtomicU64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub requests_total: u64,
    pub fallback_total: u64,
    pub error_total: u64,
    pub not_loaded_total: u64,
    pub provider_calls_total: u64,
    pub classifier_inference_total: u64,
    pub avg_latency_millis: f64,
    pub max_latency_millis: u64,
}

impl AppMetrics {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn inc_request(&self) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_fallback(&self) {
        self.fallback_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_error(&self) {
        self.error_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_not_loaded(&self) {
        self.not_loaded_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_provider_call(&self) {
        self.provider_calls_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_classifier_inference(&self) {
        self.classifier_inference_total
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn observe_latency(&self, elapsed: Duration) {
        let millis = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
        self.latency_sum_millis.fetch_add(millis, Ordering::Relaxed);
        self.latency_max_millis.fetch_max(millis, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let requests = self.requests_total.load(Ordering::Relaxed);
        let latency_sum = self.latency_sum_millis.load(Ordering::Relaxed);
        let avg_latency_millis = match requests {
            0 => 0.0,
            n => latency_sum as f64 / n as f64,
        };

        MetricsSnapshot {
            requests_total: requests,
            fallback_total: self.fallback_total.load(Ordering::Relaxed),
            error_total: self.error_total.load(Ordering::Relaxed),
            not_loaded_total: self.not_loaded_total.load(Ordering::Relaxed),
            provider_calls_total: self.provider_calls_total.load(Ordering::Relaxed),
            classifier_inference_total: self.classifier_inference_total.load(Ordering::Relaxed),
            avg_latency_millis,
            max_latency_millis: self.latency_max_millis.load(Ordering::Relaxed),
        }
    }
}

fn default_filter(service_name: &str) -> String {
    format!("{service_name}=info,ecochat_api=info,ecochat_agent=info,ecochat_ml=info")
}

pub fn init_tracing(service_name: &str, format: LogFormat) {
    TRACING_INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_filter(service_name)));

        let builder = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr);
        match format {
            LogFormat::Json => builder
                .json()
                .with_current_span(true)
                .with_span_list(true)
                .init(),
            LogFormat::Compact => builder.compact().with_target(false).init(),
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_tracks_average_and_peak_latency() {
        let metrics = AppMetrics::default();
        assert_eq!(metrics.snapshot().avg_latency_millis, 0.0);

        metrics.inc_request();
        metrics.inc_request();
        metrics.inc_fallback();
        metrics.observe_latency(Duration::from_millis(30));
        metrics.observe_latency(Duration::from_millis(10));

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.requests_total, 2);
        assert_eq!(snapshot.fallback_total, 1);
        assert_eq!(snapshot.avg_latency_millis, 20.0);
        assert_eq!(snapshot.max_latency_millis, 30);
    }

    #[test]
    fn default_filter_names_the_service() {
        assert!(default_filter("ecochat_cli").starts_with("ecochat_cli=info,"));
    }
}
