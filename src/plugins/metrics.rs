use std::sync::Arc;
use std::time::Instant;

use axum::extract::{MatchedPath, Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::{routing::get, Router};
use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder};

#[derive(Clone)]
pub struct MetricsPlugin {
    registry: Arc<Registry>,
    pub request_counter: Arc<IntCounterVec>,
    pub request_duration: Arc<HistogramVec>,
}

impl MetricsPlugin {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();
        let counter = IntCounterVec::new(
            Opts::new("requests_total", "Total HTTP requests"),
            &["method", "path", "status"],
        )?;
        registry.register(Box::new(counter.clone()))?;

        let histogram = HistogramVec::new(
            HistogramOpts::new("request_duration_seconds", "HTTP request latencies in seconds"),
            &["method", "path"],
        )?;
        registry.register(Box::new(histogram.clone()))?;

        #[cfg(target_os = "linux")]
        {
            let collector = prometheus::process_collector::ProcessCollector::for_self();
            registry.register(Box::new(collector)).ok();
        }

        Ok(MetricsPlugin {
            registry: Arc::new(registry),
            request_counter: Arc::new(counter),
            request_duration: Arc::new(histogram),
        })
    }

    /// Prometheus text exposition of everything registered.
    pub fn render(&self) -> anyhow::Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }

    pub fn router(&self) -> Router {
        let metrics = self.clone();
        Router::new().route(
            "/",
            get(move || {
                let metrics = metrics.clone();
                async move {
                    match metrics.render() {
                        Ok(body) => (StatusCode::OK, body).into_response(),
                        Err(e) => {
                            tracing::error!("failed to encode metrics: {e:#}");
                            StatusCode::INTERNAL_SERVER_ERROR.into_response()
                        }
                    }
                }
            }),
        )
    }
}

/// Records count and latency per route template, so `/blogs/:slug` is one series
/// regardless of the slug.
pub async fn track_metrics(State(metrics): State<MetricsPlugin>, req: Request, next: Next) -> Response {
    let method = req.method().to_string();
    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| "unmatched".to_owned());

    let start = Instant::now();
    let response = next.run(req).await;
    let elapsed = start.elapsed().as_secs_f64();

    let status = response.status().as_u16().to_string();
    metrics.request_counter.with_label_values(&[&method, &path, &status]).inc();
    metrics.request_duration.with_label_values(&[&method, &path]).observe(elapsed);
    response
}
