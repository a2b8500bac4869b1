use async_trait::async_trait;
use axum::http::{Method, Uri};
use axum::{middleware, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::http_error::AppError;
use crate::plugins::metrics::{track_metrics, MetricsPlugin};

#[async_trait]
pub trait Plugin: Send + Sync {
    async fn router(&self) -> Router;

    /// Mount point, without the leading slash.
    fn name(&self) -> &'static str;
    /// Optional lifecycle hook called when the kernel starts.
    async fn on_start(&self) {}
    /// Optional lifecycle hook called on shutdown.
    async fn on_shutdown(&self) {}
}

async fn not_found(method: Method, uri: Uri) -> AppError {
    AppError::not_found(format!("Cannot {method} {}", uri.path()))
}

/// Builds the application router by mounting each plugin under `/{plugin.name()}`.
/// When `metrics` is given every plugin router is instrumented with it.
pub async fn build_app(plugins: &[Box<dyn Plugin>], metrics: Option<MetricsPlugin>) -> Router {
    let mut app = Router::new();

    for plugin in plugins.iter() {
        info!("starting plugin {}", plugin.name());
        plugin.on_start().await;
        let mut router = plugin.router().await;
        if let Some(metrics) = &metrics {
            router = router.layer(middleware::from_fn_with_state(metrics.clone(), track_metrics));
        }
        // mount plugin under its name to namespace routes
        app = app.nest(&format!("/{}", plugin.name()), router);
    }

    app.fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
