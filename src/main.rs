use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use blog_api_kernel::config::AppConfig;
use blog_api_kernel::db::init_db;
use blog_api_kernel::kernel::{build_app, Plugin};
use blog_api_kernel::plugins::auth::repo::PgUserRepo;
use blog_api_kernel::plugins::auth::{AuthPlugin, AuthService};
use blog_api_kernel::plugins::blogs::repo::PgBlogRepo;
use blog_api_kernel::plugins::blogs::{BlogService, BlogsPlugin};
use blog_api_kernel::plugins::health::HealthPlugin;
use blog_api_kernel::plugins::metrics::MetricsPlugin;
use blog_api_kernel::plugins::samples::repo::PgSampleRepo;
use blog_api_kernel::plugins::samples::{SampleService, SamplesPlugin};
use blog_api_kernel::services::mail::{DynMailer, LogMailer, MailService, SmtpMailer};
use blog_api_kernel::services::password::PasswordService;
use blog_api_kernel::services::storage::{LocalDiskStorage, PUBLIC_PREFIX};
use blog_api_kernel::services::token::TokenService;
use tokio::net::TcpListener;
use tower_http::services::ServeDir;
use tracing_subscriber::EnvFilter;

const ACCESS_TOKEN_TTL: Duration = Duration::from_secs(2 * 60 * 60);
const RESET_TOKEN_TTL: Duration = Duration::from_secs(60 * 60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn")))
        .init();

    let config = AppConfig::from_env()?;
    tracing::debug!(?config, "configuration loaded");
    let pool = init_db(&config.database_url, config.run_migrations).await?;

    let access_tokens = TokenService::new(&config.jwt_secret, ACCESS_TOKEN_TTL);
    let reset_tokens = TokenService::new(&config.jwt_secret_forgot_password, RESET_TOKEN_TTL);

    let mailer: DynMailer = match &config.smtp {
        Some(smtp) => Arc::new(SmtpMailer::new(smtp, config.mail_from.clone())?),
        None => {
            tracing::warn!("SMTP_HOST not set, outgoing mail will only be logged");
            Arc::new(LogMailer)
        }
    };
    let storage = Arc::new(LocalDiskStorage::new(&config.upload_dir, config.public_base_url.clone()).await?);

    let auth_service = Arc::new(AuthService::new(
        Arc::new(PgUserRepo::new(pool.clone())),
        PasswordService::default(),
        access_tokens.clone(),
        reset_tokens,
        MailService::new(mailer),
        config.base_url_fe.clone(),
    ));
    let sample_service = Arc::new(SampleService::new(Arc::new(PgSampleRepo::new(pool.clone()))));
    let blog_service = Arc::new(BlogService::new(Arc::new(PgBlogRepo::new(pool.clone())), storage));

    let metrics_plugin = MetricsPlugin::new()?;
    let plugins: Vec<Box<dyn Plugin>> = vec![
        Box::new(HealthPlugin::new(Some(pool.clone()))),
        Box::new(AuthPlugin::new(auth_service)),
        Box::new(SamplesPlugin::new(sample_service)),
        Box::new(BlogsPlugin::new(blog_service, access_tokens)),
    ];

    let names: Vec<&'static str> = plugins.iter().map(|p| p.name()).collect();
    tracing::info!("mounting plugins: {:?}", names);

    let mut app: Router = build_app(&plugins, Some(metrics_plugin.clone())).await;
    // not instrumented, scraping would otherwise count itself
    app = app
        .nest("/metrics", metrics_plugin.router())
        .nest_service(PUBLIC_PREFIX, ServeDir::new(&config.upload_dir));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutting down");
            for p in plugins.iter() {
                p.on_shutdown().await;
            }
        })
        .await?;

    pool.close().await;
    Ok(())
}
