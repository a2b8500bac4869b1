#![allow(dead_code)]

use std::process::Command;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use blog_api_kernel::db;
use blog_api_kernel::kernel::{build_app, Plugin};
use blog_api_kernel::plugins::auth::repo::PgUserRepo;
use blog_api_kernel::plugins::auth::{AuthPlugin, AuthService};
use blog_api_kernel::plugins::blogs::repo::PgBlogRepo;
use blog_api_kernel::plugins::blogs::{BlogService, BlogsPlugin};
use blog_api_kernel::plugins::health::HealthPlugin;
use blog_api_kernel::plugins::samples::repo::PgSampleRepo;
use blog_api_kernel::plugins::samples::{SampleService, SamplesPlugin};
use blog_api_kernel::services::mail::{MailService, Mailer, OutgoingMail};
use blog_api_kernel::services::password::PasswordService;
use blog_api_kernel::services::storage::{LocalDiskStorage, PUBLIC_PREFIX};
use blog_api_kernel::services::token::TokenService;
use sqlx::{Connection, Executor, PgConnection};
use tokio::net::TcpListener;
use tower_http::services::ServeDir;

pub const ACCESS_SECRET: &str = "blog-it-access-secret";
pub const RESET_SECRET: &str = "blog-it-reset-secret";
pub const FRONTEND: &str = "http://frontend.test";

/// Drops the per-test database when the test ends.
pub struct TestDbGuard {
    maintenance_url: String,
    unique_db: String,
}

impl Drop for TestDbGuard {
    fn drop(&mut self) {
        let _ = Command::new("psql")
            .arg(&self.maintenance_url)
            .arg("-c")
            .arg(format!(
                "SELECT pg_terminate_backend(pid) FROM pg_stat_activity WHERE datname = '{}' AND pid <> pg_backend_pid();",
                self.unique_db
            ))
            .status();
        let _ = Command::new("psql")
            .arg(&self.maintenance_url)
            .arg("-c")
            .arg(format!("DROP DATABASE IF EXISTS \"{}\"", self.unique_db))
            .status();
    }
}

#[derive(Default)]
pub struct CapturingMailer {
    sent: Mutex<Vec<OutgoingMail>>,
}

impl CapturingMailer {
    pub fn sent(&self) -> Vec<OutgoingMail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for CapturingMailer {
    async fn send(&self, mail: OutgoingMail) -> anyhow::Result<()> {
        self.sent.lock().unwrap().push(mail);
        Ok(())
    }
}

pub struct TestApp {
    pub base: String,
    pub pool: sqlx::PgPool,
    pub mailer: Arc<CapturingMailer>,
    pub upload_dir: tempfile::TempDir,
    pub access_tokens: TokenService,
    pub reset_tokens: TokenService,
    pub client: reqwest::Client,
    server_handle: tokio::task::JoinHandle<()>,
    _guard: TestDbGuard,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self.server_handle.abort();
    }
}

/// `None` (and a note on stderr) when `TEST_DATABASE_URL` is unset, so the suite
/// still passes on machines without PostgreSQL.
pub fn test_database_url() -> Option<String> {
    match std::env::var("TEST_DATABASE_URL") {
        Ok(url) if !url.is_empty() => Some(url),
        _ => {
            eprintln!("TEST_DATABASE_URL not set, skipping database test");
            None
        }
    }
}

pub async fn create_test_db_and_pool(test_db: &str) -> anyhow::Result<(sqlx::PgPool, TestDbGuard)> {
    let mut maintenance_url = test_db.to_string();
    if let Some(idx) = maintenance_url.rfind('/') {
        maintenance_url.replace_range(idx + 1.., "postgres");
    }
    let base_db_name = test_db
        .rsplit('/')
        .next()
        .and_then(|s| s.split('?').next())
        .unwrap_or("blog_test");
    let unique_db = format!("{}_{}", base_db_name, uuid::Uuid::new_v4().simple());
    let mut unique_db_url = test_db.to_string();
    if let Some(idx) = unique_db_url.rfind('/') {
        unique_db_url.replace_range(idx + 1.., &unique_db);
    }

    let mut conn = PgConnection::connect(&maintenance_url).await?;
    conn.execute(format!("CREATE DATABASE \"{unique_db}\"").as_str()).await?;
    conn.close().await?;

    let guard = TestDbGuard { maintenance_url, unique_db };
    let pool = db::init_db(&unique_db_url, true).await?;
    Ok((pool, guard))
}

/// Boots the full kernel on an ephemeral port against a fresh database.
pub async fn spawn_app() -> anyhow::Result<Option<TestApp>> {
    let Some(test_db) = test_database_url() else {
        return Ok(None);
    };
    let (pool, guard) = create_test_db_and_pool(&test_db).await?;

    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let base = format!("http://{addr}");

    let upload_dir = tempfile::tempdir()?;
    let storage = Arc::new(LocalDiskStorage::new(upload_dir.path(), base.clone()).await?);
    let mailer = Arc::new(CapturingMailer::default());
    let access_tokens = TokenService::new(ACCESS_SECRET, Duration::from_secs(2 * 60 * 60));
    let reset_tokens = TokenService::new(RESET_SECRET, Duration::from_secs(60 * 60));

    let auth = Arc::new(AuthService::new(
        Arc::new(PgUserRepo::new(pool.clone())),
        PasswordService::with_cost(4),
        access_tokens.clone(),
        reset_tokens.clone(),
        MailService::new(mailer.clone()),
        FRONTEND,
    ));
    let samples = Arc::new(SampleService::new(Arc::new(PgSampleRepo::new(pool.clone()))));
    let blogs = Arc::new(BlogService::new(Arc::new(PgBlogRepo::new(pool.clone())), storage));

    let plugins: Vec<Box<dyn Plugin>> = vec![
        Box::new(HealthPlugin::new(Some(pool.clone()))),
        Box::new(AuthPlugin::new(auth)),
        Box::new(SamplesPlugin::new(samples)),
        Box::new(BlogsPlugin::new(blogs, access_tokens.clone())),
    ];
    let app = build_app(&plugins, None)
        .await
        .nest_service(PUBLIC_PREFIX, ServeDir::new(upload_dir.path()));

    let server_handle = tokio::spawn(async move {
        axum::serve(listener, app).await.expect("server error");
    });

    Ok(Some(TestApp {
        base,
        pool,
        mailer,
        upload_dir,
        access_tokens,
        reset_tokens,
        client: reqwest::Client::new(),
        server_handle,
        _guard: guard,
    }))
}

/// Registers and logs in a user, returning `(user id, access token)`.
pub async fn register_and_login(app: &TestApp, name: &str, email: &str, password: &str) -> anyhow::Result<(i64, String)> {
    let resp = app
        .client
        .post(app.url("/auth/register"))
        .json(&serde_json::json!({ "name": name, "email": email, "password": password }))
        .send()
        .await?;
    anyhow::ensure!(resp.status().is_success(), "register failed: {}", resp.text().await?);

    let resp = app
        .client
        .post(app.url("/auth/login"))
        .json(&serde_json::json!({ "email": email, "password": password }))
        .send()
        .await?;
    anyhow::ensure!(resp.status().is_success(), "login failed: {}", resp.text().await?);
    let body: serde_json::Value = resp.json().await?;
    let id = body["id"].as_i64().ok_or_else(|| anyhow::anyhow!("login response without id"))?;
    let token = body["accessToken"]
        .as_str()
        .ok_or_else(|| anyhow::anyhow!("login response without accessToken"))?
        .to_string();
    Ok((id, token))
}
