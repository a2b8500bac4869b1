//! In-memory stand-ins for the repos and external services, used by the router and
//! service tests.
#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{Method, Request, Response};
use chrono::Utc;

use crate::http_error::AppError;
use crate::plugins::auth::models::{UserDto, UserRecord};
use crate::plugins::auth::repo::UserRepo;
use crate::plugins::auth::AuthService;
use crate::plugins::blogs::models::{BlogChanges, BlogDto, BlogFilter, BlogWithUser, NewBlog, SortBy, SortOrder};
use crate::plugins::blogs::repo::BlogRepo;
use crate::plugins::samples::models::SampleDto;
use crate::plugins::samples::repo::SampleRepo;
use crate::services::mail::{MailService, Mailer, OutgoingMail};
use crate::services::password::PasswordService;
use crate::services::storage::{ObjectStorage, UploadedFile};
use crate::services::token::TokenService;

pub const ACCESS_SECRET: &str = "test-access-secret";
pub const RESET_SECRET: &str = "test-reset-secret";

pub fn access_tokens() -> TokenService {
    TokenService::new(ACCESS_SECRET, Duration::from_secs(2 * 60 * 60))
}

pub fn reset_tokens() -> TokenService {
    TokenService::new(RESET_SECRET, Duration::from_secs(60 * 60))
}

/// bcrypt at its minimum cost keeps the tests fast.
pub fn fast_passwords() -> PasswordService {
    PasswordService::with_cost(4)
}

pub fn auth_service(users: Arc<InMemoryUserRepo>, mailer: Arc<RecordingMailer>) -> AuthService {
    AuthService::new(
        users,
        fast_passwords(),
        access_tokens(),
        reset_tokens(),
        MailService::new(mailer),
        "http://frontend.test",
    )
}

pub fn json_request(method: Method, uri: &str, body: serde_json::Value, bearer: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri).header(CONTENT_TYPE, "application/json");
    if let Some(token) = bearer {
        builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn empty_request(method: Method, uri: &str, bearer: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = bearer {
        builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

pub async fn body_json(resp: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[derive(Default)]
pub struct InMemoryUserRepo {
    users: Mutex<Vec<UserRecord>>,
    next_id: AtomicI64,
}

impl InMemoryUserRepo {
    /// Inserts a user directly, hashing `password` at test cost.
    pub async fn seed(&self, name: &str, email: &str, password: &str) -> UserDto {
        let hashed = fast_passwords().hash_password(password).await.unwrap();
        self.insert(name, email, &hashed).await.unwrap()
    }

    pub fn password_hash(&self, id: i64) -> Option<String> {
        self.users.lock().unwrap().iter().find(|u| u.id == id).map(|u| u.password.clone())
    }

    pub fn remove(&self, id: i64) {
        self.users.lock().unwrap().retain(|u| u.id != id);
    }
}

#[async_trait]
impl UserRepo for InMemoryUserRepo {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, AppError> {
        Ok(self.users.lock().unwrap().iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<UserRecord>, AppError> {
        Ok(self.users.lock().unwrap().iter().find(|u| u.id == id).cloned())
    }

    async fn insert(&self, name: &str, email: &str, password_hash: &str) -> Result<UserDto, AppError> {
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.email == email) {
            return Err(AppError::bad_request("Email already exist"));
        }
        let now = Utc::now();
        let record = UserRecord {
            id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
            email: email.to_string(),
            name: name.to_string(),
            password: password_hash.to_string(),
            created_at: now,
            updated_at: now,
        };
        users.push(record.clone());
        Ok(record.into_dto())
    }

    async fn update_password(&self, id: i64, password_hash: &str) -> Result<(), AppError> {
        let mut users = self.users.lock().unwrap();
        let user = users.iter_mut().find(|u| u.id == id).ok_or_else(|| AppError::not_found("Not found"))?;
        user.password = password_hash.to_string();
        user.updated_at = Utc::now();
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemorySampleRepo {
    rows: Mutex<Vec<SampleDto>>,
    next_id: AtomicI64,
}

#[async_trait]
impl SampleRepo for InMemorySampleRepo {
    async fn list(&self) -> Result<Vec<SampleDto>, AppError> {
        Ok(self.rows.lock().unwrap().clone())
    }

    async fn find(&self, id: i64) -> Result<Option<SampleDto>, AppError> {
        Ok(self.rows.lock().unwrap().iter().find(|s| s.id == id).cloned())
    }

    async fn insert(&self, name: &str) -> Result<SampleDto, AppError> {
        let now = Utc::now();
        let row = SampleDto {
            id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
            name: name.to_string(),
            created_at: now,
            updated_at: now,
        };
        self.rows.lock().unwrap().push(row.clone());
        Ok(row)
    }

    async fn update(&self, id: i64, name: Option<&str>) -> Result<SampleDto, AppError> {
        let mut rows = self.rows.lock().unwrap();
        let row = rows.iter_mut().find(|s| s.id == id).ok_or_else(|| AppError::not_found("Not found"))?;
        if let Some(name) = name {
            row.name = name.to_string();
        }
        row.updated_at = Utc::now();
        Ok(row.clone())
    }

    async fn delete(&self, id: i64) -> Result<(), AppError> {
        self.rows.lock().unwrap().retain(|s| s.id != id);
        Ok(())
    }
}

pub struct InMemoryBlogRepo {
    blogs: Mutex<Vec<BlogDto>>,
    users: Arc<InMemoryUserRepo>,
    next_id: AtomicI64,
    reject_writes: AtomicBool,
}

impl InMemoryBlogRepo {
    pub fn new(users: Arc<InMemoryUserRepo>) -> Self {
        Self {
            blogs: Mutex::new(Vec::new()),
            users,
            next_id: AtomicI64::new(0),
            reject_writes: AtomicBool::new(false),
        }
    }

    /// Makes `insert` and `update` fail the way a lost race on the live-title index does.
    pub fn fail_writes(&self, reject: bool) {
        self.reject_writes.store(reject, Ordering::SeqCst);
    }

    fn check_write(&self) -> Result<(), AppError> {
        if self.reject_writes.load(Ordering::SeqCst) {
            return Err(AppError::bad_request("Title already used"));
        }
        Ok(())
    }

    fn join(&self, blog: BlogDto) -> BlogWithUser {
        let user = self
            .users
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.id == blog.user_id)
            .cloned()
            .expect("blog owner exists")
            .into_dto();
        BlogWithUser { blog, user }
    }
}

#[async_trait]
impl BlogRepo for InMemoryBlogRepo {
    async fn list(&self, filter: &BlogFilter) -> Result<(Vec<BlogWithUser>, i64), AppError> {
        let needle = filter.search.as_ref().map(|s| s.to_lowercase());
        let mut matching: Vec<BlogDto> = self
            .blogs
            .lock()
            .unwrap()
            .iter()
            .filter(|b| b.deleted_at.is_none())
            .filter(|b| filter.owner.map_or(true, |o| b.user_id == o))
            .filter(|b| needle.as_ref().map_or(true, |n| b.title.to_lowercase().contains(n)))
            .cloned()
            .collect();

        matching.sort_by(|a, b| {
            let ord = match filter.sort_by {
                SortBy::Id => a.id.cmp(&b.id),
                SortBy::Title => a.title.cmp(&b.title),
                SortBy::CreatedAt => a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)),
                SortBy::UpdatedAt => a.updated_at.cmp(&b.updated_at).then(a.id.cmp(&b.id)),
            };
            match filter.sort_order {
                SortOrder::Asc => ord,
                SortOrder::Desc => ord.reverse(),
            }
        });

        let total = matching.len() as i64;
        let page = matching
            .into_iter()
            .skip(filter.offset() as usize)
            .take(filter.take as usize)
            .map(|b| self.join(b))
            .collect();
        Ok((page, total))
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<BlogWithUser>, AppError> {
        let blog = self
            .blogs
            .lock()
            .unwrap()
            .iter()
            .find(|b| b.slug == slug && b.deleted_at.is_none())
            .cloned();
        Ok(blog.map(|b| self.join(b)))
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<BlogDto>, AppError> {
        Ok(self.blogs.lock().unwrap().iter().find(|b| b.id == id).cloned())
    }

    async fn title_taken(&self, title: &str, exclude_id: Option<i64>) -> Result<bool, AppError> {
        Ok(self
            .blogs
            .lock()
            .unwrap()
            .iter()
            .any(|b| b.title == title && b.deleted_at.is_none() && Some(b.id) != exclude_id))
    }

    async fn insert(&self, blog: NewBlog) -> Result<BlogDto, AppError> {
        self.check_write()?;
        let now = Utc::now();
        let dto = BlogDto {
            id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
            title: blog.title,
            slug: blog.slug,
            description: blog.description,
            content: blog.content,
            category: blog.category,
            thumbnail: blog.thumbnail,
            user_id: blog.user_id,
            deleted_at: None,
            created_at: now,
            updated_at: now,
        };
        self.blogs.lock().unwrap().push(dto.clone());
        Ok(dto)
    }

    async fn update(&self, id: i64, changes: BlogChanges) -> Result<BlogDto, AppError> {
        self.check_write()?;
        let mut blogs = self.blogs.lock().unwrap();
        let blog = blogs.iter_mut().find(|b| b.id == id).ok_or_else(|| AppError::not_found("Not found"))?;
        if let Some(v) = changes.title {
            blog.title = v;
        }
        if let Some(v) = changes.slug {
            blog.slug = v;
        }
        if let Some(v) = changes.description {
            blog.description = v;
        }
        if let Some(v) = changes.content {
            blog.content = v;
        }
        if let Some(v) = changes.category {
            blog.category = v;
        }
        if let Some(v) = changes.thumbnail {
            blog.thumbnail = v;
        }
        blog.updated_at = Utc::now();
        Ok(blog.clone())
    }

    async fn soft_delete(&self, id: i64) -> Result<(), AppError> {
        let mut blogs = self.blogs.lock().unwrap();
        if let Some(blog) = blogs.iter_mut().find(|b| b.id == id) {
            blog.thumbnail.clear();
            blog.deleted_at = Some(Utc::now());
        }
        Ok(())
    }
}

/// Records uploads and removals; URLs look like `mem://uploads/{n}-{file_name}`.
#[derive(Default)]
pub struct InMemoryStorage {
    stored: Mutex<Vec<String>>,
    removed: Mutex<Vec<String>>,
    counter: AtomicI64,
}

impl InMemoryStorage {
    pub fn stored(&self) -> Vec<String> {
        self.stored.lock().unwrap().clone()
    }

    pub fn removed(&self) -> Vec<String> {
        self.removed.lock().unwrap().clone()
    }
}

#[async_trait]
impl ObjectStorage for InMemoryStorage {
    async fn upload(&self, file: &UploadedFile) -> anyhow::Result<String> {
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        let url = format!("mem://uploads/{n}-{}", file.file_name);
        self.stored.lock().unwrap().push(url.clone());
        Ok(url)
    }

    async fn remove(&self, url: &str) -> anyhow::Result<()> {
        if url.is_empty() {
            return Ok(());
        }
        self.stored.lock().unwrap().retain(|u| u != url);
        self.removed.lock().unwrap().push(url.to_string());
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<OutgoingMail>>,
}

impl RecordingMailer {
    pub fn sent(&self) -> Vec<OutgoingMail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, mail: OutgoingMail) -> anyhow::Result<()> {
        self.sent.lock().unwrap().push(mail);
        Ok(())
    }
}

/// Mailer whose relay is always down.
pub struct FailingMailer;

#[async_trait]
impl Mailer for FailingMailer {
    async fn send(&self, _mail: OutgoingMail) -> anyhow::Result<()> {
        anyhow::bail!("connection refused")
    }
}
