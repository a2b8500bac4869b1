use std::sync::Arc;

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use crate::http_error::AppError;
use crate::plugins::auth::models::UserDto;
use crate::plugins::blogs::models::{BlogChanges, BlogDto, BlogFilter, BlogWithUser, NewBlog};

#[async_trait]
pub trait BlogRepo: Send + Sync {
    /// Live blogs matching `filter`, plus the total match count ignoring paging.
    async fn list(&self, filter: &BlogFilter) -> Result<(Vec<BlogWithUser>, i64), AppError>;
    /// Live blog with this slug.
    async fn find_by_slug(&self, slug: &str) -> Result<Option<BlogWithUser>, AppError>;
    /// Any blog with this id, soft-deleted included.
    async fn find_by_id(&self, id: i64) -> Result<Option<BlogDto>, AppError>;
    /// Whether a live blog other than `exclude_id` already uses `title`.
    async fn title_taken(&self, title: &str, exclude_id: Option<i64>) -> Result<bool, AppError>;
    async fn insert(&self, blog: NewBlog) -> Result<BlogDto, AppError>;
    async fn update(&self, id: i64, changes: BlogChanges) -> Result<BlogDto, AppError>;
    /// Sets `deleted_at` and clears the thumbnail reference.
    async fn soft_delete(&self, id: i64) -> Result<(), AppError>;
}

pub type DynBlogRepo = Arc<dyn BlogRepo>;

const BLOG_COLUMNS: &str =
    "id, title, slug, description, content, category, thumbnail, user_id, deleted_at, created_at, updated_at";

const BLOG_WITH_USER_SELECT: &str = "SELECT b.id, b.title, b.slug, b.description, b.content, b.category, b.thumbnail, \
     b.user_id, b.deleted_at, b.created_at, b.updated_at, \
     u.email AS user_email, u.name AS user_name, u.created_at AS user_created_at, u.updated_at AS user_updated_at \
     FROM blogs b JOIN users u ON u.id = b.user_id";

fn blog_with_user(r: &PgRow) -> Result<BlogWithUser, sqlx::Error> {
    let user_id: i64 = r.try_get("user_id")?;
    Ok(BlogWithUser {
        blog: BlogDto {
            id: r.try_get("id")?,
            title: r.try_get("title")?,
            slug: r.try_get("slug")?,
            description: r.try_get("description")?,
            content: r.try_get("content")?,
            category: r.try_get("category")?,
            thumbnail: r.try_get("thumbnail")?,
            user_id,
            deleted_at: r.try_get("deleted_at")?,
            created_at: r.try_get("created_at")?,
            updated_at: r.try_get("updated_at")?,
        },
        user: UserDto {
            id: user_id,
            email: r.try_get("user_email")?,
            name: r.try_get("user_name")?,
            created_at: r.try_get("user_created_at")?,
            updated_at: r.try_get("user_updated_at")?,
        },
    })
}

/// `%`, `_` and `\` are literal in a title search.
fn like_pattern(search: &str) -> String {
    let mut escaped = String::with_capacity(search.len() + 2);
    escaped.push('%');
    for c in search.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

#[derive(Clone)]
pub struct PgBlogRepo {
    pool: PgPool,
}

impl PgBlogRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BlogRepo for PgBlogRepo {
    async fn list(&self, filter: &BlogFilter) -> Result<(Vec<BlogWithUser>, i64), AppError> {
        enum Param {
            Int(i64),
            Str(String),
        }
        let mut where_clauses: Vec<String> = vec!["b.deleted_at IS NULL".to_string()];
        let mut params: Vec<Param> = Vec::new();
        if let Some(owner) = filter.owner {
            params.push(Param::Int(owner));
            where_clauses.push(format!("b.user_id = ${}", params.len()));
        }
        if let Some(search) = &filter.search {
            params.push(Param::Str(like_pattern(search)));
            where_clauses.push(format!("b.title ILIKE ${}", params.len()));
        }
        let where_sql = where_clauses.join(" AND ");

        // column and direction come from closed enums, never from raw input
        let items_sql = format!(
            "{BLOG_WITH_USER_SELECT} WHERE {where_sql} ORDER BY b.{col} {dir}, b.id {dir} LIMIT ${} OFFSET ${}",
            params.len() + 1,
            params.len() + 2,
            col = filter.sort_by.column(),
            dir = filter.sort_order.sql(),
        );
        let mut items_q = sqlx::query(&items_sql);
        for p in &params {
            items_q = match p {
                Param::Int(i) => items_q.bind(*i),
                Param::Str(s) => items_q.bind(s.clone()),
            };
        }
        let rows = items_q
            .bind(i64::from(filter.take))
            .bind(filter.offset())
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::from)?;
        let items = rows.iter().map(blog_with_user).collect::<Result<Vec<_>, _>>().map_err(AppError::from)?;

        let count_sql = format!("SELECT COUNT(*) FROM blogs b WHERE {where_sql}");
        let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
        for p in &params {
            count_q = match p {
                Param::Int(i) => count_q.bind(*i),
                Param::Str(s) => count_q.bind(s.clone()),
            };
        }
        let total = count_q.fetch_one(&self.pool).await.map_err(AppError::from)?;

        Ok((items, total))
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<BlogWithUser>, AppError> {
        let row = sqlx::query(&format!(
            "{BLOG_WITH_USER_SELECT} WHERE b.slug = $1 AND b.deleted_at IS NULL ORDER BY b.id LIMIT 1"
        ))
        .bind(slug)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;
        row.as_ref().map(blog_with_user).transpose().map_err(AppError::from)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<BlogDto>, AppError> {
        let blog = sqlx::query_as::<_, BlogDto>(&format!("SELECT {BLOG_COLUMNS} FROM blogs WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::from)?;
        Ok(blog)
    }

    async fn title_taken(&self, title: &str, exclude_id: Option<i64>) -> Result<bool, AppError> {
        let taken: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM blogs WHERE title = $1 AND deleted_at IS NULL AND ($2::BIGINT IS NULL OR id <> $2))",
        )
        .bind(title)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(taken)
    }

    async fn insert(&self, blog: NewBlog) -> Result<BlogDto, AppError> {
        let dto = sqlx::query_as::<_, BlogDto>(&format!(
            "INSERT INTO blogs (title, slug, description, content, category, thumbnail, user_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {BLOG_COLUMNS}"
        ))
        .bind(blog.title)
        .bind(blog.slug)
        .bind(blog.description)
        .bind(blog.content)
        .bind(blog.category)
        .bind(blog.thumbnail)
        .bind(blog.user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(dto)
    }

    async fn update(&self, id: i64, changes: BlogChanges) -> Result<BlogDto, AppError> {
        let dto = sqlx::query_as::<_, BlogDto>(&format!(
            "UPDATE blogs SET title = COALESCE($1, title), slug = COALESCE($2, slug), \
             description = COALESCE($3, description), content = COALESCE($4, content), \
             category = COALESCE($5, category), thumbnail = COALESCE($6, thumbnail), updated_at = now() \
             WHERE id = $7 RETURNING {BLOG_COLUMNS}"
        ))
        .bind(changes.title)
        .bind(changes.slug)
        .bind(changes.description)
        .bind(changes.content)
        .bind(changes.category)
        .bind(changes.thumbnail)
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(dto)
    }

    async fn soft_delete(&self, id: i64) -> Result<(), AppError> {
        sqlx::query("UPDATE blogs SET thumbnail = '', deleted_at = now(), updated_at = now() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(AppError::from)?;
        Ok(())
    }
}
