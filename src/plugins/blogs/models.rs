use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::plugins::auth::models::UserDto;
use crate::services::storage::UploadedFile;
use crate::validation::{not_empty, not_empty_if_present, FieldError, Validate};

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_TAKE: u32 = 10;
pub const MAX_TAKE: u32 = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct BlogDto {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub content: String,
    pub category: String,
    pub thumbnail: String,
    pub user_id: i64,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A blog joined with its owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlogWithUser {
    #[serde(flatten)]
    pub blog: BlogDto,
    pub user: UserDto,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortBy {
    Id,
    Title,
    #[default]
    CreatedAt,
    UpdatedAt,
}

impl SortBy {
    pub fn column(self) -> &'static str {
        match self {
            SortBy::Id => "id",
            SortBy::Title => "title",
            SortBy::CreatedAt => "created_at",
            SortBy::UpdatedAt => "updated_at",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn sql(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetBlogsQuery {
    pub page: Option<u32>,
    pub take: Option<u32>,
    pub sort_by: Option<SortBy>,
    pub sort_order: Option<SortOrder>,
    pub search: Option<String>,
}

impl Validate for GetBlogsQuery {
    fn validate(&self) -> Result<(), FieldError> {
        if self.page == Some(0) {
            return Err(FieldError::new("page", "page must not be less than 1"));
        }
        if let Some(take) = self.take {
            if take == 0 || take > MAX_TAKE {
                return Err(FieldError::new("take", format!("take must be between 1 and {MAX_TAKE}")));
            }
        }
        Ok(())
    }
}

/// Resolved listing options, defaults applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlogFilter {
    pub owner: Option<i64>,
    pub search: Option<String>,
    pub sort_by: SortBy,
    pub sort_order: SortOrder,
    pub page: u32,
    pub take: u32,
}

impl BlogFilter {
    pub fn from_query(query: GetBlogsQuery, owner: Option<i64>) -> Self {
        Self {
            owner,
            search: query.search.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()),
            sort_by: query.sort_by.unwrap_or_default(),
            sort_order: query.sort_order.unwrap_or_default(),
            page: query.page.unwrap_or(DEFAULT_PAGE).max(1),
            take: query.take.unwrap_or(DEFAULT_TAKE).clamp(1, MAX_TAKE),
        }
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.take)
    }
}

/// Text fields of a create request.
#[derive(Debug, Clone)]
pub struct CreateBlogInput {
    pub title: String,
    pub description: String,
    pub content: String,
    pub category: String,
}

impl Validate for CreateBlogInput {
    fn validate(&self) -> Result<(), FieldError> {
        not_empty("title", &self.title)?;
        not_empty("description", &self.description)?;
        not_empty("content", &self.content)?;
        not_empty("category", &self.category)
    }
}

/// Text fields of an update request; `None` leaves the column as is.
#[derive(Debug, Clone, Default)]
pub struct UpdateBlogInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub content: Option<String>,
    pub category: Option<String>,
}

impl Validate for UpdateBlogInput {
    fn validate(&self) -> Result<(), FieldError> {
        not_empty_if_present("title", self.title.as_deref())?;
        not_empty_if_present("description", self.description.as_deref())?;
        not_empty_if_present("content", self.content.as_deref())?;
        not_empty_if_present("category", self.category.as_deref())
    }
}

/// Row to insert; slug and thumbnail URL are already resolved.
#[derive(Debug, Clone)]
pub struct NewBlog {
    pub title: String,
    pub slug: String,
    pub description: String,
    pub content: String,
    pub category: String,
    pub thumbnail: String,
    pub user_id: i64,
}

/// Column changes for an update; `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct BlogChanges {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub content: Option<String>,
    pub category: Option<String>,
    pub thumbnail: Option<String>,
}

/// Decoded multipart body shared by create and update.
#[derive(Debug, Default)]
pub struct BlogForm {
    pub title: Option<String>,
    pub description: Option<String>,
    pub content: Option<String>,
    pub category: Option<String>,
    pub thumbnail: Option<UploadedFile>,
}
