use std::sync::Arc;

use axum::{Extension, Json};

use crate::http_error::AppError;
use crate::plugins::auth::AuthUser;
use crate::plugins::blogs::models::{BlogDto, BlogForm, BlogWithUser, CreateBlogInput, GetBlogsQuery, UpdateBlogInput};
use crate::plugins::blogs::service::BlogService;
use crate::plugins::shared::{MessageResponse, Paginated};
use crate::validation::{PathParam, Validate, ValidatedQuery};

pub async fn list_blogs(
    Extension(svc): Extension<Arc<BlogService>>,
    ValidatedQuery(query): ValidatedQuery<GetBlogsQuery>,
) -> Result<Json<Paginated<BlogWithUser>>, AppError> {
    Ok(Json(svc.get_blogs(query).await?))
}

pub async fn list_my_blogs(
    Extension(svc): Extension<Arc<BlogService>>,
    auth: AuthUser,
    ValidatedQuery(query): ValidatedQuery<GetBlogsQuery>,
) -> Result<Json<Paginated<BlogWithUser>>, AppError> {
    Ok(Json(svc.get_blogs_by_user_id(auth.id, query).await?))
}

pub async fn get_blog_by_slug(
    Extension(svc): Extension<Arc<BlogService>>,
    PathParam(slug): PathParam<String>,
) -> Result<Json<BlogWithUser>, AppError> {
    Ok(Json(svc.get_blog_by_slug(&slug).await?))
}

pub async fn create_blog(
    Extension(svc): Extension<Arc<BlogService>>,
    auth: AuthUser,
    form: BlogForm,
) -> Result<Json<BlogDto>, AppError> {
    let body = CreateBlogInput {
        title: form.title.unwrap_or_default(),
        description: form.description.unwrap_or_default(),
        content: form.content.unwrap_or_default(),
        category: form.category.unwrap_or_default(),
    };
    body.validate()?;
    let thumbnail = form.thumbnail.ok_or_else(|| AppError::bad_request("Thumbnail is required"))?;
    Ok(Json(svc.create_blog(body, thumbnail, auth.id).await?))
}

pub async fn update_blog(
    Extension(svc): Extension<Arc<BlogService>>,
    auth: AuthUser,
    PathParam(id): PathParam<i64>,
    form: BlogForm,
) -> Result<Json<BlogDto>, AppError> {
    let body = UpdateBlogInput {
        title: form.title,
        description: form.description,
        content: form.content,
        category: form.category,
    };
    body.validate()?;
    Ok(Json(svc.update_blog(id, body, auth.id, form.thumbnail).await?))
}

pub async fn delete_blog(
    Extension(svc): Extension<Arc<BlogService>>,
    auth: AuthUser,
    PathParam(id): PathParam<i64>,
) -> Result<Json<MessageResponse>, AppError> {
    Ok(Json(svc.delete_blog(id, auth.id).await?))
}
