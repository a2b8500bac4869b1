use async_trait::async_trait;
use axum::extract::{FromRequest, Multipart, Request};

use crate::http_error::AppError;
use crate::plugins::blogs::models::BlogForm;
use crate::services::storage::UploadedFile;

pub const THUMBNAIL_FIELD: &str = "thumbnail";
pub const MAX_THUMBNAIL_BYTES: usize = 1024 * 1024;
pub const ALLOWED_THUMBNAIL_TYPES: [&str; 3] = ["image/jpeg", "image/avif", "image/png"];

#[async_trait]
impl<S> FromRequest<S> for BlogForm
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let mut multipart = Multipart::from_request(req, state).await?;
        let mut form = BlogForm::default();

        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                THUMBNAIL_FIELD => {
                    let content_type = field.content_type().unwrap_or_default().to_string();
                    if !ALLOWED_THUMBNAIL_TYPES.contains(&content_type.as_str()) {
                        return Err(AppError::bad_request(format!("File type {content_type:?} is not allowed")));
                    }
                    let file_name = field.file_name().unwrap_or("thumbnail").to_string();
                    let bytes = field.bytes().await?;
                    if bytes.len() > MAX_THUMBNAIL_BYTES {
                        return Err(AppError::bad_request("Thumbnail is too large"));
                    }
                    form.thumbnail = Some(UploadedFile { file_name, content_type, bytes });
                }
                "title" => form.title = Some(field.text().await?),
                "description" => form.description = Some(field.text().await?),
                "content" => form.content = Some(field.text().await?),
                "category" => form.category = Some(field.text().await?),
                other => tracing::debug!(field = other, "ignoring unknown multipart field"),
            }
        }

        Ok(form)
    }
}
