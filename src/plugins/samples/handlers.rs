use std::sync::Arc;

use axum::{Extension, Json};

use crate::http_error::AppError;
use crate::plugins::samples::models::{CreateSampleRequest, SampleDto, UpdateSampleRequest};
use crate::plugins::samples::service::SampleService;
use crate::plugins::shared::MessageResponse;
use crate::validation::{PathParam, ValidatedJson};

pub async fn list_samples(Extension(svc): Extension<Arc<SampleService>>) -> Result<Json<Vec<SampleDto>>, AppError> {
    Ok(Json(svc.get_samples().await?))
}

pub async fn get_sample(
    Extension(svc): Extension<Arc<SampleService>>,
    PathParam(id): PathParam<i64>,
) -> Result<Json<SampleDto>, AppError> {
    Ok(Json(svc.get_sample(id).await?))
}

pub async fn create_sample(
    Extension(svc): Extension<Arc<SampleService>>,
    ValidatedJson(body): ValidatedJson<CreateSampleRequest>,
) -> Result<Json<SampleDto>, AppError> {
    Ok(Json(svc.create_sample(body).await?))
}

pub async fn update_sample(
    Extension(svc): Extension<Arc<SampleService>>,
    PathParam(id): PathParam<i64>,
    ValidatedJson(body): ValidatedJson<UpdateSampleRequest>,
) -> Result<Json<SampleDto>, AppError> {
    Ok(Json(svc.update_sample(id, body).await?))
}

pub async fn delete_sample(
    Extension(svc): Extension<Arc<SampleService>>,
    PathParam(id): PathParam<i64>,
) -> Result<Json<MessageResponse>, AppError> {
    Ok(Json(svc.delete_sample(id).await?))
}
