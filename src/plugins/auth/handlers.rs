use std::sync::Arc;

use axum::{Extension, Json};

use crate::http_error::AppError;
use crate::plugins::auth::middleware::AuthUser;
use crate::plugins::auth::models::{
    ForgotPasswordRequest, LoginRequest, LoginResponse, RegisterRequest, ResetPasswordRequest, UserDto,
};
use crate::plugins::auth::service::AuthService;
use crate::plugins::shared::MessageResponse;
use crate::validation::ValidatedJson;

pub async fn register(
    Extension(svc): Extension<Arc<AuthService>>,
    ValidatedJson(body): ValidatedJson<RegisterRequest>,
) -> Result<Json<UserDto>, AppError> {
    Ok(Json(svc.register(body).await?))
}

pub async fn login(
    Extension(svc): Extension<Arc<AuthService>>,
    ValidatedJson(body): ValidatedJson<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    Ok(Json(svc.login(body).await?))
}

pub async fn forgot_password(
    Extension(svc): Extension<Arc<AuthService>>,
    ValidatedJson(body): ValidatedJson<ForgotPasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    Ok(Json(svc.forgot_password(body).await?))
}

pub async fn reset_password(
    Extension(svc): Extension<Arc<AuthService>>,
    auth: AuthUser,
    ValidatedJson(body): ValidatedJson<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    Ok(Json(svc.reset_password(body, auth.id).await?))
}
