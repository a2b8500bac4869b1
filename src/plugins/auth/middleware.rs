use async_trait::async_trait;
use axum::extract::{FromRequestParts, Request, State};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::Response;

use crate::http_error::AppError;
use crate::services::token::TokenService;

/// Identity attached to the request by [`require_auth`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AuthUser {
    pub id: i64,
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .copied()
            .ok_or_else(|| AppError::unauthorized("Authentication token missing"))
    }
}

/// Verifies the bearer token with the given [`TokenService`] and stores the resolved
/// [`AuthUser`] in the request extensions. Layer with `from_fn_with_state`, passing the
/// access or reset token service depending on the route.
pub async fn require_auth(State(tokens): State<TokenService>, mut req: Request, next: Next) -> Result<Response, AppError> {
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::unauthorized("Authentication token missing"))?;

    let token = header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::unauthorized("Authentication token missing"))?;

    let id = tokens.verify_token(token).map_err(|e| {
        tracing::debug!("rejected bearer token: {e}");
        AppError::unauthorized("Invalid token")
    })?;

    req.extensions_mut().insert(AuthUser { id });
    Ok(next.run(req).await)
}
