use std::sync::Arc;

use async_trait::async_trait;
use axum::{middleware, routing::{patch, post}, Extension, Router};

use crate::kernel::Plugin;
use crate::plugins::auth::handlers;
use crate::plugins::auth::middleware::require_auth;
use crate::plugins::auth::service::AuthService;

pub struct AuthPlugin {
    service: Arc<AuthService>,
}

impl AuthPlugin {
    pub fn new(service: Arc<AuthService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl Plugin for AuthPlugin {
    async fn router(&self) -> Router {
        let public = Router::new()
            .route("/register", post(handlers::register))
            .route("/login", post(handlers::login))
            .route("/forgot-password", post(handlers::forgot_password));

        // gated by the reset-password token, not the access token
        let reset = Router::new()
            .route("/reset-password", patch(handlers::reset_password))
            .route_layer(middleware::from_fn_with_state(self.service.reset_tokens().clone(), require_auth));

        public.merge(reset).layer(Extension(self.service.clone()))
    }

    fn name(&self) -> &'static str {
        "auth"
    }
}
