use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::{middleware, routing::{get, post}, Extension, Router};

use crate::kernel::Plugin;
use crate::plugins::auth::require_auth;
use crate::plugins::blogs::form::MAX_THUMBNAIL_BYTES;
use crate::plugins::blogs::handlers::*;
use crate::plugins::blogs::service::BlogService;
use crate::services::token::TokenService;

pub struct BlogsPlugin {
    service: Arc<BlogService>,
    access_tokens: TokenService,
}

impl BlogsPlugin {
    pub fn new(service: Arc<BlogService>, access_tokens: TokenService) -> Self {
        Self { service, access_tokens }
    }
}

#[async_trait::async_trait]
impl Plugin for BlogsPlugin {
    async fn router(&self) -> Router {
        // `/:slug` is a slug for GET and a numeric id for PATCH/DELETE; axum
        // requires one parameter name per segment
        let public = Router::new()
            .route("/", get(list_blogs))
            .route("/:slug", get(get_blog_by_slug));

        let protected = Router::new()
            .route("/", post(create_blog))
            .route("/me", get(list_my_blogs))
            .route("/:slug", axum::routing::patch(update_blog).delete(delete_blog))
            .route_layer(middleware::from_fn_with_state(self.access_tokens.clone(), require_auth));

        public
            .merge(protected)
            // room for the thumbnail plus the text fields
            .layer(DefaultBodyLimit::max(MAX_THUMBNAIL_BYTES + 64 * 1024))
            .layer(Extension(self.service.clone()))
    }

    fn name(&self) -> &'static str {
        "blogs"
    }
}
