use std::sync::Arc;

use axum::{routing::get, Extension, Router};

use crate::kernel::Plugin;
use crate::plugins::samples::handlers::*;
use crate::plugins::samples::service::SampleService;

pub struct SamplesPlugin {
    service: Arc<SampleService>,
}

impl SamplesPlugin {
    pub fn new(service: Arc<SampleService>) -> Self {
        Self { service }
    }
}

#[async_trait::async_trait]
impl Plugin for SamplesPlugin {
    async fn router(&self) -> Router {
        Router::new()
            .route("/", get(list_samples).post(create_sample))
            .route("/:id", get(get_sample).patch(update_sample).delete(delete_sample))
            .layer(Extension(self.service.clone()))
    }

    fn name(&self) -> &'static str {
        "samples"
    }
}
