use crate::http_error::AppError;
use crate::plugins::samples::models::{CreateSampleRequest, SampleDto, UpdateSampleRequest};
use crate::plugins::samples::repo::DynSampleRepo;
use crate::plugins::shared::MessageResponse;

pub struct SampleService {
    samples: DynSampleRepo,
}

impl SampleService {
    pub fn new(samples: DynSampleRepo) -> Self {
        Self { samples }
    }

    async fn find_sample_or_throw(&self, id: i64) -> Result<SampleDto, AppError> {
        self.samples
            .find(id)
            .await?
            .ok_or_else(|| AppError::not_found("Sample Not Found"))
    }

    pub async fn get_samples(&self) -> Result<Vec<SampleDto>, AppError> {
        self.samples.list().await
    }

    pub async fn get_sample(&self, id: i64) -> Result<SampleDto, AppError> {
        self.find_sample_or_throw(id).await
    }

    pub async fn create_sample(&self, body: CreateSampleRequest) -> Result<SampleDto, AppError> {
        self.samples.insert(&body.name).await
    }

    pub async fn update_sample(&self, id: i64, body: UpdateSampleRequest) -> Result<SampleDto, AppError> {
        self.find_sample_or_throw(id).await?;
        self.samples.update(id, body.name.as_deref()).await
    }

    pub async fn delete_sample(&self, id: i64) -> Result<MessageResponse, AppError> {
        self.find_sample_or_throw(id).await?;
        self.samples.delete(id).await?;
        Ok(MessageResponse::new("Delete sample success"))
    }
}
