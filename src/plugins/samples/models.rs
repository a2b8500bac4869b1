use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::validation::{not_empty, not_empty_if_present, FieldError, Validate};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SampleDto {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateSampleRequest {
    pub name: String,
}

impl Validate for CreateSampleRequest {
    fn validate(&self) -> Result<(), FieldError> {
        not_empty("name", &self.name)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateSampleRequest {
    pub name: Option<String>,
}

impl Validate for UpdateSampleRequest {
    fn validate(&self) -> Result<(), FieldError> {
        not_empty_if_present("name", self.name.as_deref())
    }
}
