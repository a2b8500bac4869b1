use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PageMeta {
    pub page: u32,
    pub take: u32,
    pub total: i64,
}

/// One page of a listing plus the paging metadata.
#[derive(Serialize, Deserialize, Debug)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub meta: PageMeta,
}

/// Generic acknowledgement body, e.g. `{"message": "Delete blog success"}`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}
