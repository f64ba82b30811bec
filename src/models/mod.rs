//! Data models for the book server

pub mod book;
pub mod pagination;

pub use book::{Book, BookChanges, BookRecord, CreateBook, NewBook, Patch, UpdateBook};
pub use pagination::{BookPage, PageQuery, PageRequest};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Plain message response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    #[schema(example = "Operation completed successfully")]
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
