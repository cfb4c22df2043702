//! Book model and related types

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::error::{AppError, AppResult};

/// Book as stored in the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: i32,
    pub title: String,
    pub author: String,
    pub category_id: i32,
    pub isbn: String,
    pub total_copies: i32,
    pub available_copies: i32,
}

/// Book fields written on create and update
#[derive(Debug, Clone, PartialEq)]
pub struct BookRecord {
    pub title: String,
    pub author: String,
    pub category_id: i32,
    pub isbn: String,
    pub total_copies: i32,
    pub available_copies: i32,
}

/// Create or update book request.
///
/// Every field is required; only presence is checked.
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct BookRequest {
    #[validate(required)]
    pub title: Option<String>,
    #[validate(required)]
    pub author: Option<String>,
    #[validate(required)]
    pub category_id: Option<i32>,
    #[validate(required)]
    pub isbn: Option<String>,
    #[validate(required)]
    pub total_copies: Option<i32>,
    #[validate(required)]
    pub available_copies: Option<i32>,
}

impl BookRequest {
    /// Check that every field is present and build the record to write
    pub fn into_record(self) -> AppResult<BookRecord> {
        if let Err(errors) = self.validate() {
            let mut fields: Vec<String> = errors
                .field_errors()
                .keys()
                .map(|field| field.to_string())
                .collect();
            fields.sort();
            return Err(AppError::Validation(format!(
                "Missing required field: {}",
                fields.join(", ")
            )));
        }

        match self {
            BookRequest {
                title: Some(title),
                author: Some(author),
                category_id: Some(category_id),
                isbn: Some(isbn),
                total_copies: Some(total_copies),
                available_copies: Some(available_copies),
            } => Ok(BookRecord {
                title,
                author,
                category_id,
                isbn,
                total_copies,
                available_copies,
            }),
            _ => Err(AppError::Validation("Missing required field".to_string())),
        }
    }
}

/// Pagination parameters for the book list
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct BookListQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Free-text search parameters
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct BookSearchQuery {
    /// Matched against title, author and ISBN
    pub q: Option<String>,
}

/// Page of books
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BookPage {
    pub items: Vec<Book>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BookCreatedResponse {
    pub message: String,
    pub book_id: i32,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}
