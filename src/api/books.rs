//! Book (catalog) endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    auth::Identity,
    error::AppResult,
    models::book::{
        Book, BookCreatedResponse, BookListQuery, BookPage, BookRequest, BookSearchQuery,
        MessageResponse,
    },
    AppState,
};

/// List books with pagination
#[utoipa::path(
    get,
    path = "/api/books",
    tag = "books",
    params(BookListQuery),
    responses(
        (status = 200, description = "Page of books", body = BookPage)
    )
)]
pub async fn list_books(
    State(state): State<AppState>,
    Query(query): Query<BookListQuery>,
) -> AppResult<Json<BookPage>> {
    let page = state.services.catalog.list_books(&query).await?;
    Ok(Json(page))
}

/// Get book details by ID
#[utoipa::path(
    get,
    path = "/api/books/{id}",
    tag = "books",
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Book details", body = Book),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_book(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<Book>> {
    let book = state.services.catalog.get_book(id).await?;
    Ok(Json(book))
}

/// Search books by title, author or ISBN
#[utoipa::path(
    get,
    path = "/api/books/search",
    tag = "books",
    params(BookSearchQuery),
    responses(
        (status = 200, description = "Matching books", body = Vec<Book>),
        (status = 400, description = "Missing search term", body = crate::error::ErrorResponse)
    )
)]
pub async fn search_books(
    State(state): State<AppState>,
    Query(query): Query<BookSearchQuery>,
) -> AppResult<Json<Vec<Book>>> {
    let books = state.services.catalog.search_books(&query).await?;
    Ok(Json(books))
}

/// Create a new book
#[utoipa::path(
    post,
    path = "/api/books",
    tag = "books",
    security(("bearer_auth" = [])),
    request_body = BookRequest,
    responses(
        (status = 201, description = "Book created", body = BookCreatedResponse),
        (status = 400, description = "A required field is missing", body = crate::error::ErrorResponse),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse),
        (status = 409, description = "Duplicate ISBN or unknown category", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_book(
    State(state): State<AppState>,
    identity: Option<Identity>,
    Json(request): Json<BookRequest>,
) -> AppResult<(StatusCode, Json<BookCreatedResponse>)> {
    let book_id = state.services.catalog.create_book(request).await?;

    tracing::info!(
        book_id,
        account_id = identity.map(|i| i.account_id),
        "Book created"
    );

    Ok((
        StatusCode::CREATED,
        Json(BookCreatedResponse {
            message: "Book created successfully".to_string(),
            book_id,
        }),
    ))
}

/// Update an existing book
#[utoipa::path(
    put,
    path = "/api/books/{id}",
    tag = "books",
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    request_body = BookRequest,
    responses(
        (status = 200, description = "Book updated", body = MessageResponse),
        (status = 400, description = "A required field is missing", body = crate::error::ErrorResponse),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Duplicate ISBN or unknown category", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_book(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(request): Json<BookRequest>,
) -> AppResult<Json<MessageResponse>> {
    state.services.catalog.update_book(id, request).await?;

    Ok(Json(MessageResponse {
        message: "Book updated successfully".to_string(),
    }))
}

/// Delete a book
#[utoipa::path(
    delete,
    path = "/api/books/{id}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Book deleted", body = MessageResponse),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse),
        (status = 403, description = "Librarian role required", body = crate::error::ErrorResponse),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_book(
    State(state): State<AppState>,
    identity: Option<Identity>,
    Path(id): Path<i32>,
) -> AppResult<Json<MessageResponse>> {
    state.services.catalog.delete_book(id).await?;

    tracing::info!(
        book_id = id,
        account_id = identity.map(|i| i.account_id),
        "Book deleted"
    );

    Ok(Json(MessageResponse {
        message: "Book deleted successfully".to_string(),
    }))
}
