//! OpenAPI documentation

use axum::Router;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{auth, books, health};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Library Catalog API",
        version = "1.0.0",
        description = "Book catalog with account login and role-based access control"
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Auth
        auth::register,
        auth::login,
        // Books
        books::list_books,
        books::get_book,
        books::search_books,
        books::create_book,
        books::update_book,
        books::delete_book,
    ),
    components(
        schemas(
            // Auth
            crate::models::account::Role,
            crate::models::account::RegisterRequest,
            crate::models::account::RegisterResponse,
            crate::models::account::LoginRequest,
            crate::models::account::LoginResponse,
            // Books
            crate::models::book::Book,
            crate::models::book::BookRequest,
            crate::models::book::BookPage,
            crate::models::book::BookCreatedResponse,
            crate::models::book::MessageResponse,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Account registration and login"),
        (name = "books", description = "Book catalog")
    )
)]
pub struct ApiDoc;

/// Declares the `bearer_auth` scheme referenced by protected paths
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
