//! API handlers and router for the catalog REST endpoints

pub mod auth;
pub mod books;
pub mod health;
pub mod openapi;

use axum::{
    middleware,
    routing::{delete, get, post, put, MethodRouter},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::{
    auth::{authenticate, authorize, Access},
    AppState,
};

/// Create the application router with all routes
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let policy = state.config.policy.clone();

    let api = Router::new()
        // Accounts
        .route("/user/register", post(auth::register))
        .route("/user/login", post(auth::login))
        // Books
        .route("/books", guarded(get(books::list_books), &policy.list_books, &state))
        .route("/books", guarded(post(books::create_book), &policy.create_book, &state))
        .route(
            "/books/search",
            guarded(get(books::search_books), &policy.search_books, &state),
        )
        .route("/books/:id", guarded(get(books::get_book), &policy.get_book, &state))
        .route("/books/:id", guarded(put(books::update_book), &policy.update_book, &state))
        .route(
            "/books/:id",
            guarded(delete(books::delete_book), &policy.delete_book, &state),
        );

    let app = Router::new()
        .route("/", get(health::welcome))
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        .nest("/api", api)
        .with_state(state);

    app.merge(openapi::create_openapi_router())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
}

/// Put the middleware stages required by `access` in front of `route`.
///
/// The role stage is only ever installed behind the identity stage.
fn guarded(
    route: MethodRouter<AppState>,
    access: &Access,
    state: &AppState,
) -> MethodRouter<AppState> {
    match access {
        Access::Public => route,
        Access::Authenticated => {
            route.route_layer(middleware::from_fn_with_state(state.clone(), authenticate))
        }
        // Layers wrap outward, so `authenticate` runs first.
        Access::Roles(roles) => route
            .route_layer(middleware::from_fn_with_state(roles.clone(), authorize))
            .route_layer(middleware::from_fn_with_state(state.clone(), authenticate)),
    }
}
