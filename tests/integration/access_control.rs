//! Access control tests driven through the full router against the
//! in-memory store.

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use tower::ServiceExt;

use library_catalog_server::{
    api,
    auth::Access,
    config::AppConfig,
    models::Role,
    repository::{memory::MemoryStore, Repository},
    AppState,
};

fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.auth.jwt_secret = "access-control-test-secret".to_string();
    config.auth.password_memory_kib = 1024;
    config.auth.password_iterations = 1;
    config.auth.password_parallelism = 1;
    config
}

struct TestApp {
    router: Router,
    state: AppState,
    store: MemoryStore,
}

async fn spawn_app(config: AppConfig) -> TestApp {
    let (repository, store) = Repository::in_memory();
    store.add_category(1, "Science Fiction").await;
    let state = AppState::new(config, repository).unwrap();
    TestApp {
        router: api::router(state.clone()),
        state,
        store,
    }
}

impl TestApp {
    async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    async fn register(&self, identity: &str, password: &str, role: Option<&str>) -> StatusCode {
        let mut body = json!({
            "identity": identity,
            "display_name": "Test Reader",
            "password": password,
        });
        if let Some(role) = role {
            body["role"] = json!(role);
        }
        self.send(Method::POST, "/api/user/register", None, Some(body))
            .await
            .0
    }

    async fn login(&self, identity: &str, password: &str) -> (StatusCode, Value) {
        self.send(
            Method::POST,
            "/api/user/login",
            None,
            Some(json!({ "identity": identity, "password": password })),
        )
        .await
    }

    async fn token_for(&self, identity: &str, password: &str, role: Option<&str>) -> String {
        assert_eq!(self.register(identity, password, role).await, StatusCode::CREATED);
        let (status, body) = self.login(identity, password).await;
        assert_eq!(status, StatusCode::OK);
        body["token"].as_str().unwrap().to_string()
    }

    async fn create_book(&self, token: &str, isbn: &str) -> i64 {
        let (status, body) = self
            .send(Method::POST, "/api/books", Some(token), Some(book_body(isbn)))
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        body["book_id"].as_i64().unwrap()
    }
}

fn book_body(isbn: &str) -> Value {
    json!({
        "title": "Dune",
        "author": "Frank Herbert",
        "category_id": 1,
        "isbn": isbn,
        "total_copies": 3,
        "available_copies": 3
    })
}

#[tokio::test]
async fn test_member_cannot_delete_book() {
    let app = spawn_app(test_config()).await;

    assert_eq!(app.register("a@x.com", "pw1", None).await, StatusCode::CREATED);
    let (status, body) = app.login("a@x.com", "pw1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["token_type"], "Bearer");
    let member = body["token"].as_str().unwrap().to_string();

    let book_id = app.create_book(&member, "978-0441013593").await;

    let (status, body) = app.send(Method::GET, "/api/books", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);

    let uri = format!("/api/books/{}", book_id);
    let (status, body) = app.send(Method::DELETE, &uri, Some(&member), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Access denied");
    assert_eq!(app.store.book_count().await, 1);
}

#[tokio::test]
async fn test_librarian_deletes_book_once() {
    let app = spawn_app(test_config()).await;
    let librarian = app.token_for("lib@x.com", "shelves", Some("librarian")).await;
    let book_id = app.create_book(&librarian, "978-0553293357").await;

    let uri = format!("/api/books/{}", book_id);
    let (status, _) = app.send(Method::DELETE, &uri, Some(&librarian), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.store.book_count().await, 0);

    let (status, body) = app.send(Method::DELETE, &uri, Some(&librarian), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "NotFound");
}

#[tokio::test]
async fn test_create_without_token_is_rejected() {
    let app = spawn_app(test_config()).await;

    let (status, body) = app
        .send(Method::POST, "/api/books", None, Some(book_body("978-0441013593")))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "No token provided");
    assert_eq!(app.store.book_count().await, 0);
}

#[tokio::test]
async fn test_delete_without_token_is_unauthorized_not_forbidden() {
    let app = spawn_app(test_config()).await;
    let (status, _) = app.send(Method::DELETE, "/api/books/1", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_duplicate_registration_conflicts() {
    let app = spawn_app(test_config()).await;

    assert_eq!(app.register("dup@x.com", "first", None).await, StatusCode::CREATED);
    let original = app.store.account("dup@x.com").await.unwrap();

    assert_eq!(
        app.register("dup@x.com", "second", Some("librarian")).await,
        StatusCode::CONFLICT
    );
    assert_eq!(app.store.account_count().await, 1);

    let stored = app.store.account("dup@x.com").await.unwrap();
    assert_eq!(stored.password_hash, original.password_hash);
    assert_eq!(stored.role, Role::Member);

    let (status, _) = app.login("dup@x.com", "first").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_login_failures_are_indistinguishable() {
    let app = spawn_app(test_config()).await;
    assert_eq!(app.register("known@x.com", "right", None).await, StatusCode::CREATED);

    let (unknown_status, unknown_body) = app.login("nobody@x.com", "right").await;
    let (wrong_status, wrong_body) = app.login("known@x.com", "wrong").await;

    assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_body, wrong_body);
}

#[tokio::test]
async fn test_expired_and_garbage_tokens_are_rejected() {
    let app = spawn_app(test_config()).await;
    let account_id = {
        assert_eq!(app.register("late@x.com", "pw", None).await, StatusCode::CREATED);
        app.store.account("late@x.com").await.unwrap().id
    };

    let expired = app
        .state
        .services
        .auth
        .tokens()
        .issue_at(
            account_id,
            Role::Member,
            Duration::minutes(5),
            Utc::now() - Duration::hours(1),
        )
        .unwrap();

    let (no_token_status, no_token_body) = app
        .send(Method::POST, "/api/books", None, Some(book_body("1")))
        .await;

    for token in [expired.token.as_str(), "not.a.token", "garbage"] {
        let (status, body) = app
            .send(Method::POST, "/api/books", Some(token), Some(book_body("1")))
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(status, no_token_status);
        assert_eq!(body["message"], "Invalid or expired token");
        assert_ne!(body["message"], no_token_body["message"]);
    }
    assert_eq!(app.store.book_count().await, 0);
}

#[tokio::test]
async fn test_update_is_public_by_default() {
    let app = spawn_app(test_config()).await;
    let member = app.token_for("m@x.com", "pw", None).await;
    let book_id = app.create_book(&member, "978-0441013593").await;

    let uri = format!("/api/books/{}", book_id);
    let mut changed = book_body("978-0441013593");
    changed["available_copies"] = json!(2);
    let (status, _) = app.send(Method::PUT, &uri, None, Some(changed.clone())).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app.send(Method::GET, &uri, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["available_copies"], 2);

    let (status, _) = app
        .send(Method::PUT, "/api/books/9999", None, Some(changed))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_policy_can_require_librarian() {
    let mut config = test_config();
    config.policy.update_book = Access::roles([Role::Librarian]);
    let app = spawn_app(config).await;

    let librarian = app.token_for("lib@x.com", "pw", Some("librarian")).await;
    let member = app.token_for("m@x.com", "pw", None).await;
    let book_id = app.create_book(&librarian, "978-0441013593").await;
    let uri = format!("/api/books/{}", book_id);

    let (status, _) = app
        .send(Method::PUT, &uri, None, Some(book_body("978-0441013593")))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .send(Method::PUT, &uri, Some(&member), Some(book_body("978-0441013593")))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .send(Method::PUT, &uri, Some(&librarian), Some(book_body("978-0441013593")))
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_search_requires_term() {
    let app = spawn_app(test_config()).await;
    let member = app.token_for("m@x.com", "pw", None).await;
    app.create_book(&member, "978-0441013593").await;

    let (status, body) = app.send(Method::GET, "/api/books/search", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Missing required field: q");

    let (status, body) = app
        .send(Method::GET, "/api/books/search?q=herbert", None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_register_missing_field_is_bad_request() {
    let app = spawn_app(test_config()).await;

    let (status, body) = app
        .send(
            Method::POST,
            "/api/user/register",
            None,
            Some(json!({ "identity": "x@x.com", "display_name": "X" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Missing required field: password");
    assert_eq!(app.store.account_count().await, 0);
}

#[tokio::test]
async fn test_create_with_missing_field_is_bad_request() {
    let app = spawn_app(test_config()).await;
    let member = app.token_for("m@x.com", "pw", None).await;

    let (status, body) = app
        .send(
            Method::POST,
            "/api/books",
            Some(&member),
            Some(json!({ "title": "Dune" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"]
        .as_str()
        .unwrap()
        .starts_with("Missing required field"));
    assert_eq!(app.store.book_count().await, 0);
}

#[tokio::test]
async fn test_health_and_readiness() {
    let app = spawn_app(test_config()).await;

    let (status, body) = app.send(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, body) = app.send(Method::GET, "/ready", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");
}

#[tokio::test]
async fn test_list_with_huge_page_is_bad_request() {
    let app = spawn_app(test_config()).await;

    let (status, body) = app
        .send(Method::GET, "/api/books?page=9223372036854775807", None, None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "BadValue");

    let (status, body) = app
        .send(Method::GET, "/api/books?page=9223372036854775807&per_page=1", None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["items"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_lowercase_bearer_scheme_is_accepted() {
    let app = spawn_app(test_config()).await;
    let member = app.token_for("m@x.com", "pw", None).await;

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/books")
        .header(header::AUTHORIZATION, format!("bearer {}", member))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(book_body("978-0441013593").to_string()))
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(app.store.book_count().await, 1);
}
