//! Account registration and login endpoints

use axum::{extract::State, http::StatusCode, Json};

use crate::{
    error::AppResult,
    models::account::{LoginRequest, LoginResponse, RegisterRequest, RegisterResponse},
    AppState,
};

/// Register a new account
#[utoipa::path(
    post,
    path = "/api/user/register",
    tag = "auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = RegisterResponse),
        (status = 400, description = "A required field is missing", body = crate::error::ErrorResponse),
        (status = 409, description = "Identity already registered", body = crate::error::ErrorResponse)
    )
)]
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<RegisterResponse>)> {
    let account_id = state.services.auth.register(request).await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "Account registered successfully".to_string(),
            account_id,
        }),
    ))
}

/// Log in and receive a bearer token
#[utoipa::path(
    post,
    path = "/api/user/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 400, description = "A required field is missing", body = crate::error::ErrorResponse),
        (status = 401, description = "Invalid identity or password", body = crate::error::ErrorResponse)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let issued = state.services.auth.login(request).await?;

    Ok(Json(LoginResponse {
        message: "Login successful".to_string(),
        token: issued.token,
        token_type: "Bearer".to_string(),
        expires_in: issued.expires_in,
    }))
}
