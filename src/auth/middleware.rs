//! Identity and role middleware
//!
//! `authenticate` turns a bearer token into an [`Identity`] stored in the
//! request extensions; `authorize` checks that identity's role against the
//! route's [`RoleSet`]. Both short-circuit with an [`AppError`] response, so
//! the handler never runs for a rejected request.

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::{
    error::{AppError, AuthError},
    AppState,
};

use super::{policy::RoleSet, Identity};

const BEARER_SCHEME: &str = "Bearer";

/// Extract the bearer token from the `Authorization` header
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::NoTokenProvided)?
        .to_str()
        .map_err(|_| AuthError::Malformed)?;

    // Auth scheme names are case-insensitive
    let (scheme, token) = value.split_once(' ').ok_or(AuthError::Malformed)?;
    if !scheme.eq_ignore_ascii_case(BEARER_SCHEME) {
        return Err(AuthError::Malformed);
    }

    let token = token.trim();
    if token.is_empty() {
        return Err(AuthError::Malformed);
    }
    Ok(token)
}

/// Identity stage: verify the bearer token and attach the caller's identity
pub async fn authenticate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let identity = bearer_token(request.headers())
        .and_then(|token| state.services.auth.verify_token(token))?;

    tracing::debug!(
        account_id = identity.account_id,
        role = %identity.role,
        "Request authenticated"
    );

    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}

/// Role stage: only valid behind [`authenticate`] on the same route
pub async fn authorize(
    State(allowed): State<RoleSet>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let identity = request
        .extensions()
        .get::<Identity>()
        .copied()
        .ok_or_else(|| {
            AppError::Internal("role check ran without a preceding identity stage".to_string())
        })?;

    if !allowed.contains(identity.role) {
        tracing::info!(
            account_id = identity.account_id,
            role = %identity.role,
            "Role not permitted for this operation"
        );
        return Err(AuthError::AccessDenied.into());
    }

    Ok(next.run(request).await)
}

/// Handler access to the identity attached by [`authenticate`].
///
/// Use `Option<Identity>` on routes whose access policy may be public.
#[async_trait]
impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .copied()
            .ok_or(AppError::Auth(AuthError::NoTokenProvided))
    }
}
