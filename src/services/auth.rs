//! Account registration, login and token verification

use std::{sync::Arc, time::Duration};

use crate::{
    auth::{Identity, IssuedToken, PasswordHasher, TokenService},
    config::AuthConfig,
    error::{AppError, AppResult, AuthError, RegistrationError},
    models::account::{LoginRequest, NewAccount, RegisterRequest},
    repository::{AccountStore, Repository},
};

use super::bounded;

/// Compared against when the identity is unknown, so a failed lookup costs
/// as much as a wrong password.
const DUMMY_PASSWORD: &str = "dummy-password-for-unknown-identities";

#[derive(Clone)]
pub struct AuthService {
    accounts: Arc<dyn AccountStore>,
    hasher: PasswordHasher,
    tokens: TokenService,
    token_ttl: chrono::Duration,
    timeout: Duration,
    dummy_hash: Arc<str>,
}

impl AuthService {
    pub fn new(repository: Repository, config: &AuthConfig, timeout: Duration) -> AppResult<Self> {
        let hasher = PasswordHasher::from_config(config)?;
        let dummy_hash: Arc<str> = hasher.hash(DUMMY_PASSWORD)?.into();

        Ok(Self {
            accounts: repository.accounts,
            tokens: TokenService::new(&config.jwt_secret)?,
            token_ttl: chrono::Duration::minutes(config.jwt_expiration_minutes),
            hasher,
            timeout,
            dummy_hash,
        })
    }

    /// Register a new account and return its id.
    ///
    /// No token is issued; the caller logs in separately.
    pub async fn register(&self, request: RegisterRequest) -> AppResult<i32> {
        let identity = required_text("identity", request.identity)?;
        let display_name = required_text("display_name", request.display_name)?;
        let password = request
            .password
            .filter(|p| !p.is_empty())
            .ok_or(RegistrationError::MissingField("password"))?;
        let role = request.role.unwrap_or_default();

        let password_hash = bounded(
            self.timeout,
            "password hashing",
            self.hasher.hash_async(password),
        )
        .await?;

        let account = NewAccount {
            identity,
            display_name,
            password_hash,
            role,
        };

        let id = bounded(self.timeout, "account insert", self.accounts.create(&account))
            .await
            .map_err(|e| match e {
                AppError::Conflict(_) => AppError::Registration(RegistrationError::DuplicateIdentity),
                other => other,
            })?;

        tracing::info!(account_id = id, role = %role, "Account registered");
        Ok(id)
    }

    /// Check credentials and issue a session token.
    ///
    /// Unknown identity and wrong password fail identically.
    pub async fn login(&self, request: LoginRequest) -> AppResult<IssuedToken> {
        let identity = request
            .identity
            .filter(|i| !i.trim().is_empty())
            .ok_or_else(|| AppError::Validation("Missing required field: identity".to_string()))?;
        let password = request
            .password
            .ok_or_else(|| AppError::Validation("Missing required field: password".to_string()))?;

        let account = bounded(
            self.timeout,
            "account lookup",
            self.accounts.find_by_identity(identity.trim()),
        )
        .await?;

        let stored_hash = account
            .as_ref()
            .map(|a| a.password_hash.clone())
            .unwrap_or_else(|| self.dummy_hash.to_string());

        let password_matches = bounded(
            self.timeout,
            "password verification",
            self.hasher.verify_async(password, stored_hash),
        )
        .await?;

        let account = account
            .filter(|_| password_matches)
            .ok_or(AuthError::InvalidCredentials)?;

        let issued = self.tokens.issue(account.id, account.role, self.token_ttl)?;

        tracing::info!(account_id = account.id, role = %account.role, "Login succeeded");
        Ok(issued)
    }

    /// Verify a bearer token; no datastore access
    pub fn verify_token(&self, token: &str) -> Result<Identity, AuthError> {
        self.tokens.verify(token)
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }
}

fn required_text(field: &'static str, value: Option<String>) -> Result<String, RegistrationError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(RegistrationError::MissingField(field))
}
