//! Session token issuance and verification
//!
//! Tokens are HS256 JWTs carrying the account id, role, issue time and
//! expiry. Verification needs only the signing secret and the clock.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult, AuthError},
    models::Role,
};

use super::Identity;

/// JWT claims for session tokens
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Account id
    pub sub: i32,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
    /// Unique token id
    pub jti: Uuid,
}

/// Freshly issued token
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: i64,
    pub expires_in: i64,
}

/// Signs and verifies session tokens with a process-wide secret
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl TokenService {
    pub fn new(secret: &str) -> AppResult<Self> {
        if secret.is_empty() {
            return Err(AppError::Internal("JWT signing secret is empty".to_string()));
        }

        // Expiry is checked by `verify_at` against an explicit clock.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        Ok(Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        })
    }

    /// Issue a token valid for `ttl` from now
    pub fn issue(&self, account_id: i32, role: Role, ttl: Duration) -> AppResult<IssuedToken> {
        self.issue_at(account_id, role, ttl, Utc::now())
    }

    pub fn issue_at(
        &self,
        account_id: i32,
        role: Role,
        ttl: Duration,
        issued_at: DateTime<Utc>,
    ) -> AppResult<IssuedToken> {
        let iat = issued_at.timestamp();
        let exp = (issued_at + ttl).timestamp();

        let claims = Claims {
            sub: account_id,
            role,
            iat,
            exp,
            jti: Uuid::new_v4(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))?;

        Ok(IssuedToken {
            token,
            expires_at: exp,
            expires_in: exp - iat,
        })
    }

    /// Verify a token against the current time
    pub fn verify(&self, token: &str) -> Result<Identity, AuthError> {
        self.verify_at(token, Utc::now())
    }

    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Identity, AuthError> {
        let claims = decode::<Claims>(token, &self.decoding, &self.validation)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature => AuthError::InvalidSignature,
                ErrorKind::ExpiredSignature => AuthError::Expired,
                _ => AuthError::Malformed,
            })?
            .claims;

        if now.timestamp() >= claims.exp {
            return Err(AuthError::Expired);
        }

        Ok(Identity {
            account_id: claims.sub,
            role: claims.role,
        })
    }
}
