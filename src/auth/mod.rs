//! Bearer tokens. An access/refresh pair is issued at login; only access
//! tokens authenticate API calls, refresh tokens only mint new access tokens.

pub mod password;

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config::SecurityConfig;
use crate::identity::UserId;

pub use password::{hash_password, verify_password, PasswordError};

#[derive(Debug, Error)]
pub enum JwtError {
    #[error("JWT generation error: {0}")]
    TokenGeneration(String),

    #[error("JWT secret not configured")]
    InvalidSecret,

    #[error("Invalid token: {0}")]
    Invalid(String),

    #[error("Expected {expected} token")]
    WrongType { expected: TokenType },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

impl std::fmt::Display for TokenType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenType::Access => write!(f, "access"),
            TokenType::Refresh => write!(f, "refresh"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id, as a string per JWT convention.
    pub sub: String,
    pub username: String,
    pub token_type: TokenType,
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    fn new(user_id: UserId, username: &str, token_type: TokenType, lifetime: Duration) -> Self {
        let now = Utc::now();
        Self {
            sub: user_id.to_string(),
            username: username.to_string(),
            token_type,
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: (now + lifetime).timestamp(),
        }
    }

    pub fn user_id(&self) -> Result<UserId, JwtError> {
        self.sub
            .parse()
            .map_err(|_| JwtError::Invalid(format!("bad subject '{}'", self.sub)))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// HS256 signing material plus token lifetimes.
#[derive(Clone)]
pub struct AuthKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    access_lifetime: Duration,
    refresh_lifetime: Duration,
}

impl AuthKeys {
    pub fn new(secret: &str, access_lifetime: Duration, refresh_lifetime: Duration) -> Result<Self, JwtError> {
        if secret.is_empty() {
            return Err(JwtError::InvalidSecret);
        }
        Ok(Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            access_lifetime,
            refresh_lifetime,
        })
    }

    pub fn from_config(security: &SecurityConfig) -> Result<Self, JwtError> {
        Self::new(
            &security.jwt_secret,
            Duration::minutes(security.access_token_minutes),
            Duration::hours(security.refresh_token_hours),
        )
    }

    fn sign(&self, claims: &Claims) -> Result<String, JwtError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|e| JwtError::TokenGeneration(e.to_string()))
    }

    pub fn issue_access(&self, user_id: UserId, username: &str) -> Result<String, JwtError> {
        self.sign(&Claims::new(user_id, username, TokenType::Access, self.access_lifetime))
    }

    pub fn issue_pair(&self, user_id: UserId, username: &str) -> Result<TokenPair, JwtError> {
        Ok(TokenPair {
            access: self.issue_access(user_id, username)?,
            refresh: self.sign(&Claims::new(
                user_id,
                username,
                TokenType::Refresh,
                self.refresh_lifetime,
            ))?,
        })
    }

    /// Checks signature, expiry and that the token is of the `expected` kind.
    pub fn validate(&self, token: &str, expected: TokenType) -> Result<Claims, JwtError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        let claims = decode::<Claims>(token, &self.decoding, &validation)
            .map_err(|e| JwtError::Invalid(e.to_string()))?
            .claims;

        if claims.token_type != expected {
            return Err(JwtError::WrongType { expected });
        }
        Ok(claims)
    }
}
