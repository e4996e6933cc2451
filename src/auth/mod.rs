use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::SecurityConfig;

pub mod password;
pub mod validate;

/// Signed claim set shared by access and refresh tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: user or employee id
    pub sub: i64,
    /// Role id, present for employees only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<i32>,
    pub iat: i64,
    pub exp: i64,
}

/// Caller identity injected into protected requests by the token gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AuthUser {
    pub id: i64,
    /// Set for employees, absent for end users.
    pub role_id: Option<i32>,
}

impl AuthUser {
    pub fn is_employee(&self) -> bool {
        self.role_id.is_some()
    }
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.sub,
            role_id: claims.role,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Error)]
pub enum JwtError {
    #[error("JWT generation error: {0}")]
    TokenGeneration(String),

    #[error("Invalid JWT secret")]
    InvalidSecret,

    #[error("Invalid JWT token: {0}")]
    InvalidToken(String),
}

/// Issues and verifies HS256 tokens with a shared secret.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenIssuer {
    pub fn new(secret: &str, access_ttl: Duration, refresh_ttl: Duration) -> Result<Self, JwtError> {
        if secret.is_empty() {
            return Err(JwtError::InvalidSecret);
        }
        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            access_ttl,
            refresh_ttl,
        })
    }

    pub fn from_config(security: &SecurityConfig) -> Result<Self, JwtError> {
        Self::new(
            &security.jwt_secret,
            Duration::minutes(security.access_token_ttl_minutes as i64),
            Duration::hours(security.refresh_token_ttl_hours as i64),
        )
    }

    /// Access and refresh token for the same subject and role.
    pub fn issue_pair(&self, sub: i64, role: Option<i32>) -> Result<TokenPair, JwtError> {
        Ok(TokenPair {
            access_token: self.sign(sub, role, self.access_ttl)?,
            refresh_token: self.sign(sub, role, self.refresh_ttl)?,
        })
    }

    fn sign(&self, sub: i64, role: Option<i32>, ttl: Duration) -> Result<String, JwtError> {
        let now = Utc::now();
        let claims = Claims {
            sub,
            role,
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| JwtError::TokenGeneration(e.to_string()))
    }

    /// Checks signature and expiry.
    pub fn verify(&self, token: &str) -> Result<Claims, JwtError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| JwtError::InvalidToken(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issuer(secret: &str) -> TokenIssuer {
        TokenIssuer::new(secret, Duration::hours(1), Duration::days(7)).unwrap()
    }

    #[test]
    fn issued_tokens_verify_with_same_claims() {
        let issuer = issuer("secret");
        let pair = issuer.issue_pair(42, Some(3)).unwrap();
        assert_ne!(pair.access_token, pair.refresh_token);

        let access = issuer.verify(&pair.access_token).unwrap();
        let refresh = issuer.verify(&pair.refresh_token).unwrap();
        assert_eq!((access.sub, access.role), (42, Some(3)));
        assert_eq!((refresh.sub, refresh.role), (42, Some(3)));
        assert!(refresh.exp > access.exp);
    }

    #[test]
    fn rejects_foreign_signature() {
        let pair = issuer("secret").issue_pair(1, None).unwrap();
        assert!(matches!(
            issuer("other").verify(&pair.access_token),
            Err(JwtError::InvalidToken(_))
        ));
    }

    #[test]
    fn rejects_expired_token() {
        let expired = TokenIssuer::new("secret", Duration::minutes(-5), Duration::minutes(-5)).unwrap();
        let pair = expired.issue_pair(1, None).unwrap();
        assert!(expired.verify(&pair.access_token).is_err());
    }

    #[test]
    fn empty_secret_is_refused() {
        assert!(matches!(
            TokenIssuer::new("", Duration::hours(1), Duration::days(7)),
            Err(JwtError::InvalidSecret)
        ));
    }
}
