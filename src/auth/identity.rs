//! Identity provider seam: bearer credential -> opaque principal.
//!
//! The gate only needs "resolve this session token to a stable principal
//! id". Production uses HS256 JWTs issued at login; any failure during
//! resolution (bad signature, expiry, transport timeout in a remote
//! implementation) maps to `Unauthenticated`.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Stable, opaque principal identifier produced by the identity layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub subject: String,
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Resolve a bearer credential. Fails with `Unauthenticated` when the
    /// session is missing, invalid or expired.
    async fn resolve(&self, token: &str) -> Result<Principal>;
}

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    /// Subject: the user's opaque auth identity
    sub: String,
    /// Issued at (Unix timestamp)
    iat: i64,
    /// Expiration time (Unix timestamp)
    exp: i64,
}

/// A freshly issued access token.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_in: u64,
}

/// HS256 session tokens, issued at login and resolved by the gate.
pub struct JwtIdentityProvider {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expiry: Duration,
}

impl JwtIdentityProvider {
    pub fn new(secret: &str, expiry_minutes: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            expiry: Duration::minutes(expiry_minutes),
        }
    }

    /// Issue an access token for an opaque principal subject.
    pub fn issue(&self, subject: &str) -> Result<IssuedToken> {
        let now = Utc::now();
        let claims = Claims {
            sub: subject.to_string(),
            iat: now.timestamp(),
            exp: (now + self.expiry).timestamp(),
        };
        let token = encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("token signing failed: {e}")))?;
        Ok(IssuedToken {
            token,
            expires_in: self.expiry.num_seconds().max(0) as u64,
        })
    }
}

#[async_trait]
impl IdentityProvider for JwtIdentityProvider {
    async fn resolve(&self, token: &str) -> Result<Principal> {
        let data = decode::<Claims>(token, &self.decoding_key, &Validation::default())
            .map_err(|_| AppError::Unauthenticated("invalid or expired session".into()))?;
        Ok(Principal {
            subject: data.claims.sub,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_issue_then_resolve() {
        let provider = JwtIdentityProvider::new("test-secret", 30);
        let issued = provider.issue("principal-1").unwrap();
        let principal = provider.resolve(&issued.token).await.unwrap();
        assert_eq!(principal.subject, "principal-1");
        assert_eq!(issued.expires_in, 30 * 60);
    }

    #[tokio::test]
    async fn test_garbage_token_is_unauthenticated() {
        let provider = JwtIdentityProvider::new("test-secret", 30);
        let err = provider.resolve("not-a-token").await.unwrap_err();
        assert!(matches!(err, AppError::Unauthenticated(_)));
    }

    #[tokio::test]
    async fn test_token_from_other_secret_is_rejected() {
        let issuer = JwtIdentityProvider::new("secret-a", 30);
        let verifier = JwtIdentityProvider::new("secret-b", 30);
        let issued = issuer.issue("principal-1").unwrap();
        assert!(verifier.resolve(&issued.token).await.is_err());
    }

    #[tokio::test]
    async fn test_expired_token_is_rejected() {
        let provider = JwtIdentityProvider::new("test-secret", -5);
        let issued = provider.issue("principal-1").unwrap();
        assert!(provider.resolve(&issued.token).await.is_err());
    }
}
