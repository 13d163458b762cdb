use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("token expired")]
    Expired,

    #[error("malformed token")]
    Malformed,

    #[error("token signing failed: {0}")]
    Signing(String),
}

/// Mints and checks HS256 identity tokens. Verification here is purely
/// cryptographic; resolving the subject to a live user happens in
/// `auth::extractor`.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        TokenService {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    pub fn issue(&self, user_id: Uuid) -> Result<String, TokenError> {
        self.issue_with_ttl(user_id, self.ttl)
    }

    /// A negative `ttl` yields an already-expired token.
    pub fn issue_with_ttl(&self, user_id: Uuid, ttl: Duration) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id,
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    pub fn verify(&self, token: &str) -> Result<Uuid, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims.sub)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Malformed,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> TokenService {
        TokenService::new("test-secret", Duration::days(30))
    }

    #[test]
    fn test_issue_then_verify() {
        let id = Uuid::new_v4();
        let token = service().issue(id).unwrap();
        assert_eq!(service().verify(&token).unwrap(), id);
    }

    #[test]
    fn test_negative_ttl_is_expired() {
        let token = service()
            .issue_with_ttl(Uuid::new_v4(), Duration::hours(-1))
            .unwrap();
        assert_eq!(service().verify(&token), Err(TokenError::Expired));
    }

    #[test]
    fn test_garbage_is_malformed() {
        assert_eq!(
            service().verify("invalid-token-here"),
            Err(TokenError::Malformed)
        );
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let token = TokenService::new("other-secret", Duration::hours(1))
            .issue(Uuid::new_v4())
            .unwrap();
        assert_eq!(service().verify(&token), Err(TokenError::Malformed));
    }
}
