use std::collections::HashMap;
use std::time::{Duration, Instant};

use axum::http::{header::AUTHORIZATION, HeaderMap};
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::warn;

use crate::config::AuthConfig;
use crate::error::ApiError;

/// Google's JWK set for Firebase-issued ID tokens.
pub const GOOGLE_JWKS_URL: &str =
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";

/// Provider signing keys rotate rarely; refetch at most once an hour unless
/// an unknown key id shows up.
const KEY_CACHE_TTL: Duration = Duration::from_secs(3600);

/// Claims extracted from a verified bearer token. `sub` is the stable
/// external subject id users are keyed on.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TokenClaims {
    pub sub: String,
    #[serde(default)]
    pub phone_number: Option<String>,
    pub exp: usize,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("authorization header missing")]
    MissingHeader,
    #[error("invalid authentication scheme, expected Bearer")]
    InvalidScheme,
    #[error("invalid token: {0}")]
    InvalidToken(String),
    #[error("signing key {0} not found in provider key set")]
    UnknownKey(String),
    #[error("failed to fetch provider keys: {0}")]
    KeyFetch(String),
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        match e {
            // A key-set outage is our problem, not the caller's.
            AuthError::KeyFetch(msg) => ApiError::Internal(msg),
            other => ApiError::Unauthorized(other.to_string()),
        }
    }
}

/// Pull the raw token out of an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers.get(AUTHORIZATION).ok_or(AuthError::MissingHeader)?;
    let value = value.to_str().map_err(|_| AuthError::InvalidScheme)?;
    value.strip_prefix("Bearer ").ok_or(AuthError::InvalidScheme)
}

#[derive(Clone, Deserialize)]
struct Jwk {
    kid: String,
    n: String,
    e: String,
}

#[derive(Deserialize)]
struct JwkSet {
    keys: Vec<Jwk>,
}

#[derive(Default)]
struct KeyCache {
    keys: HashMap<String, Jwk>,
    fetched_at: Option<Instant>,
}

/// Stateless verification of externally issued identity tokens.
///
/// In `Firebase` mode tokens are RS256-verified against the provider's
/// published JWK set (cached), with audience and issuer pinned to the
/// project. `InsecureLocal` mode verifies HS256 with a shared secret and is
/// only for development and tests.
pub struct TokenVerifier {
    mode: AuthConfig,
    http: reqwest::Client,
    keys: RwLock<KeyCache>,
}

impl TokenVerifier {
    pub fn new(mode: AuthConfig) -> Self {
        Self {
            mode,
            http: reqwest::Client::new(),
            keys: RwLock::new(KeyCache::default()),
        }
    }

    pub async fn verify(&self, token: &str) -> Result<TokenClaims, AuthError> {
        match &self.mode {
            AuthConfig::InsecureLocal { secret } => {
                let validation = Validation::new(Algorithm::HS256);
                decode::<TokenClaims>(
                    token,
                    &DecodingKey::from_secret(secret.as_bytes()),
                    &validation,
                )
                .map(|data| data.claims)
                .map_err(|e| AuthError::InvalidToken(e.to_string()))
            }
            AuthConfig::Firebase {
                project_id,
                jwks_url,
            } => {
                let header =
                    decode_header(token).map_err(|e| AuthError::InvalidToken(e.to_string()))?;
                let kid = header
                    .kid
                    .ok_or_else(|| AuthError::InvalidToken("token has no key id".to_string()))?;

                let key = self.signing_key(jwks_url, &kid).await?;
                let decoding_key = DecodingKey::from_rsa_components(&key.n, &key.e)
                    .map_err(|e| AuthError::InvalidToken(e.to_string()))?;

                let mut validation = Validation::new(Algorithm::RS256);
                validation.set_audience(&[project_id]);
                validation.set_issuer(&[format!("https://securetoken.google.com/{project_id}")]);

                decode::<TokenClaims>(token, &decoding_key, &validation)
                    .map(|data| data.claims)
                    .map_err(|e| {
                        warn!(error = %e, "token verification failed");
                        AuthError::InvalidToken(e.to_string())
                    })
            }
        }
    }

    async fn signing_key(&self, jwks_url: &str, kid: &str) -> Result<Jwk, AuthError> {
        {
            let cache = self.keys.read().await;
            if let Some(fetched_at) = cache.fetched_at {
                if fetched_at.elapsed() < KEY_CACHE_TTL {
                    if let Some(key) = cache.keys.get(kid) {
                        return Ok(key.clone());
                    }
                }
            }
        }

        let mut cache = self.keys.write().await;
        // Another request may have refreshed while we waited for the lock.
        let stale = cache
            .fetched_at
            .map_or(true, |t| t.elapsed() >= KEY_CACHE_TTL);
        if stale || !cache.keys.contains_key(kid) {
            let set: JwkSet = self
                .http
                .get(jwks_url)
                .send()
                .await
                .map_err(|e| AuthError::KeyFetch(e.to_string()))?
                .error_for_status()
                .map_err(|e| AuthError::KeyFetch(e.to_string()))?
                .json()
                .await
                .map_err(|e| AuthError::KeyFetch(e.to_string()))?;

            cache.keys = set.keys.into_iter().map(|k| (k.kid.clone(), k)).collect();
            cache.fetched_at = Some(Instant::now());
        }

        cache
            .keys
            .get(kid)
            .cloned()
            .ok_or_else(|| AuthError::UnknownKey(kid.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn mint(secret: &str, sub: &str, exp: usize) -> String {
        let claims = TokenClaims {
            sub: sub.to_string(),
            phone_number: Some("+923001234567".to_string()),
            exp,
        };
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .expect("failed to encode token")
    }

    fn local_verifier(secret: &str) -> TokenVerifier {
        TokenVerifier::new(AuthConfig::InsecureLocal {
            secret: secret.to_string(),
        })
    }

    fn future_exp() -> usize {
        (chrono::Utc::now().timestamp() + 3600) as usize
    }

    #[tokio::test]
    async fn test_local_token_roundtrip() {
        let verifier = local_verifier("dev-secret");
        let token = mint("dev-secret", "uid-42", future_exp());

        let claims = verifier.verify(&token).await.expect("token should verify");
        assert_eq!(claims.sub, "uid-42");
        assert_eq!(claims.phone_number.as_deref(), Some("+923001234567"));
    }

    #[tokio::test]
    async fn test_wrong_secret_rejected() {
        let verifier = local_verifier("dev-secret");
        let token = mint("other-secret", "uid-42", future_exp());

        assert!(matches!(
            verifier.verify(&token).await,
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[tokio::test]
    async fn test_expired_token_rejected() {
        let verifier = local_verifier("dev-secret");
        let expired = (chrono::Utc::now().timestamp() - 3600) as usize;
        let token = mint("dev-secret", "uid-42", expired);

        assert!(matches!(
            verifier.verify(&token).await,
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[tokio::test]
    async fn test_garbage_token_rejected() {
        let verifier = local_verifier("dev-secret");
        assert!(verifier.verify("not.a.jwt").await.is_err());
    }

    #[test]
    fn test_bearer_token_parsing() {
        let mut headers = HeaderMap::new();
        assert!(matches!(
            bearer_token(&headers),
            Err(AuthError::MissingHeader)
        ));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert!(matches!(
            bearer_token(&headers),
            Err(AuthError::InvalidScheme)
        ));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def.ghi"));
        assert_eq!(bearer_token(&headers).unwrap(), "abc.def.ghi");
    }

    #[test]
    fn test_auth_error_maps_to_unauthorized() {
        let api_err: ApiError = AuthError::MissingHeader.into();
        assert!(matches!(api_err, ApiError::Unauthorized(_)));

        let api_err: ApiError = AuthError::KeyFetch("timeout".into()).into();
        assert!(matches!(api_err, ApiError::Internal(_)));
    }
}
