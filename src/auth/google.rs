use axum::async_trait;
use jsonwebtoken::{decode, decode_header, jwk::JwkSet, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::error::ApiError;

const GOOGLE_JWKS_URL: &str = "https://www.googleapis.com/oauth2/v3/certs";
const JWKS_TTL: Duration = Duration::from_secs(60 * 60);

/// Claims extracted from a cryptographically verified ID token.
#[derive(Debug, Clone)]
pub struct VerifiedIdentity {
    pub subject: String,
    pub email: String,
    pub name: Option<String>,
    pub picture: Option<String>,
}

/// Credential verifier boundary. The production impl talks to Google;
/// tests substitute a fake.
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify(&self, credential: &str) -> Result<VerifiedIdentity, ApiError>;
}

#[derive(Debug, Deserialize)]
struct GoogleClaims {
    sub: String,
    email: Option<String>,
    name: Option<String>,
    picture: Option<String>,
}

/// Verifies Google ID tokens (RS256) against Google's published JWKS.
/// Signature, issuer, audience and expiry checks are all delegated to
/// `jsonwebtoken`; the key set is cached and refetched on unknown key ids.
pub struct GoogleVerifier {
    client_id: String,
    jwks_url: String,
    http: reqwest::Client,
    cached: RwLock<Option<(JwkSet, Instant)>>,
}

impl GoogleVerifier {
    pub fn new(client_id: String) -> Self {
        Self {
            client_id,
            jwks_url: GOOGLE_JWKS_URL.to_string(),
            http: reqwest::Client::new(),
            cached: RwLock::new(None),
        }
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[&self.client_id]);
        validation.set_issuer(&["accounts.google.com", "https://accounts.google.com"]);
        validation
    }

    async fn keys(&self, force_refresh: bool) -> Result<JwkSet, ApiError> {
        if !force_refresh {
            if let Some((set, fetched_at)) = &*self.cached.read().await {
                if fetched_at.elapsed() < JWKS_TTL {
                    return Ok(set.clone());
                }
            }
        }

        debug!("fetching google jwks");
        let set: JwkSet = self
            .http
            .get(&self.jwks_url)
            .send()
            .await
            .map_err(|e| ApiError::Internal(anyhow::anyhow!("fetch google jwks: {e}")))?
            .json()
            .await
            .map_err(|e| ApiError::Internal(anyhow::anyhow!("parse google jwks: {e}")))?;

        *self.cached.write().await = Some((set.clone(), Instant::now()));
        Ok(set)
    }
}

fn invalid_token() -> ApiError {
    ApiError::Unauthenticated("Invalid Google token".into())
}

#[async_trait]
impl TokenVerifier for GoogleVerifier {
    async fn verify(&self, credential: &str) -> Result<VerifiedIdentity, ApiError> {
        let header = decode_header(credential).map_err(|_| invalid_token())?;
        let kid = header.kid.ok_or_else(invalid_token)?;

        let jwk = match self.keys(false).await?.find(&kid).cloned() {
            Some(jwk) => jwk,
            // Key rotation: refetch once before giving up on the kid.
            None => self
                .keys(true)
                .await?
                .find(&kid)
                .cloned()
                .ok_or_else(invalid_token)?,
        };

        let decoding = DecodingKey::from_jwk(&jwk).map_err(|_| invalid_token())?;
        let data = decode::<GoogleClaims>(credential, &decoding, &self.validation()).map_err(
            |e| {
                warn!(error = %e, "google token rejected");
                invalid_token()
            },
        )?;

        let claims = data.claims;
        if claims.sub.is_empty() {
            return Err(invalid_token());
        }
        let email = claims
            .email
            .filter(|e| !e.is_empty())
            .ok_or_else(invalid_token)?;

        Ok(VerifiedIdentity {
            subject: claims.sub,
            email,
            name: claims.name,
            picture: claims.picture,
        })
    }
}
