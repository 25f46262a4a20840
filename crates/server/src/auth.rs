//! Bearer token issuance and verification.
//!
//! Tokens are HS256 JWTs. `GET /get-token` hands one out to anybody; every
//! other route requires a valid, unexpired token from this issuer.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, Host, authorization::Bearer},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{ServerError, server::ServerState};

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    pub sub: String,
    pub iss: String,
    pub exp: i64,
}

pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    ttl: Duration,
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("issuer", &self.issuer)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl TokenIssuer {
    pub fn new(secret: &[u8], issuer: &str, ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            issuer: issuer.to_string(),
            ttl,
        }
    }

    /// Issuer signing with a fresh 64-byte key. Tokens do not survive a
    /// restart.
    pub fn random(issuer: &str, ttl: Duration) -> Self {
        let secret: Vec<u8> = (0..4)
            .flat_map(|_| Uuid::new_v4().into_bytes())
            .collect();
        Self::new(&secret, issuer, ttl)
    }

    pub fn issue(&self, subject: &str) -> Result<String, ServerError> {
        let expires = Utc::now()
            .checked_add_signed(self.ttl)
            .ok_or_else(|| ServerError::Internal(format!("token ttl {} out of range", self.ttl)))?;
        let claims = Claims {
            sub: subject.to_string(),
            iss: self.issuer.clone(),
            exp: expires.timestamp(),
        };

        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|err| ServerError::Internal(format!("failed to sign token: {err}")))
    }

    pub fn verify(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);
        validation.leeway = 0;

        jsonwebtoken::decode::<Claims>(token, &self.decoding, &validation).map(|data| data.claims)
    }
}

/// Handle `GET /get-token`. The token subject is the host the request was
/// addressed to.
pub async fn get_token(
    host: Option<TypedHeader<Host>>,
    State(state): State<ServerState>,
) -> Result<String, ServerError> {
    let subject = match host {
        Some(TypedHeader(host)) => match host.port() {
            Some(port) => format!("{}:{port}", host.hostname()),
            None => host.hostname().to_string(),
        },
        None => String::new(),
    };

    state.tokens.issue(&subject)
}

pub async fn require_token(
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    State(state): State<ServerState>,
    request: Request,
    next: Next,
) -> Result<Response, ServerError> {
    let Some(TypedHeader(Authorization(bearer))) = bearer else {
        return Err(ServerError::Unauthorized);
    };

    if let Err(err) = state.tokens.verify(bearer.token()) {
        tracing::debug!("rejected token: {err}");
        return Err(ServerError::Unauthorized);
    }

    Ok(next.run(request).await)
}
