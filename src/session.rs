use async_trait::async_trait;
use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use crate::entities::{User, UserId};
use crate::errors::{Error, Result};

/// Checks an external identity credential.
#[async_trait]
pub trait IdentityVerifier {
    async fn verify(&self, external_id: &str, auth_code: &str) -> Result<()>;
}

/// Accepts any non-empty external id.
pub struct PassthroughVerifier;

#[async_trait]
impl IdentityVerifier for PassthroughVerifier {
    async fn verify(&self, external_id: &str, _: &str) -> Result<()> {
        match external_id.trim().is_empty() {
            true => Err(Error::InvalidAuth),
            false => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub uid: UserId,
    pub external_id: String,
    pub username: String,
}

#[derive(Debug, Clone, ::serde::Serialize, ::serde::Deserialize)]
struct Claims {
    uid: UserId,
    external_id: String,
    username: String,
    exp: i64,
}

/// HS256 bearer tokens.
pub struct Sessions {
    secret: String,
    ttl: Duration,
}

impl Sessions {
    pub fn new(secret: impl Into<String>, ttl: Duration) -> Self {
        Self {
            secret: secret.into(),
            ttl,
        }
    }

    pub fn issue(&self, user: &User) -> Result<String> {
        let claims = Claims {
            uid: user.id,
            external_id: user.external_id.clone(),
            username: user.username.clone(),
            exp: (Utc::now() + self.ttl).timestamp(),
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| Error::Internal(e.into()))
    }

    pub fn authenticate(&self, token: &str) -> Result<Identity> {
        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::new(Algorithm::HS256),
        )
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => Error::TokenExpired,
            _ => Error::InvalidAuthToken,
        })?;

        let Claims {
            uid,
            external_id,
            username,
            ..
        } = data.claims;

        Ok(Identity {
            uid,
            external_id,
            username,
        })
    }
}
