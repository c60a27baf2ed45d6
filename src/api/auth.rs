use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use super::AppState;
use crate::errors::{Error, Result};
use crate::session::Identity;
use crate::usecases::user::authenticate;

const AUTH_METHOD: &str = "Bearer";
const MAX_TOKEN_LEN: usize = 1000;

/// Splits an `Authorization` header value into its bearer token.
fn bearer_token(header: &str) -> Result<&str> {
    let parts = header.split(' ').collect::<Vec<_>>();
    let [method, token] = parts[..] else {
        return Err(Error::InvalidAuth);
    };

    if token.len() > MAX_TOKEN_LEN {
        return Err(Error::InvalidAuthToken);
    }
    if method != AUTH_METHOD {
        return Err(Error::InvalidAuthMethod);
    }

    Ok(token)
}

/// The caller, when an `Authorization` header is present.
///
/// A present but malformed header is rejected even on public routes.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<Identity>);

impl MaybeUser {
    pub fn uid(&self) -> Option<crate::entities::UserId> { self.0.as_ref().map(|i| i.uid) }
}

#[async_trait]
impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let header = match parts.headers.get(AUTHORIZATION) {
            Some(h) => h.to_str().map_err(|_| Error::InvalidAuth)?,
            None => return Ok(MaybeUser(None)),
        };
        if header.is_empty() {
            return Ok(MaybeUser(None));
        }

        let token = bearer_token(header)?.to_string();
        let authenticate::Output { identity } = state
            .authenticate
            .handle(authenticate::Input { token })
            .await?;

        tracing::trace!("caller - {}", identity.uid);
        Ok(MaybeUser(Some(identity)))
    }
}

/// The authenticated caller; anonymous requests are unauthorized.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Identity);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        MaybeUser::from_request_parts(parts, state)
            .await?
            .0
            .map(CurrentUser)
            .ok_or(Error::Unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bearer_header() {
        assert_eq!(bearer_token("Bearer abc").unwrap(), "abc");
        assert!(matches!(bearer_token("Bearer"), Err(Error::InvalidAuth)));
        assert!(matches!(bearer_token("Bearer a b"), Err(Error::InvalidAuth)));
        assert!(matches!(
            bearer_token("Basic abc"),
            Err(Error::InvalidAuthMethod)
        ));
        assert!(matches!(
            bearer_token(&format!("Bearer {}", "x".repeat(1001))),
            Err(Error::InvalidAuthToken)
        ));
    }
}
