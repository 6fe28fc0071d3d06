use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap},
};
use std::collections::BTreeMap;

use crate::api::handlers::AppState;
use crate::error::{ApiError, ApiResult};
use crate::model::{Gate, Identity, ResourceKind};
use crate::store::traits::Store;

pub const AUTH_EMAIL_HEADER: &str = "x-auth-rioos-email";

/// Checks bearer credentials against the configured token table.
#[derive(Debug, Clone, Default)]
pub struct Authenticator {
    /// bearer token -> email
    tokens: BTreeMap<String, String>,
}

impl Authenticator {
    pub fn new(tokens: BTreeMap<String, String>) -> Self {
        Self { tokens }
    }

    /// `kind` picks the answer for a request carrying no credentials at all.
    pub fn authenticate(
        &self,
        kind: Option<ResourceKind>,
        authorization: Option<&str>,
        email: Option<&str>,
    ) -> ApiResult<Identity> {
        let (authorization, email) = match (authorization, email) {
            (None, None) => {
                return Err(match kind.map(|k| k.gate()) {
                    Some(Gate::NotAcceptable) => {
                        ApiError::NotAcceptable("credential headers required".to_string())
                    }
                    _ => ApiError::Unauthorized("credential headers required".to_string()),
                })
            }
            (None, Some(_)) => {
                return Err(ApiError::Unauthorized("missing Authorization header".to_string()))
            }
            (Some(_), None) => {
                return Err(ApiError::Unauthorized(
                    "missing X-AUTH-RIOOS-EMAIL header".to_string(),
                ))
            }
            (Some(authorization), Some(email)) => (authorization, email.trim()),
        };

        let token = bearer_token(authorization)
            .ok_or_else(|| ApiError::Unauthorized("expected a bearer token".to_string()))?;
        if email.is_empty() {
            return Err(ApiError::Unauthorized("empty X-AUTH-RIOOS-EMAIL header".to_string()));
        }

        if !self.tokens.is_empty() {
            let known = self
                .tokens
                .get(token)
                .map(|owner| owner.eq_ignore_ascii_case(email))
                .unwrap_or(false);
            if !known {
                let identity = Identity::new(email, token);
                log::warn!(
                    "Rejected credentials for {} [{}]",
                    identity.email,
                    identity.token_fingerprint
                );
                return Err(ApiError::Unauthorized("invalid credentials".to_string()));
            }
        }

        Ok(Identity::new(email, token))
    }
}

fn bearer_token(authorization: &str) -> Option<&str> {
    let (scheme, token) = authorization.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// Present headers that are not valid UTF-8 still count as present, so they
/// fail as invalid credentials instead of as missing ones.
fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .map(|value| value.to_str().unwrap_or_default())
}

#[async_trait]
impl<S> FromRequestParts<AppState<S>> for Identity
where
    S: Store + 'static,
{
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState<S>,
    ) -> Result<Self, Self::Rejection> {
        let kind = parts.extensions.get::<ResourceKind>().copied();
        let headers = &parts.headers;
        state.auth.authenticate(
            kind,
            header_value(headers, "authorization"),
            header_value(headers, AUTH_EMAIL_HEADER),
        )
    }
}
