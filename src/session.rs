//! Resolución de la sesión del usuario.
//!
//! La autenticación la hace una capa anterior (proxy o pasarela) que deja el
//! email del usuario en la cabecera configurada en `SESSION_HEADER`. Aquí sólo
//! se lee esa cabecera.

use std::convert::Infallible;

use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap},
};

use crate::{app_state::AppState, error::ApiError};

/// Identidad autenticada de la petición.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub email: String,
}

pub fn resolve_identity(headers: &HeaderMap, header_name: &str) -> Option<Identity> {
    headers
        .get(header_name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|email| !email.is_empty())
        .map(|email| Identity {
            email: email.to_string(),
        })
}

/// Extractor que exige sesión (401 si no la hay).
pub struct CurrentIdentity(pub Identity);

/// Extractor que admite peticiones anónimas.
pub struct MaybeIdentity(pub Option<Identity>);

#[async_trait]
impl FromRequestParts<AppState> for MaybeIdentity {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(MaybeIdentity(resolve_identity(
            &parts.headers,
            &state.config.session_header,
        )))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentIdentity {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        resolve_identity(&parts.headers, &state.config.session_header)
            .map(CurrentIdentity)
            .ok_or(ApiError::Unauthenticated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use pretty_assertions::assert_eq;

    #[test]
    fn reads_configured_header() {
        let mut headers = HeaderMap::new();
        headers.insert("x-user-email", HeaderValue::from_static(" ana@example.com "));
        assert_eq!(
            resolve_identity(&headers, "x-user-email"),
            Some(Identity {
                email: "ana@example.com".into()
            })
        );
        assert_eq!(resolve_identity(&headers, "x-forwarded-email"), None);
    }

    #[test]
    fn blank_header_is_no_session() {
        let mut headers = HeaderMap::new();
        headers.insert("x-user-email", HeaderValue::from_static("   "));
        assert_eq!(resolve_identity(&headers, "x-user-email"), None);
    }
}
