//! Extractors that authenticate the caller before a handler runs.

use axum::RequestPartsExt;
use axum::extract::{FromRequestParts, Query};
use axum::http::request::Parts;
use axum_extra::TypedHeader;
use axum_extra::headers::Authorization;
use axum_extra::headers::authorization::Bearer;

use quikchat_core::error::AppError;
use quikchat_core::types::AuthenticatedUser;

use crate::dto::request::WsQuery;
use crate::error::ApiError;
use crate::state::AppState;

/// Authenticated caller of a REST endpoint (`Authorization: Bearer`).
#[derive(Debug, Clone)]
pub struct AuthUser(pub AuthenticatedUser);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .await
            .ok_or_else(|| AppError::authentication("Missing or invalid Authorization header"))?;
        let user = state.authenticator.authenticate(&token).await?;
        Ok(Self(user))
    }
}

/// Authenticated WebSocket peer.
///
/// Reads `?token=` first and falls back to the `Authorization` header.
/// Runs before the upgrade so a bad token gets a plain 401.
#[derive(Debug, Clone)]
pub struct WsAuth(pub AuthenticatedUser);

impl FromRequestParts<AppState> for WsAuth {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let query = Query::<WsQuery>::try_from_uri(&parts.uri)
            .map(|Query(q)| q)
            .unwrap_or_default();

        let token = match query.token.filter(|t| !t.is_empty()) {
            Some(token) => token,
            None => bearer_token(parts)
                .await
                .ok_or_else(|| AppError::authentication("Missing access token"))?,
        };

        let user = state.authenticator.authenticate(&token).await.map_err(|e| {
            tracing::debug!(error = %e, "WebSocket authentication failed");
            e
        })?;
        Ok(Self(user))
    }
}

async fn bearer_token(parts: &mut Parts) -> Option<String> {
    parts
        .extract::<TypedHeader<Authorization<Bearer>>>()
        .await
        .ok()
        .map(|TypedHeader(Authorization(bearer))| bearer.token().to_string())
}
