use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use std::convert::Infallible;

use crate::services::AuthContext;
use crate::startup::AppState;

/// Resolves the caller from the `Authorization` header. Never rejects:
/// a missing or unusable credential yields [`AuthContext::Anonymous`] and the
/// operation guard decides what that caller may do.
#[axum::async_trait]
impl FromRequestParts<AppState> for AuthContext {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok());

        Ok(state.tokens.verify(header))
    }
}
