//! Admin capability check for mutating routes (`X-Admin-Token` header).

use crate::error::AppError;
use crate::state::AppState;
use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};

/// Header carrying the admin token.
pub const ADMIN_TOKEN_HEADER: &str = "X-Admin-Token";

/// Byte comparison whose running time does not depend on where the tokens differ.
fn tokens_match(presented: &str, expected: &str) -> bool {
    let (a, b) = (presented.as_bytes(), expected.as_bytes());
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Proof that the request presented the configured admin token.
#[derive(Clone, Debug)]
pub struct AdminAccess;

#[async_trait]
impl FromRequestParts<AppState> for AdminAccess {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Some(expected) = state.admin_token.as_deref() else {
            return Err(AppError::Forbidden("admin operations are disabled".into()));
        };
        let presented = parts
            .headers
            .get(ADMIN_TOKEN_HEADER)
            .and_then(|v: &axum::http::HeaderValue| v.to_str().ok())
            .map(str::trim)
            .filter(|s| !s.is_empty());
        match presented {
            Some(token) if tokens_match(token, expected) => Ok(AdminAccess),
            Some(_) => Err(AppError::Forbidden("invalid admin token".into())),
            None => Err(AppError::Forbidden(format!("{} header is required", ADMIN_TOKEN_HEADER))),
        }
    }
}
