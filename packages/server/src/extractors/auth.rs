use axum::{extract::FromRequestParts, http::request::Parts};

use crate::error::AppError;
use crate::state::AppState;
use crate::utils::jwt;

/// Authenticated owner extracted from the `Authorization: Bearer <token>` header.
///
/// Add this as a handler parameter to require authentication. Every image
/// operation is scoped to `owner_id`.
#[derive(Debug)]
pub struct AuthUser {
    pub owner_id: String,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("Authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or(AppError::TokenMissing)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(AppError::TokenInvalid)?;

        let claims = jwt::verify(&state.config.auth.jwt_secret, token)
            .map_err(|_| AppError::TokenInvalid)?;
        if claims.sub.is_empty() {
            return Err(AppError::TokenInvalid);
        }

        Ok(AuthUser {
            owner_id: claims.sub,
        })
    }
}
