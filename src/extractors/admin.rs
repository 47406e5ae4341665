//! Authenticated admin from the session token (Bearer header or `session` cookie).

use crate::auth::{token_from_headers, validate_token};
use crate::error::AppError;
use crate::state::AppState;
use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Request},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

#[derive(Clone, Debug)]
pub struct AdminUser {
    pub id: Uuid,
    pub email: String,
}

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        if let Some(admin) = parts.extensions.get::<AdminUser>() {
            return Ok(admin.clone());
        }
        let token = token_from_headers(&parts.headers)
            .ok_or_else(|| AppError::Unauthorized("missing session".into()))?;
        let claims = validate_token(&token, &state.settings.auth_secret)
            .map_err(|_| AppError::Unauthorized("invalid or expired session".into()))?;
        Ok(AdminUser {
            id: claims.sub,
            email: claims.email,
        })
    }
}

/// Layer guard for gated routers: rejects with 401 before the handler runs.
pub async fn require_admin(admin: AdminUser, mut req: Request, next: Next) -> Response {
    tracing::debug!(admin = %admin.email, path = %req.uri().path(), "authorized");
    req.extensions_mut().insert(admin);
    next.run(req).await
}
