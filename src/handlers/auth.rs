//! Login and logout.

use crate::auth::{
    clear_session_cookie, find_user_by_email, issue_token, session_cookie, verify_password, PublicUser, MIN_PASSWORD_LEN,
};
use crate::error::{AppError, ConfigError};
use crate::service::is_email;
use crate::state::AppState;
use axum::{
    extract::{FromRequest, Request, State},
    http::header,
    response::{IntoResponse, Response},
    Form, Json,
};
use serde::Deserialize;
use serde_json::json;

const INVALID_CREDENTIALS: &str = "Invalid credentials.";

#[derive(Debug, Default, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl Credentials {
    fn check(&self) -> Result<(), AppError> {
        if !is_email(&self.email) {
            return Err(AppError::Validation("email must be a valid email address".into()));
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AppError::Validation(format!(
                "password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }
        Ok(())
    }
}

fn is_form(req: &Request) -> bool {
    req.headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.starts_with("application/x-www-form-urlencoded"))
        .unwrap_or(false)
}

async fn credentials(req: Request, state: &AppState) -> Result<Credentials, AppError> {
    if is_form(&req) {
        let Form(c) = Form::<Credentials>::from_request(req, state)
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        Ok(c)
    } else {
        let Json(c) = Json::<Credentials>::from_request(req, state)
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        Ok(c)
    }
}

/// `POST /api/auth/login` with `{email, password}` as JSON or a form.
pub async fn login(State(state): State<AppState>, req: Request) -> Result<Response, AppError> {
    let creds = credentials(req, &state).await?;
    creds.check()?;

    let Some(user) = find_user_by_email(&state.pool, creds.email.trim()).await? else {
        tracing::info!(email = %creds.email, "login for unknown user");
        return Err(AppError::Unauthorized(INVALID_CREDENTIALS.into()));
    };
    if !verify_password(&creds.password, &user.password).unwrap_or(false) {
        tracing::info!(email = %user.email, "login with wrong password");
        return Err(AppError::Unauthorized(INVALID_CREDENTIALS.into()));
    }

    let ttl = state.settings.session_ttl_mins;
    let (token, _) = issue_token(user.id, &user.email, &state.settings.auth_secret, ttl)
        .map_err(|e| AppError::Config(ConfigError::Load(format!("session signing: {}", e))))?;
    let expires_in = ttl * 60;
    tracing::info!(email = %user.email, "logged in");
    Ok((
        [(header::SET_COOKIE, session_cookie(&token, expires_in))],
        Json(json!({
            "token": token,
            "expires_in": expires_in,
            "user": PublicUser::from(&user),
        })),
    )
        .into_response())
}

/// `POST /api/auth/logout`
pub async fn logout() -> Response {
    ([(header::SET_COOKIE, clear_session_cookie())], Json(json!({ "success": true }))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credentials_are_checked_before_lookup() {
        let short = Credentials {
            email: "admin@example.com".into(),
            password: "12345".into(),
        };
        assert!(matches!(short.check(), Err(AppError::Validation(_))));
        let bad_email = Credentials {
            email: "admin".into(),
            password: "123456".into(),
        };
        assert!(matches!(bad_email.check(), Err(AppError::Validation(_))));
        let ok = Credentials {
            email: "admin@example.com".into(),
            password: "123456".into(),
        };
        assert!(ok.check().is_ok());
    }
}
