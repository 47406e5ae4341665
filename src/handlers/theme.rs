//! Seasonal theme switch.

use crate::error::AppError;
use crate::extractors::AdminUser;
use crate::state::AppState;
use crate::theme::{status, MonthDay, ThemeSettings, DEFAULT_THEME};
use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize)]
pub struct ThemeQuery {
    pub theme: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ThemeToggle {
    pub enabled: bool,
    pub theme: Option<String>,
}

fn theme_name(raw: Option<&str>) -> &str {
    raw.map(str::trim).filter(|t| !t.is_empty()).unwrap_or(DEFAULT_THEME)
}

async fn load(state: &AppState, theme: &str) -> Result<Option<ThemeSettings>, AppError> {
    let row = sqlx::query_as::<_, ThemeSettings>(
        "SELECT \"theme_name\", \"is_enabled\", \"auto_enable\", \"start_date\", \"end_date\" \
         FROM \"theme_settings\" WHERE \"theme_name\" = $1",
    )
    .bind(theme)
    .fetch_optional(&state.pool)
    .await?;
    Ok(row)
}

/// `GET /api/theme-settings?theme=`
pub async fn get_status(
    State(state): State<AppState>,
    Query(q): Query<ThemeQuery>,
) -> Result<impl IntoResponse, AppError> {
    let theme = theme_name(q.theme.as_deref());
    let settings = load(&state, theme).await?;
    let today = MonthDay::of(&chrono::Utc::now().date_naive());
    Ok(Json(status(theme, settings.as_ref(), today)))
}

/// `POST /api/theme-settings` with `{enabled}`; admin only.
pub async fn set_enabled(
    admin: AdminUser,
    State(state): State<AppState>,
    Json(body): Json<ThemeToggle>,
) -> Result<impl IntoResponse, AppError> {
    let theme = theme_name(body.theme.as_deref());
    let done = sqlx::query(
        "UPDATE \"theme_settings\" SET \"is_enabled\" = $1, \"updated_at\" = NOW() WHERE \"theme_name\" = $2",
    )
    .bind(body.enabled)
    .bind(theme)
    .execute(&state.pool)
    .await?;
    if done.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("theme-settings/{}", theme)));
    }
    tracing::info!(theme, enabled = body.enabled, admin = %admin.email, "theme switched");
    Ok(Json(json!({ "success": true, "enabled": body.enabled })))
}
