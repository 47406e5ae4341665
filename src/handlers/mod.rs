//! HTTP handlers: public site, dashboard JSON and form actions, uploads, auth, theme.

pub mod auth;
pub mod entity;
pub mod forms;
pub mod public;
pub mod theme;
pub mod upload;

use crate::config::ResolvedEntity;
use crate::error::AppError;
use crate::state::AppState;
use serde_json::Value;
use std::collections::HashMap;
use uuid::Uuid;

/// Resolve an entity by path segment; unknown segments are a 404.
pub(crate) fn lookup<'a>(state: &'a AppState, segment: &str) -> Result<&'a ResolvedEntity, AppError> {
    state
        .model
        .entity_by_path(segment)
        .ok_or_else(|| AppError::NotFound(segment.to_string()))
}

pub(crate) fn parse_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw.trim()).map_err(|_| AppError::BadRequest(format!("invalid id '{}'", raw)))
}

pub(crate) fn body_to_map(value: Value) -> Result<HashMap<String, Value>, AppError> {
    match value {
        Value::Object(m) => Ok(m.into_iter().collect()),
        _ => Err(AppError::BadRequest("body must be a JSON object".into())),
    }
}
