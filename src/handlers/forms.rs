//! Dashboard form actions (`application/x-www-form-urlencoded`), answering with a redirect.

use crate::config::ResolvedEntity;
use crate::error::AppError;
use crate::handlers::{body_to_map, lookup, parse_id};
use crate::service::{coerce_form, split_gallery_form, CrudService, GalleryImage, GalleryService, RequestValidator};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    response::Redirect,
    Form,
};
use serde_json::Value;
use std::collections::HashMap;
use uuid::Uuid;

type Fields = HashMap<String, String>;

fn back_to_list(entity: &ResolvedEntity) -> Redirect {
    Redirect::to(&format!("/dashboard/{}", entity.path_segment))
}

/// Gallery fields only mean something for entities that own a gallery.
fn split(entity: &ResolvedEntity, fields: Fields) -> (Vec<GalleryImage>, Fields) {
    if entity.gallery.is_some() {
        split_gallery_form(fields)
    } else {
        (Vec::new(), fields)
    }
}

fn row_id(row: &Value) -> Result<Uuid, AppError> {
    row.get("id")
        .and_then(Value::as_str)
        .and_then(|s| Uuid::parse_str(s).ok())
        .ok_or(AppError::Db(sqlx::Error::RowNotFound))
}

/// `POST /dashboard/:entity/create`
pub async fn create(
    State(state): State<AppState>,
    Path((segment, action)): Path<(String, String)>,
    Form(fields): Form<Fields>,
) -> Result<Redirect, AppError> {
    if action != "create" {
        return Err(AppError::NotFound(format!("dashboard/{}/{}", segment, action)));
    }
    let entity = lookup(&state, &segment)?;
    let (images, fields) = split(entity, fields);
    let body = coerce_form(entity, fields)?;
    RequestValidator::validate(&body, &entity.validation)?;
    RequestValidator::validate_conditional(&body, &entity.conditional)?;

    let mut tx = state.pool.begin().await?;
    let row = CrudService::create_in(&mut tx, entity, &body).await?;
    if let Some(parent) = entity.gallery {
        GalleryService::replace_in(&mut tx, row_id(&row)?, parent, images).await?;
    }
    tx.commit().await?;
    tracing::info!(entity = %segment, id = ?row.get("id"), "created from form");
    Ok(back_to_list(entity))
}

/// `POST /dashboard/:entity/:id/edit` and `POST /dashboard/:entity/:id/delete`
pub async fn act(
    State(state): State<AppState>,
    Path((segment, id, action)): Path<(String, String, String)>,
    Form(fields): Form<Fields>,
) -> Result<Redirect, AppError> {
    match action.as_str() {
        "edit" => edit(&state, &segment, &id, fields).await,
        "delete" => {
            let entity = lookup(&state, &segment)?;
            let id = parse_id(&id)?;
            CrudService::delete(&state.pool, state.storage.as_ref(), &state.settings.storage, entity, id).await?;
            Ok(back_to_list(entity))
        }
        _ => Err(AppError::NotFound(format!("dashboard/{}/{}/{}", segment, id, action))),
    }
}

async fn edit(state: &AppState, segment: &str, id: &str, fields: Fields) -> Result<Redirect, AppError> {
    let entity = lookup(state, segment)?;
    let id = parse_id(id)?;
    let (images, fields) = split(entity, fields);
    let body = coerce_form(entity, fields)?;
    RequestValidator::validate_partial(&body, &entity.validation)?;
    if !entity.conditional.is_empty() {
        let existing = CrudService::read(&state.pool, entity, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("{}/{}", segment, id)))?;
        let mut merged = body_to_map(existing)?;
        merged.extend(body.iter().map(|(k, v)| (k.clone(), v.clone())));
        RequestValidator::validate_conditional(&merged, &entity.conditional)?;
    }

    let mut tx = state.pool.begin().await?;
    if CrudService::update_in(&mut tx, entity, id, &body).await?.is_none() {
        tx.rollback().await?;
        return Err(AppError::NotFound(format!("{}/{}", segment, id)));
    }
    if let Some(parent) = entity.gallery {
        GalleryService::replace_in(&mut tx, id, parent, images).await?;
    }
    tx.commit().await?;
    tracing::info!(entity = %segment, %id, "updated from form");
    Ok(back_to_list(entity))
}
