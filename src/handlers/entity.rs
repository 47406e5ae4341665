//! Dashboard JSON CRUD: paginated search, create, read, update, delete, galleries.

use crate::config::{ParentType, ResolvedEntity};
use crate::error::AppError;
use crate::handlers::{body_to_map, lookup, parse_id};
use crate::response::{success_many, success_one, success_one_ok, success_page};
use crate::service::{check_json_types, clamp_page, CrudService, GalleryImage, GalleryService, RequestValidator};
use crate::sql::ListQuery;
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use serde_json::{json, Value};
use std::collections::HashMap;

const NEXT_SORT_ORDER: &str = "next-sort-order";

fn gallery_parent(entity: &ResolvedEntity) -> Result<ParentType, AppError> {
    entity
        .gallery
        .ok_or_else(|| AppError::NotFound(format!("{} has no gallery", entity.path_segment)))
}

/// `GET /api/dashboard/:entity?query=&page=`
pub async fn list(
    State(state): State<AppState>,
    Path(segment): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, AppError> {
    let entity = lookup(&state, &segment)?;
    let list = ListQuery::new().search(params.get("query").map(String::as_str));
    let page = clamp_page(params.get("page").map(String::as_str));
    let page_size = state.settings.page_size;
    let page = CrudService::page(&state.pool, entity, list, page, page_size).await?;
    let meta = page.meta(page_size);
    Ok(success_page(page.rows, meta))
}

pub async fn create(
    State(state): State<AppState>,
    Path(segment): Path<String>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, AppError> {
    let entity = lookup(&state, &segment)?;
    let body = body_to_map(body)?;
    check_json_types(entity, &body)?;
    RequestValidator::validate(&body, &entity.validation)?;
    RequestValidator::validate_conditional(&body, &entity.conditional)?;
    let row = CrudService::create(&state.pool, entity, &body).await?;
    Ok(success_one(row))
}

/// `GET /api/dashboard/:entity/:id`; the `next-sort-order` id answers `{next}` instead.
pub async fn read(
    State(state): State<AppState>,
    Path((segment, id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let entity = lookup(&state, &segment)?;
    if id == NEXT_SORT_ORDER {
        let next = CrudService::next_sort_order(&state.pool, entity).await?;
        return Ok(success_one_ok(json!({ "next": next })));
    }
    let id = parse_id(&id)?;
    let row = CrudService::read(&state.pool, entity, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("{}/{}", segment, id)))?;
    Ok(success_one_ok(row))
}

/// Partial update. Cross-field rules are checked on the stored row merged with the patch.
pub async fn update(
    State(state): State<AppState>,
    Path((segment, id)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, AppError> {
    let entity = lookup(&state, &segment)?;
    let id = parse_id(&id)?;
    let body = body_to_map(body)?;
    check_json_types(entity, &body)?;
    RequestValidator::validate_partial(&body, &entity.validation)?;
    if !entity.conditional.is_empty() {
        let existing = CrudService::read(&state.pool, entity, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("{}/{}", segment, id)))?;
        let mut merged = body_to_map(existing)?;
        merged.extend(body.iter().map(|(k, v)| (k.clone(), v.clone())));
        RequestValidator::validate_conditional(&merged, &entity.conditional)?;
    }
    let row = CrudService::update(&state.pool, entity, id, &body)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("{}/{}", segment, id)))?;
    Ok(success_one_ok(row))
}

pub async fn delete(
    State(state): State<AppState>,
    Path((segment, id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let entity = lookup(&state, &segment)?;
    let id = parse_id(&id)?;
    let row = CrudService::delete(&state.pool, state.storage.as_ref(), &state.settings.storage, entity, id).await?;
    Ok(success_one_ok(row))
}

pub async fn galleries(
    State(state): State<AppState>,
    Path((segment, id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let entity = lookup(&state, &segment)?;
    let parent = gallery_parent(entity)?;
    let id = parse_id(&id)?;
    let rows = GalleryService::list(&state.pool, id, parent).await?;
    Ok(success_many(rows))
}

/// `PUT /api/dashboard/:entity/:id/galleries` with a JSON array of images; replaces the whole set.
pub async fn replace_galleries(
    State(state): State<AppState>,
    Path((segment, id)): Path<(String, String)>,
    Json(images): Json<Vec<GalleryImage>>,
) -> Result<impl IntoResponse, AppError> {
    let entity = lookup(&state, &segment)?;
    let parent = gallery_parent(entity)?;
    let id = parse_id(&id)?;
    if CrudService::read(&state.pool, entity, id).await?.is_none() {
        return Err(AppError::NotFound(format!("{}/{}", segment, id)));
    }
    let rows = GalleryService::replace(&state.pool, id, parent, images).await?;
    Ok(success_many(rows))
}
