//! Public site API: bare JSON rows, optionally localized with `?lang=`.

use crate::config::{OrderBy, PublicListing, ResolvedEntity};
use crate::error::AppError;
use crate::handlers::{lookup, parse_id};
use crate::locale::{localize, Language};
use crate::response::public_json;
use crate::service::{CrudService, GalleryService};
use crate::sql::{Filter, ListQuery, MAX_LIMIT};
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    response::Response,
    Extension,
};
use serde_json::Value;
use std::collections::HashMap;

const LIST_ALIAS: &str = "public";
const LOCATIONS_ALIAS: &str = "locations";
const BY_CATEGORY: &str = "by-category";
const GALLERIES: &str = "galleries";

/// Path segment of the entity a nested public router serves.
#[derive(Clone, Debug)]
pub struct PublicSegment(pub String);

type Params = HashMap<String, String>;

fn listing(entity: &ResolvedEntity) -> Result<&PublicListing, AppError> {
    entity
        .public
        .as_ref()
        .ok_or_else(|| AppError::NotFound(entity.path_segment.clone()))
}

fn parse_limit(params: &Params) -> Result<Option<u32>, AppError> {
    match params.get("limit").map(|s| s.trim()).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(raw) => raw
            .parse::<u32>()
            .map(|n| Some(n.min(MAX_LIMIT)))
            .map_err(|_| AppError::BadRequest("limit must be a non-negative integer".into())),
    }
}

/// Query-string value typed for an equality filter on `column`.
fn filter_value(entity: &ResolvedEntity, column: &str, raw: &str) -> Result<Value, AppError> {
    match entity.column(column).map(|c| c.pg_type.as_str()) {
        Some("uuid") => Ok(Value::String(parse_id(raw)?.to_string())),
        _ => Ok(Value::String(raw.to_string())),
    }
}

/// Assemble the list query for a public listing from the request's query string.
pub fn public_query(entity: &ResolvedEntity, listing: &PublicListing, params: &Params) -> Result<ListQuery, AppError> {
    let mut list = ListQuery::new()
        .search(params.get("search").map(String::as_str))
        .limit(parse_limit(params)?.or(listing.default_limit));
    for (column, value) in &listing.fixed_filters {
        list = list.filter(column, value.clone());
    }
    for qf in &listing.query_filters {
        let Some(raw) = params.get(&qf.param).map(|s| s.trim()).filter(|s| !s.is_empty()) else {
            continue;
        };
        if let Some(allowed) = &qf.allowed {
            if !allowed.iter().any(|a| a == raw) {
                tracing::debug!(param = %qf.param, value = raw, "ignoring unsupported filter value");
                continue;
            }
        }
        let value = filter_value(entity, &qf.column, raw)?;
        match qf.also_match.as_deref().filter(|extra| *extra != raw) {
            Some(extra) => list.filters.push(Filter::AnyOf {
                column: qf.column.clone(),
                values: vec![value, Value::String(extra.to_string())],
            }),
            None => list.filters.push(Filter::Eq {
                column: qf.column.clone(),
                value,
            }),
        }
    }
    if listing.cover_image {
        list.cover_image = entity.gallery;
    }
    Ok(list)
}

fn localized_rows(entity: &ResolvedEntity, mut rows: Vec<Value>, params: &Params) -> Vec<Value> {
    let Some(raw) = params.get("lang") else { return rows };
    let lang = Language::from_param(Some(raw));
    for row in rows.iter_mut() {
        if let Value::Object(map) = row {
            localize(map, lang, &entity.localized);
        }
    }
    rows
}

async fn list_entity(state: &AppState, segment: &str, params: &Params) -> Result<Response, AppError> {
    let entity = lookup(state, segment)?;
    let listing = listing(entity)?;
    let list = public_query(entity, listing, params)?;
    let rows = CrudService::list(&state.pool, entity, &list).await?;
    tracing::debug!(entity = %segment, rows = rows.len(), "public list");
    Ok(public_json(localized_rows(entity, rows, params), listing.max_age))
}

/// `GET /api/<entity>`
pub async fn list(
    State(state): State<AppState>,
    Extension(PublicSegment(segment)): Extension<PublicSegment>,
    Query(params): Query<Params>,
) -> Result<Response, AppError> {
    list_entity(&state, &segment, &params).await
}

/// `GET /api/<entity>/:id`, plus the `public` listing alias and `/api/projects/locations`.
pub async fn read(
    State(state): State<AppState>,
    Extension(PublicSegment(segment)): Extension<PublicSegment>,
    Path(id): Path<String>,
    Query(params): Query<Params>,
) -> Result<Response, AppError> {
    if id == LIST_ALIAS {
        return list_entity(&state, &segment, &params).await;
    }
    if id == LOCATIONS_ALIAS && segment == "projects" {
        return list_entity(&state, "locations", &params).await;
    }
    let entity = lookup(&state, &segment)?;
    let listing = listing(entity)?;
    let id = parse_id(&id)?;
    let row = CrudService::read(&state.pool, entity, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("{}/{}", segment, id)))?;
    let row = localized_rows(entity, vec![row], &params).pop().unwrap_or(Value::Null);
    Ok(public_json(row, listing.max_age))
}

/// `GET /api/<entity>/:id/galleries` and `GET /api/sub-categorys/by-category/:category_id`.
pub async fn nested(
    State(state): State<AppState>,
    Extension(PublicSegment(segment)): Extension<PublicSegment>,
    Path((first, second)): Path<(String, String)>,
    Query(params): Query<Params>,
) -> Result<Response, AppError> {
    let entity = lookup(&state, &segment)?;
    let listing = listing(entity)?;
    if second == GALLERIES {
        let parent = entity
            .gallery
            .ok_or_else(|| AppError::NotFound(format!("{} has no gallery", segment)))?;
        let rows = GalleryService::list(&state.pool, parse_id(&first)?, parent).await?;
        return Ok(public_json(rows, listing.max_age));
    }
    if first == BY_CATEGORY && entity.has_column("category_id") {
        let category = parse_id(&second)?;
        let mut list = ListQuery::new().filter("category_id", Value::String(category.to_string()));
        list.order = vec![OrderBy::asc("title_en")];
        let rows = CrudService::list(&state.pool, entity, &list).await?;
        return Ok(public_json(localized_rows(entity, rows, &params), listing.max_age));
    }
    Err(AppError::NotFound(format!("{}/{}/{}", segment, first, second)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{build_model, ParentType};
    use serde_json::json;

    fn params(pairs: &[(&str, &str)]) -> Params {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn audio_filter_also_matches_both() {
        let model = build_model();
        let audios = model.entity_by_path("audios").unwrap();
        let q = public_query(audios, audios.public.as_ref().unwrap(), &params(&[("use_for", "landing")])).unwrap();
        assert_eq!(q.limit, Some(1));
        assert!(q.filters.contains(&Filter::eq("is_active", json!(true))));
        assert!(q.filters.contains(&Filter::AnyOf {
            column: "use_for".into(),
            values: vec![json!("landing"), json!("both")],
        }));
    }

    #[test]
    fn unknown_audio_usage_is_ignored() {
        let model = build_model();
        let audios = model.entity_by_path("audios").unwrap();
        let q = public_query(audios, audios.public.as_ref().unwrap(), &params(&[("use_for", "credits")])).unwrap();
        assert_eq!(q.filters.len(), 1);
    }

    #[test]
    fn limit_is_capped_and_validated() {
        let model = build_model();
        let events = model.entity_by_path("event").unwrap();
        let listing = events.public.as_ref().unwrap();
        let q = public_query(events, listing, &params(&[("limit", "5000")])).unwrap();
        assert_eq!(q.limit, Some(MAX_LIMIT));
        assert_eq!(q.cover_image, Some(ParentType::Event));
        assert!(public_query(events, listing, &params(&[("limit", "2; DROP TABLE event")])).is_err());
    }

    #[test]
    fn group_filter_must_be_an_id() {
        let model = build_model();
        let machines = model.entity_by_path("machines").unwrap();
        let listing = machines.public.as_ref().unwrap();
        assert!(public_query(machines, listing, &params(&[("groupId", "abc")])).is_err());
        let id = uuid::Uuid::new_v4().to_string();
        let q = public_query(machines, listing, &params(&[("groupId", id.as_str())])).unwrap();
        assert_eq!(q.filters, vec![Filter::eq("machine_group_id", json!(id))]);
    }

    #[test]
    fn lang_collapses_localized_columns() {
        let model = build_model();
        let quotes = model.entity_by_path("quotes").unwrap();
        let rows = vec![json!({"title_ku": "ku", "title_en": "en", "title_ar": ""})];
        let out = localized_rows(quotes, rows.clone(), &params(&[("lang", "ar")]));
        assert_eq!(out[0]["title"], json!("en"));
        let untouched = localized_rows(quotes, rows, &params(&[]));
        assert!(untouched[0].get("title").is_none());
    }
}
