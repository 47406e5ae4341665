//! Generic CRUD execution against PostgreSQL.

use crate::config::{ResolvedEntity, StorageSettings};
use crate::error::AppError;
use crate::service::pagination::{offset_for, total_pages, Page};
use crate::sql::{count, delete, delete_galleries, insert, next_value, select_by_id, select_list, update, ListQuery, PgBindValue, QueryBuf};
use crate::storage::{extract_file_id, ObjectStore};
use serde_json::Value;
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::{PgConnection, PgPool, Postgres};
use std::collections::HashMap;
use uuid::Uuid;

pub struct CrudService;

impl CrudService {
    /// List rows with filters, search, ordering and limit (max 1000).
    pub async fn list(pool: &PgPool, entity: &ResolvedEntity, list: &ListQuery) -> Result<Vec<Value>, AppError> {
        let q = select_list(entity, list);
        Self::query_many(pool, &q).await
    }

    pub async fn count(pool: &PgPool, entity: &ResolvedEntity, list: &ListQuery) -> Result<u64, AppError> {
        let q = count(entity, list);
        let row = Self::query_one(pool, &q).await?;
        let total = row.as_ref().and_then(|r| r.get("total")).and_then(Value::as_i64).unwrap_or(0);
        Ok(total.max(0) as u64)
    }

    /// One page of `list` plus the total matching count. Pages past the end come back empty.
    pub async fn page(
        pool: &PgPool,
        entity: &ResolvedEntity,
        list: ListQuery,
        page: u32,
        page_size: u32,
    ) -> Result<Page, AppError> {
        let page = page.max(1);
        let total = Self::count(pool, entity, &list).await?;
        let windowed = ListQuery {
            limit: Some(page_size),
            offset: Some(offset_for(page, page_size)),
            ..list
        };
        let rows = Self::list(pool, entity, &windowed).await?;
        Ok(Page {
            rows,
            total,
            total_pages: total_pages(total, page_size),
            page,
        })
    }

    /// Fetch one row by primary key.
    pub async fn read(pool: &PgPool, entity: &ResolvedEntity, id: Uuid) -> Result<Option<Value>, AppError> {
        let q = select_by_id(entity, id);
        Self::query_one(pool, &q).await
    }

    /// Insert one row; key and timestamps come from DB defaults. Returns the created row.
    pub async fn create(
        pool: &PgPool,
        entity: &ResolvedEntity,
        body: &HashMap<String, Value>,
    ) -> Result<Value, AppError> {
        let q = insert(entity, body);
        let row = Self::query_one(pool, &q).await?.ok_or(AppError::Db(sqlx::Error::RowNotFound))?;
        tracing::info!(entity = %entity.path_segment, id = ?row.get("id"), "created");
        Ok(row)
    }

    /// Same as [`CrudService::create`] inside a caller-owned transaction.
    pub async fn create_in(
        conn: &mut PgConnection,
        entity: &ResolvedEntity,
        body: &HashMap<String, Value>,
    ) -> Result<Value, AppError> {
        let q = insert(entity, body);
        Self::query_one_in(conn, &q).await?.ok_or(AppError::Db(sqlx::Error::RowNotFound))
    }

    /// Update one row by id. `None` when the id does not exist.
    pub async fn update(
        pool: &PgPool,
        entity: &ResolvedEntity,
        id: Uuid,
        body: &HashMap<String, Value>,
    ) -> Result<Option<Value>, AppError> {
        let q = update(entity, id, body);
        Self::query_one(pool, &q).await
    }

    pub async fn update_in(
        conn: &mut PgConnection,
        entity: &ResolvedEntity,
        id: Uuid,
        body: &HashMap<String, Value>,
    ) -> Result<Option<Value>, AppError> {
        let q = update(entity, id, body);
        Self::query_one_in(conn, &q).await
    }

    /// Delete one row and its gallery in a single transaction, then drop the referenced
    /// media from object storage (best-effort). A missing id rolls back and leaves
    /// galleries untouched.
    pub async fn delete(
        pool: &PgPool,
        storage: &dyn ObjectStore,
        storage_settings: &StorageSettings,
        entity: &ResolvedEntity,
        id: Uuid,
    ) -> Result<Value, AppError> {
        let mut tx = pool.begin().await?;
        let Some(row) = Self::query_one_in(&mut tx, &delete(entity, id)).await? else {
            tx.rollback().await?;
            return Err(AppError::NotFound(format!("{}/{}", entity.path_segment, id)));
        };
        let galleries = match entity.gallery {
            Some(parent) => Self::query_many_in(&mut tx, &delete_galleries(id, parent)).await?,
            None => Vec::new(),
        };
        tx.commit().await?;
        tracing::info!(entity = %entity.path_segment, %id, galleries = galleries.len(), "deleted");

        let urls: Vec<String> = entity
            .file_columns
            .iter()
            .filter_map(|c| row.get(c))
            .chain(galleries.iter().filter_map(|g| g.get("image_url")))
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect();
        remove_media(storage, storage_settings, urls.iter().map(String::as_str)).await;
        Ok(row)
    }

    /// `MAX(sort_order) + 1`, 0 for an empty table.
    pub async fn next_sort_order(pool: &PgPool, entity: &ResolvedEntity) -> Result<i64, AppError> {
        if !entity.has_column("sort_order") {
            return Err(AppError::BadRequest(format!("{} has no sort order", entity.path_segment)));
        }
        let q = next_value(entity, "sort_order");
        let row = Self::query_one(pool, &q).await?;
        Ok(row.as_ref().and_then(|r| r.get("next")).and_then(Value::as_i64).unwrap_or(0))
    }

    pub(crate) async fn query_one(pool: &PgPool, q: &QueryBuf) -> Result<Option<Value>, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let row = bind_all(q).fetch_optional(pool).await?;
        Ok(row.map(|r| row_to_json(&r)))
    }

    pub(crate) async fn query_many(pool: &PgPool, q: &QueryBuf) -> Result<Vec<Value>, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let rows = bind_all(q).fetch_all(pool).await?;
        Ok(rows.iter().map(row_to_json).collect())
    }

    pub(crate) async fn query_one_in(conn: &mut PgConnection, q: &QueryBuf) -> Result<Option<Value>, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query (tx)");
        let row = bind_all(q).fetch_optional(&mut *conn).await?;
        Ok(row.map(|r| row_to_json(&r)))
    }

    pub(crate) async fn query_many_in(conn: &mut PgConnection, q: &QueryBuf) -> Result<Vec<Value>, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query (tx)");
        let rows = bind_all(q).fetch_all(&mut *conn).await?;
        Ok(rows.iter().map(row_to_json).collect())
    }
}

/// Delete stored objects behind `urls`. Failures are logged, never returned.
pub async fn remove_media<'a, I>(storage: &dyn ObjectStore, settings: &StorageSettings, urls: I)
where
    I: IntoIterator<Item = &'a str>,
{
    for url in urls {
        let Some(key) = extract_file_id(settings, url) else {
            if !url.trim().is_empty() {
                tracing::debug!(url, "not a stored object, skipping cleanup");
            }
            continue;
        };
        match storage.delete(&key).await {
            Ok(true) => tracing::info!(key = %key, "removed stored media"),
            Ok(false) => tracing::warn!(key = %key, "stored media was not removed"),
            Err(e) => tracing::warn!(key = %key, error = %e, "failed to remove stored media"),
        }
    }
}

fn bind_all(q: &QueryBuf) -> sqlx::query::Query<'_, Postgres, PgArguments> {
    let mut query = sqlx::query(&q.sql);
    for p in &q.params {
        query = query.bind(PgBindValue::from_json(p));
    }
    query
}

pub(crate) fn row_to_json(row: &PgRow) -> Value {
    use sqlx::Column;
    use sqlx::Row;
    let mut map = serde_json::Map::new();
    for col in row.columns() {
        let name = col.name();
        map.insert(name.to_string(), cell_to_value(row, name));
    }
    Value::Object(map)
}

fn cell_to_value(row: &PgRow, name: &str) -> Value {
    use sqlx::Row;
    if let Ok(Some(n)) = row.try_get::<Option<i16>, _>(name) {
        return Value::from(n);
    }
    if let Ok(Some(n)) = row.try_get::<Option<i32>, _>(name) {
        return Value::from(n);
    }
    if let Ok(Some(n)) = row.try_get::<Option<i64>, _>(name) {
        return Value::from(n);
    }
    if let Ok(Some(n)) = row.try_get::<Option<f64>, _>(name) {
        if let Some(n) = serde_json::Number::from_f64(n) {
            return Value::Number(n);
        }
    }
    if let Ok(Some(b)) = row.try_get::<Option<bool>, _>(name) {
        return Value::Bool(b);
    }
    if let Ok(Some(u)) = row.try_get::<Option<Uuid>, _>(name) {
        return Value::String(u.to_string());
    }
    if let Ok(Some(d)) = row.try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(name) {
        return Value::String(d.to_rfc3339());
    }
    if let Ok(Some(d)) = row.try_get::<Option<chrono::NaiveDate>, _>(name) {
        return Value::String(d.format("%Y-%m-%d").to_string());
    }
    if let Ok(Some(s)) = row.try_get::<Option<String>, _>(name) {
        return Value::String(s);
    }
    if let Ok(Some(j)) = row.try_get::<Option<Value>, _>(name) {
        return j;
    }
    Value::Null
}
