//! Builds parameterized SELECT, INSERT, UPDATE, DELETE from the resolved entity.

use crate::config::{OrderBy, ParentType, ResolvedEntity};
use serde_json::Value;
use std::collections::HashMap;
use uuid::Uuid;

pub const GALLERY_TABLE: &str = "galleries";
pub const USERS_TABLE: &str = "users";
/// Hard cap on any list query.
pub const MAX_LIMIT: u32 = 1000;

const MAIN_ALIAS: &str = "main";
const COVER_KEY: &str = "gallery_image_url";
/// Columns the database maintains; never written from request bodies.
const MANAGED_COLUMNS: [&str; 2] = ["created_at", "updated_at"];

/// Quote identifier for PostgreSQL (safe: only from the catalog).
pub(crate) fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

#[derive(Debug)]
pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<Value>,
}

impl QueryBuf {
    fn new() -> Self {
        QueryBuf {
            sql: String::new(),
            params: Vec::new(),
        }
    }

    fn push_param(&mut self, v: Value) -> u32 {
        let n = self.params.len() as u32 + 1;
        self.params.push(v);
        n
    }

    /// Push a value and return its placeholder with a cast to `pg_type`.
    fn placeholder(&mut self, v: Value, pg_type: &str) -> String {
        let n = self.push_param(v);
        format!("${}::{}", n, pg_type)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Filter {
    Eq { column: String, value: Value },
    AnyOf { column: String, values: Vec<Value> },
}

impl Filter {
    pub fn eq(column: &str, value: Value) -> Self {
        Filter::Eq {
            column: column.to_string(),
            value,
        }
    }
}

/// Everything a list or count query can be narrowed by.
#[derive(Clone, Debug, Default)]
pub struct ListQuery {
    pub filters: Vec<Filter>,
    /// Case-insensitive substring matched against the entity's search columns.
    pub search: Option<String>,
    /// Overrides the entity's default order when non-empty.
    pub order: Vec<OrderBy>,
    /// Attach the first gallery image of this parent type as `gallery_image_url`.
    pub cover_image: Option<ParentType>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl ListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, column: &str, value: Value) -> Self {
        self.filters.push(Filter::eq(column, value));
        self
    }

    pub fn search(mut self, term: Option<&str>) -> Self {
        self.search = term.map(str::trim).filter(|t| !t.is_empty()).map(str::to_string);
        self
    }

    pub fn limit(mut self, limit: Option<u32>) -> Self {
        self.limit = limit;
        self
    }
}

/// Escape `%`, `_` and `\` and wrap the term for a substring ILIKE.
pub fn like_pattern(term: &str) -> String {
    let mut out = String::with_capacity(term.len() + 2);
    out.push('%');
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out.push('%');
    out
}

fn column_list(entity: &ResolvedEntity, alias: Option<&str>) -> String {
    entity
        .columns
        .iter()
        .map(|c| match alias {
            Some(a) => format!("{}.{}", a, quoted(&c.name)),
            None => quoted(&c.name),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn pg_type_of<'a>(entity: &'a ResolvedEntity, column: &str) -> &'a str {
    entity.column(column).map(|c| c.pg_type.as_str()).unwrap_or("text")
}

fn where_clause(entity: &ResolvedEntity, list: &ListQuery, q: &mut QueryBuf) -> String {
    let mut parts = Vec::new();
    for f in &list.filters {
        match f {
            Filter::Eq { column, value } if entity.has_column(column) => {
                let ph = q.placeholder(value.clone(), pg_type_of(entity, column));
                parts.push(format!("{}.{} = {}", MAIN_ALIAS, quoted(column), ph));
            }
            Filter::AnyOf { column, values } if entity.has_column(column) && !values.is_empty() => {
                let pg_type = pg_type_of(entity, column);
                let phs: Vec<String> = values.iter().map(|v| q.placeholder(v.clone(), pg_type)).collect();
                parts.push(format!("{}.{} IN ({})", MAIN_ALIAS, quoted(column), phs.join(", ")));
            }
            _ => {}
        }
    }
    if let Some(term) = &list.search {
        if !entity.search_columns.is_empty() {
            let n = q.push_param(Value::String(like_pattern(term)));
            let ors: Vec<String> = entity
                .search_columns
                .iter()
                .map(|c| format!("{}.{} ILIKE ${}", MAIN_ALIAS, quoted(c), n))
                .collect();
            parts.push(format!("({})", ors.join(" OR ")));
        }
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", parts.join(" AND "))
    }
}

fn order_clause(entity: &ResolvedEntity, list: &ListQuery) -> String {
    let order = if list.order.is_empty() { &entity.default_order } else { &list.order };
    let mut parts: Vec<String> = order
        .iter()
        .filter(|o| entity.has_column(&o.column))
        .map(|o| format!("{}.{} {}", MAIN_ALIAS, quoted(&o.column), o.direction))
        .collect();
    // Tie-break on the key so pages are stable.
    parts.push(format!("{}.{} ASC", MAIN_ALIAS, quoted(&entity.pk_column)));
    format!(" ORDER BY {}", parts.join(", "))
}

fn cover_subquery(entity: &ResolvedEntity, parent: ParentType, q: &mut QueryBuf) -> String {
    let ph = q.placeholder(Value::from(parent.as_i16()), "smallint");
    format!(
        "(SELECT g.\"image_url\" FROM {} g WHERE g.\"parent_id\" = {}.{} AND g.\"parent_type\" = {} \
         ORDER BY g.\"order_index\" ASC, g.\"created_at\" ASC LIMIT 1) AS {}",
        quoted(GALLERY_TABLE),
        MAIN_ALIAS,
        quoted(&entity.pk_column),
        ph,
        quoted(COVER_KEY)
    )
}

/// SELECT by primary key.
pub fn select_by_id(entity: &ResolvedEntity, id: Uuid) -> QueryBuf {
    let mut q = QueryBuf::new();
    let ph = q.placeholder(Value::String(id.to_string()), "uuid");
    q.sql = format!(
        "SELECT {} FROM {} {} WHERE {}.{} = {}",
        column_list(entity, Some(MAIN_ALIAS)),
        quoted(&entity.table_name),
        MAIN_ALIAS,
        MAIN_ALIAS,
        quoted(&entity.pk_column),
        ph
    );
    q
}

/// SELECT list: filters, search, ordering, optional cover image; LIMIT/OFFSET are bound parameters.
pub fn select_list(entity: &ResolvedEntity, list: &ListQuery) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut select_parts = vec![column_list(entity, Some(MAIN_ALIAS))];
    if let Some(parent) = list.cover_image {
        select_parts.push(cover_subquery(entity, parent, &mut q));
    }
    let where_sql = where_clause(entity, list, &mut q);
    let order_sql = order_clause(entity, list);
    let limit = list.limit.unwrap_or(MAX_LIMIT).min(MAX_LIMIT);
    let limit_ph = q.placeholder(Value::from(limit), "bigint");
    let offset_sql = match list.offset {
        Some(off) if off > 0 => format!(" OFFSET {}", q.placeholder(Value::from(off), "bigint")),
        _ => String::new(),
    };
    q.sql = format!(
        "SELECT {} FROM {} {}{}{} LIMIT {}{}",
        select_parts.join(", "),
        quoted(&entity.table_name),
        MAIN_ALIAS,
        where_sql,
        order_sql,
        limit_ph,
        offset_sql
    );
    q
}

/// SELECT COUNT(*) with the same WHERE as [`select_list`].
pub fn count(entity: &ResolvedEntity, list: &ListQuery) -> QueryBuf {
    let mut q = QueryBuf::new();
    let where_sql = where_clause(entity, list, &mut q);
    q.sql = format!(
        "SELECT COUNT(*) AS \"total\" FROM {} {}{}",
        quoted(&entity.table_name),
        MAIN_ALIAS,
        where_sql
    );
    q
}

/// INSERT: columns present in body (catalog columns only). Key and timestamps come from DB defaults.
pub fn insert(entity: &ResolvedEntity, body: &HashMap<String, Value>) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut cols = Vec::new();
    let mut placeholders = Vec::new();
    for c in &entity.columns {
        if c.name == entity.pk_column || MANAGED_COLUMNS.contains(&c.name.as_str()) {
            continue;
        }
        let val = match body.get(&c.name) {
            Some(v) => v.clone(),
            None if c.has_default() => continue,
            None => Value::Null,
        };
        placeholders.push(q.placeholder(val, &c.pg_type));
        cols.push(quoted(&c.name));
    }
    let table = quoted(&entity.table_name);
    let returning = column_list(entity, None);
    q.sql = if cols.is_empty() {
        format!("INSERT INTO {} DEFAULT VALUES RETURNING {}", table, returning)
    } else {
        format!(
            "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
            table,
            cols.join(", "),
            placeholders.join(", "),
            returning
        )
    };
    q
}

/// UPDATE by id: SET only catalog columns present in body, and always `updated_at = NOW()`.
pub fn update(entity: &ResolvedEntity, id: Uuid, body: &HashMap<String, Value>) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut sets = Vec::new();
    for c in &entity.columns {
        if c.name == entity.pk_column || MANAGED_COLUMNS.contains(&c.name.as_str()) {
            continue;
        }
        let Some(v) = body.get(&c.name) else { continue };
        let rhs = q.placeholder(v.clone(), &c.pg_type);
        sets.push(format!("{} = {}", quoted(&c.name), rhs));
    }
    if entity.has_column("updated_at") {
        sets.push(format!("{} = NOW()", quoted("updated_at")));
    }
    let id_ph = q.placeholder(Value::String(id.to_string()), "uuid");
    q.sql = format!(
        "UPDATE {} SET {} WHERE {} = {} RETURNING {}",
        quoted(&entity.table_name),
        sets.join(", "),
        quoted(&entity.pk_column),
        id_ph,
        column_list(entity, None)
    );
    q
}

/// DELETE by id, returning the removed row.
pub fn delete(entity: &ResolvedEntity, id: Uuid) -> QueryBuf {
    let mut q = QueryBuf::new();
    let ph = q.placeholder(Value::String(id.to_string()), "uuid");
    q.sql = format!(
        "DELETE FROM {} WHERE {} = {} RETURNING {}",
        quoted(&entity.table_name),
        quoted(&entity.pk_column),
        ph,
        column_list(entity, None)
    );
    q
}

/// `MAX(column) + 1`, or 0 on an empty table.
pub fn next_value(entity: &ResolvedEntity, column: &str) -> QueryBuf {
    let mut q = QueryBuf::new();
    q.sql = format!(
        "SELECT (COALESCE(MAX({}), -1) + 1)::bigint AS \"next\" FROM {}",
        quoted(column),
        quoted(&entity.table_name)
    );
    q
}

const GALLERY_COLUMNS: &str = "\"id\", \"parent_id\", \"parent_type\", \"image_url\", \"alt_text\", \"order_index\", \"created_at\"";

pub fn select_galleries(parent_id: Uuid, parent: ParentType) -> QueryBuf {
    let mut q = QueryBuf::new();
    let id_ph = q.placeholder(Value::String(parent_id.to_string()), "uuid");
    let type_ph = q.placeholder(Value::from(parent.as_i16()), "smallint");
    q.sql = format!(
        "SELECT {} FROM {} WHERE \"parent_id\" = {} AND \"parent_type\" = {} ORDER BY \"order_index\" ASC, \"created_at\" ASC",
        GALLERY_COLUMNS,
        quoted(GALLERY_TABLE),
        id_ph,
        type_ph
    );
    q
}

pub fn delete_galleries(parent_id: Uuid, parent: ParentType) -> QueryBuf {
    let mut q = QueryBuf::new();
    let id_ph = q.placeholder(Value::String(parent_id.to_string()), "uuid");
    let type_ph = q.placeholder(Value::from(parent.as_i16()), "smallint");
    q.sql = format!(
        "DELETE FROM {} WHERE \"parent_id\" = {} AND \"parent_type\" = {} RETURNING {}",
        quoted(GALLERY_TABLE),
        id_ph,
        type_ph,
        GALLERY_COLUMNS
    );
    q
}

pub fn insert_gallery(parent_id: Uuid, parent: ParentType, image_url: &str, alt_text: &str, order_index: i32) -> QueryBuf {
    let mut q = QueryBuf::new();
    let phs = [
        q.placeholder(Value::String(parent_id.to_string()), "uuid"),
        q.placeholder(Value::from(parent.as_i16()), "smallint"),
        q.placeholder(Value::String(image_url.to_string()), "text"),
        q.placeholder(Value::String(alt_text.to_string()), "text"),
        q.placeholder(Value::from(order_index), "integer"),
    ];
    q.sql = format!(
        "INSERT INTO {} (\"parent_id\", \"parent_type\", \"image_url\", \"alt_text\", \"order_index\") VALUES ({}) RETURNING {}",
        quoted(GALLERY_TABLE),
        phs.join(", "),
        GALLERY_COLUMNS
    );
    q
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::build_model;
    use serde_json::json;

    fn entity(seg: &str) -> ResolvedEntity {
        build_model().entity_by_path(seg).cloned().unwrap()
    }

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("tower"), "%tower%");
        assert_eq!(like_pattern("50%_off\\"), "%50\\%\\_off\\\\%");
    }

    #[test]
    fn list_binds_limit_and_orders_by_default() {
        let e = entity("event");
        let q = select_list(&e, &ListQuery::new().limit(Some(2)));
        assert!(q.sql.contains("ORDER BY main.\"created_at\" DESC, main.\"id\" ASC"), "{}", q.sql);
        assert!(q.sql.ends_with("LIMIT $1::bigint"), "{}", q.sql);
        assert_eq!(q.params, vec![json!(2)]);
    }

    #[test]
    fn limit_is_capped() {
        let e = entity("event");
        let q = select_list(&e, &ListQuery::new().limit(Some(5000)));
        assert_eq!(q.params, vec![json!(MAX_LIMIT)]);
    }

    #[test]
    fn search_covers_every_title_column() {
        let e = entity("projects");
        let q = count(&e, &ListQuery::new().search(Some("Tower")));
        assert!(q.sql.contains("main.\"title_ku\" ILIKE $1 OR main.\"title_en\" ILIKE $1 OR main.\"title_ar\" ILIKE $1"));
        assert_eq!(q.params, vec![json!("%Tower%")]);
    }

    #[test]
    fn blank_search_is_ignored() {
        let e = entity("projects");
        let q = count(&e, &ListQuery::new().search(Some("   ")));
        assert!(!q.sql.contains("WHERE"));
    }

    #[test]
    fn filters_and_cover_share_param_numbering() {
        let e = entity("machines");
        let list = ListQuery {
            cover_image: Some(ParentType::Machine),
            offset: Some(12),
            ..ListQuery::new().filter("machine_group_id", json!("g1"))
        };
        let q = select_list(&e, &list);
        assert!(q.sql.contains("g.\"parent_type\" = $1::smallint"));
        assert!(q.sql.contains("main.\"machine_group_id\" = $2::uuid"));
        assert!(q.sql.contains("LIMIT $3::bigint OFFSET $4::bigint"));
        assert_eq!(q.params, vec![json!(3), json!("g1"), json!(1000), json!(12)]);
    }

    #[test]
    fn unknown_filter_columns_are_dropped() {
        let e = entity("banners");
        let q = count(&e, &ListQuery::new().filter("password", json!("x")));
        assert!(!q.sql.contains("password"));
        assert!(q.params.is_empty());
    }

    #[test]
    fn any_of_filter_expands_to_in_list() {
        let e = entity("audios");
        let list = ListQuery {
            filters: vec![Filter::AnyOf {
                column: "use_for".into(),
                values: vec![json!("landing"), json!("both")],
            }],
            ..Default::default()
        };
        let q = count(&e, &list);
        assert!(q.sql.contains("main.\"use_for\" IN ($1::text, $2::text)"));
    }

    #[test]
    fn insert_skips_key_and_defaulted_columns() {
        let e = entity("banners");
        let body: HashMap<String, Value> = [
            ("title_en".to_string(), json!("Hero")),
            ("id".to_string(), json!("should-not-bind")),
            ("sort_order".to_string(), json!(4)),
        ]
        .into_iter()
        .collect();
        let q = insert(&e, &body);
        let (columns, _) = q.sql.split_once(" VALUES ").unwrap();
        assert!(!columns.contains("\"id\""));
        assert!(columns.contains("\"sort_order\""));
        assert!(!columns.contains("\"is_active\""));
        assert!(q.sql.contains("$1::text"));
    }

    #[test]
    fn update_sets_updated_at_and_binds_id_last() {
        let e = entity("quotes");
        let id = Uuid::new_v4();
        let body: HashMap<String, Value> = [("title_en".to_string(), json!("New"))].into_iter().collect();
        let q = update(&e, id, &body);
        assert!(q.sql.starts_with("UPDATE \"quotes\" SET \"title_en\" = $1::text, \"updated_at\" = NOW() WHERE \"id\" = $2::uuid"));
        assert_eq!(q.params[1], json!(id.to_string()));
    }

    #[test]
    fn galleries_are_ordered_by_index_then_creation() {
        let q = select_galleries(Uuid::new_v4(), ParentType::Product);
        assert!(q.sql.ends_with("ORDER BY \"order_index\" ASC, \"created_at\" ASC"));
        assert_eq!(q.params[1], json!(2));
    }
}
