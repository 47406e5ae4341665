//! Schema bootstrap: database creation, DDL generated from the catalog, admin provisioning.
//! Every statement is idempotent so startup can run it unconditionally.

use crate::auth::{hash_password, MIN_PASSWORD_LEN};
use crate::config::{validate, ColumnInfo, ResolvedEntity, ResolvedModel};
use crate::error::AppError;
use crate::service::is_email;
use crate::sql::{quoted, GALLERY_TABLE, USERS_TABLE};
use sqlx::ConnectOptions;
use sqlx::PgPool;
use std::str::FromStr;

fn column_def(c: &ColumnInfo) -> String {
    let mut def = format!("{} {}", quoted(&c.name), c.pg_type.to_uppercase());
    if !c.nullable {
        def.push_str(" NOT NULL");
    }
    if let Some(d) = &c.default {
        def.push_str(" DEFAULT ");
        def.push_str(d);
    }
    if c.unique {
        def.push_str(" UNIQUE");
    }
    if let Some(target) = &c.references {
        def.push_str(&format!(" REFERENCES {} (\"id\") ON DELETE SET NULL", quoted(target)));
    }
    def
}

/// `CREATE TABLE IF NOT EXISTS` for one catalog entity.
pub fn create_table_sql(entity: &ResolvedEntity) -> String {
    let mut defs: Vec<String> = entity.columns.iter().map(column_def).collect();
    defs.push(format!("PRIMARY KEY ({})", quoted(&entity.pk_column)));
    format!(
        "CREATE TABLE IF NOT EXISTS {} (\n    {}\n)",
        quoted(&entity.table_name),
        defs.join(",\n    ")
    )
}

fn support_tables() -> Vec<String> {
    vec![
        format!(
            r#"CREATE TABLE IF NOT EXISTS {} (
    "id" UUID NOT NULL DEFAULT gen_random_uuid() PRIMARY KEY,
    "parent_id" UUID NOT NULL,
    "parent_type" SMALLINT NOT NULL,
    "image_url" TEXT NOT NULL,
    "alt_text" TEXT NOT NULL DEFAULT '',
    "order_index" INTEGER NOT NULL DEFAULT 1,
    "created_at" TIMESTAMPTZ NOT NULL DEFAULT NOW()
)"#,
            quoted(GALLERY_TABLE)
        ),
        format!(
            "CREATE INDEX IF NOT EXISTS \"galleries_parent_idx\" ON {} (\"parent_id\", \"parent_type\", \"order_index\")",
            quoted(GALLERY_TABLE)
        ),
        format!(
            r#"CREATE TABLE IF NOT EXISTS {} (
    "id" UUID NOT NULL DEFAULT gen_random_uuid() PRIMARY KEY,
    "name" TEXT NOT NULL,
    "email" TEXT NOT NULL UNIQUE,
    "password" TEXT NOT NULL,
    "created_at" TIMESTAMPTZ NOT NULL DEFAULT NOW()
)"#,
            quoted(USERS_TABLE)
        ),
    ]
}

/// Validate the catalog, then create every table (parents first), the gallery table and users.
pub async fn apply_migrations(pool: &PgPool, model: &ResolvedModel) -> Result<(), AppError> {
    validate(model)?;
    for entity in &model.entities {
        let ddl = create_table_sql(entity);
        tracing::debug!(table = %entity.table_name, sql = %ddl, "ddl");
        sqlx::query(&ddl).execute(pool).await?;
    }
    for ddl in support_tables() {
        sqlx::query(&ddl).execute(pool).await?;
    }
    tracing::info!(tables = model.entities.len() + 2, "schema ready");
    Ok(())
}

/// Create the admin account, or reset its password when it already exists.
pub async fn ensure_admin(pool: &PgPool, email: &str, password: &str) -> Result<(), AppError> {
    let email = email.trim().to_lowercase();
    if !is_email(&email) {
        return Err(AppError::Validation("ADMIN_EMAIL must be a valid email".into()));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(format!(
            "ADMIN_PASSWORD must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    let hash = hash_password(password).map_err(|e| AppError::BadRequest(format!("password hashing failed: {}", e)))?;
    let name = email.split('@').next().unwrap_or("admin").to_string();
    sqlx::query(&format!(
        "INSERT INTO {} (\"name\", \"email\", \"password\") VALUES ($1, $2, $3) \
         ON CONFLICT (\"email\") DO UPDATE SET \"password\" = EXCLUDED.\"password\"",
        quoted(USERS_TABLE)
    ))
    .bind(&name)
    .bind(&email)
    .bind(&hash)
    .execute(pool)
    .await?;
    tracing::info!(email = %email, "admin account provisioned");
    Ok(())
}

/// Ensure the database in `database_url` exists; create it if not. Connects to the
/// server's `postgres` database to run CREATE DATABASE. Call before creating the main pool.
pub async fn ensure_database_exists(database_url: &str) -> Result<(), AppError> {
    let (admin_url, db_name) = split_db_name(database_url)?;
    if db_name.is_empty() || db_name == "postgres" {
        return Ok(());
    }
    let opts = sqlx::postgres::PgConnectOptions::from_str(&admin_url)
        .map_err(|e| AppError::BadRequest(format!("invalid DATABASE_URL: {}", e)))?;
    let mut conn: sqlx::PgConnection = opts.connect().await?;
    let exists: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
        .bind(&db_name)
        .fetch_one(&mut conn)
        .await?;
    if !exists.0 {
        sqlx::query(&format!("CREATE DATABASE {}", quoted(&db_name)))
            .execute(&mut conn)
            .await?;
        tracing::info!(database = %db_name, "created database");
    }
    Ok(())
}

/// `(url pointing at the postgres database, target database name)`; query options are kept.
fn split_db_name(url: &str) -> Result<(String, String), AppError> {
    let (base, query) = match url.split_once('?') {
        Some((b, q)) => (b, Some(q)),
        None => (url, None),
    };
    let slash = base
        .rfind('/')
        .filter(|&i| i > base.find("://").map(|p| p + 2).unwrap_or(0))
        .ok_or_else(|| AppError::BadRequest("DATABASE_URL: no database name".into()))?;
    let db_name = base[slash + 1..].trim().to_string();
    let mut admin_url = format!("{}/postgres", &base[..slash]);
    if let Some(q) = query {
        admin_url.push('?');
        admin_url.push_str(q);
    }
    Ok((admin_url, db_name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::build_model;

    #[test]
    fn split_keeps_query_options() {
        let (admin, name) = split_db_name("postgres://u:p@db:5432/atelier?sslmode=require").unwrap();
        assert_eq!(admin, "postgres://u:p@db:5432/postgres?sslmode=require");
        assert_eq!(name, "atelier");
    }

    #[test]
    fn split_without_database_is_an_error() {
        assert!(split_db_name("postgres://localhost").is_err());
    }

    #[test]
    fn table_ddl_includes_constraints() {
        let model = build_model();
        let sql = create_table_sql(model.entity_by_path("special-projects").unwrap());
        assert!(sql.starts_with("CREATE TABLE IF NOT EXISTS \"special_projects\""));
        assert!(sql.contains("\"id\" UUID NOT NULL DEFAULT gen_random_uuid()"));
        assert!(sql.contains("\"sort_order\" INTEGER NOT NULL UNIQUE"));
        assert!(sql.contains("PRIMARY KEY (\"id\")"));
    }

    #[test]
    fn foreign_keys_point_at_parents() {
        let model = build_model();
        let sql = create_table_sql(model.entity_by_path("locations").unwrap());
        assert!(sql.contains("\"country_id\" UUID REFERENCES \"countries\" (\"id\") ON DELETE SET NULL"));
    }

    #[test]
    fn parents_are_created_before_children() {
        let model = build_model();
        let pos = |t: &str| model.entities.iter().position(|e| e.table_name == t).unwrap();
        for e in &model.entities {
            for c in &e.columns {
                if let Some(target) = &c.references {
                    assert!(pos(target) < pos(&e.table_name), "{} before {}", target, e.table_name);
                }
            }
        }
    }
}
