//! Coerce form-encoded fields into typed JSON values by column type.

use crate::config::{ColumnInfo, ResolvedEntity};
use crate::error::AppError;
use serde_json::Value;
use std::collections::HashMap;

const WRITE_PROTECTED: [&str; 3] = ["id", "created_at", "updated_at"];

fn parse_bool(col: &str, s: &str) -> Result<bool, AppError> {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" | "on" | "1" | "yes" => Ok(true),
        "false" | "off" | "0" | "no" | "" => Ok(false),
        other => Err(AppError::Validation(format!("{} must be a boolean, got '{}'", col, other))),
    }
}

/// Keep only writable catalog columns and convert each string to the column's JSON shape.
/// Blank values become `null` for nullable columns and are dropped when the column has a default.
/// Browsers leave unchecked checkboxes out of the body, so a missing boolean column is `false`.
pub fn coerce_form(entity: &ResolvedEntity, fields: HashMap<String, String>) -> Result<HashMap<String, Value>, AppError> {
    let mut out = HashMap::new();
    for (name, raw) in fields {
        if WRITE_PROTECTED.contains(&name.as_str()) {
            continue;
        }
        let Some(col) = entity.column(&name) else { continue };
        if let Some(value) = coerce_field(col, raw)? {
            out.insert(name, value);
        }
    }
    for col in entity.columns.iter().filter(|c| c.pg_type == "boolean") {
        out.entry(col.name.clone()).or_insert(Value::Bool(false));
    }
    Ok(out)
}

fn coerce_field(col: &ColumnInfo, raw: String) -> Result<Option<Value>, AppError> {
    let name = col.name.as_str();
    let trimmed = raw.trim();
    let pg_type = col.pg_type.as_str();
    if pg_type == "boolean" {
        return Ok(Some(Value::Bool(parse_bool(name, trimmed)?)));
    }
    if trimmed.is_empty() && pg_type != "text" {
        return Ok(if col.has_default() { None } else { Some(Value::Null) });
    }
    let value = match pg_type {
        "smallint" | "integer" | "bigint" => {
            let n: i64 = trimmed
                .parse()
                .map_err(|_| AppError::Validation(format!("{} must be a whole number", name)))?;
            Value::from(n)
        }
        "uuid" => Value::String(parse_uuid(name, trimmed)?.to_string()),
        "date" => {
            parse_date(name, trimmed)?;
            Value::String(trimmed.to_string())
        }
        _ if trimmed.is_empty() && col.nullable => Value::Null,
        _ => Value::String(raw),
    };
    Ok(Some(value))
}

fn parse_uuid(col: &str, s: &str) -> Result<uuid::Uuid, AppError> {
    uuid::Uuid::parse_str(s).map_err(|_| AppError::Validation(format!("{} must be a valid id", col)))
}

fn parse_date(col: &str, s: &str) -> Result<chrono::NaiveDate, AppError> {
    chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| AppError::Validation(format!("{} must be a date (YYYY-MM-DD)", col)))
}

/// Check a JSON body against column types before it reaches a `$n::type` cast.
/// Unknown keys are left for the SQL builder, which ignores them; `null` is left to validation.
pub fn check_json_types(entity: &ResolvedEntity, body: &HashMap<String, Value>) -> Result<(), AppError> {
    for (name, value) in body {
        let Some(col) = entity.column(name) else { continue };
        if value.is_null() {
            continue;
        }
        let ok = match col.pg_type.as_str() {
            "boolean" => value.is_boolean(),
            "smallint" | "integer" | "bigint" => value.is_i64(),
            "uuid" => match value.as_str() {
                Some(s) => parse_uuid(name, s.trim()).is_ok(),
                None => false,
            },
            "date" => match value.as_str() {
                Some(s) => parse_date(name, s.trim()).is_ok(),
                None => false,
            },
            "timestamptz" => value
                .as_str()
                .map(|s| chrono::DateTime::parse_from_rfc3339(s).is_ok())
                .unwrap_or(false),
            "text" => value.is_string(),
            _ => true,
        };
        if !ok {
            return Err(AppError::Validation(format!(
                "{} must be a valid {} value",
                name, col.pg_type
            )));
        }
    }
    Ok(())
}
