//! Request validation from catalog rules.

use crate::config::{ConditionalRule, ValidationRule};
use crate::error::AppError;
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::OnceLock;

pub struct RequestValidator;

impl RequestValidator {
    /// Validate body against per-column rules. All required fields must be present.
    pub fn validate(
        body: &HashMap<String, Value>,
        rules: &HashMap<String, ValidationRule>,
    ) -> Result<(), AppError> {
        let mut cols: Vec<&String> = rules.keys().collect();
        cols.sort();
        for col in cols {
            let rule = &rules[col];
            let val = body.get(col);
            if rule.required == Some(true) && val.map(is_blank).unwrap_or(true) {
                return Err(AppError::Validation(format!("{} is required", col)));
            }
            if let Some(v) = val {
                validate_field(col, v, rule)?;
            }
        }
        Ok(())
    }

    /// Validate only the fields present in body (for PATCH). Required is not enforced for missing fields.
    pub fn validate_partial(
        body: &HashMap<String, Value>,
        rules: &HashMap<String, ValidationRule>,
    ) -> Result<(), AppError> {
        for (col, v) in body {
            if let Some(rule) = rules.get(col) {
                if rule.required == Some(true) && is_blank(v) {
                    return Err(AppError::Validation(format!("{} is required", col)));
                }
                validate_field(col, v, rule)?;
            }
        }
        Ok(())
    }

    /// Cross-field rules, checked against the row as it will be stored.
    pub fn validate_conditional(row: &HashMap<String, Value>, rules: &[ConditionalRule]) -> Result<(), AppError> {
        for rule in rules {
            let triggered = row.get(&rule.when_column).map(|v| value_eq(v, &rule.equals)).unwrap_or(false);
            if triggered && row.get(&rule.require).map(is_blank).unwrap_or(true) {
                return Err(AppError::Validation(format!(
                    "{} is required when {} is {}",
                    rule.require, rule.when_column, rule.equals
                )));
            }
        }
        Ok(())
    }
}

fn is_blank(v: &Value) -> bool {
    match v {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

fn validate_field(col: &str, v: &Value, rule: &ValidationRule) -> Result<(), AppError> {
    if v.is_null() {
        return Ok(());
    }
    if let Some(format) = &rule.format {
        validate_format(col, v, format)?;
    }
    if let Some(s) = v.as_str() {
        let len = s.trim().chars().count();
        if let Some(max) = rule.max_length {
            if len > max as usize {
                return Err(AppError::Validation(format!("{} must be at most {} characters", col, max)));
            }
        }
        if let Some(min) = rule.min_length {
            if len < min as usize {
                return Err(AppError::Validation(format!("{} must be at least {} characters", col, min)));
            }
        }
    }
    if let Some(ref allowed) = rule.allowed {
        if !allowed.iter().any(|a| value_eq(v, a)) {
            let shown: Vec<String> = allowed.iter().map(|a| a.to_string()).collect();
            return Err(AppError::Validation(format!("{} must be one of: {}", col, shown.join(", "))));
        }
    }
    if let Some(n) = v.as_f64() {
        if let Some(min) = rule.minimum {
            if n < min {
                return Err(AppError::Validation(format!("{} must be at least {}", col, min)));
            }
        }
        if let Some(max) = rule.maximum {
            if n > max {
                return Err(AppError::Validation(format!("{} must be at most {}", col, max)));
            }
        }
    }
    Ok(())
}

fn value_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(n), Value::Number(m)) => n.as_f64() == m.as_f64(),
        (Value::String(s), Value::Number(m)) | (Value::Number(m), Value::String(s)) => {
            s.trim().parse::<f64>().ok() == m.as_f64()
        }
        _ => a == b,
    }
}

fn email_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("static regex"))
}

fn url_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(https?://[^\s/$.?#][^\s]*|/[^\s]*)$").expect("static regex"))
}

fn month_day_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(0[1-9]|1[0-2])-(0[1-9]|[12][0-9]|3[01])$").expect("static regex"))
}

pub fn is_email(s: &str) -> bool {
    email_re().is_match(s.trim())
}

fn validate_format(col: &str, v: &Value, format: &str) -> Result<(), AppError> {
    let Some(s) = v.as_str() else { return Ok(()) };
    if s.is_empty() {
        return Ok(());
    }
    let (ok, what) = match format.to_lowercase().as_str() {
        "email" => (is_email(s), "a valid email"),
        "url" => (url_re().is_match(s), "an http(s) URL or absolute path"),
        "month_day" => (month_day_re().is_match(s), "a date in MM-DD form"),
        _ => (true, ""),
    };
    if ok {
        Ok(())
    } else {
        Err(AppError::Validation(format!("{} must be {}", col, what)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::build_model;
    use serde_json::json;

    fn body(v: Value) -> HashMap<String, Value> {
        v.as_object().cloned().unwrap().into_iter().collect()
    }

    #[test]
    fn missing_localized_title_is_rejected() {
        let model = build_model();
        let events = model.entity_by_path("event").unwrap();
        let b = body(json!({
            "title_ku": "ku", "title_en": "en", "title_ar": "",
            "description_ku": "d", "description_en": "d", "description_ar": "d"
        }));
        let err = RequestValidator::validate(&b, &events.validation).unwrap_err();
        assert_eq!(err.to_string(), "validation: title_ar is required");
    }

    #[test]
    fn partial_checks_only_present_fields() {
        let model = build_model();
        let events = model.entity_by_path("event").unwrap();
        assert!(RequestValidator::validate_partial(&body(json!({"title_en": "New"})), &events.validation).is_ok());
        assert!(RequestValidator::validate_partial(&body(json!({"title_en": " "})), &events.validation).is_err());
    }

    #[test]
    fn allowed_values_and_numeric_strings() {
        let model = build_model();
        let social = model.entity_by_path("social-media").unwrap();
        let ok = body(json!({"type": 2, "url": "https://x.com/studio"}));
        assert!(RequestValidator::validate(&ok, &social.validation).is_ok());
        let bad = body(json!({"type": 7, "url": "https://x.com/studio"}));
        assert!(RequestValidator::validate(&bad, &social.validation).is_err());
        let bad_url = body(json!({"type": 0, "url": "instagram"}));
        assert!(RequestValidator::validate(&bad_url, &social.validation).is_err());
    }

    #[test]
    fn month_day_format() {
        let model = build_model();
        let theme = model.entity_by_path("theme-settings").unwrap();
        let ok = body(json!({"theme_name": "christmas", "start_date": "12-27", "end_date": "01-01"}));
        assert!(RequestValidator::validate(&ok, &theme.validation).is_ok());
        let bad = body(json!({"theme_name": "christmas", "start_date": "2024-12-27"}));
        assert!(RequestValidator::validate(&bad, &theme.validation).is_err());
    }

    #[test]
    fn banner_media_must_match_type() {
        let model = build_model();
        let banners = model.entity_by_path("banners").unwrap();
        let video_without_url = body(json!({"type": "video", "image_url": "/x.jpg", "video_url": ""}));
        let err = RequestValidator::validate_conditional(&video_without_url, &banners.conditional).unwrap_err();
        assert!(err.to_string().contains("video_url is required"));

        let image_ok = body(json!({"type": "image", "image_url": "/api/cloud/files/k.jpg"}));
        assert!(RequestValidator::validate_conditional(&image_ok, &banners.conditional).is_ok());
    }

    #[test]
    fn email_shapes() {
        assert!(is_email("admin@studio.iq"));
        assert!(!is_email("admin@studio"));
        assert!(!is_email("not an email"));
    }
}
