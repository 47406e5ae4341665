//! Building blocks of the content catalog.

use serde::Serialize;
use std::fmt;

/// Per-column rule checked by `RequestValidator`.
#[derive(Clone, Debug, Default)]
pub struct ValidationRule {
    pub required: Option<bool>,
    /// `email`, `url` or `month_day` (`MM-DD`).
    pub format: Option<String>,
    pub max_length: Option<u32>,
    pub min_length: Option<u32>,
    pub allowed: Option<Vec<serde_json::Value>>,
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
}

impl ValidationRule {
    pub fn required() -> Self {
        ValidationRule {
            required: Some(true),
            min_length: Some(1),
            ..Default::default()
        }
    }

    pub fn format(fmt: &str) -> Self {
        ValidationRule {
            format: Some(fmt.to_string()),
            ..Default::default()
        }
    }

    pub fn one_of<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<serde_json::Value>,
    {
        ValidationRule {
            allowed: Some(values.into_iter().map(Into::into).collect()),
            ..Default::default()
        }
    }
}

/// Discriminator stored in `galleries.parent_type`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParentType {
    Project,
    Event,
    Product,
    Machine,
}

impl ParentType {
    pub fn as_i16(self) -> i16 {
        match self {
            ParentType::Project => 0,
            ParentType::Event => 1,
            ParentType::Product => 2,
            ParentType::Machine => 3,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortDirection::Asc => f.write_str("ASC"),
            SortDirection::Desc => f.write_str("DESC"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderBy {
    pub column: String,
    pub direction: SortDirection,
}

impl OrderBy {
    pub fn asc(column: &str) -> Self {
        OrderBy {
            column: column.to_string(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(column: &str) -> Self {
        OrderBy {
            column: column.to_string(),
            direction: SortDirection::Desc,
        }
    }
}

/// Maps a query-string parameter onto an equality filter, e.g. `groupId` -> `machine_group_id`.
#[derive(Clone, Debug)]
pub struct QueryFilter {
    pub param: String,
    pub column: String,
    /// Values accepted for the parameter; anything else is ignored.
    pub allowed: Option<Vec<String>>,
    /// Extra value that always matches alongside the requested one (`use_for = X OR use_for = 'both'`).
    pub also_match: Option<String>,
}

impl QueryFilter {
    pub fn new(param: &str, column: &str) -> Self {
        QueryFilter {
            param: param.to_string(),
            column: column.to_string(),
            allowed: None,
            also_match: None,
        }
    }
}

/// How an entity is exposed on the public site.
#[derive(Clone, Debug, Default)]
pub struct PublicListing {
    /// Always-on equality filters (`is_active = true`).
    pub fixed_filters: Vec<(String, serde_json::Value)>,
    pub query_filters: Vec<QueryFilter>,
    /// Attach the first gallery image as `gallery_image_url`.
    pub cover_image: bool,
    /// Shared-cache lifetime in seconds; 0 disables caching headers.
    pub max_age: u32,
    /// Row cap applied when the caller does not pass `limit`.
    pub default_limit: Option<u32>,
}

/// `require` must be non-empty whenever `when_column` equals `equals` (banner media by type).
#[derive(Clone, Debug, PartialEq)]
pub struct ConditionalRule {
    pub when_column: String,
    pub equals: serde_json::Value,
    pub require: String,
}
