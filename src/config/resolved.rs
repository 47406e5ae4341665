//! Resolved entity model: the catalog flattened for runtime dispatch.

use crate::config::{ConditionalRule, OrderBy, ParentType, PublicListing, ValidationRule};
use std::collections::HashMap;

#[derive(Clone, Debug)]
pub struct ColumnInfo {
    pub name: String,
    /// PostgreSQL type name, used for DDL and for casts on bound values (e.g. "timestamptz").
    pub pg_type: String,
    pub nullable: bool,
    /// SQL default expression (e.g. `gen_random_uuid()`, `NOW()`).
    pub default: Option<String>,
    pub unique: bool,
    /// Referenced table for a foreign key on `id`.
    pub references: Option<String>,
}

impl ColumnInfo {
    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }
}

#[derive(Clone, Debug)]
pub struct ResolvedEntity {
    pub table_name: String,
    pub path_segment: String,
    pub pk_column: String,
    pub columns: Vec<ColumnInfo>,
    /// Base names stored as `{base}_ku`, `{base}_en`, `{base}_ar`.
    pub localized: Vec<String>,
    pub search_columns: Vec<String>,
    pub default_order: Vec<OrderBy>,
    pub gallery: Option<ParentType>,
    pub public: Option<PublicListing>,
    /// Columns holding object-storage URLs, cleaned up when the row is deleted.
    pub file_columns: Vec<String>,
    pub validation: HashMap<String, ValidationRule>,
    pub conditional: Vec<ConditionalRule>,
}

impl ResolvedEntity {
    pub fn column(&self, name: &str) -> Option<&ColumnInfo> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }
}

#[derive(Clone, Debug)]
pub struct ResolvedModel {
    pub entities: Vec<ResolvedEntity>,
    pub entity_by_path: HashMap<String, ResolvedEntity>,
}

impl ResolvedModel {
    pub fn new(entities: Vec<ResolvedEntity>) -> Self {
        let entity_by_path = entities
            .iter()
            .map(|e| (e.path_segment.clone(), e.clone()))
            .collect();
        ResolvedModel {
            entities,
            entity_by_path,
        }
    }

    pub fn entity_by_path(&self, path: &str) -> Option<&ResolvedEntity> {
        self.entity_by_path.get(path)
    }
}
