//! Catalog validation: referential integrity between entities and their columns.

use crate::config::ResolvedModel;
use crate::error::ConfigError;
use std::collections::HashSet;

pub fn validate(model: &ResolvedModel) -> Result<(), ConfigError> {
    let mut path_segments = HashSet::new();
    let mut gallery_parents = HashSet::new();
    let tables: HashSet<&str> = model.entities.iter().map(|e| e.table_name.as_str()).collect();

    for e in &model.entities {
        if !path_segments.insert(e.path_segment.as_str()) {
            return Err(ConfigError::DuplicatePathSegment(e.path_segment.clone()));
        }
        if let Some(parent) = e.gallery {
            if !gallery_parents.insert(parent.as_i16()) {
                return Err(ConfigError::DuplicateGalleryParent(parent.as_i16()));
            }
        }

        let mut referenced: Vec<&str> = vec![e.pk_column.as_str()];
        referenced.extend(e.search_columns.iter().map(String::as_str));
        referenced.extend(e.default_order.iter().map(|o| o.column.as_str()));
        referenced.extend(e.file_columns.iter().map(String::as_str));
        referenced.extend(e.validation.keys().map(String::as_str));
        for rule in &e.conditional {
            referenced.push(rule.when_column.as_str());
            referenced.push(rule.require.as_str());
        }
        if let Some(public) = &e.public {
            referenced.extend(public.fixed_filters.iter().map(|(c, _)| c.as_str()));
            referenced.extend(public.query_filters.iter().map(|f| f.column.as_str()));
        }
        for col in referenced {
            if !e.has_column(col) {
                return Err(ConfigError::UnknownColumn {
                    entity: e.path_segment.clone(),
                    column: col.to_string(),
                });
            }
        }

        for c in &e.columns {
            if let Some(target) = &c.references {
                if !tables.contains(target.as_str()) {
                    return Err(ConfigError::Validation(format!(
                        "{}.{} references unknown table '{}'",
                        e.table_name, c.name, target
                    )));
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{build_model, OrderBy, ParentType};

    #[test]
    fn duplicate_path_segment_is_rejected() {
        let mut model = build_model();
        let mut copy = model.entities[0].clone();
        copy.table_name = "countries_copy".into();
        model.entities.push(copy);
        assert!(matches!(validate(&model), Err(ConfigError::DuplicatePathSegment(s)) if s == "countries"));
    }

    #[test]
    fn unknown_order_column_is_rejected() {
        let mut model = build_model();
        model.entities[0].default_order = vec![OrderBy::asc("nope")];
        assert!(matches!(validate(&model), Err(ConfigError::UnknownColumn { column, .. }) if column == "nope"));
    }

    #[test]
    fn gallery_parent_types_must_be_unique() {
        let mut model = build_model();
        model.entities[0].gallery = Some(ParentType::Project);
        assert!(matches!(validate(&model), Err(ConfigError::DuplicateGalleryParent(0))));
    }
}
