//! The static content catalog: every entity the site and dashboard expose.

use crate::config::{
    ColumnInfo, ConditionalRule, OrderBy, ParentType, PublicListing, QueryFilter, ResolvedEntity, ResolvedModel, ValidationRule,
};
use crate::locale::Language;
use serde_json::json;
use std::collections::HashMap;

struct EntityBuilder {
    entity: ResolvedEntity,
}

fn entity(table: &str, segment: &str) -> EntityBuilder {
    let id = ColumnInfo {
        name: "id".into(),
        pg_type: "uuid".into(),
        nullable: false,
        default: Some("gen_random_uuid()".into()),
        unique: false,
        references: None,
    };
    EntityBuilder {
        entity: ResolvedEntity {
            table_name: table.into(),
            path_segment: segment.into(),
            pk_column: "id".into(),
            columns: vec![id],
            localized: Vec::new(),
            search_columns: Vec::new(),
            default_order: vec![OrderBy::desc("created_at")],
            gallery: None,
            public: None,
            file_columns: Vec::new(),
            validation: HashMap::new(),
            conditional: Vec::new(),
        },
    }
}

impl EntityBuilder {
    fn push(&mut self, name: &str, pg_type: &str, nullable: bool, default: Option<&str>) -> &mut ColumnInfo {
        self.entity.columns.push(ColumnInfo {
            name: name.into(),
            pg_type: pg_type.into(),
            nullable,
            default: default.map(str::to_string),
            unique: false,
            references: None,
        });
        let last = self.entity.columns.len() - 1;
        &mut self.entity.columns[last]
    }

    /// `{base}_ku`, `{base}_en`, `{base}_ar`, all required text.
    fn localized(mut self, base: &str) -> Self {
        for lang in Language::ALL {
            let col = format!("{}_{}", base, lang.code());
            self.push(&col, "text", false, None);
            self.entity.validation.insert(col, ValidationRule::required());
        }
        self.entity.localized.push(base.into());
        self
    }

    fn required(mut self, name: &str, pg_type: &str) -> Self {
        self.push(name, pg_type, false, None);
        self.entity.validation.insert(name.into(), ValidationRule::required());
        self
    }

    fn optional(mut self, name: &str, pg_type: &str) -> Self {
        self.push(name, pg_type, true, None);
        self
    }

    fn defaulted(mut self, name: &str, pg_type: &str, default: &str) -> Self {
        self.push(name, pg_type, false, Some(default));
        self
    }

    fn unique(mut self, name: &str, pg_type: &str) -> Self {
        self.push(name, pg_type, false, None).unique = true;
        self.entity.validation.insert(name.into(), ValidationRule::required());
        self
    }

    fn reference(mut self, name: &str, table: &str) -> Self {
        self.push(name, "uuid", true, None).references = Some(table.into());
        self
    }

    fn file(mut self, name: &str, nullable: bool) -> Self {
        self.push(name, "text", nullable, None);
        if !nullable {
            self.entity.validation.insert(name.into(), ValidationRule::required());
        }
        self.entity.file_columns.push(name.into());
        self
    }

    fn rule(mut self, column: &str, rule: ValidationRule) -> Self {
        self.entity.validation.insert(column.into(), rule);
        self
    }

    fn require_when(mut self, when_column: &str, equals: &str, require: &str) -> Self {
        self.entity.conditional.push(ConditionalRule {
            when_column: when_column.into(),
            equals: json!(equals),
            require: require.into(),
        });
        self
    }

    fn search(mut self, columns: &[&str]) -> Self {
        self.entity.search_columns = columns.iter().map(|s| s.to_string()).collect();
        self
    }

    fn order(mut self, order: Vec<OrderBy>) -> Self {
        self.entity.default_order = order;
        self
    }

    fn gallery(mut self, parent: ParentType) -> Self {
        self.entity.gallery = Some(parent);
        self
    }

    fn public(mut self, listing: PublicListing) -> Self {
        self.entity.public = Some(listing);
        self
    }

    fn build(mut self) -> ResolvedEntity {
        self.push("created_at", "timestamptz", false, Some("NOW()"));
        self.push("updated_at", "timestamptz", false, Some("NOW()"));
        self.entity
    }
}

fn titles() -> [&'static str; 3] {
    ["title_ku", "title_en", "title_ar"]
}

fn cached(max_age: u32) -> PublicListing {
    PublicListing {
        max_age,
        ..Default::default()
    }
}

fn with_cover(mut listing: PublicListing) -> PublicListing {
    listing.cover_image = true;
    listing
}

fn filtered(mut listing: PublicListing, param: &str, column: &str) -> PublicListing {
    listing.query_filters.push(QueryFilter::new(param, column));
    listing
}

fn active_only(mut listing: PublicListing) -> PublicListing {
    listing.fixed_filters.push(("is_active".into(), json!(true)));
    listing
}

/// Build the runtime model. Tables are listed parents-first so DDL can be applied in order.
pub fn build_model() -> ResolvedModel {
    let countries = entity("countries", "countries")
        .localized("name")
        .rule("code", ValidationRule { max_length: Some(3), ..Default::default() })
        .optional("code", "text")
        .search(&["name_ku", "name_en", "name_ar"])
        .order(vec![OrderBy::asc("name_en")])
        .public(cached(3600))
        .build();

    let locations = entity("locations", "locations")
        .localized("city")
        .reference("country_id", "countries")
        .search(&["city_ku", "city_en", "city_ar"])
        .order(vec![OrderBy::asc("city_en")])
        .public(filtered(cached(3600), "countryId", "country_id"))
        .build();

    let categories = entity("project_categories", "project-categories")
        .localized("title")
        .search(&titles())
        .order(vec![OrderBy::asc("title_en")])
        .public(cached(3600))
        .build();

    let sub_categories = entity("sub_categorys", "sub-categorys")
        .localized("title")
        .reference("category_id", "project_categories")
        .search(&titles())
        .public(filtered(cached(3600), "categoryId", "category_id"))
        .build();

    let projects = entity("projects", "projects")
        .localized("title")
        .localized("description")
        .required("date", "date")
        .reference("location_id", "locations")
        .reference("category_id", "project_categories")
        .reference("sub_category_id", "sub_categorys")
        .search(&titles())
        .order(vec![OrderBy::desc("date"), OrderBy::desc("created_at")])
        .gallery(ParentType::Project)
        .public({
            let l = with_cover(PublicListing::default());
            let l = filtered(l, "categoryId", "category_id");
            let l = filtered(l, "subCategoryId", "sub_category_id");
            filtered(l, "locationId", "location_id")
        })
        .build();

    let events = entity("event", "event")
        .localized("title")
        .localized("description")
        .search(&titles())
        .gallery(ParentType::Event)
        .public(with_cover(PublicListing::default()))
        .build();

    let machine_groups = entity("machine_groups", "machine-groups")
        .localized("title")
        .search(&titles())
        .order(vec![OrderBy::asc("title_en")])
        .public(cached(3600))
        .build();

    let products = entity("products", "products")
        .localized("title")
        .localized("description")
        .optional("product_group_id", "uuid")
        .search(&titles())
        .order(vec![OrderBy::asc("title_en")])
        .gallery(ParentType::Product)
        .public(filtered(with_cover(cached(300)), "groupId", "product_group_id"))
        .build();

    let machines = entity("machines", "machines")
        .localized("title")
        .localized("description")
        .reference("machine_group_id", "machine_groups")
        .search(&titles())
        .order(vec![OrderBy::asc("title_en")])
        .gallery(ParentType::Machine)
        .public(filtered(with_cover(cached(300)), "groupId", "machine_group_id"))
        .build();

    let banners = entity("banners", "banners")
        .localized("title")
        .file("image_url", true)
        .file("video_url", true)
        .defaulted("type", "text", "'image'")
        .rule("type", ValidationRule::one_of(["image", "video"]))
        .require_when("type", "image", "image_url")
        .require_when("type", "video", "video_url")
        .defaulted("is_active", "boolean", "true")
        .defaulted("sort_order", "integer", "0")
        .rule("sort_order", ValidationRule { minimum: Some(0.0), ..Default::default() })
        .search(&titles())
        .order(vec![OrderBy::asc("sort_order"), OrderBy::desc("created_at")])
        .public(active_only(PublicListing::default()))
        .build();

    let audios = entity("audios", "audios")
        .localized("title")
        .file("audio_url", false)
        .defaulted("is_active", "boolean", "true")
        .defaulted("use_for", "text", "'both'")
        .rule("use_for", ValidationRule::one_of(["landing", "intro", "both"]))
        .search(&titles())
        .public({
            let mut l = active_only(PublicListing::default());
            l.query_filters.push(QueryFilter {
                param: "use_for".into(),
                column: "use_for".into(),
                allowed: Some(vec!["landing".into(), "intro".into(), "both".into()]),
                also_match: Some("both".into()),
            });
            l.default_limit = Some(1);
            l
        })
        .build();

    let quotes = entity("quotes", "quotes")
        .localized("title")
        .localized("description")
        .file("image_url", true)
        .search(&titles())
        .public(PublicListing::default())
        .build();

    let teams = entity("teams", "teams")
        .localized("name")
        .localized("position")
        .file("image_url", true)
        .defaulted("special", "text", "'regular'")
        .search(&["name_ku", "name_en", "name_ar"])
        .order(vec![OrderBy::asc("created_at")])
        .public(PublicListing::default())
        .build();

    let social_media = entity("social_media", "social-media")
        .required("type", "smallint")
        .rule("type", ValidationRule { required: Some(true), ..ValidationRule::one_of([0, 1, 2]) })
        .required("url", "text")
        .rule("url", ValidationRule { required: Some(true), ..ValidationRule::format("url") })
        .search(&["url"])
        .order(vec![OrderBy::asc("type")])
        .public(cached(3600))
        .build();

    let properties = entity("properties", "properties")
        .unique("key", "text")
        .localized("value")
        .search(&["key", "value_ku", "value_en", "value_ar"])
        .order(vec![OrderBy::asc("key")])
        .build();

    let special_projects = entity("special_projects", "special-projects")
        .file("image_url", false)
        .unique("sort_order", "integer")
        .rule("sort_order", ValidationRule { required: Some(true), minimum: Some(0.0), ..Default::default() })
        .order(vec![OrderBy::asc("sort_order")])
        .public(PublicListing::default())
        .build();

    let footer_properties = entity("footer_properties", "footer-properties")
        .unique("property_key", "text")
        .localized("title")
        .localized("content")
        .defaulted("property_type", "text", "'about'")
        .rule("property_type", ValidationRule::one_of(["about", "stats", "contact", "social"]))
        .defaulted("display_order", "integer", "0")
        .defaulted("is_active", "boolean", "true")
        .search(&titles())
        .order(vec![OrderBy::asc("display_order")])
        .public(active_only(cached(3600)))
        .build();

    let about_stats = entity("about_stats", "about-stats")
        .unique("key", "text")
        .required("stat_value", "text")
        .localized("label")
        .defaulted("display_order", "integer", "0")
        .search(&["key", "label_ku", "label_en", "label_ar"])
        .order(vec![OrderBy::asc("display_order")])
        .public(cached(3600))
        .build();

    let graphics = entity("graphics", "graphics")
        .file("image_url", false)
        .public(PublicListing::default())
        .build();

    let theme_settings = entity("theme_settings", "theme-settings")
        .unique("theme_name", "text")
        .defaulted("is_enabled", "boolean", "false")
        .defaulted("auto_enable", "boolean", "false")
        .optional("start_date", "text")
        .rule("start_date", ValidationRule::format("month_day"))
        .optional("end_date", "text")
        .rule("end_date", ValidationRule::format("month_day"))
        .search(&["theme_name"])
        .order(vec![OrderBy::asc("theme_name")])
        .build();

    ResolvedModel::new(vec![
        countries,
        locations,
        categories,
        sub_categories,
        projects,
        events,
        machine_groups,
        products,
        machines,
        banners,
        audios,
        quotes,
        teams,
        social_media,
        properties,
        special_projects,
        footer_properties,
        about_stats,
        graphics,
        theme_settings,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::validate;

    #[test]
    fn catalog_passes_validation() {
        let model = build_model();
        validate(&model).expect("catalog must be consistent");
        assert_eq!(model.entities.len(), 20);
    }

    #[test]
    fn gallery_parents_are_wired() {
        let model = build_model();
        let parent = |seg: &str| model.entity_by_path(seg).and_then(|e| e.gallery);
        assert_eq!(parent("projects"), Some(ParentType::Project));
        assert_eq!(parent("event"), Some(ParentType::Event));
        assert_eq!(parent("products"), Some(ParentType::Product));
        assert_eq!(parent("machines"), Some(ParentType::Machine));
        assert_eq!(parent("banners"), None);
    }

    #[test]
    fn localized_triplets_are_required_columns() {
        let model = build_model();
        let teams = model.entity_by_path("teams").unwrap();
        for col in ["name_ku", "name_en", "name_ar", "position_ku", "position_en", "position_ar"] {
            let info = teams.column(col).unwrap();
            assert!(!info.nullable, "{} should be NOT NULL", col);
            assert_eq!(teams.validation[col].required, Some(true));
        }
        assert_eq!(teams.localized, vec!["name".to_string(), "position".to_string()]);
    }

    #[test]
    fn banners_list_active_rows_by_sort_order() {
        let model = build_model();
        let banners = model.entity_by_path("banners").unwrap();
        let public = banners.public.as_ref().unwrap();
        assert_eq!(public.fixed_filters, vec![("is_active".to_string(), json!(true))]);
        assert_eq!(banners.default_order, vec![OrderBy::asc("sort_order"), OrderBy::desc("created_at")]);
        assert_eq!(banners.file_columns, vec!["image_url".to_string(), "video_url".to_string()]);
    }

    #[test]
    fn private_entities_have_no_public_listing() {
        let model = build_model();
        assert!(model.entity_by_path("properties").unwrap().public.is_none());
        assert!(model.entity_by_path("theme-settings").unwrap().public.is_none());
    }
}
