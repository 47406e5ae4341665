//! Language selection for trilingual (`_ku`, `_en`, `_ar`) columns.

use serde_json::{Map, Value};
use std::str::FromStr;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Language {
    Ku,
    #[default]
    En,
    Ar,
}

impl Language {
    pub const ALL: [Language; 3] = [Language::Ku, Language::En, Language::Ar];

    pub fn code(self) -> &'static str {
        match self {
            Language::Ku => "ku",
            Language::En => "en",
            Language::Ar => "ar",
        }
    }

    /// Parse a `lang` query value, falling back to English for anything unknown.
    pub fn from_param(raw: Option<&str>) -> Self {
        raw.and_then(|s| s.parse().ok()).unwrap_or_default()
    }
}

impl FromStr for Language {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ku" => Ok(Language::Ku),
            "en" => Ok(Language::En),
            "ar" => Ok(Language::Ar),
            _ => Err(()),
        }
    }
}

fn non_empty<'a>(row: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    row.get(key).filter(|v| match v {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        _ => true,
    })
}

/// Add a collapsed `{base}` key for every localized base present on the row.
/// Picks the requested language, then English, then the first non-empty value.
pub fn localize(row: &mut Map<String, Value>, lang: Language, bases: &[String]) {
    for base in bases {
        let key = |l: Language| format!("{}_{}", base, l.code());
        if Language::ALL.iter().all(|l| !row.contains_key(&key(*l))) {
            continue;
        }
        let chosen = non_empty(row, &key(lang))
            .or_else(|| non_empty(row, &key(Language::En)))
            .or_else(|| Language::ALL.iter().find_map(|l| non_empty(row, &key(*l))))
            .cloned()
            .unwrap_or(Value::String(String::new()));
        row.insert(base.clone(), chosen);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn parses_case_insensitively_with_english_default() {
        assert_eq!(Language::from_param(Some("AR")), Language::Ar);
        assert_eq!(Language::from_param(Some("ku")), Language::Ku);
        assert_eq!(Language::from_param(Some("fr")), Language::En);
        assert_eq!(Language::from_param(None), Language::En);
    }

    #[test]
    fn picks_requested_language() {
        let mut r = row(json!({"title_ku": "ناونیشان", "title_en": "Title", "title_ar": "عنوان"}));
        localize(&mut r, Language::Ku, &["title".into()]);
        assert_eq!(r["title"], "ناونیشان");
    }

    #[test]
    fn falls_back_to_english_then_any() {
        let mut r = row(json!({"title_ku": "", "title_en": "Title", "title_ar": "عنوان"}));
        localize(&mut r, Language::Ku, &["title".into()]);
        assert_eq!(r["title"], "Title");

        let mut r = row(json!({"title_ku": null, "title_en": " ", "title_ar": "عنوان"}));
        localize(&mut r, Language::Ku, &["title".into()]);
        assert_eq!(r["title"], "عنوان");
    }

    #[test]
    fn skips_bases_missing_from_row() {
        let mut r = row(json!({"url": "https://x.com/studio"}));
        localize(&mut r, Language::Ar, &["title".into()]);
        assert!(!r.contains_key("title"));
    }
}
