//! Seasonal theme activation (manual switch or a recurring `MM-DD` window).

use chrono::Datelike;
use serde::Serialize;

pub const DEFAULT_THEME: &str = "christmas";

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct ThemeSettings {
    pub theme_name: String,
    pub is_enabled: bool,
    pub auto_enable: bool,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// Month and day of a recurring date.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct MonthDay {
    pub month: u32,
    pub day: u32,
}

impl MonthDay {
    /// Parse `MM-DD`; rejects out-of-range parts.
    pub fn parse(s: &str) -> Option<Self> {
        let (m, d) = s.trim().split_once('-')?;
        let month: u32 = m.parse().ok()?;
        let day: u32 = d.parse().ok()?;
        if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
            return None;
        }
        Some(MonthDay { month, day })
    }

    pub fn of<D: Datelike>(date: &D) -> Self {
        MonthDay {
            month: date.month(),
            day: date.day(),
        }
    }
}

/// Whether the theme is on for `today`.
///
/// Without `auto_enable` the manual flag wins. With it, an inclusive window applies; a start
/// later in the year than the end wraps over New Year (`12-27` to `01-01`). A missing or
/// malformed window falls back to the manual flag.
pub fn is_active(settings: &ThemeSettings, today: MonthDay) -> bool {
    if !settings.auto_enable {
        return settings.is_enabled;
    }
    let window = settings
        .start_date
        .as_deref()
        .and_then(MonthDay::parse)
        .zip(settings.end_date.as_deref().and_then(MonthDay::parse));
    match window {
        Some((start, end)) if start.month > end.month => today >= start || today <= end,
        Some((start, end)) => today >= start && today <= end,
        None => settings.is_enabled,
    }
}

#[derive(Serialize)]
pub struct ThemeStatus {
    pub enabled: bool,
    pub theme: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settings: Option<ThemeDetail>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeDetail {
    pub manual: bool,
    pub auto: bool,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

pub fn status(theme: &str, settings: Option<&ThemeSettings>, today: MonthDay) -> ThemeStatus {
    match settings {
        None => ThemeStatus {
            enabled: false,
            theme: theme.to_string(),
            settings: None,
            reason: Some("No settings found".into()),
        },
        Some(s) => ThemeStatus {
            enabled: is_active(s, today),
            theme: theme.to_string(),
            settings: Some(ThemeDetail {
                manual: s.is_enabled,
                auto: s.auto_enable,
                start_date: s.start_date.clone(),
                end_date: s.end_date.clone(),
            }),
            reason: None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn md(s: &str) -> MonthDay {
        MonthDay::parse(s).unwrap()
    }

    fn auto(start: &str, end: &str) -> ThemeSettings {
        ThemeSettings {
            theme_name: DEFAULT_THEME.into(),
            is_enabled: false,
            auto_enable: true,
            start_date: Some(start.into()),
            end_date: Some(end.into()),
        }
    }

    #[test]
    fn manual_flag_wins_without_auto_enable() {
        let s = ThemeSettings {
            is_enabled: true,
            start_date: Some("01-01".into()),
            end_date: Some("01-02".into()),
            ..Default::default()
        };
        assert!(is_active(&s, md("07-15")));
    }

    #[test]
    fn year_crossing_window() {
        let s = auto("12-27", "01-01");
        assert!(is_active(&s, md("12-27")));
        assert!(is_active(&s, md("12-31")));
        assert!(is_active(&s, md("01-01")));
        assert!(!is_active(&s, md("01-02")));
        assert!(!is_active(&s, md("12-26")));
    }

    #[test]
    fn same_year_window_is_inclusive() {
        let s = auto("03-10", "04-05");
        assert!(is_active(&s, md("03-10")));
        assert!(is_active(&s, md("04-05")));
        assert!(!is_active(&s, md("04-06")));
        assert!(!is_active(&s, md("02-28")));
    }

    #[test]
    fn malformed_window_falls_back_to_manual() {
        let mut s = auto("13-01", "01-01");
        s.is_enabled = true;
        assert!(is_active(&s, md("06-01")));
    }

    #[test]
    fn status_without_row_reports_reason() {
        let st = status(DEFAULT_THEME, None, md("12-30"));
        assert!(!st.enabled);
        assert_eq!(st.reason.as_deref(), Some("No settings found"));
    }
}
