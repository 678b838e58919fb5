//! Search parameters and their URL query-string form.
//!
//! A search is identified by three keys: `count`, `logo_id` and `index`.
//! Keys that are empty or equal to their default are left out of the query
//! string, and parsing falls back to the defaults for any absent key, so a
//! shared link reproduces the same search.

use serde::{Deserialize, Serialize};
use url::form_urlencoded;

use crate::error::{LogoReviewError, Result};
use crate::model::LogoId;

pub const KEY_COUNT: &str = "count";
pub const KEY_LOGO_ID: &str = "logo_id";
pub const KEY_INDEX: &str = "index";

/// Number of neighbors requested by a fresh search.
pub const DEFAULT_COUNT: u32 = 50;

/// Parameters that define one logo search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchParams {
    /// Reference logo, as an integer string.
    pub logo_id: Option<String>,
    /// Embedding index to query.
    pub index: Option<String>,
    pub count: u32,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            logo_id: None,
            index: None,
            count: DEFAULT_COUNT,
        }
    }
}

impl SearchParams {
    /// Search around a reference logo with the default count.
    pub fn for_logo(logo_id: LogoId) -> Self {
        Self {
            logo_id: Some(logo_id.to_string()),
            ..Default::default()
        }
    }

    /// Search an index without a reference logo.
    pub fn for_index(index: impl Into<String>) -> Self {
        Self {
            index: Some(index.into()),
            ..Default::default()
        }
    }

    pub fn with_count(self, count: u32) -> Self {
        Self { count, ..self }
    }

    pub fn with_index(self, index: impl Into<String>) -> Self {
        Self {
            index: Some(index.into()),
            ..self
        }
    }

    /// Reference logo id as given, ignoring blanks.
    pub fn logo_id(&self) -> Option<&str> {
        non_blank(self.logo_id.as_deref())
    }

    pub fn index(&self) -> Option<&str> {
        non_blank(self.index.as_deref())
    }

    /// Numeric reference logo id, if one is set and well-formed.
    pub fn reference_id(&self) -> Option<LogoId> {
        self.logo_id().and_then(|id| id.parse().ok())
    }

    /// Reject parameters no search could be run with.
    pub fn validate(&self) -> Result<()> {
        if self.count == 0 {
            return Err(LogoReviewError::InvalidParams(
                "count must be at least 1".into(),
            ));
        }
        if let Some(id) = self.logo_id() {
            if id.parse::<LogoId>().is_err() {
                return Err(LogoReviewError::InvalidParams(format!(
                    "logo_id must be an integer, got {id:?}"
                )));
            }
        }
        Ok(())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Value a recognized key should carry in the URL, or `None` to drop it.
fn key_value(defaults: &SearchParams, current: &SearchParams, key: &str) -> Option<String> {
    match key {
        KEY_COUNT => (current.count != 0 && current.count != defaults.count)
            .then(|| current.count.to_string()),
        KEY_LOGO_ID => current
            .logo_id()
            .filter(|id| Some(*id) != defaults.logo_id())
            .map(str::to_owned),
        KEY_INDEX => current
            .index()
            .filter(|index| Some(*index) != defaults.index())
            .map(str::to_owned),
        _ => None,
    }
}

/// Serialize `current` into a fresh query string (without the leading `?`).
pub fn to_query_string(defaults: &SearchParams, current: &SearchParams) -> String {
    merge_query_string("", defaults, current)
}

/// Rewrite the recognized keys of `existing`, leaving any other key in place.
pub fn merge_query_string(
    existing: &str,
    defaults: &SearchParams,
    current: &SearchParams,
) -> String {
    let mut pairs: Vec<(String, String)> =
        form_urlencoded::parse(existing.trim_start_matches('?').as_bytes())
            .into_owned()
            .collect();

    for key in [KEY_COUNT, KEY_LOGO_ID, KEY_INDEX] {
        match key_value(defaults, current, key) {
            None => pairs.retain(|(k, _)| k != key),
            Some(value) => match pairs.iter().position(|(k, _)| k == key) {
                Some(first) => {
                    pairs[first].1 = value;
                    let mut seen = 0;
                    pairs.retain(|(k, _)| {
                        if k != key {
                            return true;
                        }
                        seen += 1;
                        seen == 1
                    });
                }
                None => pairs.push((key.to_owned(), value)),
            },
        }
    }

    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs)
        .finish()
}

/// Read search parameters out of a query string, defaulting absent keys.
pub fn from_query_string(defaults: &SearchParams, query: &str) -> SearchParams {
    let mut params = defaults.clone();

    for (key, value) in form_urlencoded::parse(query.trim_start_matches('?').as_bytes()) {
        match &*key {
            KEY_COUNT => {
                params.count = value
                    .trim()
                    .parse::<u32>()
                    .ok()
                    .filter(|count| *count > 0)
                    .unwrap_or(defaults.count);
            }
            KEY_LOGO_ID => params.logo_id = non_blank(Some(&*value)).map(str::to_owned),
            KEY_INDEX => params.index = non_blank(Some(&*value)).map(str::to_owned),
            _ => {}
        }
    }

    params
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_produce_empty_query() {
        let defaults = SearchParams::default();
        assert_eq!(to_query_string(&defaults, &defaults), "");
    }

    #[test]
    fn test_set_keys_are_written() {
        let defaults = SearchParams::default();
        let params = SearchParams::for_logo(42).with_count(100).with_index("efficientnet");
        assert_eq!(
            to_query_string(&defaults, &params),
            "count=100&logo_id=42&index=efficientnet"
        );
    }

    #[test]
    fn test_default_count_is_elided() {
        let defaults = SearchParams::default();
        let params = SearchParams::for_logo(42);
        assert_eq!(to_query_string(&defaults, &params), "logo_id=42");
    }

    #[test]
    fn test_blank_values_are_removed() {
        let defaults = SearchParams::default();
        let params = SearchParams {
            logo_id: Some("  ".into()),
            index: Some(String::new()),
            count: DEFAULT_COUNT,
        };
        assert_eq!(
            merge_query_string("?logo_id=3&index=old", &defaults, &params),
            ""
        );
    }

    #[test]
    fn test_unrelated_keys_are_preserved() {
        let defaults = SearchParams::default();
        let params = SearchParams::for_logo(7);
        assert_eq!(
            merge_query_string("lang=fr&logo_id=1&logo_id=2", &defaults, &params),
            "lang=fr&logo_id=7"
        );
    }

    #[test]
    fn test_values_are_url_encoded() {
        let defaults = SearchParams::default();
        let params = SearchParams::for_index("a b&c");
        let query = to_query_string(&defaults, &params);
        assert_eq!(query, "index=a+b%26c");
        assert_eq!(from_query_string(&defaults, &query), params);
    }

    #[test]
    fn test_parse_falls_back_to_defaults() {
        let defaults = SearchParams::default();
        assert_eq!(from_query_string(&defaults, ""), defaults);
        assert_eq!(from_query_string(&defaults, "?unrelated=1"), defaults);
    }

    #[test]
    fn test_parse_coerces_count() {
        let defaults = SearchParams::default();
        assert_eq!(from_query_string(&defaults, "count=120").count, 120);
        assert_eq!(from_query_string(&defaults, "count=abc").count, DEFAULT_COUNT);
        assert_eq!(from_query_string(&defaults, "count=0").count, DEFAULT_COUNT);
        assert_eq!(from_query_string(&defaults, "count=-5").count, DEFAULT_COUNT);
    }

    #[test]
    fn test_url_overrides_non_empty_defaults() {
        let defaults = SearchParams::for_index("default-index");
        let parsed = from_query_string(&defaults, "index=other");
        assert_eq!(parsed.index.as_deref(), Some("other"));
    }

    #[test]
    fn test_round_trip() {
        let defaults = SearchParams::default();
        let cases = [
            SearchParams::for_logo(42),
            SearchParams::for_logo(1).with_count(250),
            SearchParams::for_index("clip").with_count(75),
            SearchParams::default(),
        ];
        for params in cases {
            let query = to_query_string(&defaults, &params);
            assert_eq!(from_query_string(&defaults, &query), params, "query: {query}");
        }
    }

    #[test]
    fn test_reference_id() {
        assert_eq!(SearchParams::for_logo(42).reference_id(), Some(42));
        assert_eq!(SearchParams::default().reference_id(), None);
        let bad = SearchParams {
            logo_id: Some("abc".into()),
            ..Default::default()
        };
        assert_eq!(bad.reference_id(), None);
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_count() {
        let params = SearchParams::default().with_count(0);
        assert!(matches!(
            params.validate(),
            Err(LogoReviewError::InvalidParams(_))
        ));
        assert!(SearchParams::for_logo(3).validate().is_ok());
    }
}
