//! Bilingual text values.
//!
//! Names coming from older records are plain strings while newer records
//! carry a per-locale map (`{"vi": ..., "en": ...}`). Both deserialize into
//! [`LocalizedText`]; call sites resolve a display string through
//! [`LocalizedText::localize`] instead of inspecting the shape themselves.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A text value that is either a plain string or a per-locale map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LocalizedText {
    Plain(String),
    PerLocale(BTreeMap<String, String>),
}

impl LocalizedText {
    pub fn plain(value: impl Into<String>) -> Self {
        LocalizedText::Plain(value.into())
    }

    /// Resolve the text for `locale`, falling back through `fallback_chain`
    /// and finally to any populated entry. Plain strings resolve as-is.
    pub fn localize(&self, locale: &str, fallback_chain: &[&str]) -> Option<&str> {
        match self {
            LocalizedText::Plain(s) => Some(s.as_str()),
            LocalizedText::PerLocale(map) => std::iter::once(locale)
                .chain(fallback_chain.iter().copied())
                .find_map(|loc| map.get(loc))
                .or_else(|| map.values().next())
                .map(String::as_str),
        }
    }
}

impl Default for LocalizedText {
    fn default() -> Self {
        LocalizedText::Plain(String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_string_resolves_for_any_locale() {
        let name = LocalizedText::plain("Riverside Camp");
        assert_eq!(name.localize("vi", &["en"]), Some("Riverside Camp"));
    }

    #[test]
    fn per_locale_map_prefers_requested_locale() {
        let name: LocalizedText =
            serde_json::from_str(r#"{"vi": "Khu A", "en": "Zone A"}"#).unwrap();
        assert_eq!(name.localize("en", &["vi"]), Some("Zone A"));
        assert_eq!(name.localize("fr", &["vi"]), Some("Khu A"));
    }

    #[test]
    fn missing_fallback_uses_any_populated_entry() {
        let name: LocalizedText = serde_json::from_str(r#"{"vi": "Khu B"}"#).unwrap();
        assert_eq!(name.localize("en", &[]), Some("Khu B"));
    }

    #[test]
    fn plain_json_string_deserializes_as_plain() {
        let name: LocalizedText = serde_json::from_str(r#""Lakeview""#).unwrap();
        assert_eq!(name, LocalizedText::plain("Lakeview"));
    }
}
