//! Localized text resolution.
//!
//! Backend records carry user-facing names in several languages. A
//! [`LanguageContext`] picks the variant for the current UI language,
//! falling back to the configured default language and then to the first
//! variant available.

use std::collections::BTreeMap;
use std::env;

use serde::{Deserialize, Serialize};

/// Language used when nothing else is configured.
pub const FALLBACK_LANGUAGE: &str = "en";

/// A text value that may be localized.
///
/// Accepts a plain string, a list of single-language objects
/// (`[{"en": "John"}, {"fa": "جان"}]`), or a language to text map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LocalizedText {
    /// Not localized
    Plain(String),
    /// Ordered list of language variants
    Variants(Vec<BTreeMap<String, String>>),
    /// Language to text map (iterated in language-code order)
    Map(BTreeMap<String, String>),
}

impl LocalizedText {
    /// Create a plain, non-localized text.
    pub fn plain(text: impl Into<String>) -> Self {
        LocalizedText::Plain(text.into())
    }

    /// Get the non-empty text for a language, if present.
    ///
    /// An exact code match anywhere wins over a base-language match, so
    /// `"en"` prefers an `"en"` variant to an earlier `"en-US"` one.
    pub fn get(&self, language: &str) -> Option<&str> {
        match self {
            LocalizedText::Plain(_) => None,
            LocalizedText::Variants(variants) => {
                lookup(variants.iter().flat_map(|v| v.iter()), language)
            }
            LocalizedText::Map(map) => lookup(map.iter(), language),
        }
    }

    /// The first non-empty variant.
    pub fn first(&self) -> Option<&str> {
        match self {
            LocalizedText::Plain(text) => Some(text.as_str()).filter(|s| !s.is_empty()),
            LocalizedText::Variants(variants) => variants
                .iter()
                .flat_map(|v| v.values())
                .map(String::as_str)
                .find(|s| !s.is_empty()),
            LocalizedText::Map(map) => map.values().map(String::as_str).find(|s| !s.is_empty()),
        }
    }

    /// Resolve for the given language context.
    pub fn resolve(&self, languages: &LanguageContext) -> Option<&str> {
        if let LocalizedText::Plain(text) = self {
            return Some(text.as_str()).filter(|s| !s.is_empty());
        }
        self.get(&languages.ui_language)
            .or_else(|| self.get(&languages.default_language))
            .or_else(|| self.first())
    }
}

impl From<&str> for LocalizedText {
    fn from(text: &str) -> Self {
        LocalizedText::Plain(text.to_string())
    }
}

impl From<String> for LocalizedText {
    fn from(text: String) -> Self {
        LocalizedText::Plain(text)
    }
}

fn lookup<'a, I>(entries: I, language: &str) -> Option<&'a str>
where
    I: Iterator<Item = (&'a String, &'a String)> + Clone,
{
    let mut present = entries.filter(|(_, value)| !value.is_empty());
    if let Some((_, value)) = present.clone().find(|(key, _)| key.as_str() == language) {
        return Some(value.as_str());
    }
    // "en_US" should still match an "en" variant
    let base = base_language(language);
    present
        .find(|(key, _)| base_language(key) == base)
        .map(|(_, value)| value.as_str())
}

fn base_language(code: &str) -> String {
    code.split(['_', '-'])
        .next()
        .unwrap_or(code)
        .to_lowercase()
}

/// The languages used to resolve localized text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageContext {
    /// Current UI language
    pub ui_language: String,
    /// Configured default language
    pub default_language: String,
}

impl LanguageContext {
    /// Create a context from a UI language and a default language.
    pub fn new(ui_language: impl Into<String>, default_language: impl Into<String>) -> Self {
        Self {
            ui_language: ui_language.into(),
            default_language: default_language.into(),
        }
    }

    /// Create a context from the process locale, defaulting to English.
    pub fn detect() -> Self {
        Self::new(detect_locale(), FALLBACK_LANGUAGE)
    }
}

impl Default for LanguageContext {
    fn default() -> Self {
        Self::new(FALLBACK_LANGUAGE, FALLBACK_LANGUAGE)
    }
}

/// Detect the UI language from `LC_ALL`, `LC_MESSAGES` or `LANG`.
///
/// `"de_DE.UTF-8"` becomes `"de"`. Returns `"en"` when nothing is set.
pub fn detect_locale() -> String {
    detect_locale_from(|key| env::var(key).ok())
}

/// [`detect_locale`] over any variable source.
pub fn detect_locale_from(var: impl Fn(&str) -> Option<String>) -> String {
    ["LC_ALL", "LC_MESSAGES", "LANG"]
        .into_iter()
        .filter_map(|key| var(key))
        .find_map(|value| normalize_locale(&value))
        .unwrap_or_else(|| FALLBACK_LANGUAGE.to_string())
}

/// Normalize a POSIX locale string to a language code.
///
/// Returns `None` for empty values and the `C`/`POSIX` locales.
pub fn normalize_locale(value: &str) -> Option<String> {
    let trimmed = value.trim();
    let without_encoding = trimmed.split('.').next().unwrap_or(trimmed);
    if without_encoding.is_empty()
        || without_encoding.eq_ignore_ascii_case("c")
        || without_encoding.eq_ignore_ascii_case("posix")
    {
        return None;
    }
    Some(base_language(without_encoding))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names() -> LocalizedText {
        serde_json::from_str(r#"[{"en": "John"}, {"fa": "جان"}]"#).unwrap()
    }

    #[test]
    fn test_deserialize_shapes() {
        let plain: LocalizedText = serde_json::from_str(r#""John""#).unwrap();
        assert_eq!(plain, LocalizedText::plain("John"));

        let map: LocalizedText = serde_json::from_str(r#"{"en": "John", "de": "Johann"}"#).unwrap();
        assert!(matches!(map, LocalizedText::Map(_)));

        assert!(matches!(names(), LocalizedText::Variants(_)));
    }

    #[test]
    fn test_resolve_prefers_ui_language() {
        let ctx = LanguageContext::new("fa", "en");
        assert_eq!(names().resolve(&ctx), Some("جان"));
    }

    #[test]
    fn test_resolve_falls_back_to_default_language() {
        let ctx = LanguageContext::new("de", "en");
        assert_eq!(names().resolve(&ctx), Some("John"));
    }

    #[test]
    fn test_resolve_falls_back_to_first_variant() {
        let ctx = LanguageContext::new("de", "it");
        let text: LocalizedText = serde_json::from_str(r#"[{"fa": "جان"}, {"en": "John"}]"#).unwrap();
        assert_eq!(text.resolve(&ctx), Some("جان"));
    }

    #[test]
    fn test_resolve_matches_regional_codes() {
        let ctx = LanguageContext::new("en_US", "fa");
        assert_eq!(names().resolve(&ctx), Some("John"));
    }

    #[test]
    fn test_empty_variants_are_skipped() {
        let text: LocalizedText = serde_json::from_str(r#"[{"en": ""}, {"fa": "جان"}]"#).unwrap();
        assert_eq!(text.resolve(&LanguageContext::default()), Some("جان"));
        assert_eq!(LocalizedText::plain("").resolve(&LanguageContext::default()), None);
    }

    #[test]
    fn test_exact_variant_beats_earlier_regional_one() {
        let text: LocalizedText =
            serde_json::from_str(r#"[{"en-US": "Color"}, {"en": "Colour"}]"#).unwrap();
        assert_eq!(text.get("en"), Some("Colour"));
        assert_eq!(text.get("en-US"), Some("Color"));
        assert_eq!(text.get("en_GB"), Some("Color"));
    }

    #[test]
    fn test_empty_exact_variant_falls_through() {
        let text: LocalizedText =
            serde_json::from_str(r#"[{"en": ""}, {"en-GB": "Colour"}, {"fa": "رنگ"}]"#).unwrap();
        assert_eq!(text.get("en"), Some("Colour"));

        let map: LocalizedText = serde_json::from_str(r#"{"de": "", "de-AT": "Farbe"}"#).unwrap();
        assert_eq!(map.get("de"), Some("Farbe"));
        assert_eq!(map.resolve(&LanguageContext::new("de", "en")), Some("Farbe"));
    }

    #[test]
    fn test_detect_locale_precedence() {
        let vars = |pairs: &'static [(&'static str, &'static str)]| {
            move |key: &str| {
                pairs
                    .iter()
                    .find(|(k, _)| *k == key)
                    .map(|(_, v)| v.to_string())
            }
        };

        assert_eq!(
            detect_locale_from(vars(&[("LANG", "de_DE.UTF-8"), ("LC_ALL", "fa_IR.UTF-8")])),
            "fa"
        );
        // Blank and C locales are skipped
        assert_eq!(
            detect_locale_from(vars(&[("LC_ALL", ""), ("LC_MESSAGES", "C"), ("LANG", "de_DE")])),
            "de"
        );
        assert_eq!(detect_locale_from(vars(&[("LANG", "POSIX")])), FALLBACK_LANGUAGE);
        assert_eq!(detect_locale_from(|_| None), FALLBACK_LANGUAGE);
    }

    #[test]
    fn test_normalize_locale() {
        assert_eq!(normalize_locale("de_DE.UTF-8"), Some("de".to_string()));
        assert_eq!(normalize_locale("fa-IR"), Some("fa".to_string()));
        assert_eq!(normalize_locale("C"), None);
        assert_eq!(normalize_locale(""), None);
    }
}
