//! Internationalization: supported locales, locale resolution, and the
//! activated message set handed to renderers and API clients.
//!
//! Catalog loading lives in `catalog`; `.po` parsing in `po`.

pub mod catalog;
pub mod po;

use std::collections::BTreeMap;

use serde::Serialize;

/// Message id → translated string.
pub type Messages = BTreeMap<String, String>;

/// Supported locales as `(code, display name)`.
pub const LOCALES: &[(&str, &str)] = &[("en", "English"), ("id", "Indonesian")];

/// Source locale and fallback for anything unsupported.
pub const DEFAULT_LOCALE: &str = "en";

#[must_use]
pub fn is_locale_valid(locale: &str) -> bool {
    LOCALES.iter().any(|(code, _)| *code == locale)
}

/// Map a requested locale onto a supported one, falling back to the default.
#[must_use]
pub fn locale_or_default(locale: &str) -> &'static str {
    LOCALES
        .iter()
        .find(|(code, _)| *code == locale)
        .map_or(DEFAULT_LOCALE, |(code, _)| code)
}

/// Pick the locale for a request: explicit `?locale=` first, then the
/// `Accept-Language` header in order of appearance, then the default.
#[must_use]
pub fn resolve_locale(query: Option<&str>, accept_language: Option<&str>) -> &'static str {
    if let Some(requested) = query.map(str::trim).filter(|l| is_locale_valid(l)) {
        return locale_or_default(requested);
    }

    accept_language
        .into_iter()
        .flat_map(|header| header.split(','))
        .filter_map(|part| part.split(';').next())
        .map(|tag| tag.trim().split('-').next().unwrap_or_default().to_ascii_lowercase())
        .find(|primary| is_locale_valid(primary))
        .map_or(DEFAULT_LOCALE, |primary| locale_or_default(&primary))
}

/// An activated locale with its merged messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct I18n {
    pub locale: String,
    pub messages: Messages,
}

impl I18n {
    #[must_use]
    pub fn new(locale: impl Into<String>, messages: Messages) -> Self {
        Self { locale: locale.into(), messages }
    }

    /// Translate `id`, or return it untouched when no translation exists.
    #[must_use]
    pub fn t<'a>(&'a self, id: &'a str) -> &'a str {
        self.messages.get(id).map_or(id, String::as_str)
    }
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
