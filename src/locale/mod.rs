//! Locales - language/country/variant triples
//!
//! Format accepted by [`Locale::parse`]: `<language>[_<COUNTRY>[_<variant>]]`,
//! with `-` accepted as a separator as well.
//!
//! Examples:
//! - `en`
//! - `en_GB`
//! - `fr-CA`
//! - `no_NO_NY`

pub mod resolver;

pub use resolver::LocaleResolver;

use crate::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Anything that carries a locale and can take part in locale resolution.
pub trait Localized {
    fn locale(&self) -> &Locale;
}

impl Localized for Locale {
    fn locale(&self) -> &Locale {
        self
    }
}

/// A language with an optional country and variant.
///
/// Language is normalized to lowercase, country to uppercase. Variant is kept as given.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Locale {
    pub language: String,
    pub country: Option<String>,
    pub variant: Option<String>,
}

impl Locale {
    /// Create a language-only locale
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            language: language.into().to_lowercase(),
            country: None,
            variant: None,
        }
    }

    /// Set the country
    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country = normalize_part(country.into()).map(|c| c.to_uppercase());
        self
    }

    /// Set the variant
    pub fn with_variant(mut self, variant: impl Into<String>) -> Self {
        self.variant = normalize_part(variant.into());
        self
    }

    /// Build a locale from nullable storage columns
    pub fn from_parts(language: &str, country: Option<&str>, variant: Option<&str>) -> Self {
        let mut locale = Self::new(language);
        if let Some(country) = country {
            locale = locale.with_country(country);
        }
        if let Some(variant) = variant {
            locale = locale.with_variant(variant);
        }
        locale
    }

    /// Parse `en`, `en_GB`, `en-GB` or `en_GB_variant`
    pub fn parse(s: &str) -> Result<Self> {
        let mut parts = s.trim().splitn(3, ['_', '-']);
        let language = parts.next().unwrap_or_default();

        if language.is_empty() || !language.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(Error::InvalidLocale(s.to_string()));
        }

        let mut locale = Self::new(language);
        if let Some(country) = parts.next() {
            if !country.chars().all(|c| c.is_ascii_alphanumeric()) {
                return Err(Error::InvalidLocale(s.to_string()));
            }
            locale = locale.with_country(country);
        }
        if let Some(variant) = parts.next() {
            locale = locale.with_variant(variant);
        }
        Ok(locale)
    }

    /// The language-only locale for this locale's language
    pub fn language_only(&self) -> Self {
        Self::new(self.language.clone())
    }

    /// True when neither country nor variant is set
    pub fn is_language_only(&self) -> bool {
        self.country.is_none() && self.variant.is_none()
    }

    /// Detect the platform default locale from `LC_ALL`, `LC_MESSAGES` and `LANG`.
    ///
    /// Falls back to `en` when nothing usable is set.
    pub fn system_default() -> Self {
        ["LC_ALL", "LC_MESSAGES", "LANG"]
            .iter()
            .filter_map(|var| std::env::var(var).ok())
            .find_map(|value| Self::parse_posix(&value))
            .unwrap_or_else(|| Self::new("en"))
    }

    /// Parse a POSIX locale value such as `en_US.UTF-8@euro`
    pub fn parse_posix(value: &str) -> Option<Self> {
        let value = value.trim();
        if value.is_empty() {
            return None;
        }
        if value == "C" || value == "POSIX" || value.starts_with("C.") {
            return Some(Self::new("en"));
        }
        let base = value.split(['.', '@']).next().unwrap_or_default();
        Self::parse(base).ok()
    }

    /// Convert to the canonical string (`en_GB`, `en__POSIX` for a variant without country)
    pub fn to_locale_string(&self) -> String {
        match (&self.country, &self.variant) {
            (None, None) => self.language.clone(),
            (Some(country), None) => format!("{}_{}", self.language, country),
            (country, Some(variant)) => format!(
                "{}_{}_{}",
                self.language,
                country.as_deref().unwrap_or_default(),
                variant
            ),
        }
    }
}

fn normalize_part(part: String) -> Option<String> {
    let trimmed = part.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_locale_string())
    }
}

impl FromStr for Locale {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for Locale {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_locale_string())
    }
}

impl<'de> Deserialize<'de> for Locale {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}
