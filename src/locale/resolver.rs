//! Locale Resolver
//!
//! Picks the best candidate for a ranked list of preferred locales.
//!
//! Resolution order, per preferred locale:
//! 1. Exact pass (same language; exact country/variant wins, with partial degrade)
//! 2. Best-fit pass (same language; most specific candidate wins)
//!
//! After the preferred list is exhausted, both passes run once more for the
//! platform default locale. If that also fails, the first candidate is returned.

use super::{Locale, Localized};

/// Resolves localized candidates against preferred locales.
#[derive(Debug, Clone)]
pub struct LocaleResolver {
    default_locale: Locale,
}

impl LocaleResolver {
    /// Create a resolver with an explicit platform default locale
    pub fn new(default_locale: Locale) -> Self {
        Self { default_locale }
    }

    /// Create a resolver using the locale detected from the environment
    pub fn system() -> Self {
        Self::new(Locale::system_default())
    }

    /// The locale used once the preferred locales are exhausted
    pub fn default_locale(&self) -> &Locale {
        &self.default_locale
    }

    /// Select the best candidate for `preferred`, or `None` when there are no candidates.
    pub fn resolve<'a, T: Localized>(
        &self,
        candidates: &'a [T],
        preferred: &[Locale],
    ) -> Option<&'a T> {
        if candidates.is_empty() {
            return None;
        }

        for wanted in preferred.iter().chain(std::iter::once(&self.default_locale)) {
            let found = exact_pass(candidates, wanted)
                .or_else(|| best_fit_pass(candidates, wanted));
            if found.is_some() {
                return found;
            }
        }

        candidates.first()
    }
}

impl Default for LocaleResolver {
    fn default() -> Self {
        Self::system()
    }
}

/// Exact pass over the candidates for one locale.
///
/// Returns immediately on an exact language/country/variant match. Otherwise the
/// pass still degrades in three cases (kept as-is, callers rely on it):
/// - locale without country: a language-only candidate is preferred, else the
///   first country-bearing candidate seen
/// - same country, different variant: a variant-less candidate is preferred,
///   else the first one seen
///
/// Candidates from other countries are discarded.
fn exact_pass<'a, T: Localized>(candidates: &'a [T], wanted: &Locale) -> Option<&'a T> {
    let mut closest: Option<(&'a T, u8)> = None;

    for candidate in candidates {
        let have = candidate.locale();
        if have.language != wanted.language {
            continue;
        }
        if have.country == wanted.country && have.variant == wanted.variant {
            return Some(candidate);
        }

        let rank = match (&wanted.country, &have.country) {
            (None, None) => 2,
            (None, Some(_)) => 1,
            (Some(w), Some(h)) if w == h => {
                if have.variant.is_none() {
                    2
                } else {
                    1
                }
            }
            _ => continue,
        };

        if closest.is_none_or(|(_, best)| rank > best) {
            closest = Some((candidate, rank));
        }
    }

    closest.map(|(candidate, _)| candidate)
}

/// Best-fit pass: any candidate sharing the language qualifies.
///
/// Preference: country and variant match > country match > language-only > other country.
/// Ties keep the first candidate seen.
fn best_fit_pass<'a, T: Localized>(candidates: &'a [T], wanted: &Locale) -> Option<&'a T> {
    let mut best: Option<(&'a T, u8)> = None;

    for candidate in candidates {
        let have = candidate.locale();
        if have.language != wanted.language {
            continue;
        }

        let score = match (&wanted.country, &have.country) {
            (Some(w), Some(h)) if w == h => {
                if have.variant == wanted.variant {
                    4
                } else {
                    3
                }
            }
            (_, None) => 2,
            (None, Some(_)) | (Some(_), Some(_)) => 1,
        };

        if best.is_none_or(|(_, top)| score > top) {
            best = Some((candidate, score));
        }
    }

    best.map(|(candidate, _)| candidate)
}
