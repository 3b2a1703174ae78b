//! Row codec - attribute values to flat rows and back
//!
//! Write side: [`decompose`] turns one typed value into the rows to insert.
//! Read side: [`Assembler`] folds joined rows, in `value_order` order, back
//! into an [`AttributeMap`].
//!
//! Multi-valued single-language attributes have two encodings, one row per
//! element or one comma-packed row. Both are read the same way: each stored
//! text is split on commas and every piece becomes an element.

use super::sqlite::MultiValueEncoding;
use crate::attribute::{check_shape, AttributeMap, AttributeType, AttributeValue, Translation};
use crate::datatype::Value;
use crate::locale::Locale;
use crate::{Error, Result};

const PACK_SEPARATOR: &str = ",";

/// Largest jump past the current end of a translated list a stored ordinal may make
const MAX_ORDINAL_GAP: usize = 1024;

/// One `attribute` row, minus the owner columns
#[derive(Debug, Clone, PartialEq)]
pub struct StoredValue {
    pub language: Option<String>,
    pub country: Option<String>,
    pub text: String,
    /// 1-based ordinal
    pub order: i64,
}

impl StoredValue {
    fn plain(text: String, order: i64) -> Self {
        Self { language: None, country: None, text, order }
    }

    /// Locale of a multi-lingual row; `None` when the language is missing
    fn locale(&self) -> Option<Locale> {
        self.language
            .as_deref()
            .filter(|l| !l.is_empty())
            .map(|l| Locale::from_parts(l, self.country.as_deref(), None))
    }
}

/// Turn one attribute value into rows
pub fn decompose(
    ty: &AttributeType,
    value: &AttributeValue,
    encoding: MultiValueEncoding,
) -> Result<Vec<StoredValue>> {
    check_shape(ty, value)?;

    match value {
        AttributeValue::Single(v) => {
            let text = ty.data_type.to_stored(v)?;
            if ty.multi_valued {
                check_unpacked(ty, &text)?;
            }
            Ok(vec![StoredValue::plain(text, 1)])
        }
        AttributeValue::List(values) => {
            let mut texts = Vec::with_capacity(values.len());
            for v in values.iter().flatten() {
                let text = ty.data_type.to_stored(v)?;
                check_unpacked(ty, &text)?;
                texts.push(text);
            }
            Ok(match encoding {
                MultiValueEncoding::Rows => texts
                    .into_iter()
                    .zip(1..)
                    .map(|(text, order)| StoredValue::plain(text, order))
                    .collect(),
                MultiValueEncoding::Packed if texts.is_empty() => Vec::new(),
                MultiValueEncoding::Packed => {
                    vec![StoredValue::plain(texts.join(PACK_SEPARATOR), 1)]
                }
            })
        }
        AttributeValue::Translated(t) => translation_rows(ty, t, 1),
        AttributeValue::TranslatedList(list) => {
            let mut rows = Vec::new();
            let mut order = 0;
            for t in list.iter().flatten() {
                if t.explicit().next().is_none() {
                    continue;
                }
                order += 1;
                rows.extend(translation_rows(ty, t, order)?);
            }
            Ok(rows)
        }
    }
}

/// Elements of single-language lists are split on commas when read back
fn check_unpacked(ty: &AttributeType, text: &str) -> Result<()> {
    if text.contains(PACK_SEPARATOR) {
        return Err(Error::Coercion(format!(
            "multi-valued attribute '{}' cannot hold '{}': elements may not contain '{}'",
            ty.name, text, PACK_SEPARATOR
        )));
    }
    Ok(())
}

fn translation_rows(ty: &AttributeType, t: &Translation, order: i64) -> Result<Vec<StoredValue>> {
    t.explicit()
        .map(|(locale, v)| {
            if locale.variant.is_some() {
                return Err(Error::Coercion(format!(
                    "attribute '{}' cannot store variant locale {}",
                    ty.name, locale
                )));
            }
            Ok(StoredValue {
                language: Some(locale.language.clone()),
                country: locale.country.clone(),
                text: ty.data_type.to_stored(v)?,
                order,
            })
        })
        .collect()
}

/// Folds ordered rows into an attribute map
#[derive(Debug, Default)]
pub struct Assembler {
    attrs: AttributeMap,
}

impl Assembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one row of attribute `ty.name`
    pub fn push(&mut self, ty: &AttributeType, row: StoredValue) -> Result<()> {
        match (ty.multi_valued, ty.multi_lingual) {
            (false, false) => {
                // Rows should not recur; if they do the last one wins.
                let value = ty.data_type.from_stored(&row.text)?;
                self.attrs.insert(ty.name.clone(), AttributeValue::Single(value));
            }
            (false, true) => {
                let Some(locale) = row.locale() else {
                    skip_unlocalized(ty);
                    return Ok(());
                };
                let value = ty.data_type.from_stored(&row.text)?;
                self.translation(&ty.name).insert(locale, value);
            }
            (true, false) => {
                let values = row
                    .text
                    .split(PACK_SEPARATOR)
                    .map(|part| ty.data_type.from_stored(part).map(Some))
                    .collect::<Result<Vec<_>>>()?;
                self.list(&ty.name).extend(values);
            }
            (true, true) => {
                let Some(locale) = row.locale() else {
                    skip_unlocalized(ty);
                    return Ok(());
                };
                if row.order < 1 {
                    tracing::warn!(
                        attribute = %ty.name,
                        order = row.order,
                        "Skipping row with invalid order"
                    );
                    return Ok(());
                }
                let position = (row.order - 1) as usize;
                let len = match self.attrs.get(&ty.name) {
                    Some(AttributeValue::TranslatedList(list)) => list.len(),
                    _ => 0,
                };
                if position > len + MAX_ORDINAL_GAP {
                    tracing::warn!(
                        attribute = %ty.name,
                        order = row.order,
                        "Skipping row with runaway order"
                    );
                    return Ok(());
                }
                let value = ty.data_type.from_stored(&row.text)?;
                let list = self.translated_list(&ty.name);
                if list.len() <= position {
                    list.resize(position + 1, None);
                }
                list[position].get_or_insert_with(Translation::new).insert(locale, value);
            }
        }
        Ok(())
    }

    pub fn finish(self) -> AttributeMap {
        self.attrs
    }

    fn translation(&mut self, name: &str) -> &mut Translation {
        let slot = self.slot(name, |v| matches!(v, AttributeValue::Translated(_)), || {
            AttributeValue::Translated(Translation::new())
        });
        match slot {
            AttributeValue::Translated(t) => t,
            _ => unreachable!("slot shape checked above"),
        }
    }

    fn list(&mut self, name: &str) -> &mut Vec<Option<Value>> {
        let slot = self.slot(name, |v| matches!(v, AttributeValue::List(_)), || {
            AttributeValue::List(Vec::new())
        });
        match slot {
            AttributeValue::List(values) => values,
            _ => unreachable!("slot shape checked above"),
        }
    }

    fn translated_list(&mut self, name: &str) -> &mut Vec<Option<Translation>> {
        let slot = self.slot(name, |v| matches!(v, AttributeValue::TranslatedList(_)), || {
            AttributeValue::TranslatedList(Vec::new())
        });
        match slot {
            AttributeValue::TranslatedList(list) => list,
            _ => unreachable!("slot shape checked above"),
        }
    }

    /// Entry for `name`, reset to `empty()` unless it already has the right shape
    fn slot(
        &mut self,
        name: &str,
        has_shape: impl Fn(&AttributeValue) -> bool,
        empty: impl Fn() -> AttributeValue,
    ) -> &mut AttributeValue {
        let slot = self.attrs.entry(name.to_string()).or_insert_with(&empty);
        if !has_shape(slot) {
            *slot = empty();
        }
        slot
    }
}

fn skip_unlocalized(ty: &AttributeType) {
    tracing::warn!(attribute = %ty.name, "Skipping multi-lingual row without language");
}
