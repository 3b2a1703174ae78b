//! Translation Store - free-standing localized text
//!
//! Two tables live here:
//! - `translation`: per-owner, per-attribute translated text
//! - `localized_text`: message catalogue entries keyed by group/code/locale,
//!   upserted on their lowercased localization code

use super::sqlite::SqliteStore;
use super::statements;
use crate::attribute::{Translation, TranslationMap};
use crate::datatype::Value;
use crate::locale::{Locale, Localized};
use crate::Result;
use rusqlite::params;
use serde::{Deserialize, Serialize};

/// One message catalogue entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalizedText {
    pub text_group: String,
    pub text_code: String,
    pub locale: Locale,
    pub message: String,
}

impl LocalizedText {
    pub fn new(
        text_group: impl Into<String>,
        text_code: impl Into<String>,
        locale: Locale,
        message: impl Into<String>,
    ) -> Self {
        Self {
            text_group: text_group.into(),
            text_code: text_code.into(),
            locale,
            message: message.into(),
        }
    }

    /// Natural key: `lower(group:code:language:country:variant)`
    pub fn localization_code(&self) -> String {
        format!(
            "{}:{}:{}:{}:{}",
            self.text_group,
            self.text_code,
            self.locale.language,
            self.locale.country.as_deref().unwrap_or_default(),
            self.locale.variant.as_deref().unwrap_or_default()
        )
        .to_lowercase()
    }
}

impl Localized for LocalizedText {
    fn locale(&self) -> &Locale {
        &self.locale
    }
}

impl SqliteStore {
    // ========== Translation Store ==========

    /// Replace every translation of an owner
    pub fn save_translations(
        &mut self,
        owner_class: &str,
        owner_id: &str,
        translations: &TranslationMap,
    ) -> Result<()> {
        let tx = self.conn.transaction()?;
        tx.execute(statements::DELETE_TRANSLATIONS, params![owner_class, owner_id])?;

        let mut written = 0;
        {
            let mut insert = tx.prepare_cached(statements::INSERT_TRANSLATION)?;
            for (attribute, translation) in translations {
                for (locale, value) in translation.explicit() {
                    if locale.variant.is_some() {
                        tracing::warn!(
                            owner_class,
                            owner_id,
                            attribute = %attribute,
                            locale = %locale,
                            "Skipping variant translation"
                        );
                        continue;
                    }
                    insert.execute(params![
                        owner_class,
                        owner_id,
                        attribute,
                        locale.language,
                        locale.country,
                        value.to_string(),
                    ])?;
                    written += 1;
                }
            }
        }
        tx.commit()?;

        tracing::debug!("Saved {} translations for {}/{}", written, owner_class, owner_id);
        Ok(())
    }

    /// Load every translation of an owner; empty when nothing is stored
    pub fn load_translations(&self, owner_class: &str, owner_id: &str) -> Result<TranslationMap> {
        let mut stmt = self.conn.prepare_cached(statements::SELECT_TRANSLATIONS)?;
        let rows = stmt
            .query_map(params![owner_class, owner_id], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Option<String>>(2)?,
                    row.get::<_, String>(3)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut translations = TranslationMap::new();
        for (attribute, language, country, text) in rows {
            translations
                .entry(attribute)
                .or_default()
                .insert(Locale::from_parts(&language, country.as_deref(), None), Value::Text(text));
        }
        Ok(translations)
    }

    /// Delete every translation of an owner
    pub fn remove_translations(&mut self, owner_class: &str, owner_id: &str) -> Result<()> {
        let tx = self.conn.transaction()?;
        tx.execute(statements::DELETE_TRANSLATIONS, params![owner_class, owner_id])?;
        tx.commit()?;
        Ok(())
    }

    /// Best translation of one attribute for the preferred locales
    pub fn translate(
        &self,
        owner_class: &str,
        owner_id: &str,
        attribute: &str,
        preferred: &[Locale],
    ) -> Result<Option<String>> {
        let mut stmt = self.conn.prepare_cached(statements::SELECT_ATTRIBUTE_TRANSLATIONS)?;
        let rows = stmt
            .query_map(params![owner_class, owner_id, attribute], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, Option<String>>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut translation = Translation::new();
        for (language, country, text) in rows {
            let locale = Locale::from_parts(&language, country.as_deref(), None);
            translation.insert(locale, Value::Text(text));
        }
        Ok(translation
            .resolve(preferred, self.resolver())
            .map(ToString::to_string))
    }

    // ========== Localized Text ==========

    /// Insert or update a message catalogue entry
    pub fn upsert_localized_text(&self, text: &LocalizedText) -> Result<()> {
        self.conn.execute(
            statements::UPSERT_LOCALIZED_TEXT,
            params![
                text.localization_code(),
                text.text_group,
                text.text_code,
                text.locale.language,
                text.locale.country,
                text.locale.variant,
                text.message,
            ],
        )?;
        Ok(())
    }

    /// All entries for a group and code, compared case-insensitively
    pub fn localized_texts(&self, text_group: &str, text_code: &str) -> Result<Vec<LocalizedText>> {
        let mut stmt = self.conn.prepare_cached(statements::SELECT_LOCALIZED_TEXTS)?;
        let texts = stmt
            .query_map(params![text_group, text_code], |row| {
                let language: String = row.get(2)?;
                let country: Option<String> = row.get(3)?;
                let variant: Option<String> = row.get(4)?;
                Ok(LocalizedText {
                    text_group: row.get(0)?,
                    text_code: row.get(1)?,
                    locale: Locale::from_parts(&language, country.as_deref(), variant.as_deref()),
                    message: row.get(5)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(texts)
    }

    /// Best message for the preferred locales
    pub fn localize(
        &self,
        text_group: &str,
        text_code: &str,
        preferred: &[Locale],
    ) -> Result<Option<String>> {
        let texts = self.localized_texts(text_group, text_code)?;
        Ok(self
            .resolver()
            .resolve(&texts, preferred)
            .map(|text| text.message.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn locale(s: &str) -> Locale {
        Locale::parse(s).unwrap()
    }

    fn greetings() -> TranslationMap {
        let mut map = TranslationMap::new();
        map.insert(
            "greeting".into(),
            Translation::new()
                .with(locale("en"), "Hello")
                .with(locale("en_GB"), "Hiya")
                .with(locale("fr"), "Bonjour"),
        );
        map.insert("farewell".into(), Translation::new().with(locale("de_AT"), "Servus"));
        map
    }

    #[test]
    fn test_translation_roundtrip() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store.save_translations("Page", "home", &greetings()).unwrap();
        assert_eq!(store.load_translations("Page", "home").unwrap(), greetings());
    }

    #[test]
    fn test_translate() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store.save_translations("Page", "home", &greetings()).unwrap();

        let hit = store
            .translate("Page", "home", "greeting", &[locale("fr_CA"), locale("en_GB")])
            .unwrap();
        assert_eq!(hit.as_deref(), Some("Bonjour"));

        // Inherited fallback: de_AT also answers for plain German.
        let hit = store.translate("Page", "home", "farewell", &[locale("de")]).unwrap();
        assert_eq!(hit.as_deref(), Some("Servus"));

        assert_eq!(store.translate("Page", "home", "missing", &[locale("en")]).unwrap(), None);
    }

    #[test]
    fn test_inherited_fallback_is_not_stored() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let mut map = TranslationMap::new();
        map.insert("farewell".into(), Translation::new().with(locale("de_AT"), "Servus"));
        store.save_translations("Page", "home", &map).unwrap();

        assert_eq!(store.stats().unwrap().translations, 1);
        let loaded = store.load_translations("Page", "home").unwrap();
        assert_eq!(loaded["farewell"].get(&locale("de")), Some(&Value::text("Servus")));
    }

    #[test]
    fn test_save_translations_replaces_and_remove_clears() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store.save_translations("Page", "home", &greetings()).unwrap();

        let mut smaller = TranslationMap::new();
        smaller.insert("greeting".into(), Translation::new().with(locale("it"), "Ciao"));
        store.save_translations("Page", "home", &smaller).unwrap();
        assert_eq!(store.load_translations("Page", "home").unwrap(), smaller);

        store.remove_translations("Page", "home").unwrap();
        assert!(store.load_translations("Page", "home").unwrap().is_empty());
    }

    #[test]
    fn test_localization_code() {
        let text = LocalizedText::new("UI", "Save", locale("en_GB"), "Save");
        assert_eq!(text.localization_code(), "ui:save:en:gb:");
    }

    fn upsert(store: &SqliteStore, group: &str, code: &str, l: &str, message: &str) {
        let text = LocalizedText::new(group, code, locale(l), message);
        store.upsert_localized_text(&text).unwrap();
    }

    fn localized(store: &SqliteStore, group: &str, code: &str, l: &str) -> Option<String> {
        store.localize(group, code, &[locale(l)]).unwrap()
    }

    #[test]
    fn test_upsert_is_idempotent() {
        let store = SqliteStore::open_in_memory().unwrap();
        upsert(&store, "ui", "save", "en", "Save");
        upsert(&store, "UI", "SAVE", "en", "Store");
        upsert(&store, "ui", "save", "en", "Store");

        let texts = store.localized_texts("ui", "save").unwrap();
        assert_eq!(texts.len(), 1);
        assert_eq!(texts[0].message, "Store");
        assert_eq!(store.stats().unwrap().localized_texts, 1);
    }

    #[test]
    fn test_lookup_ignores_case_of_group_and_code() {
        let store = SqliteStore::open_in_memory().unwrap();
        upsert(&store, "ui", "save", "en", "Save");
        upsert(&store, "UI", "Save", "en", "Store");

        assert_eq!(localized(&store, "UI", "Save", "en").as_deref(), Some("Store"));
        assert_eq!(localized(&store, "ui", "SAVE", "en").as_deref(), Some("Store"));
        assert_eq!(store.localized_texts("Ui", "save").unwrap().len(), 1);
    }

    #[test]
    fn test_localize_with_variants() {
        let store = SqliteStore::open_in_memory().unwrap();
        for (l, message) in [("no", "Lagre"), ("no_NO_NY", "Lagra"), ("sv", "Spara")] {
            upsert(&store, "ui", "save", l, message);
        }

        assert_eq!(localized(&store, "ui", "save", "no_NO_NY").as_deref(), Some("Lagra"));
        // Same country, other variant still beats the language-only entry.
        assert_eq!(localized(&store, "ui", "save", "no_NO").as_deref(), Some("Lagra"));
        assert_eq!(localized(&store, "ui", "save", "no_SE").as_deref(), Some("Lagre"));
        assert_eq!(localized(&store, "ui", "cancel", "no"), None);
    }
}
