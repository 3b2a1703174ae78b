//! Attribute Store - attribute values per owner

use super::rows::{decompose, Assembler, StoredValue};
use super::sqlite::SqliteStore;
use super::statements;
use super::types::{load_types_in, TypeRow};
use crate::attribute::{AttributeMap, AttributeType, TypeScope};
use crate::Result;
use rusqlite::params;
use std::collections::hash_map::Entry;
use std::collections::{BTreeSet, HashMap};

impl SqliteStore {
    // ========== Attribute Store ==========

    /// Replace every attribute of an owner.
    ///
    /// Types are looked up for (`type_class`, `type_id`) inside the same
    /// transaction. Attributes without a type are dropped with a warning; any
    /// other failure rolls the whole save back.
    pub fn save_attributes(
        &mut self,
        type_class: &str,
        type_id: Option<&str>,
        owner_class: &str,
        owner_id: &str,
        attrs: &AttributeMap,
    ) -> Result<()> {
        let type_scope = TypeScope::from_owner_id(type_id);
        let encoding = self.options.encoding;
        let tx = self.conn.transaction()?;
        let types = load_types_in(&tx, &self.options.registry, type_class, type_scope.owner_id())?;

        let missing = types.missing_required(attrs);
        if !missing.is_empty() {
            tracing::debug!(owner_class, owner_id, ?missing, "Saving without required attributes");
        }

        tx.execute(statements::DELETE_ATTRIBUTES, params![owner_class, owner_id])?;

        let mut written = 0;
        {
            let mut insert = tx.prepare_cached(statements::INSERT_ATTRIBUTE)?;
            for (name, value) in attrs {
                let Some(ty) = types.get(name) else {
                    tracing::warn!(
                        owner_class,
                        owner_id,
                        attribute = %name,
                        "Dropping attribute with no type"
                    );
                    continue;
                };
                for row in decompose(ty, value, encoding)? {
                    insert.execute(params![
                        type_class,
                        type_scope.owner_id(),
                        owner_class,
                        owner_id,
                        name,
                        row.language,
                        row.country,
                        row.text,
                        row.order,
                    ])?;
                    written += 1;
                }
            }
        }
        tx.commit()?;

        tracing::debug!("Saved {} attribute rows for {}/{}", written, owner_class, owner_id);
        Ok(())
    }

    /// Load every attribute of an owner; empty when nothing is stored
    pub fn load_attributes(&self, owner_class: &str, owner_id: &str) -> Result<AttributeMap> {
        let mut stmt = self.conn.prepare_cached(statements::SELECT_ATTRIBUTES)?;
        let mut rows = stmt.query(params![owner_class, owner_id])?;

        let mut types: HashMap<String, AttributeType> = HashMap::new();
        let mut assembler = Assembler::new();
        let mut count = 0;

        while let Some(row) = rows.next()? {
            let stored = StoredValue {
                language: row.get(1)?,
                country: row.get(2)?,
                text: row.get(3)?,
                order: row.get(4)?,
            };
            let type_row = TypeRow::read(row, 5)?;
            let name: String = row.get(0)?;

            let ty = match types.entry(name) {
                Entry::Occupied(entry) => entry.into_mut(),
                Entry::Vacant(entry) => entry.insert(type_row.resolve(&self.options.registry)?),
            };
            assembler.push(ty, stored)?;
            count += 1;
        }

        tracing::debug!("Loaded {} attribute rows for {}/{}", count, owner_class, owner_id);
        Ok(assembler.finish())
    }

    /// Delete every attribute of an owner; types are untouched
    pub fn remove_attributes(&mut self, owner_class: &str, owner_id: &str) -> Result<()> {
        let tx = self.conn.transaction()?;
        let removed = tx.execute(statements::DELETE_ATTRIBUTES, params![owner_class, owner_id])?;
        tx.commit()?;
        tracing::debug!("Removed {} attribute rows for {}/{}", removed, owner_class, owner_id);
        Ok(())
    }

    /// Owners of `owner_class` whose `attribute` has exactly `text_value` stored
    pub fn find_owner_id(
        &self,
        owner_class: &str,
        attribute: &str,
        text_value: &str,
    ) -> Result<BTreeSet<String>> {
        let mut stmt = self.conn.prepare_cached(statements::SELECT_OWNER_IDS)?;
        let ids = stmt
            .query_map(params![owner_class, attribute, text_value], |row| row.get(0))?
            .collect::<rusqlite::Result<BTreeSet<String>>>()?;
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::{AttributeValue, Translation, TypeMap};
    use crate::datatype::{DataType, Value};
    use crate::locale::Locale;
    use crate::storage::{MultiValueEncoding, StoreOptions};

    fn product_types() -> TypeMap {
        [
            AttributeType::new("title", DataType::text()).in_group("main", Some(1)).multi_lingual(),
            AttributeType::new("size", DataType::integer()).in_group("main", Some(2)),
            AttributeType::new("tags", DataType::text()).in_group("meta", Some(1)).multi_valued(),
            AttributeType::new("notes", DataType::text())
                .in_group("meta", Some(2))
                .multi_valued()
                .multi_lingual(),
            AttributeType::new("price", DataType::Decimal { scale: Some(2) })
                .in_group("main", Some(3)),
        ]
        .into_iter()
        .collect()
    }

    fn store_with_types() -> SqliteStore {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store.save_types("Product", None, &product_types()).unwrap();
        store
    }

    fn en() -> Locale {
        Locale::new("en")
    }

    fn sample_attrs() -> AttributeMap {
        let mut attrs = AttributeMap::new();
        attrs.insert(
            "title".into(),
            Translation::new()
                .with(en(), "Chair")
                .with(en().with_country("US"), "Seat")
                .with(Locale::new("fr"), "Chaise")
                .into(),
        );
        attrs.insert("size".into(), Value::Integer(42).into());
        attrs.insert("tags".into(), AttributeValue::list(["wood", "oak", "brown"]));
        attrs.insert(
            "notes".into(),
            AttributeValue::TranslatedList(vec![
                Some(Translation::new().with(en(), "sturdy").with(Locale::new("fr"), "solide")),
                Some(Translation::new().with(en().with_country("GB"), "comfy")),
            ]),
        );
        attrs.insert("price".into(), Value::Decimal(19.5).into());
        attrs
    }

    #[test]
    fn test_roundtrip_all_shapes() {
        let mut store = store_with_types();
        let attrs = sample_attrs();
        store.save_attributes("Product", None, "Product", "p1", &attrs).unwrap();

        let loaded = store.load_attributes("Product", "p1").unwrap();
        assert_eq!(loaded, attrs);
    }

    #[test]
    fn test_load_unknown_owner_is_empty() {
        let store = store_with_types();
        assert!(store.load_attributes("Product", "missing").unwrap().is_empty());
    }

    #[test]
    fn test_unknown_attribute_is_dropped() {
        let mut store = store_with_types();
        let mut attrs = AttributeMap::new();
        attrs.insert("size".into(), Value::Integer(3).into());
        attrs.insert("colour".into(), Value::text("red").into());

        store.save_attributes("Product", None, "Product", "p1", &attrs).unwrap();

        let loaded = store.load_attributes("Product", "p1").unwrap();
        assert_eq!(loaded.len(), 1);
        assert!(!loaded.contains_key("colour"));
    }

    #[test]
    fn test_multi_valued_order_recovered_from_ordinal() {
        let store = store_with_types();
        for (text, order) in [("c", 3), ("a", 1), ("b", 2)] {
            store
                .conn
                .execute(
                    "INSERT INTO attribute (type_class, type_id, owner_class, owner_id, name,
                                            text_value, value_order)
                     VALUES ('Product', NULL, 'Product', 'p1', 'tags', ?1, ?2)",
                    params![text, order],
                )
                .unwrap();
        }

        let loaded = store.load_attributes("Product", "p1").unwrap();
        assert_eq!(loaded["tags"], AttributeValue::list(["a", "b", "c"]));
    }

    #[test]
    fn test_packed_encoding_roundtrip() {
        let options = StoreOptions::new(en()).with_encoding(MultiValueEncoding::Packed);
        let mut store = SqliteStore::open_in_memory_with(options).unwrap();
        store.save_types("Product", None, &product_types()).unwrap();

        let mut attrs = AttributeMap::new();
        attrs.insert("tags".into(), AttributeValue::list(["a", "b", "c"]));
        store.save_attributes("Product", None, "Product", "p1", &attrs).unwrap();

        assert_eq!(store.stats().unwrap().attributes, 1);
        assert_eq!(store.load_attributes("Product", "p1").unwrap(), attrs);
    }

    #[test]
    fn test_find_owner_id() {
        let mut store = store_with_types();
        assert!(store.find_owner_id("Product", "size", "42").unwrap().is_empty());
        assert!(store.find_owner_id("Product", "size", "42").unwrap().is_empty());

        let attrs = sample_attrs();
        store.save_attributes("Product", None, "Product", "p1", &attrs).unwrap();
        store.save_attributes("Product", None, "Product", "p1", &attrs).unwrap();
        store.save_attributes("Product", None, "Product", "p2", &attrs).unwrap();

        let owners = store.find_owner_id("Product", "size", "42").unwrap();
        assert_eq!(owners.into_iter().collect::<Vec<_>>(), vec!["p1", "p2"]);
        assert!(store.find_owner_id("Product", "size", "4").unwrap().is_empty());

        store.remove_attributes("Product", "p1").unwrap();
        store.remove_attributes("Product", "p2").unwrap();
        assert!(store.find_owner_id("Product", "size", "42").unwrap().is_empty());
    }

    #[test]
    fn test_failed_save_keeps_previous_attributes() {
        let mut store = store_with_types();
        let original = sample_attrs();
        store.save_attributes("Product", None, "Product", "p1", &original).unwrap();

        // "price" is written before "size" fails to coerce.
        let mut broken = AttributeMap::new();
        broken.insert("notes".into(), AttributeValue::TranslatedList(vec![None]));
        broken.insert("price".into(), Value::Decimal(1.0).into());
        broken.insert("size".into(), Value::text("big").into());

        assert!(store.save_attributes("Product", None, "Product", "p1", &broken).is_err());
        assert_eq!(store.load_attributes("Product", "p1").unwrap(), original);
    }

    #[test]
    fn test_missing_required_attribute_still_saves() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let types: TypeMap = [
            AttributeType::new("sku", DataType::text()).required(),
            AttributeType::new("size", DataType::integer()),
        ]
        .into_iter()
        .collect();
        store.save_types("Product", None, &types).unwrap();

        let mut attrs = AttributeMap::new();
        attrs.insert("size".into(), Value::Integer(3).into());
        let types = store.load_types("Product", None).unwrap();
        assert_eq!(types.missing_required(&attrs), vec!["sku"]);

        store.save_attributes("Product", None, "Product", "p1", &attrs).unwrap();
        assert_eq!(store.load_attributes("Product", "p1").unwrap(), attrs);
    }

    #[test]
    fn test_empty_list_is_absent_after_reload() {
        let mut store = store_with_types();
        let mut attrs = AttributeMap::new();
        attrs.insert("tags".into(), AttributeValue::List(Vec::new()));
        attrs.insert("size".into(), Value::Integer(1).into());
        store.save_attributes("Product", None, "Product", "p1", &attrs).unwrap();

        let loaded = store.load_attributes("Product", "p1").unwrap();
        assert!(!loaded.contains_key("tags"));
        assert_eq!(loaded["size"], AttributeValue::Single(Value::Integer(1)));
    }

    #[test]
    fn test_instance_type_override_applies_to_join() {
        let mut store = store_with_types();
        let overrides: TypeMap =
            [AttributeType::new("size", DataType::decimal())].into_iter().collect();
        store.save_types("Product", Some("p1"), &overrides).unwrap();

        let mut decimal = AttributeMap::new();
        decimal.insert("size".into(), Value::Decimal(1.5).into());
        store.save_attributes("Product", Some("p1"), "Product", "p1", &decimal).unwrap();

        let mut integer = AttributeMap::new();
        integer.insert("size".into(), Value::Integer(7).into());
        store.save_attributes("Product", Some("p2"), "Product", "p2", &integer).unwrap();

        assert_eq!(store.load_attributes("Product", "p1").unwrap(), decimal);
        assert_eq!(store.load_attributes("Product", "p2").unwrap(), integer);
    }

    #[test]
    fn test_remove_attributes_keeps_types() {
        let mut store = store_with_types();
        store.save_attributes("Product", None, "Product", "p1", &sample_attrs()).unwrap();
        store.remove_attributes("Product", "p1").unwrap();

        assert!(store.load_attributes("Product", "p1").unwrap().is_empty());
        assert_eq!(store.load_types("Product", None).unwrap().len(), 5);
    }

    #[test]
    fn test_resolved_title_for_reader() {
        let mut store = store_with_types();
        store.save_attributes("Product", None, "Product", "p1", &sample_attrs()).unwrap();
        let loaded = store.load_attributes("Product", "p1").unwrap();

        let preferred = [Locale::new("fr").with_country("CA")];
        let title = loaded["title"].as_translation().unwrap();
        assert_eq!(title.resolve(&preferred, store.resolver()), Some(&Value::text("Chaise")));

        let preferred = [en().with_country("GB")];
        assert_eq!(title.resolve(&preferred, store.resolver()), Some(&Value::text("Chair")));
    }
}
