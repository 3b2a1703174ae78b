//! SQL statements, fixed at compile time

// ========== Type Registry ==========

pub const SELECT_TYPES: &str = r#"
SELECT type_id, name, group_name, type_index, data_type, type_parameters,
       required, multi_valued, multi_lingual
FROM attribute_type
WHERE type_class = ?1 AND (type_id IS NULL OR type_id = ?2)
ORDER BY group_name, type_index, name
"#;

pub const DELETE_TYPES: &str =
    "DELETE FROM attribute_type WHERE type_class = ?1 AND type_id IS ?2";

pub const INSERT_TYPE: &str = r#"
INSERT INTO attribute_type (type_class, type_id, name, group_name, type_index, data_type,
                            type_parameters, required, multi_valued, multi_lingual)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
"#;

// ========== Attribute Store ==========

/// Attribute rows joined with their effective type: the instance-scoped type
/// when one exists for the row's `type_id`, else the class-wide one.
pub const SELECT_ATTRIBUTES: &str = r#"
SELECT a.name, a.language, a.country, a.text_value, a.value_order,
       t.type_id, t.name, t.group_name, t.type_index, t.data_type, t.type_parameters,
       t.required, t.multi_valued, t.multi_lingual
FROM attribute a
JOIN attribute_type t
  ON t.type_class = a.type_class
 AND t.name = a.name
 AND (t.type_id = a.type_id
      OR (t.type_id IS NULL
          AND NOT EXISTS (SELECT 1 FROM attribute_type o
                          WHERE o.type_class = a.type_class
                            AND o.name = a.name
                            AND o.type_id = a.type_id)))
WHERE a.owner_class = ?1 AND a.owner_id = ?2
ORDER BY t.group_name, t.type_index, a.name, a.value_order, a.language, a.country
"#;

pub const DELETE_ATTRIBUTES: &str =
    "DELETE FROM attribute WHERE owner_class = ?1 AND owner_id = ?2";

pub const INSERT_ATTRIBUTE: &str = r#"
INSERT INTO attribute (type_class, type_id, owner_class, owner_id, name, language, country,
                       text_value, value_order)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
"#;

pub const SELECT_OWNER_IDS: &str = r#"
SELECT DISTINCT owner_id FROM attribute
WHERE owner_class = ?1 AND name = ?2 AND text_value = ?3
"#;

// ========== Translation Store ==========

pub const SELECT_TRANSLATIONS: &str = r#"
SELECT attribute, language, country, translation FROM translation
WHERE owner_class = ?1 AND owner_id = ?2
ORDER BY attribute, language, country
"#;

pub const SELECT_ATTRIBUTE_TRANSLATIONS: &str = r#"
SELECT language, country, translation FROM translation
WHERE owner_class = ?1 AND owner_id = ?2 AND attribute = ?3
ORDER BY language, country
"#;

pub const DELETE_TRANSLATIONS: &str =
    "DELETE FROM translation WHERE owner_class = ?1 AND owner_id = ?2";

pub const INSERT_TRANSLATION: &str = r#"
INSERT INTO translation (owner_class, owner_id, attribute, language, country, translation)
VALUES (?1, ?2, ?3, ?4, ?5, ?6)
"#;

// ========== Localized Text ==========

pub const UPSERT_LOCALIZED_TEXT: &str = r#"
INSERT INTO localized_text (localization_code, text_group, text_code, language, country, variant,
                            text_message)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
ON CONFLICT(localization_code) DO UPDATE SET text_message = excluded.text_message
"#;

/// Group and code match case-insensitively, like the upsert key.
pub const SELECT_LOCALIZED_TEXTS: &str = r#"
SELECT text_group, text_code, language, country, variant, text_message FROM localized_text
WHERE lower(text_group) = lower(?1) AND lower(text_code) = lower(?2)
ORDER BY language, country, variant
"#;
