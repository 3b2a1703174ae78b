//! Database schema definitions

/// SQL to create the attribute_type table
///
/// `type_id` is NULL for class-wide types.
pub const CREATE_ATTRIBUTE_TYPE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS attribute_type (
    type_class TEXT NOT NULL,
    type_id TEXT,
    name TEXT NOT NULL,
    group_name TEXT NOT NULL DEFAULT '',
    type_index INTEGER,
    data_type TEXT NOT NULL,
    type_parameters TEXT,
    required TEXT NOT NULL DEFAULT 'N',
    multi_valued TEXT NOT NULL DEFAULT 'N',
    multi_lingual TEXT NOT NULL DEFAULT 'N'
)
"#;

/// SQL to create the attribute table
pub const CREATE_ATTRIBUTE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS attribute (
    type_class TEXT NOT NULL,
    type_id TEXT,
    owner_class TEXT NOT NULL,
    owner_id TEXT NOT NULL,
    name TEXT NOT NULL,
    language TEXT,
    country TEXT,
    text_value TEXT NOT NULL,
    value_order INTEGER NOT NULL DEFAULT 1
)
"#;

/// SQL to create the translation table
pub const CREATE_TRANSLATION_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS translation (
    owner_class TEXT NOT NULL,
    owner_id TEXT NOT NULL,
    attribute TEXT NOT NULL,
    language TEXT NOT NULL,
    country TEXT,
    translation TEXT NOT NULL
)
"#;

/// SQL to create the localized_text table
pub const CREATE_LOCALIZED_TEXT_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS localized_text (
    localization_code TEXT PRIMARY KEY,
    text_group TEXT NOT NULL,
    text_code TEXT NOT NULL,
    language TEXT NOT NULL,
    country TEXT,
    variant TEXT,
    text_message TEXT NOT NULL
)
"#;

/// SQL to create indexes
pub const CREATE_INDEXES: &[&str] = &[
    // At most one class-wide and one per-instance type per (class, name)
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_attribute_type_identity
     ON attribute_type(type_class, IFNULL(type_id, ''), name)",
    "CREATE INDEX IF NOT EXISTS idx_attribute_owner ON attribute(owner_class, owner_id)",
    "CREATE INDEX IF NOT EXISTS idx_attribute_value ON attribute(owner_class, name, text_value)",
    "CREATE INDEX IF NOT EXISTS idx_translation_owner ON translation(owner_class, owner_id)",
    "CREATE INDEX IF NOT EXISTS idx_localized_text_code
     ON localized_text(lower(text_group), lower(text_code))",
];

/// All schema creation statements
pub fn all_schema_statements() -> Vec<&'static str> {
    let mut stmts = vec![
        CREATE_ATTRIBUTE_TYPE_TABLE,
        CREATE_ATTRIBUTE_TABLE,
        CREATE_TRANSLATION_TABLE,
        CREATE_LOCALIZED_TEXT_TABLE,
    ];
    stmts.extend(CREATE_INDEXES.iter().copied());
    stmts
}
