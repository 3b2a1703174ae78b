//! SQLite storage implementation

use super::schema;
use crate::datatype::{default_registry, DataTypeRegistry};
use crate::locale::{Locale, LocaleResolver};
use crate::Result;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// How multi-valued, single-language attributes are written.
///
/// Both encodings are always understood on read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MultiValueEncoding {
    /// One row per element, ordered by `value_order`
    #[default]
    Rows,
    /// A single row holding the comma-joined elements
    Packed,
}

/// Settings fixed when a store is opened.
#[derive(Debug, Clone)]
pub struct StoreOptions {
    pub registry: DataTypeRegistry,
    pub resolver: LocaleResolver,
    pub encoding: MultiValueEncoding,
}

impl StoreOptions {
    pub fn new(default_locale: Locale) -> Self {
        Self {
            registry: default_registry(),
            resolver: LocaleResolver::new(default_locale),
            encoding: MultiValueEncoding::default(),
        }
    }

    pub fn with_encoding(mut self, encoding: MultiValueEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn with_registry(mut self, registry: DataTypeRegistry) -> Self {
        self.registry = registry;
        self
    }
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self::new(Locale::system_default())
    }
}

/// SQLite-backed attribute store
///
/// Mutating operations take `&mut self` and run in one transaction each;
/// dropping an uncommitted transaction rolls it back.
pub struct SqliteStore {
    pub(super) conn: Connection,
    pub(super) options: StoreOptions,
}

impl SqliteStore {
    /// Open a database file (creates if doesn't exist)
    pub fn open(path: &Path, options: StoreOptions) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self { conn, options };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        Self::open_in_memory_with(StoreOptions::new(Locale::new("en")))
    }

    /// Open an in-memory database with explicit options
    pub fn open_in_memory_with(options: StoreOptions) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn, options };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Initialize the database schema
    fn initialize_schema(&self) -> Result<()> {
        for stmt in schema::all_schema_statements() {
            self.conn.execute(stmt, [])?;
        }
        Ok(())
    }

    pub fn options(&self) -> &StoreOptions {
        &self.options
    }

    pub fn resolver(&self) -> &LocaleResolver {
        &self.options.resolver
    }

    fn count(&self, table: &str) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Get database statistics
    pub fn stats(&self) -> Result<DbStats> {
        Ok(DbStats {
            types: self.count("attribute_type")?,
            attributes: self.count("attribute")?,
            translations: self.count("translation")?,
            localized_texts: self.count("localized_text")?,
        })
    }
}

/// Row counts per table
#[derive(Debug, Clone, Serialize)]
pub struct DbStats {
    pub types: usize,
    pub attributes: usize,
    pub translations: usize,
    pub localized_texts: usize,
}

impl std::fmt::Display for DbStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Database Statistics:")?;
        writeln!(f, "  Types: {}", self.types)?;
        writeln!(f, "  Attribute rows: {}", self.attributes)?;
        writeln!(f, "  Translations: {}", self.translations)?;
        writeln!(f, "  Localized texts: {}", self.localized_texts)
    }
}
