//! # eavstore - Entity-Attribute-Value persistence engine
//!
//! A schema-less store for typed attributes attached to arbitrary owners.
//!
//! eavstore provides:
//! - A two-level type registry (instance-scoped types override class-wide defaults)
//! - An attribute store that rebuilds scalar, multi-valued and multi-lingual
//!   values out of flat SQLite rows
//! - A locale resolver that picks the best translation for a ranked list of locales
//! - A translation store for free-standing localized text

pub mod locale;
pub mod datatype;
pub mod attribute;
pub mod storage;
pub mod config;
pub mod ui;

// Re-exports for convenient access
pub use locale::{Locale, LocaleResolver, Localized};
pub use datatype::{DataType, DataTypeRegistry, Value};
pub use attribute::{AttributeMap, AttributeType, AttributeValue, Translation, TypeMap, TypeScope};
pub use storage::{SqliteStore, StoreOptions, MultiValueEncoding};

/// Result type alias for eavstore operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for eavstore operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Coercion error: {0}")]
    Coercion(String),

    #[error("Invalid locale: {0}")]
    InvalidLocale(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
