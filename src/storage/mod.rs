//! Storage Layer - SQLite-backed persistence
//!
//! System of record is SQLite with tables:
//! - attribute_type(type_class, type_id, name, group_name, type_index, data_type,
//!   type_parameters, flags)
//! - attribute(type_class, type_id, owner_class, owner_id, name, language, country,
//!   text_value, value_order)
//! - translation(owner_class, owner_id, attribute, language, country, translation)
//! - localized_text(localization_code, text_group, text_code, language, country, variant,
//!   text_message)

pub mod schema;
pub mod sqlite;
mod statements;
mod rows;
mod types;
mod attributes;
mod translations;

pub use sqlite::{SqliteStore, StoreOptions, MultiValueEncoding, DbStats};
pub use translations::LocalizedText;
