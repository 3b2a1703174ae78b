//! Type Registry - attribute type definitions per owner class and scope

use super::sqlite::SqliteStore;
use super::statements;
use crate::attribute::{AttributeType, TypeMap, TypeScope};
use crate::datatype::{split_parameters, DataTypeRegistry};
use crate::Result;
use rusqlite::{params, Connection, Row};
use std::collections::HashSet;

/// A raw `attribute_type` row, before its data type is resolved.
///
/// Column order: type_id, name, group_name, type_index, data_type,
/// type_parameters, required, multi_valued, multi_lingual.
#[derive(Debug)]
pub(super) struct TypeRow {
    type_id: Option<String>,
    name: String,
    group: String,
    index: Option<i64>,
    data_type: String,
    parameters: Option<String>,
    required: String,
    multi_valued: String,
    multi_lingual: String,
}

impl TypeRow {
    /// Read the nine type columns starting at `offset`
    pub(super) fn read(row: &Row, offset: usize) -> rusqlite::Result<Self> {
        Ok(Self {
            type_id: row.get(offset)?,
            name: row.get(offset + 1)?,
            group: row.get(offset + 2)?,
            index: row.get(offset + 3)?,
            data_type: row.get(offset + 4)?,
            parameters: row.get(offset + 5)?,
            required: row.get(offset + 6)?,
            multi_valued: row.get(offset + 7)?,
            multi_lingual: row.get(offset + 8)?,
        })
    }

    /// Resolve the data type; an unknown identifier is a configuration error
    pub(super) fn resolve(self, registry: &DataTypeRegistry) -> Result<AttributeType> {
        let params = split_parameters(self.parameters.as_deref());
        Ok(AttributeType {
            data_type: registry.resolve(&self.data_type, &params)?,
            name: self.name,
            group: self.group,
            index: self.index,
            required: parse_flag(&self.required),
            multi_valued: parse_flag(&self.multi_valued),
            multi_lingual: parse_flag(&self.multi_lingual),
            scope: TypeScope::from_owner_id(self.type_id.as_deref()),
        })
    }
}

/// `Y`/`N` flags, case-insensitive
pub(super) fn parse_flag(flag: &str) -> bool {
    flag.trim().eq_ignore_ascii_case("y")
}

pub(super) fn flag(value: bool) -> &'static str {
    if value { "Y" } else { "N" }
}

/// Load the effective types for an owner through any connection or transaction.
///
/// An instance-scoped type hides the class-wide type of the same name.
pub(super) fn load_types_in(
    conn: &Connection,
    registry: &DataTypeRegistry,
    owner_class: &str,
    owner_id: Option<&str>,
) -> Result<TypeMap> {
    let scope = TypeScope::from_owner_id(owner_id);
    let mut stmt = conn.prepare_cached(statements::SELECT_TYPES)?;
    let rows = stmt
        .query_map(params![owner_class, scope.owner_id()], |row| TypeRow::read(row, 0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let overridden: HashSet<String> = rows
        .iter()
        .filter(|row| row.type_id.is_some())
        .map(|row| row.name.clone())
        .collect();

    let mut types = TypeMap::new();
    for row in rows {
        if row.type_id.is_none() && overridden.contains(&row.name) {
            continue;
        }
        types.insert(row.resolve(registry)?);
    }
    Ok(types)
}

impl SqliteStore {
    // ========== Type Registry ==========

    /// Load the effective types for an owner class, optionally for one instance
    pub fn load_types(&self, owner_class: &str, owner_id: Option<&str>) -> Result<TypeMap> {
        let types = load_types_in(&self.conn, &self.options.registry, owner_class, owner_id)?;
        tracing::debug!("Loaded {} types for {}/{:?}", types.len(), owner_class, owner_id);
        Ok(types)
    }

    /// Replace every type of one scope. Not incremental.
    pub fn save_types(
        &mut self,
        owner_class: &str,
        owner_id: Option<&str>,
        types: &TypeMap,
    ) -> Result<()> {
        let scope = TypeScope::from_owner_id(owner_id);
        let tx = self.conn.transaction()?;
        tx.execute(statements::DELETE_TYPES, params![owner_class, scope.owner_id()])?;
        {
            let mut insert = tx.prepare_cached(statements::INSERT_TYPE)?;
            for ty in types {
                let parameters = ty.data_type.stored_parameters()?;
                insert.execute(params![
                    owner_class,
                    scope.owner_id(),
                    ty.name,
                    ty.group,
                    ty.index,
                    ty.data_type.name(),
                    parameters,
                    flag(ty.required),
                    flag(ty.multi_valued),
                    flag(ty.multi_lingual),
                ])?;
            }
        }
        tx.commit()?;
        tracing::debug!("Saved {} types for {}/{}", types.len(), owner_class, scope);
        Ok(())
    }

    /// Delete every type of one scope
    pub fn remove_types(&mut self, owner_class: &str, owner_id: Option<&str>) -> Result<()> {
        let scope = TypeScope::from_owner_id(owner_id);
        let tx = self.conn.transaction()?;
        let removed = tx.execute(statements::DELETE_TYPES, params![owner_class, scope.owner_id()])?;
        tx.commit()?;
        tracing::debug!("Removed {} types for {}/{}", removed, owner_class, scope);
        Ok(())
    }
}
