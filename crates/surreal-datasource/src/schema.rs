//! Schema introspection: SurrealDB tables → framework table definitions.

use crate::error::{AdapterError, Result};
use crate::kind::to_field_schema;
use crate::raw::take_value;
use crate::record::{build_external_table_id, escape_ident};
use datasource_types::{Schema, Table, TableSchema, ID_FIELD};
use serde::Deserialize;
use std::collections::BTreeMap;
use surrealdb::engine::any::Any;
use surrealdb::sql::Value;
use surrealdb::Surreal;

/// One field as reported by `INFO FOR TABLE ... STRUCTURE`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FieldStructure {
    pub name: String,
    #[serde(default)]
    pub kind: Option<String>,
}

impl FieldStructure {
    pub fn new(name: impl Into<String>, kind: Option<&str>) -> Self {
        Self {
            name: name.into(),
            kind: kind.map(str::to_string),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TableEntry {
    name: String,
}

/// Raw structural description of the selected database.
pub async fn db_structure(surreal: &Surreal<Any>) -> Result<serde_json::Value> {
    info(surreal, "INFO FOR DB STRUCTURE").await
}

/// Table names listed in a database structure document.
pub fn table_names(structure: &serde_json::Value) -> Result<Vec<String>> {
    let tables = structure.get("tables").cloned().ok_or_else(|| {
        AdapterError::Introspection("database structure has no 'tables' entry".to_string())
    })?;
    let entries: Vec<TableEntry> = serde_json::from_value(tables)
        .map_err(|e| AdapterError::Introspection(format!("malformed table list: {e}")))?;
    Ok(entries.into_iter().map(|t| t.name).collect())
}

/// Fields defined on `table`.
pub async fn table_fields(surreal: &Surreal<Any>, table: &str) -> Result<Vec<FieldStructure>> {
    let query = format!("INFO FOR TABLE {} STRUCTURE", escape_ident(table));
    let structure = info(surreal, &query).await?;

    match structure.get("fields") {
        Some(fields) => serde_json::from_value(fields.clone()).map_err(|e| {
            AdapterError::Introspection(format!("malformed field list for '{table}': {e}"))
        }),
        None => Ok(Vec::new()),
    }
}

/// Build a table schema: synthesized `id` first, then discovered fields.
///
/// A field named `id` on the SurrealDB side is skipped; the primary key is
/// always the synthesized one.
pub fn to_table_schema(fields: &[FieldStructure]) -> Result<TableSchema> {
    let mut schema = TableSchema::with_primary_id();
    for field in fields {
        if field.name == ID_FIELD {
            tracing::debug!("Skipping explicit '{ID_FIELD}' field definition");
            continue;
        }
        let descriptor = to_field_schema(&field.name, field.kind.as_deref())?;
        schema
            .push(descriptor)
            .map_err(|e| AdapterError::Introspection(e.to_string()))?;
    }
    Ok(schema)
}

/// Framework table definition for one SurrealDB table.
///
/// The identifier of an already-known table with the same name is kept.
pub fn to_table(
    datasource_id: &str,
    name: &str,
    schema: TableSchema,
    known: Option<&Table>,
) -> Table {
    let id = known
        .and_then(|t| t.id.clone())
        .unwrap_or_else(|| build_external_table_id(datasource_id, name));

    let mut table = Table::new(name, schema);
    table.id = Some(id);
    table.source_id = Some(datasource_id.to_string());
    table
}

/// Introspect every table of the database.
///
/// Failing to list tables fails the whole call. A failure on a single
/// table is recorded in [`Schema::errors`] under the table's name and the
/// scan continues.
pub async fn build_schema(
    surreal: &Surreal<Any>,
    datasource_id: &str,
    entities: &BTreeMap<String, Table>,
) -> Result<Schema> {
    let structure = db_structure(surreal).await?;
    let names = table_names(&structure)?;

    tracing::debug!(
        "Building schema for datasource '{}' from {} tables ({} already known)",
        datasource_id,
        names.len(),
        entities.len()
    );

    let mut schema = Schema::default();
    for name in names {
        let fields = table_fields(surreal, &name).await;
        match fields.and_then(|fields| to_table_schema(&fields)) {
            Ok(table_schema) => {
                let table = to_table(datasource_id, &name, table_schema, entities.get(&name));
                schema.tables.insert(name, table);
            }
            Err(e) => {
                tracing::warn!("Failed to introspect table '{}': {}", name, e);
                schema.errors.insert(name, e.to_string());
            }
        }
    }

    Ok(schema)
}

async fn info(surreal: &Surreal<Any>, query: &str) -> Result<serde_json::Value> {
    tracing::trace!("Executing SurrealDB query: {}", query);
    let mut response = surreal.query(query).await?.check()?;
    match take_value(&mut response, 0)? {
        Value::None | Value::Null => Err(AdapterError::Introspection(format!(
            "'{query}' returned nothing"
        ))),
        info => Ok(info.into_json()),
    }
}
