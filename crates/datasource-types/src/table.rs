//! Table-level schema types.
//!
//! A [`TableSchema`] is an ordered mapping from field name to
//! [`FieldSchema`]. Insertion order is preserved on serialization so the
//! framework renders columns in discovery order, with the synthesized
//! primary key first.

use crate::field::{FieldConstraints, FieldSchema, FieldType};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// Name of the primary key field every external table carries.
pub const ID_FIELD: &str = "id";

/// Error type for table schema operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    /// Field names must be unique within a table
    #[error("Field '{0}' is already defined in this table")]
    DuplicateField(String),

    /// The primary key field is synthesized, never supplied
    #[error("Field '{ID_FIELD}' is reserved for the synthesized primary key")]
    ReservedField,
}

/// Ordered field name → field descriptor mapping for one table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableSchema {
    fields: Vec<FieldSchema>,
}

impl TableSchema {
    /// Create an empty schema with no primary key.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a schema holding only the synthesized `id` field.
    ///
    /// The id is a hidden, required, auto-generated string at order 0.
    pub fn with_primary_id() -> Self {
        let id = FieldSchema {
            name: ID_FIELD.to_string(),
            field_type: FieldType::String,
            external_type: None,
            constraints: FieldConstraints::required(),
            autocolumn: true,
            order: Some(0),
            visible: false,
        };
        Self { fields: vec![id] }
    }

    /// Append a discovered field.
    pub fn push(&mut self, field: FieldSchema) -> Result<(), SchemaError> {
        if field.name == ID_FIELD {
            return Err(SchemaError::ReservedField);
        }
        if self.contains(&field.name) {
            return Err(SchemaError::DuplicateField(field.name));
        }
        self.fields.push(field);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldSchema> {
        self.fields.iter()
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Serialize for TableSchema {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for field in &self.fields {
            map.serialize_entry(&field.name, field)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for TableSchema {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct TableSchemaVisitor;

        impl<'de> Visitor<'de> for TableSchemaVisitor {
            type Value = TableSchema;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of field name to field schema")
            }

            fn visit_map<M>(self, mut access: M) -> Result<Self::Value, M::Error>
            where
                M: MapAccess<'de>,
            {
                let mut fields: Vec<FieldSchema> = Vec::new();
                while let Some((key, mut field)) = access.next_entry::<String, FieldSchema>()? {
                    if fields.iter().any(|f| f.name == key) {
                        return Err(serde::de::Error::custom(SchemaError::DuplicateField(key)));
                    }
                    // The map key names the field
                    field.name = key;
                    fields.push(field);
                }
                Ok(TableSchema { fields })
            }
        }

        deserializer.deserialize_map(TableSchemaVisitor)
    }
}

/// Where a table's rows live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableSourceType {
    Internal,
    External,
}

/// A framework table definition backed by a datasource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    /// Fully-qualified table identifier (`{datasource}__{table}`)
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    pub name: String,

    #[serde(rename = "type", default = "default_table_type")]
    pub table_type: String,

    #[serde(default)]
    pub primary: Vec<String>,

    #[serde(default)]
    pub schema: TableSchema,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,

    #[serde(default = "default_source_type")]
    pub source_type: TableSourceType,
}

fn default_table_type() -> String {
    "table".to_string()
}

fn default_source_type() -> TableSourceType {
    TableSourceType::External
}

impl Table {
    /// A table with the given name and schema, not yet bound to a datasource.
    pub fn new(name: impl Into<String>, schema: TableSchema) -> Self {
        Self {
            id: None,
            name: name.into(),
            table_type: default_table_type(),
            primary: vec![ID_FIELD.to_string()],
            schema,
            source_id: None,
            source_type: TableSourceType::External,
        }
    }
}

/// Result of introspecting a datasource.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    pub tables: BTreeMap<String, Table>,

    /// Per-table introspection failures, keyed by table name
    #[serde(default)]
    pub errors: BTreeMap<String, String>,
}
