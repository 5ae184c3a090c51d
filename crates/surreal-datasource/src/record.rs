//! Identifier construction: framework table ids and SurrealDB record ids.

use crate::error::{AdapterError, Result};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use surrealdb::sql::{Id, Thing};

/// Separator between datasource id and table name in a table identifier.
pub const TABLE_ID_SEPARATOR: &str = "__";

// Characters left alone by URI component encoding
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Fully-qualified framework identifier of an external table.
///
/// Table names containing spaces are percent-encoded first, so
/// `("ds", "My Table")` becomes `ds__My%20Table`.
pub fn build_external_table_id(datasource_id: &str, table_name: &str) -> String {
    let table_name = if table_name.contains(' ') {
        utf8_percent_encode(table_name, URI_COMPONENT).to_string()
    } else {
        table_name.to_string()
    };
    format!("{datasource_id}{TABLE_ID_SEPARATOR}{table_name}")
}

/// Turn a framework identifier into a SurrealDB record id.
///
/// A full record id (`user:abc`, `user:⟨a b⟩`, `user:1`) is parsed as-is.
/// Anything else is treated as a plain key within `table`.
pub fn record_id(table: &str, raw: &str) -> Result<Thing> {
    if raw.contains(':') {
        if let Ok(thing) = surrealdb::sql::thing(raw) {
            return Ok(thing);
        }
    }

    if table.is_empty() {
        return Err(AdapterError::InvalidRecordId {
            value: raw.to_string(),
            reason: "not a full record id and no table to resolve it against".to_string(),
        });
    }
    if raw.is_empty() {
        return Err(AdapterError::InvalidRecordId {
            value: raw.to_string(),
            reason: "empty identifier".to_string(),
        });
    }

    // Only canonical integers become numeric keys; "007" stays a string
    let key = match raw.parse::<i64>() {
        Ok(n) if n.to_string() == raw => Id::Number(n),
        _ => Id::String(raw.to_string()),
    };
    Ok(Thing::from((table, key)))
}

/// Quote a table name for statements that take an identifier, not a value.
pub fn escape_ident(name: &str) -> String {
    format!("`{}`", name.replace('\\', "\\\\").replace('`', "\\`"))
}
