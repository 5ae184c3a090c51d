//! Error types for the SurrealDB datasource adapter.
//!
//! Every failure the adapter can surface maps to exactly one variant here.
//! Only `test_connection` on [`crate::SurrealDatasource`] converts a failure
//! into a value; everything else propagates.

use std::time::Duration;
use thiserror::Error;

/// Errors returned by the SurrealDB datasource adapter.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// Session establishment failed (connect, signin or ns/db selection).
    #[error("Failed to connect to SurrealDB: {0}")]
    Connection(String),

    /// External field kind with no framework counterpart.
    #[error("Unsupported SurrealDB field kind: '{kind}'")]
    UnsupportedType { kind: String },

    /// Operation needs a record identifier and none was supplied.
    #[error("{operation} requires an 'id' equality filter")]
    MissingId { operation: String },

    /// The database rejected a query or mutation.
    #[error("SurrealDB query failed: {0}")]
    QueryExecution(String),

    /// Identifier could not be turned into a record id.
    #[error("Invalid record id '{value}': {reason}")]
    InvalidRecordId { value: String, reason: String },

    /// A row value could not be coerced to the field's type.
    #[error("Invalid value for field '{field}': {reason}")]
    InvalidFieldValue { field: String, reason: String },

    /// The query descriptor is malformed.
    #[error("Invalid query descriptor: {0}")]
    InvalidDescriptor(String),

    /// Introspection output did not have the expected shape.
    #[error("Unexpected introspection result: {0}")]
    Introspection(String),

    #[error("{operation} timed out after {after:?}")]
    Timeout { operation: String, after: Duration },

    #[error("{operation} was cancelled")]
    Cancelled { operation: String },
}

impl AdapterError {
    pub(crate) fn missing_id(operation: impl std::fmt::Display) -> Self {
        Self::MissingId {
            operation: operation.to_string(),
        }
    }

    pub(crate) fn invalid_value(field: &str, reason: impl Into<String>) -> Self {
        Self::InvalidFieldValue {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<surrealdb::Error> for AdapterError {
    fn from(e: surrealdb::Error) -> Self {
        Self::QueryExecution(e.to_string())
    }
}

/// Result type for adapter operations.
pub type Result<T> = std::result::Result<T, AdapterError>;
