//! Framework-side types for external datasource adapters.
//!
//! This crate describes the shape the host application-data framework works
//! with, independent of any particular backing database:
//!
//! - [`FieldType`] / [`FieldSchema`] - per-field type and constraints
//! - [`TableSchema`] - ordered field name → field descriptor mapping
//! - [`Table`] / [`Schema`] - introspected tables plus per-table errors
//! - [`QueryJson`] - the abstract operation request an adapter dispatches
//! - [`DatasourcePlus`] - the contract every adapter implements
//!
//! # Architecture
//!
//! ```text
//! datasource-types (this crate)
//!    │
//!    └─── surreal-datasource  (implements DatasourcePlus for SurrealDB)
//! ```

pub mod field;
pub mod query;
pub mod table;
mod traits;

pub use field::{FieldConstraints, FieldSchema, FieldType};
pub use query::{
    ConnectionInfo, Filters, Operation, QueryExtra, QueryJson, QueryResponse, Row, SqlQuery,
};
pub use table::{Schema, SchemaError, Table, TableSchema, TableSourceType, ID_FIELD};
pub use traits::{DatasourcePlus, StatementResults};
