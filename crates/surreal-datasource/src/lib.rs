//! SurrealDB datasource adapter
//!
//! Lets the framework treat a SurrealDB database as one of its own
//! relational-style datasources:
//!
//! - Schema introspection: SurrealDB tables and field kinds become framework
//!   table schemas with a synthesized `id` primary key
//! - Row conversion in both directions, with datetime/boolean coercion on
//!   the way out
//! - Dispatch of abstract query descriptors to point lookups, scans and
//!   mutations, plus raw SurrealQL passthrough
//! - A lazily opened, single-flight session per adapter instance
//!
//! # Example
//!
//! ```no_run
//! use datasource_types::DatasourcePlus;
//! use surreal_datasource::{SurrealConfig, SurrealDatasource};
//!
//! # async fn run() -> Result<(), surreal_datasource::AdapterError> {
//! let config = SurrealConfig::new("ws://localhost", "app", "app")
//!     .with_port(8000)
//!     .with_credentials("root", "root");
//! let ds = SurrealDatasource::new(config);
//!
//! let schema = ds.build_schema("datasource_1", &Default::default()).await?;
//! for (name, table) in &schema.tables {
//!     println!("{name}: {} fields", table.schema.len());
//! }
//! # Ok(())
//! # }
//! ```

mod adapter;
mod connect;
mod error;
pub mod kind;
pub mod query;
pub mod raw;
pub mod record;
pub mod rows;
pub mod schema;

pub use adapter::SurrealDatasource;
pub use connect::{ConnectionManager, Credentials, SurrealConfig};
pub use error::{AdapterError, Result};
pub use kind::{map_kind, FieldKind};
pub use record::build_external_table_id;

// Re-export SurrealDB types used in public signatures
pub use surrealdb::engine::any::Any as SurrealEngine;
pub use surrealdb::Surreal;
