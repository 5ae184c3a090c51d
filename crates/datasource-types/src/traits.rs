//! DatasourcePlus trait definition.
//!
//! This trait is the contract between the framework and an external
//! datasource adapter. The framework only ever talks to adapters through
//! it, so each adapter is free to map these calls onto its own driver.

use crate::query::{ConnectionInfo, QueryJson, QueryResponse, Row, SqlQuery};
use crate::table::{Schema, Table};
use std::collections::BTreeMap;

/// Results of a raw query, one entry per statement.
pub type StatementResults = Vec<Vec<serde_json::Value>>;

/// Trait for adapters that expose an external database as framework tables.
///
/// # Usage Pattern
///
/// ```ignore
/// async fn sync_tables<D: DatasourcePlus>(ds: &D, id: &str) -> Result<Schema, D::Error> {
///     let known = BTreeMap::new();
///     ds.build_schema(id, &known).await
/// }
/// ```
#[async_trait::async_trait]
pub trait DatasourcePlus: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Placeholder token the framework writes for positional bindings.
    fn binding_identifier(&self) -> &'static str;

    /// Expression concatenating the given expressions as strings.
    fn string_concat(&self, parts: &[String]) -> String;

    /// Probe connectivity. Never fails; problems are reported in the result.
    async fn test_connection(&self) -> ConnectionInfo;

    /// Raw structural description of the database.
    async fn get_schema(&self) -> Result<serde_json::Value, Self::Error>;

    async fn get_table_names(&self) -> Result<Vec<String>, Self::Error>;

    /// Dispatch an abstract query descriptor.
    async fn query(&self, json: &QueryJson) -> Result<QueryResponse, Self::Error>;

    /// Introspect every table into framework table definitions.
    ///
    /// `entities` holds the tables the framework already knows for this
    /// datasource; it is consulted for identifier continuity only.
    async fn build_schema(
        &self,
        datasource_id: &str,
        entities: &BTreeMap<String, Table>,
    ) -> Result<Schema, Self::Error>;

    async fn create(&self, query: &SqlQuery) -> Result<StatementResults, Self::Error>;

    async fn read(&self, query: &SqlQuery) -> Result<StatementResults, Self::Error>;

    /// Point lookup by record identifier.
    async fn read_one(&self, id: &str) -> Result<Option<Row>, Self::Error>;

    async fn update(&self, query: &SqlQuery) -> Result<StatementResults, Self::Error>;

    async fn delete(&self, query: &SqlQuery) -> Result<StatementResults, Self::Error>;

    /// Execute a query with positional bindings substituted.
    async fn sql(&self, query: &SqlQuery) -> Result<StatementResults, Self::Error>;
}
