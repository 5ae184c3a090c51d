use crate::connect::{ConnectionManager, SurrealConfig};
use crate::error::{AdapterError, Result};
use crate::query::{execute, plan, select_record};
use crate::raw::{self, substitute_bindings, BINDING_IDENTIFIER};
use crate::record::record_id;
use crate::rows::to_framework;
use crate::schema;
use datasource_types::{
    ConnectionInfo, DatasourcePlus, QueryJson, QueryResponse, Row, Schema, SqlQuery,
    StatementResults, Table, TableSchema,
};
use std::collections::BTreeMap;
use std::future::Future;
use surrealdb::engine::any::Any;
use surrealdb::Surreal;
use tokio_util::sync::CancellationToken;

/// SurrealDB datasource adapter.
///
/// Holds one lazily opened session. Every operation opens the session if
/// needed, then runs under the configured deadline and the adapter's
/// cancellation token. There is no locking between operations; concurrent
/// calls interleave at the database.
pub struct SurrealDatasource {
    connection: ConnectionManager,
    cancel: CancellationToken,
}

impl SurrealDatasource {
    pub fn new(config: SurrealConfig) -> Self {
        Self {
            connection: ConnectionManager::new(config),
            cancel: CancellationToken::new(),
        }
    }

    pub fn config(&self) -> &SurrealConfig {
        self.connection.config()
    }

    /// Open the session if it is not open yet.
    pub async fn ensure_open(&self) -> Result<()> {
        self.guarded("connect", self.connection.ensure_open())
            .await
            .map(|_| ())
    }

    pub async fn is_open(&self) -> bool {
        self.connection.is_open().await
    }

    /// Cancel in-flight operations and drop the session.
    ///
    /// Operations started after closing fail with [`AdapterError::Cancelled`].
    pub async fn close(&self) {
        self.cancel.cancel();
        self.connection.close().await;
    }

    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled()
    }

    async fn session(&self) -> Result<Surreal<Any>> {
        self.connection.ensure_open().await
    }

    /// Run `fut` under the configured deadline and the cancellation token.
    async fn guarded<T, F>(&self, operation: &str, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        if self.cancel.is_cancelled() {
            return Err(AdapterError::Cancelled {
                operation: operation.to_string(),
            });
        }

        let deadline = self.connection.config().timeout;
        let timed = async {
            match deadline {
                Some(after) => tokio::time::timeout(after, fut).await.map_err(|_| {
                    AdapterError::Timeout {
                        operation: operation.to_string(),
                        after,
                    }
                })?,
                None => fut.await,
            }
        };

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(AdapterError::Cancelled {
                operation: operation.to_string(),
            }),
            result = timed => result,
        }
    }

    async fn passthrough(&self, operation: &str, sql: &str) -> Result<StatementResults> {
        self.guarded(operation, async {
            let surreal = self.session().await?;
            raw::execute(&surreal, sql, Vec::new()).await
        })
        .await
    }
}

#[async_trait::async_trait]
impl DatasourcePlus for SurrealDatasource {
    type Error = AdapterError;

    fn binding_identifier(&self) -> &'static str {
        BINDING_IDENTIFIER
    }

    fn string_concat(&self, parts: &[String]) -> String {
        raw::string_concat(parts)
    }

    async fn test_connection(&self) -> ConnectionInfo {
        let probe = self
            .guarded("test connection", async {
                let surreal = self.session().await?;
                surreal.query("RETURN true").await?.check()?;
                Ok(())
            })
            .await;

        match probe {
            Ok(()) => ConnectionInfo::connected(),
            Err(e) => {
                tracing::debug!("Connection test failed: {e}");
                ConnectionInfo::failed(e.to_string())
            }
        }
    }

    async fn get_schema(&self) -> Result<serde_json::Value> {
        self.guarded("get schema", async {
            let surreal = self.session().await?;
            schema::db_structure(&surreal).await
        })
        .await
    }

    async fn get_table_names(&self) -> Result<Vec<String>> {
        self.guarded("get table names", async {
            let surreal = self.session().await?;
            let structure = schema::db_structure(&surreal).await?;
            schema::table_names(&structure)
        })
        .await
    }

    async fn query(&self, json: &QueryJson) -> Result<QueryResponse> {
        let operation = json.operation.to_string();
        tracing::debug!("Dispatching {} on table '{}'", operation, json.table.name);

        let plan = plan(json)?;
        self.guarded(&operation, async {
            let surreal = self.session().await?;
            execute(&surreal, plan, &json.table.schema).await
        })
        .await
    }

    async fn build_schema(
        &self,
        datasource_id: &str,
        entities: &BTreeMap<String, Table>,
    ) -> Result<Schema> {
        self.guarded("build schema", async {
            let surreal = self.session().await?;
            schema::build_schema(&surreal, datasource_id, entities).await
        })
        .await
    }

    async fn create(&self, query: &SqlQuery) -> Result<StatementResults> {
        self.passthrough("create", &query.sql).await
    }

    async fn read(&self, query: &SqlQuery) -> Result<StatementResults> {
        self.passthrough("read", &query.sql).await
    }

    async fn read_one(&self, id: &str) -> Result<Option<Row>> {
        let id = record_id("", id)?;
        self.guarded("read one", async {
            let surreal = self.session().await?;
            let record = select_record(&surreal, &id).await?;
            Ok(record.map(|r| to_framework(&TableSchema::new(), r)))
        })
        .await
    }

    async fn update(&self, query: &SqlQuery) -> Result<StatementResults> {
        self.passthrough("update", &query.sql).await
    }

    async fn delete(&self, query: &SqlQuery) -> Result<StatementResults> {
        self.passthrough("delete", &query.sql).await
    }

    async fn sql(&self, query: &SqlQuery) -> Result<StatementResults> {
        let bindings = query.bindings.as_deref().unwrap_or_default();
        let (sql, params) = substitute_bindings(&query.sql, bindings);
        self.guarded("sql", async {
            let surreal = self.session().await?;
            raw::execute(&surreal, &sql, params).await
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_closed_adapter_rejects_operations() {
        let ds = SurrealDatasource::new(SurrealConfig::new("mem://", "test", "test"));
        ds.ensure_open().await.unwrap();
        ds.close().await;

        assert!(ds.is_closed());
        assert!(!ds.is_open().await);
        let err = ds.get_table_names().await.unwrap_err();
        assert!(matches!(err, AdapterError::Cancelled { .. }), "{err:?}");
    }

    #[tokio::test]
    async fn test_deadline_surfaces_as_timeout() {
        let config = SurrealConfig::new("mem://", "test", "test")
            .with_timeout(Duration::from_millis(50));
        let ds = SurrealDatasource::new(config);

        let err = ds
            .guarded("sleep", async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(())
            })
            .await
            .unwrap_err();
        assert!(
            matches!(&err, AdapterError::Timeout { operation, .. } if operation == "sleep"),
            "{err:?}"
        );
    }

    #[tokio::test]
    async fn test_close_cancels_in_flight_operation() {
        let ds = std::sync::Arc::new(SurrealDatasource::new(SurrealConfig::new(
            "mem://", "test", "test",
        )));

        let pending = {
            let ds = ds.clone();
            tokio::spawn(async move {
                ds.guarded("sleep", async {
                    tokio::time::sleep(Duration::from_secs(30)).await;
                    Ok(())
                })
                .await
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        ds.close().await;

        let err = pending.await.unwrap().unwrap_err();
        assert!(matches!(err, AdapterError::Cancelled { .. }), "{err:?}");
    }

    #[test]
    fn test_adapter_identity() {
        let ds = SurrealDatasource::new(SurrealConfig::new("mem://", "test", "test"));
        assert_eq!(ds.binding_identifier(), "$var");
        assert_eq!(
            ds.string_concat(&["a".to_string(), "b".to_string()]),
            "concat(a, b)"
        );
    }
}
