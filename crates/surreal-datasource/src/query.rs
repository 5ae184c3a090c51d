//! Query descriptor dispatch.
//!
//! A [`QueryJson`] is first turned into a [`Plan`] without touching the
//! database, so malformed descriptors (UPDATE without an id, CREATE without
//! a body) fail before any network call. The plan is then executed as
//! parameterized SurrealQL against the open session.

use crate::error::{AdapterError, Result};
use crate::raw::take_records;
use crate::record::record_id;
use crate::rows::{to_content, to_external, to_framework};
use datasource_types::{Operation, QueryJson, QueryResponse, Row, TableSchema};
use surrealdb::engine::any::Any;
use surrealdb::sql::{Thing, Value};
use surrealdb::Surreal;

/// Concrete database call a descriptor maps to.
#[derive(Debug, Clone, PartialEq)]
pub enum Plan {
    /// Table DDL; accepted but not performed
    Unsupported(Operation),
    SelectOne(Thing),
    SelectAll(String),
    Insert { table: String, content: Value },
    Update { id: Thing, content: Value },
    Delete(Thing),
}

/// Route a descriptor to the database call it requires.
pub fn plan(json: &QueryJson) -> Result<Plan> {
    let table = json.table.name.as_str();
    let schema = &json.table.schema;

    match json.operation {
        op @ (Operation::CreateTable | Operation::UpdateTable | Operation::DeleteTable) => {
            Ok(Plan::Unsupported(op))
        }
        Operation::Read => match json.extra_id() {
            Some(id) => Ok(Plan::SelectOne(record_id(table, &id)?)),
            None => Ok(Plan::SelectAll(table.to_string())),
        },
        Operation::Create => {
            let body = json.body.as_ref().ok_or_else(|| {
                AdapterError::InvalidDescriptor(format!("CREATE on '{table}' has no row body"))
            })?;
            let record = to_external(schema, Some(body))?;
            Ok(Plan::Insert {
                table: table.to_string(),
                content: to_content(record),
            })
        }
        Operation::Update => {
            let id = json
                .filter_id()
                .ok_or_else(|| AdapterError::missing_id(Operation::Update))?;
            let record = to_external(schema, json.body.as_ref())?;
            Ok(Plan::Update {
                id: record_id(table, &id)?,
                content: to_content(record),
            })
        }
        Operation::Delete => {
            let id = json
                .extra_id()
                .ok_or_else(|| AdapterError::missing_id(Operation::Delete))?;
            Ok(Plan::Delete(record_id(table, &id)?))
        }
    }
}

/// Execute a plan against an open session.
pub async fn execute(
    surreal: &Surreal<Any>,
    plan: Plan,
    schema: &TableSchema,
) -> Result<QueryResponse> {
    match plan {
        Plan::Unsupported(operation) => {
            tracing::debug!("Ignoring {operation}: table definitions are not managed");
            Ok(QueryResponse::Unsupported { operation })
        }
        Plan::SelectOne(id) => {
            let rows = select_record(surreal, &id)
                .await?
                .map(|record| vec![to_framework(schema, record)])
                .unwrap_or_default();
            Ok(QueryResponse::Rows(rows))
        }
        Plan::SelectAll(table) => {
            let query = "SELECT * FROM type::table($table)";
            tracing::trace!("Executing SurrealDB query: {} (table: {})", query, table);
            let mut response = surreal.query(query).bind(("table", table)).await?.check()?;
            let records = take_records(&mut response, 0)?;
            Ok(QueryResponse::Rows(to_rows(schema, records)))
        }
        Plan::Insert { table, content } => {
            let query = "CREATE type::table($table) CONTENT $content";
            tracing::trace!("Executing SurrealDB query: {} (table: {})", query, table);
            let mut response = surreal
                .query(query)
                .bind(("table", table))
                .bind(("content", content))
                .await?
                .check()?;
            let created = take_records(&mut response, 0)?;
            Ok(QueryResponse::Rows(to_rows(schema, created)))
        }
        Plan::Update { id, content } => {
            let query = "UPDATE $record_id CONTENT $content";
            tracing::trace!("Executing SurrealDB query: {} for record: {}", query, id);
            let mut response = surreal
                .query(query)
                .bind(("record_id", id))
                .bind(("content", content))
                .await?
                .check()?;
            let updated = take_records(&mut response, 0)?;
            let rows = updated
                .into_iter()
                .next()
                .map(|record| vec![to_framework(schema, record)])
                .unwrap_or_default();
            Ok(QueryResponse::Rows(rows))
        }
        Plan::Delete(id) => {
            let query = "DELETE $record_id";
            tracing::trace!("Executing SurrealDB query: {} for record: {}", query, id);
            surreal.query(query).bind(("record_id", id)).await?.check()?;
            Ok(QueryResponse::Rows(Vec::new()))
        }
    }
}

/// Point lookup of a single record.
pub async fn select_record(surreal: &Surreal<Any>, id: &Thing) -> Result<Option<Value>> {
    let query = "SELECT * FROM $record_id";
    tracing::trace!("Executing SurrealDB query: {} for record: {}", query, id);
    let mut response = surreal
        .query(query)
        .bind(("record_id", id.clone()))
        .await?
        .check()?;
    let records = take_records(&mut response, 0)?;
    Ok(records.into_iter().next())
}

fn to_rows(schema: &TableSchema, records: Vec<Value>) -> Vec<Row> {
    records
        .into_iter()
        .map(|record| to_framework(schema, record))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use datasource_types::{FieldSchema, FieldType, Filters, Table};
    use serde_json::json;
    use surrealdb::sql::Id;

    fn user_table() -> Table {
        let mut schema = TableSchema::with_primary_id();
        schema.push(FieldSchema::new("name", FieldType::String)).unwrap();
        schema.push(FieldSchema::new("admin", FieldType::Boolean)).unwrap();
        Table::new("user", schema)
    }

    fn body(value: serde_json::Value) -> Row {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_table_ddl_is_unsupported() {
        for op in [
            Operation::CreateTable,
            Operation::UpdateTable,
            Operation::DeleteTable,
        ] {
            let query = QueryJson::new(op, user_table());
            assert_eq!(plan(&query).unwrap(), Plan::Unsupported(op));
        }
    }

    #[test]
    fn test_read_routes_on_id_filter() {
        let scan = QueryJson::new(Operation::Read, user_table());
        assert_eq!(plan(&scan).unwrap(), Plan::SelectAll("user".to_string()));

        let point = scan.with_id_filter(Filters::id("user:ada"));
        let Plan::SelectOne(id) = plan(&point).unwrap() else {
            panic!("expected point lookup");
        };
        assert_eq!(id.tb, "user");
        assert_eq!(id.id, Id::String("ada".to_string()));
    }

    #[test]
    fn test_create_converts_body() {
        let query = QueryJson::new(Operation::Create, user_table())
            .with_body(body(json!({"id": "user:x", "name": "Ada"})));

        let Plan::Insert { table, content } = plan(&query).unwrap() else {
            panic!("expected insert");
        };
        assert_eq!(table, "user");
        let Value::Object(obj) = content else {
            panic!("content should be an object");
        };
        assert!(obj.get("id").is_none());
        assert_eq!(obj.get("admin"), Some(&Value::Bool(false)));
    }

    #[test]
    fn test_create_without_body_is_rejected() {
        let query = QueryJson::new(Operation::Create, user_table());
        assert!(matches!(
            plan(&query),
            Err(AdapterError::InvalidDescriptor(_))
        ));
    }

    #[test]
    fn test_update_requires_id_filter() {
        let query = QueryJson::new(Operation::Update, user_table())
            .with_body(body(json!({"name": "Ada"})));
        assert!(matches!(plan(&query), Err(AdapterError::MissingId { .. })));

        // The primary-key slot is not consulted for UPDATE
        let query = query.with_id_filter(Filters::id("user:ada"));
        assert!(matches!(plan(&query), Err(AdapterError::MissingId { .. })));

        let query = query.with_filters(Filters::id("user:ada"));
        assert!(matches!(plan(&query).unwrap(), Plan::Update { .. }));
    }

    #[test]
    fn test_delete_uses_id_filter_slot() {
        let query = QueryJson::new(Operation::Delete, user_table());
        assert!(matches!(plan(&query), Err(AdapterError::MissingId { .. })));

        let query = query.with_id_filter(Filters::id("ada"));
        let Plan::Delete(id) = plan(&query).unwrap() else {
            panic!("expected delete");
        };
        assert_eq!(id.tb, "user");
    }
}
