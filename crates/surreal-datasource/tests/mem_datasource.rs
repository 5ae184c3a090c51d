//! Adapter tests against the embedded in-memory SurrealDB engine.
//!
//! Every `mem://` connection gets its own empty datastore, so each test
//! builds its own adapter and fixtures.

use datasource_types::{
    DatasourcePlus, FieldSchema, FieldType, Filters, Operation, QueryJson, QueryResponse, Row,
    SqlQuery, Table, TableSchema,
};
use serde_json::json;
use std::collections::BTreeMap;
use surreal_datasource::{AdapterError, SurrealConfig, SurrealDatasource};

fn mem_datasource() -> SurrealDatasource {
    SurrealDatasource::new(SurrealConfig::new("mem://", "test", "test"))
}

fn person_table() -> Table {
    let mut schema = TableSchema::with_primary_id();
    schema.push(FieldSchema::new("name", FieldType::String)).unwrap();
    schema.push(FieldSchema::new("born", FieldType::Datetime)).unwrap();
    schema.push(FieldSchema::new("active", FieldType::Boolean)).unwrap();
    Table::new("person", schema)
}

fn row(value: serde_json::Value) -> Row {
    value.as_object().cloned().unwrap()
}

async fn setup(ds: &SurrealDatasource, sql: &str) {
    ds.sql(&SqlQuery::new(sql)).await.unwrap();
}

#[tokio::test]
async fn test_connection_probe() {
    let ds = mem_datasource();
    let info = ds.test_connection().await;
    assert!(info.connected, "{info:?}");
    assert!(info.error.is_none());
    // The probe leaves the session open
    assert!(ds.is_open().await);

    let bad = SurrealDatasource::new(SurrealConfig::new("nosuchscheme://x", "ns", "db"));
    let info = bad.test_connection().await;
    assert!(!info.connected);
    assert!(info.error.is_some());
}

#[tokio::test]
async fn test_ensure_open_is_idempotent() -> anyhow::Result<()> {
    let ds = mem_datasource();
    ds.ensure_open().await?;
    setup(&ds, "CREATE person:ada SET name = 'Ada'").await;

    // A second handshake would land on a fresh, empty datastore
    ds.ensure_open().await?;
    let found = ds.read_one("person:ada").await?;
    assert_eq!(found.unwrap().get("name"), Some(&json!("Ada")));
    Ok(())
}

#[tokio::test]
async fn test_concurrent_first_use_shares_one_session() -> anyhow::Result<()> {
    let ds = mem_datasource();
    let (a, b) = tokio::join!(ds.ensure_open(), ds.ensure_open());
    a?;
    b?;

    let create = SqlQuery::new("CREATE person:grace SET name = 'Grace'");
    let (created, _) = tokio::join!(ds.create(&create), ds.ensure_open());
    created?;
    assert!(ds.read_one("person:grace").await?.is_some());
    Ok(())
}

#[tokio::test]
async fn test_every_read_path_returns_records() -> anyhow::Result<()> {
    let ds = mem_datasource();
    let created = ds
        .sql(&SqlQuery::new("CREATE person:ada SET name = 'Ada'"))
        .await?;
    assert_eq!(created, vec![vec![json!({"id": "person:ada", "name": "Ada"})]]);

    let selected = ds.read(&SqlQuery::new("SELECT * FROM person")).await?;
    assert_eq!(selected[0], vec![json!({"id": "person:ada", "name": "Ada"})]);

    let scan = ds
        .query(&QueryJson::new(Operation::Read, person_table()))
        .await?;
    assert_eq!(scan.rows().len(), 1);
    assert_eq!(scan.rows()[0]["id"], json!("person:ada"));

    let point = ds
        .query(
            &QueryJson::new(Operation::Read, person_table())
                .with_id_filter(Filters::id("person:ada")),
        )
        .await?;
    assert_eq!(point.rows().len(), 1);
    assert_eq!(point.rows()[0]["name"], json!("Ada"));

    // A plain key resolves against the target table
    let point = ds
        .query(&QueryJson::new(Operation::Read, person_table()).with_id_filter(Filters::id("ada")))
        .await?;
    assert_eq!(point.rows().len(), 1);

    let one = ds.read_one("person:ada").await?;
    assert_eq!(one, Some(row(json!({"id": "person:ada", "name": "Ada"}))));

    let structure = ds.get_schema().await?;
    assert!(structure.get("tables").is_some(), "{structure}");
    assert_eq!(ds.get_table_names().await?, vec!["person".to_string()]);

    let schema = ds.build_schema("ds1", &BTreeMap::new()).await?;
    assert!(schema.tables.contains_key("person"));
    assert!(schema.errors.is_empty(), "{:?}", schema.errors);
    Ok(())
}

#[tokio::test]
async fn test_build_schema() -> anyhow::Result<()> {
    let ds = mem_datasource();
    setup(
        &ds,
        "DEFINE TABLE user SCHEMAFULL;
         DEFINE FIELD name ON user TYPE string;
         DEFINE FIELD born ON user TYPE datetime;
         DEFINE FIELD active ON user TYPE bool;
         DEFINE FIELD role ON user TYPE option<'admin' | 'member'>;
         DEFINE TABLE legacy SCHEMAFULL;
         DEFINE FIELD age ON legacy TYPE int;",
    )
    .await;

    let schema = ds.build_schema("ds1", &BTreeMap::new()).await?;

    let user = &schema.tables["user"];
    assert_eq!(user.id.as_deref(), Some("ds1__user"));
    assert_eq!(user.schema.field_names()[0], "id");

    let id = user.schema.get("id").unwrap();
    assert_eq!(id.order, Some(0));
    assert!(!id.visible);

    assert_eq!(user.schema.get("name").unwrap().field_type, FieldType::String);
    assert_eq!(user.schema.get("born").unwrap().field_type, FieldType::Datetime);

    let active = user.schema.get("active").unwrap();
    assert_eq!(active.field_type, FieldType::Boolean);
    assert!(!active.constraints.presence);

    let role = user.schema.get("role").unwrap();
    assert_eq!(role.field_type, FieldType::Options);
    assert!(!role.constraints.presence);
    assert_eq!(
        role.constraints.inclusion,
        Some(vec!["admin".to_string(), "member".to_string()])
    );

    // `int` has no framework counterpart; only that table fails
    assert!(!schema.tables.contains_key("legacy"));
    assert!(schema.errors["legacy"].contains("int"));

    let names = ds.get_table_names().await?;
    assert!(names.contains(&"user".to_string()));
    assert!(names.contains(&"legacy".to_string()));
    Ok(())
}

#[tokio::test]
async fn test_crud_dispatch() -> anyhow::Result<()> {
    let ds = mem_datasource();
    let table = person_table();

    let created = ds
        .query(
            &QueryJson::new(Operation::Create, table.clone())
                .with_body(row(json!({"name": "Ada", "born": "1815-12-10"}))),
        )
        .await?;
    let created = created.into_rows();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0]["active"], json!(false));
    assert!(created[0]["born"].is_string());
    let id = created[0]["id"].as_str().unwrap().to_string();
    assert!(id.starts_with("person:"), "{id}");

    let scan = ds
        .query(&QueryJson::new(Operation::Read, table.clone()))
        .await?;
    assert_eq!(scan.rows().len(), 1);

    let point = ds
        .query(&QueryJson::new(Operation::Read, table.clone()).with_id_filter(Filters::id(&id)))
        .await?;
    assert_eq!(point.rows().len(), 1);
    assert_eq!(point.rows()[0]["name"], json!("Ada"));

    let updated = ds
        .query(
            &QueryJson::new(Operation::Update, table.clone())
                .with_filters(Filters::id(&id))
                .with_body(row(json!({"name": "Ada Lovelace", "active": true}))),
        )
        .await?;
    assert_eq!(updated.rows().len(), 1);
    assert_eq!(updated.rows()[0]["name"], json!("Ada Lovelace"));
    assert_eq!(updated.rows()[0]["active"], json!(true));

    let deleted = ds
        .query(&QueryJson::new(Operation::Delete, table.clone()).with_id_filter(Filters::id(&id)))
        .await?;
    assert!(deleted.rows().is_empty());

    let scan = ds.query(&QueryJson::new(Operation::Read, table)).await?;
    assert!(scan.rows().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_point_read_of_missing_record_is_empty() -> anyhow::Result<()> {
    let ds = mem_datasource();
    let response = ds
        .query(
            &QueryJson::new(Operation::Read, person_table())
                .with_id_filter(Filters::id("person:nobody")),
        )
        .await?;
    assert!(response.rows().is_empty());
    assert!(ds.read_one("person:nobody").await?.is_none());
    Ok(())
}

#[tokio::test]
async fn test_update_without_id_fails_before_connecting() {
    // Unreachable target: any network attempt would be a connection error
    let ds = SurrealDatasource::new(SurrealConfig::new("nosuchscheme://x", "ns", "db"));
    let query = QueryJson::new(Operation::Update, person_table())
        .with_body(row(json!({"name": "Ada"})));

    let err = ds.query(&query).await.unwrap_err();
    assert!(matches!(err, AdapterError::MissingId { .. }), "{err:?}");
    assert!(!ds.is_open().await);
}

#[tokio::test]
async fn test_table_ddl_is_reported_unsupported() -> anyhow::Result<()> {
    let ds = mem_datasource();
    let response = ds
        .query(&QueryJson::new(Operation::CreateTable, person_table()))
        .await?;
    assert_eq!(
        response,
        QueryResponse::Unsupported {
            operation: Operation::CreateTable
        }
    );
    Ok(())
}

#[tokio::test]
async fn test_sql_bindings_are_bound_not_spliced() -> anyhow::Result<()> {
    let ds = mem_datasource();
    setup(&ds, "CREATE person:ada SET name = 'Ada'; CREATE person:bob SET name = 'Bob';").await;

    let query = SqlQuery::new("SELECT * FROM person WHERE name = $var").with_bindings(vec![json!("Ada")]);
    let results = ds.sql(&query).await?;
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].len(), 1);
    assert_eq!(results[0][0]["name"], json!("Ada"));

    let hostile = SqlQuery::new("SELECT * FROM person WHERE name = $var")
        .with_bindings(vec![json!("x'; DELETE person; --")]);
    let results = ds.sql(&hostile).await?;
    assert!(results[0].is_empty());

    let all = ds.read(&SqlQuery::new("SELECT * FROM person")).await?;
    assert_eq!(all[0].len(), 2);
    Ok(())
}

#[tokio::test]
async fn test_raw_passthrough_returns_each_statement() -> anyhow::Result<()> {
    let ds = mem_datasource();
    let results = ds
        .create(&SqlQuery::new(
            "CREATE counter:1 SET value = 1; SELECT * FROM counter;",
        ))
        .await?;
    assert_eq!(results.len(), 2);
    assert_eq!(results[1][0]["value"], json!(1));

    ds.update(&SqlQuery::new("UPDATE counter:1 SET value = 2"))
        .await?;
    ds.delete(&SqlQuery::new("DELETE counter:1")).await?;
    assert!(ds.read_one("counter:1").await?.is_none());
    Ok(())
}

#[tokio::test]
async fn test_rejected_query_is_execution_error() {
    let ds = mem_datasource();
    let err = ds.read(&SqlQuery::new("SELEC * FROM")).await.unwrap_err();
    assert!(matches!(err, AdapterError::QueryExecution(_)), "{err:?}");
}
