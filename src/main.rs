//! Command-line interface for surreal-connector
//!
//! # Usage Examples
//!
//! ```bash
//! # Connectivity probe
//! surreal-connector --host ws://localhost --port 8000 \
//!   --namespace app --database app test-connection
//!
//! # Framework table definitions for every SurrealDB table
//! surreal-connector --config connection.toml schema --datasource-id ds_1
//!
//! # Full scan or point lookup through the query dispatcher
//! surreal-connector --config connection.toml read --table user
//! surreal-connector --config connection.toml read --table user --id user:ada
//!
//! # Raw SurrealQL with positional bindings
//! surreal-connector --config connection.toml \
//!   sql 'SELECT * FROM user WHERE age > $var' --binding 30
//! ```

use anyhow::Context;
use clap::{Parser, Subcommand};
use datasource_types::{
    DatasourcePlus, Filters, Operation, QueryJson, SqlQuery, Table, TableSchema,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use surreal_connector::{parse_binding, ConnectionOpts};
use surreal_datasource::SurrealDatasource;

#[derive(Parser)]
#[command(name = "surreal-connector")]
#[command(about = "Expose a SurrealDB database as framework datasource tables")]
#[command(long_about = None)]
struct Cli {
    /// Read connection options from a TOML file instead of flags
    #[arg(long, global = true, env = "SURREAL_CONNECTOR_CONFIG")]
    config: Option<PathBuf>,

    #[command(flatten)]
    connection: ConnectionOpts,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that a session can be established
    TestConnection,

    /// List table names
    Tables,

    /// Print the raw database structure
    Info,

    /// Introspect all tables as framework table definitions
    Schema {
        /// Datasource identifier used to build table identifiers
        #[arg(long)]
        datasource_id: String,
    },

    /// Read rows through the query dispatcher
    Read {
        /// Table to read
        #[arg(long)]
        table: String,

        /// Record id for a point lookup (e.g. user:ada)
        #[arg(long)]
        id: Option<String>,
    },

    /// Execute SurrealQL, substituting positional bindings
    Sql {
        /// Query text; `$var` marks a positional binding
        query: String,

        /// Binding values in order (JSON, or plain text)
        #[arg(long = "binding", value_name = "VALUE")]
        bindings: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = run().await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let opts = match &cli.config {
        Some(path) => ConnectionOpts::from_file(path)?,
        None => cli.connection.clone(),
    };
    let config = opts.to_surreal_config()?;
    tracing::debug!("Using SurrealDB endpoint {}", config.endpoint());

    let ds = SurrealDatasource::new(config);
    let result = execute(&ds, cli.command).await;
    ds.close().await;
    result
}

async fn execute(ds: &SurrealDatasource, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::TestConnection => {
            let info = ds.test_connection().await;
            print_json(&info)?;
            if !info.connected {
                anyhow::bail!("SurrealDB is not reachable");
            }
        }
        Commands::Tables => {
            let names = ds.get_table_names().await.context("Failed to list tables")?;
            print_json(&names)?;
        }
        Commands::Info => {
            let structure = ds
                .get_schema()
                .await
                .context("Failed to read database structure")?;
            print_json(&structure)?;
        }
        Commands::Schema { datasource_id } => {
            let schema = ds
                .build_schema(&datasource_id, &BTreeMap::new())
                .await
                .context("Failed to build schema")?;
            for (table, error) in &schema.errors {
                tracing::warn!("Table '{}' skipped: {}", table, error);
            }
            print_json(&schema)?;
        }
        Commands::Read { table, id } => {
            let mut query = QueryJson::new(
                Operation::Read,
                Table::new(&table, TableSchema::with_primary_id()),
            );
            if let Some(id) = id {
                query = query.with_id_filter(Filters::id(id));
            }
            let response = ds
                .query(&query)
                .await
                .with_context(|| format!("Failed to read table '{table}'"))?;
            print_json(&response)?;
        }
        Commands::Sql { query, bindings } => {
            let bindings = bindings.iter().map(|b| parse_binding(b)).collect();
            let results = ds
                .sql(&SqlQuery::new(query).with_bindings(bindings))
                .await
                .context("Query failed")?;
            print_json(&results)?;
        }
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
