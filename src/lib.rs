//! SurrealConnector Library
//!
//! Command-line plumbing around the SurrealDB datasource adapter: connection
//! options (flags, environment or a TOML file) and helpers shared by the
//! `surreal-connector` binary.
//!
//! # CLI Usage
//!
//! ```bash
//! # Check that the database is reachable
//! surreal-connector --host ws://localhost --port 8000 test-connection
//!
//! # Introspect all tables as framework table definitions
//! surreal-connector --config connection.toml schema --datasource-id ds_1
//!
//! # Run SurrealQL with positional bindings
//! surreal-connector sql "SELECT * FROM user WHERE name = \$var" --binding Ada
//! ```

use anyhow::Context;
use clap::Parser;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use surreal_datasource::SurrealConfig;

pub mod config;

#[derive(Parser, Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConnectionOpts {
    /// SurrealDB host, e.g. ws://localhost or mem://
    #[arg(long, default_value = "ws://localhost", env = "SURREAL_HOST")]
    pub host: String,

    /// SurrealDB RPC port; omit for embedded engines
    #[arg(long, env = "SURREAL_PORT")]
    #[serde(default)]
    pub port: Option<u16>,

    /// SurrealDB username; signin is skipped when empty
    #[arg(long, default_value = "root", env = "SURREAL_USERNAME")]
    #[serde(default)]
    pub username: String,

    /// SurrealDB password
    #[arg(long, default_value = "root", env = "SURREAL_PASSWORD")]
    #[serde(default)]
    pub password: String,

    /// SurrealDB namespace
    #[arg(long, env = "SURREAL_NAMESPACE")]
    #[serde(default)]
    pub namespace: Option<String>,

    /// SurrealDB database
    #[arg(long, env = "SURREAL_DATABASE")]
    #[serde(default)]
    pub database: Option<String>,

    /// Per-operation deadline (e.g. "30s", "500ms", "5m")
    #[arg(long, env = "SURREAL_TIMEOUT")]
    #[serde(default)]
    pub timeout: Option<String>,
}

impl ConnectionOpts {
    /// Load options from a TOML file using the same keys as the flags.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read connection config {path:?}"))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse connection config {path:?}"))
    }

    pub fn timeout(&self) -> anyhow::Result<Option<Duration>> {
        self.timeout
            .as_deref()
            .map(config::parse_duration)
            .transpose()
            .context("Invalid timeout")
    }

    pub fn to_surreal_config(&self) -> anyhow::Result<SurrealConfig> {
        let namespace = self
            .namespace
            .as_deref()
            .context("A namespace is required (--namespace or SURREAL_NAMESPACE)")?;
        let database = self
            .database
            .as_deref()
            .context("A database is required (--database or SURREAL_DATABASE)")?;

        let mut config = SurrealConfig::new(&self.host, namespace, database);
        if let Some(port) = self.port {
            config = config.with_port(port);
        }
        if !self.username.is_empty() {
            config = config.with_credentials(&self.username, &self.password);
        }
        if let Some(timeout) = self.timeout()? {
            config = config.with_timeout(timeout);
        }
        Ok(config)
    }
}

/// Interpret a `--binding` argument: JSON when it parses, a string otherwise.
pub fn parse_binding(raw: &str) -> serde_json::Value {
    serde_json::from_str(raw).unwrap_or_else(|_| serde_json::Value::String(raw.to_string()))
}
