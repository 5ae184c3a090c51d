use crate::error::{AdapterError, Result};
use std::time::Duration;
use surrealdb::engine::any::Any;
use surrealdb::Surreal;
use tokio::sync::Mutex;

/// Root credentials used to sign in after connecting.
#[derive(Clone, Debug)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// SurrealDB connection options
///
/// Identifies exactly one session target. Immutable once handed to an
/// adapter.
#[derive(Clone, Debug)]
pub struct SurrealConfig {
    pub host: String,
    pub port: Option<u16>,
    pub namespace: String,
    pub database: String,
    /// Skipped for embedded engines that run without authentication
    pub credentials: Option<Credentials>,
    /// Deadline applied to every network-bound operation
    pub timeout: Option<Duration>,
}

impl SurrealConfig {
    pub fn new(
        host: impl Into<String>,
        namespace: impl Into<String>,
        database: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port: None,
            namespace: namespace.into(),
            database: database.into(),
            credentials: None,
            timeout: None,
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.credentials = Some(Credentials {
            username: username.into(),
            password: password.into(),
        });
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// RPC endpoint derived from host and port.
    ///
    /// `http(s)://` hosts are rewritten to `ws(s)://` since the RPC
    /// protocol runs over WebSocket.
    pub fn endpoint(&self) -> String {
        let host = match self.host.strip_suffix('/') {
            Some(trimmed) if !self.host.ends_with("://") => trimmed,
            _ => self.host.as_str(),
        };
        let host = host
            .replace("http://", "ws://")
            .replace("https://", "wss://");
        match self.port {
            Some(port) => format!("{host}:{port}"),
            None => host,
        }
    }
}

enum SessionState {
    Uninitialized,
    Open(Surreal<Any>),
    Failed(String),
}

/// Owns the single session of an adapter instance.
///
/// The session is opened lazily by [`ConnectionManager::ensure_open`]. The
/// state lock is held while a session is being established, so concurrent
/// first calls perform one handshake between them. A failed attempt leaves
/// the manager closed and the next call retries.
pub struct ConnectionManager {
    config: SurrealConfig,
    state: Mutex<SessionState>,
}

impl ConnectionManager {
    pub fn new(config: SurrealConfig) -> Self {
        Self {
            config,
            state: Mutex::new(SessionState::Uninitialized),
        }
    }

    pub fn config(&self) -> &SurrealConfig {
        &self.config
    }

    /// Return the open session, establishing it first if needed.
    pub async fn ensure_open(&self) -> Result<Surreal<Any>> {
        let mut state = self.state.lock().await;
        if let SessionState::Open(surreal) = &*state {
            return Ok(surreal.clone());
        }

        match establish(&self.config).await {
            Ok(surreal) => {
                *state = SessionState::Open(surreal.clone());
                Ok(surreal)
            }
            Err(e) => {
                tracing::error!("Failed to connect to SurrealDB: {e}");
                *state = SessionState::Failed(e.to_string());
                Err(e)
            }
        }
    }

    pub async fn is_open(&self) -> bool {
        matches!(*self.state.lock().await, SessionState::Open(_))
    }

    /// Cause of the most recent failed attempt, if the last attempt failed.
    pub async fn last_failure(&self) -> Option<String> {
        match &*self.state.lock().await {
            SessionState::Failed(cause) => Some(cause.clone()),
            _ => None,
        }
    }

    /// Drop the session. A later `ensure_open` connects again.
    pub async fn close(&self) {
        let mut state = self.state.lock().await;
        if matches!(*state, SessionState::Open(_)) {
            tracing::debug!("Closing SurrealDB session to {}", self.config.endpoint());
        }
        *state = SessionState::Uninitialized;
    }
}

/// Connect, sign in and select namespace/database.
///
/// On any failure the partially set up handle is dropped, which closes the
/// underlying connection.
async fn establish(config: &SurrealConfig) -> Result<Surreal<Any>> {
    let endpoint = config.endpoint();
    let ns = &config.namespace;
    let db = &config.database;

    tracing::debug!(
        "Connecting to SurrealDB at {} (namespace: {}, database: {})",
        endpoint,
        ns,
        db
    );

    let surreal = surrealdb::engine::any::connect(endpoint.as_str())
        .await
        .map_err(|e| {
            AdapterError::Connection(format!("connection to '{endpoint}' failed: {e}"))
        })?;

    if let Some(credentials) = &config.credentials {
        let username = &credentials.username;
        surreal
            .signin(surrealdb::opt::auth::Root {
                username,
                password: &credentials.password,
            })
            .await
            .map_err(|e| {
                AdapterError::Connection(format!("authentication failed (user: '{username}'): {e}"))
            })?;
    }

    surreal.use_ns(ns).use_db(db).await.map_err(|e| {
        AdapterError::Connection(format!(
            "failed to select namespace '{ns}' / database '{db}': {e}"
        ))
    })?;

    tracing::debug!("Connected to SurrealDB at {endpoint}");
    Ok(surreal)
}
