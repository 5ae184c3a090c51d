//! Query descriptors and results exchanged between the framework and an adapter.

use crate::table::{Table, ID_FIELD};
use serde::{Deserialize, Serialize};

/// A framework row: field name → JSON value.
pub type Row = serde_json::Map<String, serde_json::Value>;

/// Operation kind carried by a [`QueryJson`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Operation {
    Read,
    Create,
    Update,
    Delete,
    CreateTable,
    UpdateTable,
    DeleteTable,
}

impl Operation {
    /// Whether this operation manages table definitions rather than rows.
    pub fn is_table_ddl(&self) -> bool {
        matches!(
            self,
            Self::CreateTable | Self::UpdateTable | Self::DeleteTable
        )
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Read => "READ",
            Self::Create => "CREATE",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
            Self::CreateTable => "CREATE_TABLE",
            Self::UpdateTable => "UPDATE_TABLE",
            Self::DeleteTable => "DELETE_TABLE",
        };
        f.write_str(s)
    }
}

/// Filter set attached to a query. Only equality filters are consumed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Filters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equal: Option<serde_json::Map<String, serde_json::Value>>,
}

impl Filters {
    /// Equality filter on `id`.
    pub fn id(id: impl Into<String>) -> Self {
        let mut equal = serde_json::Map::new();
        equal.insert(ID_FIELD.to_string(), serde_json::Value::String(id.into()));
        Self { equal: Some(equal) }
    }

    /// The value of an equality filter on `id`, if any.
    ///
    /// String and numeric values are accepted; numbers are stringified.
    pub fn equal_id(&self) -> Option<String> {
        match self.equal.as_ref()?.get(ID_FIELD)? {
            serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

/// Extra filter slot; carries the primary-key filter for point operations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryExtra {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_filter: Option<Filters>,
}

/// Abstract operation request dispatched by an adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryJson {
    pub operation: Operation,

    pub table: Table,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filters: Option<Filters>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<QueryExtra>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Row>,
}

impl QueryJson {
    pub fn new(operation: Operation, table: Table) -> Self {
        Self {
            operation,
            table,
            filters: None,
            extra: None,
            body: None,
        }
    }

    pub fn with_filters(mut self, filters: Filters) -> Self {
        self.filters = Some(filters);
        self
    }

    pub fn with_id_filter(mut self, filters: Filters) -> Self {
        self.extra = Some(QueryExtra {
            id_filter: Some(filters),
        });
        self
    }

    pub fn with_body(mut self, body: Row) -> Self {
        self.body = Some(body);
        self
    }

    /// `id` equality from the main filter slot.
    pub fn filter_id(&self) -> Option<String> {
        self.filters.as_ref().and_then(Filters::equal_id)
    }

    /// `id` equality from the extra (primary-key) filter slot.
    pub fn extra_id(&self) -> Option<String> {
        self.extra
            .as_ref()
            .and_then(|e| e.id_filter.as_ref())
            .and_then(Filters::equal_id)
    }
}

/// A literal query string with optional ordered bindings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SqlQuery {
    pub sql: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bindings: Option<Vec<serde_json::Value>>,
}

impl SqlQuery {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            bindings: None,
        }
    }

    pub fn with_bindings(mut self, bindings: Vec<serde_json::Value>) -> Self {
        self.bindings = Some(bindings);
        self
    }
}

/// Outcome of a connectivity probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionInfo {
    pub connected: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ConnectionInfo {
    pub fn connected() -> Self {
        Self {
            connected: true,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            connected: false,
            error: Some(error.into()),
        }
    }
}

/// Result of dispatching a [`QueryJson`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum QueryResponse {
    Rows(Vec<Row>),
    /// The adapter accepted the request but does not perform it
    Unsupported { operation: Operation },
}

impl QueryResponse {
    /// Rows of the response; empty for unsupported operations.
    pub fn rows(&self) -> &[Row] {
        match self {
            Self::Rows(rows) => rows,
            Self::Unsupported { .. } => &[],
        }
    }

    pub fn into_rows(self) -> Vec<Row> {
        match self {
            Self::Rows(rows) => rows,
            Self::Unsupported { .. } => Vec::new(),
        }
    }

    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::Unsupported { .. })
    }
}
