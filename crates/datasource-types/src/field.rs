//! Field-level schema types.

use serde::{Deserialize, Serialize};

/// Field type enumeration understood by the framework.
///
/// Serialized in lowercase (`"string"`, `"datetime"`, ...), which is the
/// representation the framework stores in its table definitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Number,
    Datetime,
    Boolean,
    Json,
    Array,
    /// Single choice out of a fixed set of literals
    Options,
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Datetime => "datetime",
            Self::Boolean => "boolean",
            Self::Json => "json",
            Self::Array => "array",
            Self::Options => "options",
        };
        f.write_str(s)
    }
}

/// Validation constraints attached to a field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldConstraints {
    /// Whether a value must be present
    #[serde(default)]
    pub presence: bool,

    /// Allowed literal values, only set for option fields
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inclusion: Option<Vec<String>>,
}

impl FieldConstraints {
    pub fn required() -> Self {
        Self {
            presence: true,
            inclusion: None,
        }
    }
}

/// Field descriptor as stored in a framework table schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSchema {
    pub name: String,

    #[serde(rename = "type")]
    pub field_type: FieldType,

    /// Type name in the external database, kept for round-tripping
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_type: Option<String>,

    #[serde(default)]
    pub constraints: FieldConstraints,

    /// Value is generated by the datasource, never supplied by users
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub autocolumn: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<u32>,

    #[serde(default = "default_visible")]
    pub visible: bool,
}

fn default_visible() -> bool {
    true
}

impl FieldSchema {
    /// Create a visible, optional field of the given type.
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            external_type: None,
            constraints: FieldConstraints::default(),
            autocolumn: false,
            order: None,
            visible: true,
        }
    }

    pub fn with_external_type(mut self, external_type: impl Into<String>) -> Self {
        self.external_type = Some(external_type.into());
        self
    }

    pub fn with_constraints(mut self, constraints: FieldConstraints) -> Self {
        self.constraints = constraints;
        self
    }

    pub fn is_required(&self) -> bool {
        self.constraints.presence
    }
}
