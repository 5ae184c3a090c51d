//! Translation between SurrealDB field kinds and framework field types.
//!
//! SurrealDB reports a field's type as a kind string (`string`,
//! `option<datetime>`, `"a" | "b"`, ...). Kinds are parsed into the closed
//! [`FieldKind`] set at this boundary; anything outside it is rejected with
//! [`AdapterError::UnsupportedType`] instead of being guessed.

use crate::error::{AdapterError, Result};
use datasource_types::{FieldConstraints, FieldSchema, FieldType};

/// Kind assumed for fields that declare no type.
pub const DEFAULT_KIND: &str = "string";

const UNION_MARKER: char = '|';
const OPTION_PREFIX: &str = "option";

/// SurrealDB field kinds the adapter understands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    Any,
    String,
    Number,
    Datetime,
    Bool,
    Object,
    StringArray,
    /// Union of literals, optionally wrapped in `option<...>`
    Union { literals: Vec<String> },
}

impl FieldKind {
    /// Parse a kind string. Union detection wins over the exact-match table.
    pub fn parse(kind: &str) -> Result<Self> {
        if kind.contains(UNION_MARKER) {
            return Ok(Self::Union {
                literals: inclusion_values(kind),
            });
        }

        match kind {
            "" | "string" => Ok(Self::String),
            "any" => Ok(Self::Any),
            "number" => Ok(Self::Number),
            "datetime" => Ok(Self::Datetime),
            "bool" => Ok(Self::Bool),
            "object" => Ok(Self::Object),
            "array<string>" => Ok(Self::StringArray),
            other => Err(AdapterError::UnsupportedType {
                kind: other.to_string(),
            }),
        }
    }

    pub fn field_type(&self) -> FieldType {
        match self {
            Self::Any | Self::String => FieldType::String,
            Self::Number => FieldType::Number,
            Self::Datetime => FieldType::Datetime,
            Self::Bool => FieldType::Boolean,
            Self::Object => FieldType::Json,
            Self::StringArray => FieldType::Array,
            Self::Union { .. } => FieldType::Options,
        }
    }
}

/// Map a SurrealDB kind string to a framework field type.
pub fn map_kind(kind: &str) -> Result<FieldType> {
    FieldKind::parse(kind).map(|k| k.field_type())
}

/// Allowed literals of a union kind, in declaration order.
///
/// Accepts both `option<"a" | "b">` and `"a" | "b"`; quotes and surrounding
/// whitespace are stripped from each literal.
pub fn inclusion_values(kind: &str) -> Vec<String> {
    let inner = kind.trim();
    let inner = match inner.strip_prefix("option<") {
        Some(rest) => rest.strip_suffix('>').unwrap_or(rest),
        None => inner,
    };

    inner
        .replace(['"', '\''], "")
        .split(UNION_MARKER)
        .map(|literal| literal.trim().to_string())
        .collect()
}

/// A field is required unless it is optional or boolean.
pub fn is_required(kind: &str) -> bool {
    !kind.starts_with(OPTION_PREFIX) && kind != "bool"
}

/// Build the framework descriptor for one introspected field.
pub fn to_field_schema(name: &str, kind: Option<&str>) -> Result<FieldSchema> {
    let kind = kind.filter(|k| !k.is_empty()).unwrap_or(DEFAULT_KIND);
    let parsed = FieldKind::parse(kind)?;

    let inclusion = match &parsed {
        FieldKind::Union { literals } => Some(literals.clone()),
        _ => None,
    };

    Ok(FieldSchema::new(name, parsed.field_type())
        .with_external_type(kind)
        .with_constraints(FieldConstraints {
            presence: is_required(kind),
            inclusion,
        }))
}
