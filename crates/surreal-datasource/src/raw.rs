//! Raw query passthrough and positional binding handling.

use crate::error::Result;
use datasource_types::StatementResults;
use surrealdb::engine::any::Any;
use surrealdb::sql::Value;
use surrealdb::{Response, Surreal};

/// Placeholder token the framework writes for positional bindings.
pub const BINDING_IDENTIFIER: &str = "$var";

const BINDING_PARAM_PREFIX: &str = "binding_";

/// `concat(a, b, ...)` over the given expressions.
pub fn string_concat(parts: &[String]) -> String {
    format!("concat({})", parts.join(", "))
}

/// Rewrite positional placeholders into named query parameters.
///
/// Each `$var` token is replaced, in order, with `$binding_N` and the N-th
/// binding is returned as that parameter's value. Values are bound as
/// strings, so a binding behaves like a quoted literal without being spliced
/// into the query text. Tokens beyond the number of bindings are left as
/// they are; surplus bindings are ignored.
pub fn substitute_bindings(
    sql: &str,
    bindings: &[serde_json::Value],
) -> (String, Vec<(String, String)>) {
    let mut out = String::with_capacity(sql.len());
    let mut params: Vec<(String, String)> = Vec::new();
    let mut rest = sql;

    while let Some(pos) = rest.find(BINDING_IDENTIFIER) {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + BINDING_IDENTIFIER.len()..];
        // `$variable` is a different parameter, not the placeholder
        let is_token = !after.starts_with(|c: char| c.is_alphanumeric() || c == '_');

        match bindings.get(params.len()) {
            Some(binding) if is_token => {
                let name = format!("{BINDING_PARAM_PREFIX}{}", params.len());
                out.push('$');
                out.push_str(&name);
                params.push((name, binding_text(binding)));
            }
            _ => out.push_str(BINDING_IDENTIFIER),
        }
        rest = after;
    }
    out.push_str(rest);

    (out, params)
}

fn binding_text(binding: &serde_json::Value) -> String {
    match binding {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Execute SurrealQL text and collect every statement's result.
pub async fn execute(
    surreal: &Surreal<Any>,
    sql: &str,
    params: Vec<(String, String)>,
) -> Result<StatementResults> {
    tracing::trace!("Executing SurrealDB query: {}", sql);

    let mut q = surreal.query(sql);
    for param in params {
        q = q.bind(param);
    }
    let mut response = q.await?.check()?;

    let mut results = Vec::with_capacity(response.num_statements());
    for index in 0..response.num_statements() {
        let values = take_records(&mut response, index)?;
        results.push(values.into_iter().map(Value::into_json).collect());
    }
    Ok(results)
}

/// Result of statement `index`.
///
/// Results are taken as the SDK's public value type and unwrapped; the
/// SDK does not deserialize into `sql::Value` directly.
pub(crate) fn take_value(response: &mut Response, index: usize) -> Result<Value> {
    let value: surrealdb::Value = response.take(index)?;
    Ok(value.into_inner())
}

/// Records produced by statement `index`.
///
/// An array result yields its elements, `NONE` yields nothing and any other
/// value is a single record.
pub(crate) fn take_records(response: &mut Response, index: usize) -> Result<Vec<Value>> {
    Ok(flatten_records(take_value(response, index)?))
}

fn flatten_records(value: Value) -> Vec<Value> {
    match value {
        Value::Array(array) => array.0,
        Value::None => Vec::new(),
        other => vec![other],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_string_concat() {
        let parts = vec!["first".to_string(), "' '".to_string(), "last".to_string()];
        assert_eq!(string_concat(&parts), "concat(first, ' ', last)");
    }

    #[test]
    fn test_substitute_in_order() {
        let (sql, params) = substitute_bindings(
            "SELECT * FROM user WHERE name = $var AND age > $var",
            &[json!("Ada"), json!(30)],
        );
        assert_eq!(
            sql,
            "SELECT * FROM user WHERE name = $binding_0 AND age > $binding_1"
        );
        assert_eq!(
            params,
            vec![
                ("binding_0".to_string(), "Ada".to_string()),
                ("binding_1".to_string(), "30".to_string()),
            ]
        );
    }

    #[test]
    fn test_values_are_not_spliced_into_text() {
        let (sql, params) =
            substitute_bindings("SELECT * FROM user WHERE name = $var", &[json!("x'; DELETE user; --")]);
        assert!(!sql.contains("DELETE"));
        assert_eq!(params[0].1, "x'; DELETE user; --");
    }

    #[test]
    fn test_surplus_tokens_and_bindings() {
        let (sql, params) = substitute_bindings("RETURN [$var, $var]", &[json!(null)]);
        assert_eq!(sql, "RETURN [$binding_0, $var]");
        assert_eq!(params, vec![("binding_0".to_string(), String::new())]);

        let (sql, params) = substitute_bindings("RETURN $var", &[json!(1), json!(2)]);
        assert_eq!(sql, "RETURN $binding_0");
        assert_eq!(params.len(), 1);
    }

    #[test]
    fn test_flatten_records() {
        let array = Value::Array(vec![Value::Bool(true), Value::Null].into());
        assert_eq!(flatten_records(array), vec![Value::Bool(true), Value::Null]);
        assert!(flatten_records(Value::None).is_empty());
        assert_eq!(flatten_records(Value::Bool(false)), vec![Value::Bool(false)]);
    }

    #[test]
    fn test_longer_parameter_names_are_untouched() {
        let (sql, params) = substitute_bindings("RETURN $variable + $var", &[json!("a")]);
        assert_eq!(sql, "RETURN $variable + $binding_0");
        assert_eq!(params.len(), 1);
    }
}
