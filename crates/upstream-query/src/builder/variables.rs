use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

static UUID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}$").expect("valid UUID pattern")
});

/// GraphQL type declared for the variable `name`, inferred from the value bound to it.
///
/// Absent and `null` values are declared as nullable `String`, every other value as non-null.
pub(crate) fn infer_variable_type(name: &str, value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => "String".to_string(),
        Some(Value::String(_)) if is_identifier_name(name) => "ID!".to_string(),
        Some(Value::Array(items)) => match items.first() {
            Some(first) => format!("[{}!]", scalar_type(first)),
            None => "[String]".to_string(),
        },
        Some(value) => format!("{}!", scalar_type(value)),
    }
}

fn scalar_type(value: &Value) -> &'static str {
    match value {
        Value::String(value) if UUID.is_match(value) => "ID",
        Value::Bool(_) => "Boolean",
        Value::Number(number) if is_integer(number) => "Int",
        Value::Number(_) => "Float",
        Value::Null | Value::String(_) | Value::Array(_) | Value::Object(_) => "String",
    }
}

fn is_integer(number: &serde_json::Number) -> bool {
    number.is_i64() || number.is_u64() || number.as_f64().is_some_and(|value| value.fract() == 0.0)
}

// `id`, `userId`, `user_id`, `userID`
fn is_identifier_name(name: &str) -> bool {
    name == "id" || name.ends_with("Id") || name.ends_with("ID") || name.ends_with("_id")
}
