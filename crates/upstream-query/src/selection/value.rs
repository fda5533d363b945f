use std::fmt;

use indexmap::IndexMap;

/// Value of a field argument.
///
/// Variable markers are an explicit variant at every position, including inside lists and
/// objects, so no shape probing of literal objects is ever needed.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgumentValue {
    Null,
    /// Rendered as the bare word `undefined`, which some upstreams treat differently from an
    /// absent argument. Not valid GraphQL for most servers.
    Undefined,
    Boolean(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<ArgumentValue>),
    Object(IndexMap<String, ArgumentValue>),
    Variable(VariableRef),
}

/// Binds an argument to the operation variable `$name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VariableRef {
    pub name: String,
    /// Declared type, takes precedence over the type inferred from the runtime value.
    pub ty: Option<String>,
}

impl VariableRef {
    pub fn new(name: impl Into<String>) -> Self {
        VariableRef {
            name: name.into(),
            ty: None,
        }
    }

    pub fn with_type(mut self, ty: impl Into<String>) -> Self {
        self.ty = Some(ty.into());
        self
    }
}

impl ArgumentValue {
    pub fn variable(name: impl Into<String>) -> Self {
        ArgumentValue::Variable(VariableRef::new(name))
    }

    pub fn object<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<ArgumentValue>,
    {
        ArgumentValue::Object(
            entries
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }

    /// Writes the GraphQL literal for this value, reporting every variable reference met on the
    /// way, nested ones included.
    pub(crate) fn write(&self, out: &mut String, on_variable: &mut dyn FnMut(&VariableRef)) {
        match self {
            ArgumentValue::Null => out.push_str("null"),
            ArgumentValue::Undefined => out.push_str("undefined"),
            ArgumentValue::Boolean(true) => out.push_str("true"),
            ArgumentValue::Boolean(false) => out.push_str("false"),
            ArgumentValue::Int(value) => out.push_str(&value.to_string()),
            // whole floats keep a fractional part so they are not read back as Int literals
            ArgumentValue::Float(value) if value.is_finite() && value.fract() == 0.0 => {
                out.push_str(&format!("{value:.1}"))
            }
            ArgumentValue::Float(value) if value.is_finite() => out.push_str(&value.to_string()),
            ArgumentValue::Float(_) => out.push_str("null"),
            ArgumentValue::String(value) => write_string_literal(out, value),
            ArgumentValue::List(items) => {
                out.push('[');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    item.write(out, on_variable);
                }
                out.push(']');
            }
            ArgumentValue::Object(fields) if fields.is_empty() => out.push_str("{}"),
            ArgumentValue::Object(fields) => {
                out.push_str("{ ");
                for (i, (key, value)) in fields.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    out.push_str(key);
                    out.push_str(": ");
                    value.write(out, on_variable);
                }
                out.push_str(" }");
            }
            ArgumentValue::Variable(variable) => {
                out.push('$');
                out.push_str(&variable.name);
                on_variable(variable);
            }
        }
    }
}

impl fmt::Display for ArgumentValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        self.write(&mut out, &mut |_| ());
        f.write_str(&out)
    }
}

fn write_string_literal(out: &mut String, value: &str) {
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{08}' => out.push_str("\\b"),
            '\u{0C}' => out.push_str("\\f"),
            c if c.is_control() => out.push_str(&format!("\\u{:04X}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
}

impl From<serde_json::Value> for ArgumentValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => ArgumentValue::Null,
            serde_json::Value::Bool(value) => ArgumentValue::Boolean(value),
            serde_json::Value::Number(number) => match number.as_i64() {
                Some(value) => ArgumentValue::Int(value),
                None => ArgumentValue::Float(number.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(value) => ArgumentValue::String(value),
            serde_json::Value::Array(items) => ArgumentValue::List(items.into_iter().map(Into::into).collect()),
            serde_json::Value::Object(fields) => ArgumentValue::object(fields),
        }
    }
}

impl From<VariableRef> for ArgumentValue {
    fn from(variable: VariableRef) -> Self {
        ArgumentValue::Variable(variable)
    }
}

impl From<&str> for ArgumentValue {
    fn from(value: &str) -> Self {
        ArgumentValue::String(value.to_string())
    }
}

impl From<String> for ArgumentValue {
    fn from(value: String) -> Self {
        ArgumentValue::String(value)
    }
}

impl From<bool> for ArgumentValue {
    fn from(value: bool) -> Self {
        ArgumentValue::Boolean(value)
    }
}

impl From<i32> for ArgumentValue {
    fn from(value: i32) -> Self {
        ArgumentValue::Int(value.into())
    }
}

impl From<i64> for ArgumentValue {
    fn from(value: i64) -> Self {
        ArgumentValue::Int(value)
    }
}

impl From<f64> for ArgumentValue {
    fn from(value: f64) -> Self {
        ArgumentValue::Float(value)
    }
}

impl<T: Into<ArgumentValue>> From<Vec<T>> for ArgumentValue {
    fn from(items: Vec<T>) -> Self {
        ArgumentValue::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<ArgumentValue>> From<Option<T>> for ArgumentValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(ArgumentValue::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn variables_of(value: &ArgumentValue) -> Vec<String> {
        let mut names = Vec::new();
        value.write(&mut String::new(), &mut |variable| names.push(variable.name.clone()));
        names
    }

    #[test]
    fn scalars() {
        assert_eq!(ArgumentValue::Null.to_string(), "null");
        assert_eq!(ArgumentValue::Undefined.to_string(), "undefined");
        assert_eq!(ArgumentValue::from(true).to_string(), "true");
        assert_eq!(ArgumentValue::from(42).to_string(), "42");
        assert_eq!(ArgumentValue::from(1.5).to_string(), "1.5");
        assert_eq!(ArgumentValue::Float(f64::INFINITY).to_string(), "null");
        assert_eq!(ArgumentValue::from(3.0).to_string(), "3.0");
        assert_eq!(ArgumentValue::from(-2.0).to_string(), "-2.0");
        assert_eq!(ArgumentValue::from(1e20).to_string(), "100000000000000000000.0");
        assert_eq!(ArgumentValue::from("a \"quoted\"\nline").to_string(), r#""a \"quoted\"\nline""#);
    }

    #[test]
    fn nested_objects_and_lists() {
        let value = ArgumentValue::object([
            ("status", ArgumentValue::from("ACTIVE")),
            ("ids", ArgumentValue::from(vec![1, 2])),
            ("owner", ArgumentValue::object([("id", ArgumentValue::variable("ownerId"))])),
            ("empty", ArgumentValue::Object(IndexMap::new())),
        ]);

        insta::assert_snapshot!(value, @r#"{ status: "ACTIVE", ids: [1, 2], owner: { id: $ownerId }, empty: {} }"#);
    }

    #[test]
    fn variables_are_found_at_any_depth() {
        let value = ArgumentValue::List(vec![
            ArgumentValue::variable("first"),
            ArgumentValue::object([("inner", ArgumentValue::List(vec![ArgumentValue::variable("second")]))]),
        ]);

        assert_eq!(variables_of(&value), ["first", "second"]);
    }

    #[test]
    fn json_conversion_is_literal() {
        let value = ArgumentValue::from(serde_json::json!({ "variable": "id", "limit": 10, "ratio": 0.5 }));

        assert!(variables_of(&value).is_empty());
        insta::assert_snapshot!(value, @r#"{ variable: "id", limit: 10, ratio: 0.5 }"#);
    }
}
