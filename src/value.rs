//! Shape inspection and textual forms of context values.

use itertools::Itertools;
use serde_json::Value;

/// Short type label used in render error messages.
pub fn type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "nil",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_f64() => "float64",
        Value::Number(_) => "int",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "map",
    }
}

/// Template truthiness: false, zero, empty and nil are false.
pub fn is_true(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(m) => !m.is_empty(),
    }
}

/// Element count for strings (in chars), lists and maps.
pub fn length(v: &Value) -> Option<usize> {
    match v {
        Value::String(s) => Some(s.chars().count()),
        Value::Array(a) => Some(a.len()),
        Value::Object(m) => Some(m.len()),
        _ => None,
    }
}

/// `%v` rendering: `[a b c]` for lists, `map[k:v]` for maps, `<nil>` for null.
pub fn format_value(v: &Value) -> String {
    match v {
        Value::Null => "<nil>".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if n.is_f64() => f.to_string(),
            _ => n.to_string(),
        },
        Value::String(s) => s.clone(),
        Value::Array(a) => format!("[{}]", a.iter().map(format_value).join(" ")),
        Value::Object(m) => format!(
            "map[{}]",
            m.iter()
                .sorted_by(|a, b| a.0.cmp(b.0))
                .map(|(k, v)| format!("{k}:{}", format_value(v)))
                .join(" ")
        ),
    }
}

/// What an action writes to the output. Null prints as `<no value>`.
pub fn print_value(v: &Value) -> String {
    match v {
        Value::Null => "<no value>".to_string(),
        other => format_value(other),
    }
}

/// String form of a list element or scalar, used by `join` and `print`.
pub fn to_text(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => format_value(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn default_textual_forms() {
        assert_eq!(format_value(&json!(["ab", "cd", "ef"])), "[ab cd ef]");
        assert_eq!(format_value(&json!({"b": 2, "a": "x"})), "map[a:x b:2]");
        assert_eq!(format_value(&json!(true)), "true");
        assert_eq!(format_value(&json!(1.5)), "1.5");
        assert_eq!(format_value(&Value::Null), "<nil>");
        assert_eq!(print_value(&Value::Null), "<no value>");
        assert_eq!(format_value(&json!([null, 1])), "[<nil> 1]");
    }

    #[test]
    fn truthiness() {
        for falsy in [json!(null), json!(false), json!(0), json!(""), json!([]), json!({})] {
            assert!(!is_true(&falsy), "{falsy} should be false");
        }
        for truthy in [json!(true), json!(-1), json!("0"), json!([""]), json!({"a": null})] {
            assert!(is_true(&truthy), "{truthy} should be true");
        }
    }

    #[test]
    fn lengths() {
        assert_eq!(length(&json!("héllo")), Some(5));
        assert_eq!(length(&json!(["a", "b"])), Some(2));
        assert_eq!(length(&json!(true)), None);
    }
}
