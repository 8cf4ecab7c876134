//! Shape-agnostic helpers. These accept any value and never fail: an
//! unexpected shape falls back to a conservative answer.

use serde_json::Value;

use super::arg;
use crate::errors::Result;
use crate::value::{format_value, length as value_length};

pub fn is_iterable(args: &[Value]) -> Result<Value> {
    Ok(Value::Bool(matches!(
        arg(args, 0),
        Value::Array(_) | Value::Object(_)
    )))
}

pub fn is_empty(args: &[Value]) -> Result<Value> {
    Ok(Value::Bool(emptiness(arg(args, 0))))
}

pub fn is_not_empty(args: &[Value]) -> Result<Value> {
    Ok(Value::Bool(!emptiness(arg(args, 0))))
}

fn emptiness(v: &Value) -> bool {
    match v {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(_) => false,
        other => value_length(other) == Some(0),
    }
}

/// Feature-flag reading of a value: `"0"`, `false`, `0`, empty and absent are off.
pub fn is_enabled(args: &[Value]) -> Result<Value> {
    let enabled = match arg(args, 0) {
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
        Value::String(s) => !s.is_empty() && s != "0",
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => match n.as_i64() {
            Some(i) => i != 0,
            None => true,
        },
    };
    Ok(Value::Bool(enabled))
}

/// `default value fallback`
pub fn default(args: &[Value]) -> Result<Value> {
    let value = arg(args, 0);
    let use_fallback = match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(_) => false,
        other => value_length(other) == Some(0),
    };
    Ok(if use_fallback { arg(args, 1).clone() } else { value.clone() })
}

pub fn length(args: &[Value]) -> Result<Value> {
    Ok(Value::from(value_length(arg(args, 0)).unwrap_or(0)))
}

pub fn dump(args: &[Value]) -> Result<Value> {
    Ok(Value::String(format_value(arg(args, 0))))
}
