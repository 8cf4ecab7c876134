//! String transforms and string predicates.
//!
//! Parameters are strings unless stated otherwise; a list or boolean passed
//! where a string is expected is a render error, as with a typed signature.

use regex::Regex;
use serde_json::Value;

use super::{arg, str_arg};
use crate::errors::{Result, TemplateError};
use crate::naming;
use crate::value::to_text;

pub fn upper(args: &[Value]) -> Result<Value> {
    Ok(Value::String(str_arg(args, 0)?.to_uppercase()))
}

pub fn lower(args: &[Value]) -> Result<Value> {
    Ok(Value::String(str_arg(args, 0)?.to_lowercase()))
}

pub fn trim(args: &[Value]) -> Result<Value> {
    Ok(Value::String(str_arg(args, 0)?.trim().to_string()))
}

pub fn title(args: &[Value]) -> Result<Value> {
    Ok(Value::String(naming::title_case(str_arg(args, 0)?)))
}

pub fn slugify(args: &[Value]) -> Result<Value> {
    Ok(Value::String(naming::slugify(str_arg(args, 0)?)))
}

pub fn snakize(args: &[Value]) -> Result<Value> {
    Ok(Value::String(naming::snakize(str_arg(args, 0)?)))
}

pub fn underscore(args: &[Value]) -> Result<Value> {
    Ok(Value::String(naming::underscore(str_arg(args, 0)?)))
}

pub fn envname(args: &[Value]) -> Result<Value> {
    Ok(Value::String(naming::envname(str_arg(args, 0)?)))
}

/// `split value [sep]`; the separator defaults to a single space.
pub fn split(args: &[Value]) -> Result<Value> {
    for i in 0..args.len() {
        str_arg(args, i)?;
    }
    let (value, sep) = match args.len() {
        0 => ("", ""),
        1 => (str_arg(args, 0)?, " "),
        _ => (str_arg(args, 0)?, str_arg(args, 1)?),
    };
    Ok(string_list(split_literal(value, sep)))
}

pub fn comma_split(args: &[Value]) -> Result<Value> {
    Ok(string_list(split_literal(str_arg(args, 0)?, ",")))
}

// An empty separator explodes the value into chars; "" explodes into nothing.
pub(crate) fn split_literal<'a>(value: &'a str, sep: &str) -> Vec<&'a str> {
    if sep.is_empty() {
        return value
            .char_indices()
            .map(|(i, c)| &value[i..i + c.len_utf8()])
            .collect();
    }
    value.split(sep).collect()
}

pub(crate) fn string_list(items: Vec<&str>) -> Value {
    Value::Array(items.into_iter().map(|s| Value::String(s.to_string())).collect())
}

pub fn concat(args: &[Value]) -> Result<Value> {
    let mut out = String::new();
    for i in 0..args.len() {
        out.push_str(str_arg(args, i)?);
    }
    Ok(Value::String(out))
}

/// `join value sep`: lists are joined, a string comes back unchanged,
/// anything else (absent, boolean, map) becomes "".
pub fn join(args: &[Value]) -> Result<Value> {
    let sep = str_arg(args, 1)?;
    Ok(Value::String(match arg(args, 0) {
        Value::Array(items) => items.iter().map(to_text).collect::<Vec<_>>().join(sep),
        Value::String(s) => s.clone(),
        _ => String::new(),
    }))
}

pub fn contains(args: &[Value]) -> Result<Value> {
    Ok(Value::Bool(str_arg(args, 0)?.contains(str_arg(args, 1)?)))
}

pub fn matches(args: &[Value]) -> Result<Value> {
    let re = compile(str_arg(args, 1)?)?;
    Ok(Value::Bool(re.is_match(str_arg(args, 0)?)))
}

/// All occurrences; `$1` / `${name}` in the replacement expand to groups.
pub fn regexp_replace(args: &[Value]) -> Result<Value> {
    let re = compile(str_arg(args, 1)?)?;
    let replaced = re.replace_all(str_arg(args, 0)?, str_arg(args, 2)?);
    Ok(Value::String(replaced.into_owned()))
}

pub fn replace(args: &[Value]) -> Result<Value> {
    let (s, old, new) = (str_arg(args, 0)?, str_arg(args, 1)?, str_arg(args, 2)?);
    Ok(Value::String(s.replace(old, new)))
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern)
        .map_err(|e| TemplateError::render(format!("invalid regular expression {pattern:?}: {e}")))
}
