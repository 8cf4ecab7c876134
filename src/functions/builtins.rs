//! The engine's own namespace: logic, comparison, indexing and printing.

use std::cmp::Ordering;
use std::fmt::Write as _;

use serde_json::Value;

use super::{arg, str_arg};
use crate::comparison::{cmp_values, values_equal};
use crate::errors::{Result, TemplateError};
use crate::value::{format_value, is_true, to_text, type_name};

/// First falsy argument, or the last one.
pub fn and(args: &[Value]) -> Result<Value> {
    Ok(args
        .iter()
        .find(|v| !is_true(v))
        .or(args.last())
        .cloned()
        .unwrap_or(Value::Null))
}

/// First truthy argument, or the last one.
pub fn or(args: &[Value]) -> Result<Value> {
    Ok(args
        .iter()
        .find(|v| is_true(v))
        .or(args.last())
        .cloned()
        .unwrap_or(Value::Null))
}

pub fn not(args: &[Value]) -> Result<Value> {
    Ok(Value::Bool(!is_true(arg(args, 0))))
}

/// `eq a b c...` is true when `a` equals any of the others.
pub fn eq(args: &[Value]) -> Result<Value> {
    let first = arg(args, 0);
    for other in args.iter().skip(1) {
        if values_equal(first, other)? {
            return Ok(Value::Bool(true));
        }
    }
    Ok(Value::Bool(false))
}

pub fn ne(args: &[Value]) -> Result<Value> {
    Ok(Value::Bool(!values_equal(arg(args, 0), arg(args, 1))?))
}

fn ordered(args: &[Value], pred: fn(Ordering) -> bool) -> Result<Value> {
    cmp_values(arg(args, 0), arg(args, 1)).map(|ord| Value::Bool(pred(ord)))
}

pub fn lt(args: &[Value]) -> Result<Value> {
    ordered(args, Ordering::is_lt)
}

pub fn le(args: &[Value]) -> Result<Value> {
    ordered(args, Ordering::is_le)
}

pub fn gt(args: &[Value]) -> Result<Value> {
    ordered(args, Ordering::is_gt)
}

pub fn ge(args: &[Value]) -> Result<Value> {
    ordered(args, Ordering::is_ge)
}

/// Builtin `len`: unlike `length`, a value without a length is an error.
pub fn len(args: &[Value]) -> Result<Value> {
    match arg(args, 0) {
        Value::String(s) => Ok(Value::from(s.len())),
        Value::Array(a) => Ok(Value::from(a.len())),
        Value::Object(m) => Ok(Value::from(m.len())),
        other => Err(TemplateError::render(format!("len of type {}", type_name(other)))),
    }
}

/// `index collection key...`
pub fn index(args: &[Value]) -> Result<Value> {
    let mut current = arg(args, 0).clone();
    for key in args.iter().skip(1) {
        current = match (&current, key) {
            (Value::Array(items), Value::Number(n)) => {
                let i = n
                    .as_u64()
                    .and_then(|i| usize::try_from(i).ok())
                    .filter(|i| *i < items.len())
                    .ok_or_else(|| TemplateError::render(format!("index out of range: {n}")))?;
                items[i].clone()
            }
            (Value::Object(map), Value::String(k)) => map.get(k).cloned().unwrap_or(Value::Null),
            (Value::Null, _) => return Err(TemplateError::render("index of untyped nil")),
            (container, key) => {
                return Err(TemplateError::render(format!(
                    "can't index item of type {} with {}",
                    type_name(container),
                    type_name(key)
                )))
            }
        };
    }
    Ok(current)
}

/// Spaces go between operands when neither side is a string.
pub fn print(args: &[Value]) -> Result<Value> {
    let mut out = String::new();
    for (i, v) in args.iter().enumerate() {
        if i > 0 && !v.is_string() && !args[i - 1].is_string() {
            out.push(' ');
        }
        out.push_str(&to_text(v));
    }
    Ok(Value::String(out))
}

pub fn println(args: &[Value]) -> Result<Value> {
    let mut out = args.iter().map(to_text).collect::<Vec<_>>().join(" ");
    out.push('\n');
    Ok(Value::String(out))
}

/// `printf` / `sprintf format args...`
pub fn printf(args: &[Value]) -> Result<Value> {
    let format = str_arg(args, 0)?;
    Ok(Value::String(sprintf(format, &args[1..])))
}

/// Printf-style formatting over context values.
///
/// Verbs: `%v %+v %s %d %f %t %q %x %%`, with `-`/`0` flags, width and
/// precision. Misuse is reported inline (`%!d(string=x)`, `%!v(MISSING)`)
/// instead of failing.
pub(crate) fn sprintf(format: &str, args: &[Value]) -> String {
    let mut out = String::new();
    let mut remaining = args.iter();
    let mut chars = format.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        let (mut left, mut zero) = (false, false);
        while let Some(&flag) = chars.peek() {
            match flag {
                '-' => left = true,
                '0' => zero = true,
                '+' | '#' | ' ' => {}
                _ => break,
            }
            chars.next();
        }
        let mut width = String::new();
        while let Some(d) = chars.peek().filter(|d| d.is_ascii_digit()) {
            width.push(*d);
            chars.next();
        }
        let mut precision = None;
        if chars.peek() == Some(&'.') {
            chars.next();
            let mut digits = String::new();
            while let Some(d) = chars.peek().filter(|d| d.is_ascii_digit()) {
                digits.push(*d);
                chars.next();
            }
            precision = Some(digits.parse::<usize>().unwrap_or(0));
        }
        let Some(verb) = chars.next() else {
            out.push_str("%!(NOVERB)");
            break;
        };
        if verb == '%' {
            out.push('%');
            continue;
        }
        let Some(value) = remaining.next() else {
            let _ = write!(out, "%!{verb}(MISSING)");
            continue;
        };
        let body = format_verb(verb, value, precision);
        let width: usize = width.parse().unwrap_or(0);
        let pad = width.saturating_sub(body.chars().count());
        if left {
            out.push_str(&body);
            out.extend(std::iter::repeat(' ').take(pad));
        } else {
            let fill = if zero { '0' } else { ' ' };
            out.extend(std::iter::repeat(fill).take(pad));
            out.push_str(&body);
        }
    }

    let extra: Vec<String> = remaining
        .map(|v| format!("{}={}", type_name(v), format_value(v)))
        .collect();
    if !extra.is_empty() {
        let _ = write!(out, "%!(EXTRA {})", extra.join(", "));
    }
    out
}

fn format_verb(verb: char, value: &Value, precision: Option<usize>) -> String {
    match (verb, value) {
        ('v', _) => format_value(value),
        ('s', Value::String(s)) => match precision {
            Some(p) => s.chars().take(p).collect(),
            None => s.clone(),
        },
        ('s', Value::Array(_) | Value::Object(_) | Value::Null) => format_value(value),
        ('d', Value::Number(n)) if !n.is_f64() => n.to_string(),
        ('f', Value::Number(n)) => {
            format!("{:.*}", precision.unwrap_or(6), n.as_f64().unwrap_or_default())
        }
        ('t', Value::Bool(b)) => b.to_string(),
        ('q', Value::String(s)) => format!("{s:?}"),
        ('x', Value::String(s)) => s.bytes().map(|b| format!("{b:02x}")).collect(),
        ('x', Value::Number(n)) if n.is_i64() => format!("{:x}", n.as_i64().unwrap_or_default()),
        _ => format!("%!{verb}({}={})", type_name(value), format_value(value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn logic() {
        assert_eq!(and(&[json!(1), json!(""), json!(2)]).unwrap(), json!(""));
        assert_eq!(and(&[json!(1), json!(2)]).unwrap(), json!(2));
        assert_eq!(or(&[json!(""), json!("x")]).unwrap(), json!("x"));
        assert_eq!(or(&[json!(""), json!(0)]).unwrap(), json!(0));
        assert_eq!(not(&[json!([])]).unwrap(), json!(true));
    }

    #[test]
    fn comparisons() {
        assert_eq!(gt(&[json!(22), json!(20)]).unwrap(), json!(true));
        assert_eq!(gt(&[json!(22), json!(30)]).unwrap(), json!(false));
        assert_eq!(le(&[json!("a"), json!("a")]).unwrap(), json!(true));
        assert_eq!(eq(&[json!("b"), json!("a"), json!("b")]).unwrap(), json!(true));
        assert_eq!(ne(&[json!(true), json!(false)]).unwrap(), json!(true));
        assert!(lt(&[json!("1"), json!(2)]).is_err());
    }

    #[test]
    fn len_and_index() {
        assert_eq!(len(&[json!("héllo")]).unwrap(), json!(6));
        assert!(len(&[json!(true)]).is_err());
        assert_eq!(index(&[json!(["a", "b"]), json!(1)]).unwrap(), json!("b"));
        assert_eq!(index(&[json!({"k": "v"}), json!("k")]).unwrap(), json!("v"));
        assert_eq!(index(&[json!({"k": "v"}), json!("x")]).unwrap(), Value::Null);
        assert!(index(&[json!(["a"]), json!(3)]).is_err());
        assert!(index(&[Value::Null, json!(0)]).is_err());
    }

    #[test]
    fn printing() {
        assert_eq!(print(&[json!("a"), json!("b")]).unwrap(), json!("ab"));
        assert_eq!(print(&[json!(1), json!(2)]).unwrap(), json!("1 2"));
        assert_eq!(println(&[json!("a"), json!(1)]).unwrap(), json!("a 1\n"));
    }

    #[test]
    fn printf_verbs() {
        assert_eq!(sprintf("%s=%d", &[json!("n"), json!(5)]), "n=5");
        assert_eq!(
            sprintf("%v|%t|%q", &[json!(["a", "b"]), json!(true), json!("x")]),
            "[a b]|true|\"x\""
        );
        assert_eq!(sprintf("%5s|%-3d|%03d", &[json!("ab"), json!(7), json!(7)]), "   ab|7  |007");
        assert_eq!(sprintf("%.2f%%", &[json!(1.5)]), "1.50%");
        assert_eq!(sprintf("%d", &[json!("x")]), "%!d(string=x)");
        assert_eq!(sprintf("%s %s", &[json!("a")]), "a %!s(MISSING)");
        assert_eq!(sprintf("%s", &[json!("a"), json!(1)]), "a%!(EXTRA int=1)");
    }
}
