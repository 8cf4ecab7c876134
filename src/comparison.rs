use std::cmp::Ordering;

use serde_json::Value;

use crate::errors::{Result, TemplateError};
use crate::value::type_name;

/// Equality of two basic values. Lists and maps are not comparable.
pub fn values_equal(a: &Value, b: &Value) -> Result<bool> {
    match (a, b) {
        (Value::Bool(ba), Value::Bool(bb)) => Ok(ba == bb),
        (Value::Null, Value::Null) => Ok(true),
        _ => cmp_values(a, b).map(|ord| ord == Ordering::Equal),
    }
}

/// Ordering of two strings or two numbers; anything else is a render error.
pub fn cmp_values(a: &Value, b: &Value) -> Result<Ordering> {
    match (a, b) {
        (Value::String(sa), Value::String(sb)) => Ok(sa.cmp(sb)),
        (Value::Number(na), Value::Number(nb)) => {
            if let (Some(ia), Some(ib)) = (na.as_i64(), nb.as_i64()) {
                return Ok(ia.cmp(&ib));
            }
            match (na.as_f64(), nb.as_f64()) {
                (Some(da), Some(db)) => da
                    .partial_cmp(&db)
                    .ok_or_else(|| TemplateError::render("invalid number for comparison")),
                _ => Err(TemplateError::render("invalid number for comparison")),
            }
        }
        (Value::Array(_) | Value::Object(_) | Value::Bool(_) | Value::Null, _) => Err(
            TemplateError::render(format!("invalid type for comparison: {}", type_name(a))),
        ),
        _ => Err(TemplateError::render(format!(
            "incompatible types for comparison: {} and {}",
            type_name(a),
            type_name(b)
        ))),
    }
}
