//! Environment lookups from inside a template.
//!
//! Each function owns an index built once from the renderer's
//! [`EnvSnapshot`](crate::context::EnvSnapshot), keyed by slugified name, so
//! `{{ env "db_host" }}`, `{{ env "DB-HOST" }}` and `{{ env "db host" }}` all
//! find `APPCONF_DB_HOST`.

use std::collections::HashMap;
use std::ops::RangeInclusive;
use std::sync::Arc;

use serde_json::Value;

use super::strings::{split_literal, string_list};
use super::{str_arg, Function};
use crate::errors::Result;
use crate::naming::slugify;

/// `env` (prefixed variables only) and `global_env` (whole environment).
pub struct EnvLookup {
    name: &'static str,
    index: Arc<HashMap<String, String>>,
}

impl EnvLookup {
    pub fn new(name: &'static str, index: Arc<HashMap<String, String>>) -> Self {
        Self { name, index }
    }
}

impl Function for EnvLookup {
    fn name(&self) -> &'static str { self.name }
    fn arity(&self) -> RangeInclusive<usize> { 1..=1 }
    fn call(&self, args: &[Value]) -> Result<Value> {
        let key = slugify(str_arg(args, 0)?);
        Ok(self
            .index
            .get(&key)
            .map(|raw| Value::String(raw.clone()))
            .unwrap_or(Value::Null))
    }
}

/// `env_list key`: a prefixed variable split on commas; absent gives `[]`.
pub struct EnvList {
    index: Arc<HashMap<String, String>>,
}

impl EnvList {
    pub fn new(index: Arc<HashMap<String, String>>) -> Self {
        Self { index }
    }
}

impl Function for EnvList {
    fn name(&self) -> &'static str { "env_list" }
    fn arity(&self) -> RangeInclusive<usize> { 1..=1 }
    fn call(&self, args: &[Value]) -> Result<Value> {
        let key = slugify(str_arg(args, 0)?);
        Ok(match self.index.get(&key) {
            Some(raw) => string_list(split_literal(raw, ",")),
            None => Value::Array(Vec::new()),
        })
    }
}
