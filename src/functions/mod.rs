use serde_json::Value;
use std::collections::HashMap;
use std::ops::RangeInclusive;
use std::sync::Arc;

use crate::context::EnvSnapshot;
use crate::errors::{Result, TemplateError};
use crate::value::type_name;

pub mod builtins;
pub mod env;
pub mod predicates;
pub mod strings;

/// Trait for functions callable from a template pipeline.
///
/// The piped value, when there is one, arrives as the last element of `args`.
pub trait Function: Send + Sync {
    fn name(&self) -> &'static str;
    fn arity(&self) -> RangeInclusive<usize>;
    fn call(&self, args: &[Value]) -> Result<Value>;
}

/// A stateless function backed by a plain `fn`.
pub struct NativeFn {
    name: &'static str,
    arity: RangeInclusive<usize>,
    f: fn(&[Value]) -> Result<Value>,
}

impl NativeFn {
    pub fn new(
        name: &'static str,
        arity: RangeInclusive<usize>,
        f: fn(&[Value]) -> Result<Value>,
    ) -> Self {
        Self { name, arity, f }
    }
}

impl Function for NativeFn {
    fn name(&self) -> &'static str { self.name }
    fn arity(&self) -> RangeInclusive<usize> { self.arity.clone() }
    fn call(&self, args: &[Value]) -> Result<Value> { (self.f)(args) }
}

const VARIADIC: usize = usize::MAX;

/// Thread-safe function registry.
#[derive(Clone, Default)]
pub struct Registry {
    inner: Arc<HashMap<&'static str, Arc<dyn Function>>>,
}

impl Registry {
    pub fn new() -> Self { Self::default() }

    /// Every pipeline function plus the engine builtins. `env`, `global_env`
    /// and `env_list` read from `env`, indexed once here.
    pub fn with_builtins(env: &EnvSnapshot, prefix: &str) -> Self {
        let mut registry = Self::new();

        for f in [
            NativeFn::new("upper", 1..=1, strings::upper),
            NativeFn::new("lower", 1..=1, strings::lower),
            NativeFn::new("trim", 1..=1, strings::trim),
            NativeFn::new("ucwords", 1..=1, strings::title),
            NativeFn::new("title", 1..=1, strings::title),
            NativeFn::new("slugify", 1..=1, strings::slugify),
            NativeFn::new("snakize", 1..=1, strings::snakize),
            NativeFn::new("underscore", 1..=1, strings::underscore),
            NativeFn::new("envname", 1..=1, strings::envname),
            NativeFn::new("split", 0..=VARIADIC, strings::split),
            NativeFn::new("comma_split", 1..=1, strings::comma_split),
            NativeFn::new("concat", 0..=VARIADIC, strings::concat),
            NativeFn::new("join", 2..=2, strings::join),
            NativeFn::new("contains", 2..=2, strings::contains),
            NativeFn::new("match", 2..=2, strings::matches),
            NativeFn::new("regexp_replace", 3..=3, strings::regexp_replace),
            NativeFn::new("replace", 3..=3, strings::replace),
            NativeFn::new("sprintf", 1..=VARIADIC, builtins::printf),
            NativeFn::new("is_iterable", 1..=1, predicates::is_iterable),
            NativeFn::new("is_empty", 1..=1, predicates::is_empty),
            NativeFn::new("is_not_empty", 1..=1, predicates::is_not_empty),
            NativeFn::new("is_enabled", 1..=1, predicates::is_enabled),
            NativeFn::new("default", 2..=2, predicates::default),
            NativeFn::new("length", 1..=1, predicates::length),
            NativeFn::new("dump", 1..=1, predicates::dump),
            // engine builtins
            NativeFn::new("and", 1..=VARIADIC, builtins::and),
            NativeFn::new("or", 1..=VARIADIC, builtins::or),
            NativeFn::new("not", 1..=1, builtins::not),
            NativeFn::new("eq", 2..=VARIADIC, builtins::eq),
            NativeFn::new("ne", 2..=2, builtins::ne),
            NativeFn::new("lt", 2..=2, builtins::lt),
            NativeFn::new("le", 2..=2, builtins::le),
            NativeFn::new("gt", 2..=2, builtins::gt),
            NativeFn::new("ge", 2..=2, builtins::ge),
            NativeFn::new("len", 1..=1, builtins::len),
            NativeFn::new("index", 1..=VARIADIC, builtins::index),
            NativeFn::new("print", 0..=VARIADIC, builtins::print),
            NativeFn::new("printf", 1..=VARIADIC, builtins::printf),
            NativeFn::new("println", 0..=VARIADIC, builtins::println),
        ] {
            registry.register(f);
        }

        let local = Arc::new(env.prefixed_index(prefix));
        let global = Arc::new(env.global_index());
        registry.register(env::EnvLookup::new("env", Arc::clone(&local)));
        registry.register(env::EnvLookup::new("global_env", global));
        registry.register(env::EnvList::new(local));
        registry
    }

    pub fn register<F: Function + 'static>(&mut self, f: F) {
        let mut_map = Arc::make_mut(&mut self.inner);
        mut_map.insert(f.name(), Arc::new(f));
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Function>> {
        self.inner.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.inner.contains_key(name)
    }
}

/// Argument `i`, or null when the call was short.
pub(crate) fn arg(args: &[Value], i: usize) -> &Value {
    args.get(i).unwrap_or(&Value::Null)
}

/// Argument `i` as a string; other shapes are a render error.
pub(crate) fn str_arg(args: &[Value], i: usize) -> Result<&str> {
    match arg(args, i) {
        Value::String(s) => Ok(s),
        other => Err(TemplateError::render(format!(
            "wrong type for value; expected string; got {}",
            type_name(other)
        ))),
    }
}

pub(crate) fn describe_arity(arity: &RangeInclusive<usize>) -> String {
    match (*arity.start(), *arity.end()) {
        (lo, hi) if lo == hi => lo.to_string(),
        (lo, VARIADIC) => format!("at least {lo}"),
        (lo, hi) => format!("{lo} to {hi}"),
    }
}
