//! Environment capture and field resolution.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::naming::{field_to_env_key, slugify};

/// Immutable copy of the process environment.
///
/// Taken once per renderer; the resolver and the `env`/`global_env`
/// functions both read from it, so a render never sees the environment
/// change underneath it.
#[derive(Debug, Clone, Default)]
pub struct EnvSnapshot {
    vars: BTreeMap<String, String>,
}

impl EnvSnapshot {
    /// Capture the current process environment. Non UTF-8 entries are converted lossily.
    pub fn capture() -> Self {
        let vars = std::env::vars_os()
            .map(|(k, v)| (k.to_string_lossy().into_owned(), v.to_string_lossy().into_owned()))
            .collect::<BTreeMap<_, _>>();
        debug!(count = vars.len(), "captured environment");
        Self { vars }
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// Variables starting with `prefix`, keyed by the slugified remainder
    /// (`APPCONF_DB_HOST` → `db-host`).
    pub fn prefixed_index(&self, prefix: &str) -> HashMap<String, String> {
        self.vars
            .iter()
            .filter_map(|(k, v)| {
                let rest = k.strip_prefix(prefix)?;
                let rest = rest.strip_prefix('_').unwrap_or(rest);
                Some((slugify(rest), v.clone()))
            })
            .collect()
    }

    /// All variables keyed by their slugified full name.
    pub fn global_index(&self) -> HashMap<String, String> {
        self.vars.iter().map(|(k, v)| (slugify(k), v.clone())).collect()
    }
}

/// Placeholder rendered in place of a field with no environment variable.
pub fn missing_sentinel(field: &str, key: &str) -> String {
    format!("####### ENVRENDER : MISSING ENV VAR FOR TPL VALUE: {field}, SHOULD BE {key} #######")
}

/// Raw variable → typed value: a comma makes a list, `true`/`false` a boolean.
pub fn coerce(raw: &str) -> Value {
    if raw.contains(',') {
        return Value::Array(raw.split(',').map(|s| Value::String(s.to_string())).collect());
    }
    match raw {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => Value::String(raw.to_string()),
    }
}

/// How one field was resolved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Binding {
    pub field: String,
    pub key: String,
    pub value: Value,
    pub missing: bool,
}

/// Binds template fields to `<prefix>_<UPPER_SNAKE>` variables of a snapshot.
pub struct Resolver<'a> {
    prefix: &'a str,
    env: &'a EnvSnapshot,
}

impl<'a> Resolver<'a> {
    pub fn new(prefix: &'a str, env: &'a EnvSnapshot) -> Self {
        Self { prefix, env }
    }

    pub fn bind(&self, field: &str) -> Binding {
        let key = field_to_env_key(field, self.prefix);
        match self.env.get(&key) {
            Some(raw) => Binding {
                field: field.to_string(),
                value: coerce(raw),
                key,
                missing: false,
            },
            None => {
                // `{{ . }}`, `{{ $e }}` and literals bind the empty name
                if field.is_empty() {
                    debug!(key = %key, "no environment variable for unnamed action");
                } else {
                    warn!(field, key = %key, "no environment variable for template field");
                }
                Binding {
                    field: field.to_string(),
                    value: Value::String(missing_sentinel(field, &key)),
                    key,
                    missing: true,
                }
            }
        }
    }

    pub fn bindings(&self, fields: &[String]) -> Vec<Binding> {
        fields.iter().map(|f| self.bind(f)).collect()
    }

    /// One entry per field; never fails.
    pub fn resolve(&self, fields: &[String]) -> Map<String, Value> {
        self.bindings(fields)
            .into_iter()
            .map(|b| (b.field, b.value))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn env() -> EnvSnapshot {
        EnvSnapshot::from_pairs([
            ("APPCONF_VAR_LIST", "ab,cd,ef"),
            ("APPCONF_VAR_BOOL", "true"),
            ("APPCONF_VAR_OFF", "false"),
            ("APPCONF_VAR_STANDARD", "this_is_a_config_value"),
            ("APPCONF_VAR_EMPTY", ""),
            ("OTHER_VAR_LIST", "x"),
        ])
    }

    #[test]
    fn coercion_order() {
        assert_eq!(coerce("ab,cd,ef"), json!(["ab", "cd", "ef"]));
        assert_eq!(coerce("true,false"), json!(["true", "false"]));
        assert_eq!(coerce("true"), json!(true));
        assert_eq!(coerce("TRUE"), json!("TRUE"));
        assert_eq!(coerce(","), json!(["", ""]));
        assert_eq!(coerce(""), json!(""));
    }

    #[test]
    fn resolves_typed_values() {
        let env = env();
        let resolver = Resolver::new("APPCONF", &env);
        let fields: Vec<String> = ["VarList", "VarBool", "VarOff", "VarStandard", "VarEmpty"]
            .map(String::from)
            .to_vec();
        let ctx = resolver.resolve(&fields);
        assert_eq!(ctx["VarList"], json!(["ab", "cd", "ef"]));
        assert_eq!(ctx["VarBool"], json!(true));
        assert_eq!(ctx["VarOff"], json!(false));
        assert_eq!(ctx["VarStandard"], json!("this_is_a_config_value"));
        assert_eq!(ctx["VarEmpty"], json!(""));
    }

    #[test]
    fn missing_field_gets_sentinel() {
        let env = env();
        let binding = Resolver::new("APPCONF", &env).bind("VarMissing");
        assert!(binding.missing);
        assert_eq!(binding.key, "APPCONF_VAR_MISSING");
        let text = binding.value.as_str().unwrap();
        assert!(text.contains("VarMissing"));
        assert!(text.contains("APPCONF_VAR_MISSING"));
    }

    #[derive(Clone, Default)]
    struct Captured(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn only_named_fields_warn_when_missing() {
        let env = env();
        let logs = Captured::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        tracing::subscriber::with_default(subscriber, || {
            Resolver::new("APPCONF", &env).bindings(&["".to_string(), "VarMissing".to_string()]);
        });
        let out = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        assert_eq!(out.matches("no environment variable").count(), 1, "{out}");
        assert!(out.contains("APPCONF_VAR_MISSING"), "{out}");
    }

    #[test]
    fn prefix_selects_namespace() {
        let env = env();
        let ctx = Resolver::new("OTHER", &env).resolve(&["VarList".to_string()]);
        assert_eq!(ctx["VarList"], json!("x"));
    }

    #[test]
    fn indexes_are_slugified() {
        let env = env();
        let local = env.prefixed_index("APPCONF");
        assert_eq!(local.get("var-list").map(String::as_str), Some("ab,cd,ef"));
        assert!(!local.contains_key("other-var-list"));
        let global = env.global_index();
        assert_eq!(global.get("other-var-list").map(String::as_str), Some("x"));
    }
}
