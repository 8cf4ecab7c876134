//! Field name ↔ environment key translation, plus the case/slug transforms
//! shared by the function library and the environment lookups.

use std::sync::LazyLock;

use itertools::Itertools;
use regex::Regex;

/// Namespace used when no `-p` prefix is given.
pub const DEFAULT_PREFIX: &str = "APPCONF";

static NON_ALNUM: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^a-z0-9]+").unwrap());
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static CAMEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(^[^A-Z]*|[A-Z]*)([A-Z][^A-Z]+|$)").unwrap());

/// Map a template field to the environment variable it is bound to.
///
/// `MyValueIsCamelCase` with prefix `APPCONF` becomes
/// `APPCONF_MY_VALUE_IS_CAMEL_CASE`. Every uppercase letter after the first
/// character opens a new word, so `ABc` becomes `A_BC`.
pub fn field_to_env_key(field: &str, prefix: &str) -> String {
    format!("{}_{}", prefix, split_upper_words(field).join("_").to_uppercase())
}

/// Split `field` in front of every uppercase letter that is not the first character.
pub fn split_upper_words(field: &str) -> Vec<&str> {
    let mut words = Vec::new();
    let mut start = 0;
    for (i, c) in field.char_indices().skip(1) {
        if c.is_uppercase() {
            words.push(&field[start..i]);
            start = i;
        }
    }
    if start < field.len() {
        words.push(&field[start..]);
    }
    words
}

// lower-case, collapse everything that is not [a-z0-9] into single `sep`
fn normalize(value: &str, sep: &str) -> String {
    let lowered = value.trim().to_lowercase();
    let spaced = NON_ALNUM.replace_all(&lowered, " ");
    WHITESPACE.replace_all(spaced.trim(), sep).into_owned()
}

/// `Hello, World!` → `hello-world`
pub fn slugify(value: &str) -> String {
    normalize(value, "-")
}

/// `Hello, World!` → `hello_world`
pub fn snakize(value: &str) -> String {
    normalize(value, "_")
}

/// `HTTPServerName` → `http_server_name`
pub fn underscore(value: &str) -> String {
    let words = CAMEL
        .captures_iter(value)
        .flat_map(|caps| [caps.get(1), caps.get(2)])
        .flatten()
        .map(|m| m.as_str())
        .filter(|w| !w.is_empty())
        .join("_");
    snakize(&words)
}

/// `my app name` → `MY_APP_NAME`
pub fn envname(value: &str) -> String {
    let camel: String = value
        .split_whitespace()
        .map(|w| title_case(&w.to_lowercase()))
        .collect();
    underscore(&camel).to_uppercase()
}

/// Uppercase the first letter of every word and leave the rest untouched.
pub fn title_case(value: &str) -> String {
    let mut prev = ' ';
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if is_word_separator(prev) {
            out.extend(c.to_uppercase());
        } else {
            out.push(c);
        }
        prev = c;
    }
    out
}

fn is_word_separator(c: char) -> bool {
    if c.is_ascii() {
        return !(c.is_ascii_alphanumeric() || c == '_');
    }
    if c.is_alphanumeric() {
        return false;
    }
    c.is_whitespace()
}
