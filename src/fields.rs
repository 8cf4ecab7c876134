//! Discovery of the top-level fields a template refers to.

use std::sync::LazyLock;

use itertools::Itertools;
use regex::Regex;

use crate::template::{Branch, Pipeline, Template, Visitor};

// First `.Ident` after `{{`, skipping whatever non-dot text precedes it.
// Identifier characters match the template parser's: Unicode letters, digits, `_`.
static FIELD_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{\s*[^.]*\.\s*([\p{L}\p{N}_]+)").unwrap());

/// Collects one token per action, conditional and loop, in document order.
///
/// Actions contribute their full text (`{{.A | upper}}`); `if` and `range`
/// contribute their first pipeline argument re-wrapped as `{{<arg>}}`.
#[derive(Debug, Default)]
pub struct FieldCollector {
    tokens: Vec<String>,
}

impl FieldCollector {
    pub fn into_tokens(self) -> Vec<String> {
        self.tokens
    }

    fn push_first_arg(&mut self, branch: &Branch) {
        if let Some(arg) = branch.pipe.first_arg() {
            self.tokens.push(format!("{{{{{arg}}}}}"));
        }
    }
}

impl Visitor for FieldCollector {
    fn visit_action(&mut self, pipe: &Pipeline) {
        self.tokens.push(format!("{{{{{pipe}}}}}"));
    }

    fn visit_if(&mut self, branch: &Branch) {
        self.push_first_arg(branch);
    }

    fn visit_range(&mut self, branch: &Branch) {
        self.push_first_arg(branch);
    }
}

/// Raw field tokens of `template`, duplicates included.
pub fn extract_fields(template: &Template) -> Vec<String> {
    let mut collector = FieldCollector::default();
    template.accept(&mut collector);
    collector.into_tokens()
}

/// Exact-match dedup; keeps the first occurrence and the original order.
pub fn dedup_fields(tokens: Vec<String>) -> Vec<String> {
    tokens.into_iter().unique().collect()
}

/// Bare identifier of a token: `{{ default .Name "x" }}` → `Name`.
/// A token without a dotted identifier gives "".
pub fn extract_field_name(token: &str) -> String {
    FIELD_NAME
        .captures(token)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default()
}

/// Deduplicated field names of `template`, ready for resolution.
pub fn field_names(template: &Template) -> Vec<String> {
    let names = dedup_fields(extract_fields(template))
        .iter()
        .map(|token| extract_field_name(token))
        .collect();
    dedup_fields(names)
}
