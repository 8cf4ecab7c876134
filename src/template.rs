//! Syntax tree of a `{{ }}` template and the parser that builds it.
//!
//! The tree only knows five node kinds: literal text, actions, `if`,
//! `range`, and lists of nodes. Every node prints back to a canonical
//! textual form (`{{.Field | upper}}`), which is what field discovery
//! works on.

use std::fmt;

use itertools::Itertools;
use serde_json::Value;

use crate::errors::{Result, TemplateError};
use crate::functions::Registry;
use crate::parser::{ParseError, Parser};

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Text(String),
    Action(Pipeline),
    If(Branch),
    Range(Branch),
    List(List),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct List {
    pub nodes: Vec<Node>,
}

/// Shared shape of `if` and `range`: a test pipeline, a body and an optional `else`.
#[derive(Debug, Clone, PartialEq)]
pub struct Branch {
    pub pipe: Pipeline,
    pub list: List,
    pub else_list: Option<List>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Pipeline {
    /// Declared variables, `$` included (`$idx`, `$elem`).
    pub decl: Vec<String>,
    /// `=` instead of `:=`
    pub is_assign: bool,
    pub cmds: Vec<Command>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    pub args: Vec<Arg>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    Dot,
    Field(Vec<String>),
    Variable { name: String, fields: Vec<String> },
    Identifier(String),
    Str { raw: String, value: String },
    Number { raw: String, value: Value },
    Bool(bool),
    Nil,
    Pipe(Box<Pipeline>),
}

impl Pipeline {
    /// First argument of the first command: the value a conditional or loop is driven by.
    pub fn first_arg(&self) -> Option<&Arg> {
        self.cmds.first().and_then(|cmd| cmd.args.first())
    }
}

/// Read-only walk over a parsed tree.
///
/// `accept` calls the hook for the node, then descends into list children
/// and into the body and `else` branch of `if`/`range`.
pub trait Visitor {
    fn visit_text(&mut self, _text: &str) {}
    fn visit_action(&mut self, _pipe: &Pipeline) {}
    fn visit_if(&mut self, _branch: &Branch) {}
    fn visit_range(&mut self, _branch: &Branch) {}
}

impl Node {
    pub fn accept<V: Visitor + ?Sized>(&self, visitor: &mut V) {
        match self {
            Node::Text(text) => visitor.visit_text(text),
            Node::Action(pipe) => visitor.visit_action(pipe),
            Node::If(branch) => {
                visitor.visit_if(branch);
                branch.accept_children(visitor);
            }
            Node::Range(branch) => {
                visitor.visit_range(branch);
                branch.accept_children(visitor);
            }
            Node::List(list) => list.accept(visitor),
        }
    }
}

impl List {
    pub fn accept<V: Visitor + ?Sized>(&self, visitor: &mut V) {
        for node in &self.nodes {
            node.accept(visitor);
        }
    }
}

impl Branch {
    fn accept_children<V: Visitor + ?Sized>(&self, visitor: &mut V) {
        self.list.accept(visitor);
        if let Some(else_list) = &self.else_list {
            else_list.accept(visitor);
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Text(text) => f.write_str(text),
            Node::Action(pipe) => write!(f, "{{{{{pipe}}}}}"),
            Node::If(branch) => write_branch(f, "if", branch),
            Node::Range(branch) => write_branch(f, "range", branch),
            Node::List(list) => write!(f, "{list}"),
        }
    }
}

fn write_branch(f: &mut fmt::Formatter<'_>, keyword: &str, branch: &Branch) -> fmt::Result {
    write!(f, "{{{{{keyword} {}}}}}{}", branch.pipe, branch.list)?;
    if let Some(else_list) = &branch.else_list {
        write!(f, "{{{{else}}}}{else_list}")?;
    }
    f.write_str("{{end}}")
}

impl fmt::Display for List {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.nodes.iter().try_for_each(|node| write!(f, "{node}"))
    }
}

impl fmt::Display for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.decl.is_empty() {
            let op = if self.is_assign { "=" } else { ":=" };
            write!(f, "{} {op} ", self.decl.join(", "))?;
        }
        write!(f, "{}", self.cmds.iter().join(" | "))
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.args.iter().join(" "))
    }
}

impl fmt::Display for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arg::Dot => f.write_str("."),
            Arg::Field(fields) => write!(f, ".{}", fields.join(".")),
            Arg::Variable { name, fields } => {
                f.write_str(name)?;
                fields.iter().try_for_each(|field| write!(f, ".{field}"))
            }
            Arg::Identifier(name) => f.write_str(name),
            Arg::Str { raw, .. } | Arg::Number { raw, .. } => f.write_str(raw),
            Arg::Bool(b) => write!(f, "{b}"),
            Arg::Nil => f.write_str("nil"),
            Arg::Pipe(pipe) => write!(f, "({pipe})"),
        }
    }
}

/// A parsed template, ready for field discovery and execution.
#[derive(Debug, Clone)]
pub struct Template {
    name: String,
    root: List,
}

impl Template {
    /// Parse `src`. Function names are checked against `funcs`, so an
    /// unknown function is a parse error rather than a render error.
    pub fn parse(name: impl Into<String>, src: &str, funcs: &Registry) -> Result<Self> {
        let name = name.into();
        let mut tp = TemplateParser {
            p: Parser::new(src),
            funcs,
            trim_next: false,
        };
        let root = tp.parse_root().map_err(|e| {
            let ParseError::InvalidSyntax(msg) = e;
            TemplateError::Parse(format!("template: {}:{}: {}", name, tp.p.line(), msg))
        })?;
        Ok(Self { name, root })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn root(&self) -> &List {
        &self.root
    }

    pub fn accept<V: Visitor + ?Sized>(&self, visitor: &mut V) {
        self.root.accept(visitor);
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.root)
    }
}

// Why a list stopped.
enum Stop {
    Eof,
    End,
    Else,
    ElseIf,
}

struct TemplateParser<'a, 'r> {
    p: Parser<'a>,
    funcs: &'r Registry,
    // a `-}}` asked to trim the leading whitespace of the next text
    trim_next: bool,
}

impl<'a, 'r> TemplateParser<'a, 'r> {
    fn parse_root(&mut self) -> std::result::Result<List, ParseError> {
        let (list, stop) = self.parse_list()?;
        match stop {
            Stop::Eof => Ok(list),
            Stop::End => Err("unexpected {{end}}".to_string().into()),
            Stop::Else | Stop::ElseIf => Err("unexpected {{else}}".to_string().into()),
        }
    }

    fn parse_list(&mut self) -> std::result::Result<(List, Stop), ParseError> {
        let mut nodes = Vec::new();
        loop {
            let rest = self.p.rest();
            let Some(open) = rest.find("{{") else {
                self.push_text(&mut nodes, rest, false);
                self.p.advance(rest.len());
                return Ok((List { nodes }, Stop::Eof));
            };
            let after = &rest[open + 2..];
            let trim_left = after.starts_with('-')
                && after[1..].starts_with(|c: char| c.is_whitespace());
            self.push_text(&mut nodes, &rest[..open], trim_left);
            self.p.advance(open + 2 + usize::from(trim_left));
            self.p.skip_ws();

            if self.p.consume_str("/*") {
                self.p.capture_until_str("*/")?;
                self.p.advance(2);
                self.close()?;
                continue;
            }
            if self.p.peek_keyword("end") {
                self.p.advance(3);
                self.close()?;
                return Ok((List { nodes }, Stop::End));
            }
            if self.p.peek_keyword("else") {
                self.p.advance(4);
                self.p.skip_ws();
                if self.p.peek_keyword("if") {
                    self.p.advance(2);
                    return Ok((List { nodes }, Stop::ElseIf));
                }
                self.close()?;
                return Ok((List { nodes }, Stop::Else));
            }
            if self.p.peek_keyword("if") {
                self.p.advance(2);
                nodes.push(Node::If(self.parse_branch("if")?));
                continue;
            }
            if self.p.peek_keyword("range") {
                self.p.advance(5);
                nodes.push(Node::Range(self.parse_branch("range")?));
                continue;
            }
            let pipe = self.parse_pipeline("command")?;
            self.close()?;
            nodes.push(Node::Action(pipe));
        }
    }

    fn push_text(&mut self, nodes: &mut Vec<Node>, text: &str, trim_right: bool) {
        let mut text = text;
        if std::mem::take(&mut self.trim_next) {
            text = text.trim_start();
        }
        if trim_right {
            text = text.trim_end();
        }
        if !text.is_empty() {
            nodes.push(Node::Text(text.to_string()));
        }
    }

    // Consume `}}` or ` -}}` at the end of an action.
    fn close(&mut self) -> std::result::Result<(), ParseError> {
        self.p.skip_ws();
        if self.p.consume_str("-}}") {
            self.trim_next = true;
            return Ok(());
        }
        if self.p.consume_str("}}") {
            return Ok(());
        }
        let msg = match self.p.peek_char() {
            None => "unclosed action".to_string(),
            Some(c) => format!("unexpected {c:?} in action"),
        };
        Err(msg.into())
    }

    fn parse_branch(&mut self, keyword: &str) -> std::result::Result<Branch, ParseError> {
        let pipe = self.parse_pipeline(keyword)?;
        self.close()?;
        let (list, stop) = self.parse_list()?;
        let else_list = match stop {
            Stop::End => None,
            Stop::Else => {
                let (else_list, stop) = self.parse_list()?;
                match stop {
                    Stop::End => Some(else_list),
                    Stop::Eof => return Err("unexpected EOF".to_string().into()),
                    Stop::Else | Stop::ElseIf => {
                        return Err(format!("expected end; found {{{{else}}}} in {keyword}").into())
                    }
                }
            }
            // `{{else if}}` is sugar for an `if` nested in the else branch; it owns the `{{end}}`
            Stop::ElseIf if keyword == "if" => Some(List {
                nodes: vec![Node::If(self.parse_branch("if")?)],
            }),
            Stop::ElseIf => return Err(format!("unexpected {{{{else if}}}} in {keyword}").into()),
            Stop::Eof => return Err("unexpected EOF".to_string().into()),
        };
        Ok(Branch {
            pipe,
            list,
            else_list,
        })
    }

    fn parse_pipeline(&mut self, context: &str) -> std::result::Result<Pipeline, ParseError> {
        self.p.skip_ws();
        let (decl, is_assign) = self.parse_decl();
        if decl.len() > 2 || (decl.len() == 2 && context != "range") {
            return Err(format!("too many declarations in {context}").into());
        }
        let mut cmds: Vec<Command> = Vec::new();
        loop {
            self.p.skip_ws();
            if self.at_command_end() {
                if !cmds.is_empty() {
                    return Err("missing command after '|'".to_string().into());
                }
                break;
            }
            let cmd = self.parse_command()?;
            if !cmds.is_empty() && !matches!(cmd.args.first(), Some(Arg::Identifier(_))) {
                return Err(format!(
                    "non executable command in pipeline stage {}",
                    cmds.len() + 1
                )
                .into());
            }
            cmds.push(cmd);
            self.p.skip_ws();
            if !self.p.consume_char('|') {
                break;
            }
        }
        if cmds.is_empty() {
            return Err(format!("missing value for {context}").into());
        }
        Ok(Pipeline {
            decl,
            is_assign,
            cmds,
        })
    }

    // `$x :=`, `$i, $e :=` or `$x =`; rewinds when the `$` turns out to be an operand.
    fn parse_decl(&mut self) -> (Vec<String>, bool) {
        let start = self.p.pos();
        let mut names = Vec::new();
        while self.p.consume_char('$') {
            let name = self.p.parse_identifier().unwrap_or_default();
            names.push(format!("${name}"));
            self.p.skip_ws();
            if !self.p.consume_char(',') {
                break;
            }
            self.p.skip_ws();
        }
        if !names.is_empty() {
            if self.p.consume_str(":=") {
                return (names, false);
            }
            if self.p.peek_char() == Some('=') && self.p.peek_nth(1) != Some('=') {
                self.p.advance(1);
                return (names, true);
            }
        }
        self.p.seek(start);
        (Vec::new(), false)
    }

    fn at_command_end(&self) -> bool {
        self.p.eof()
            || self.p.peek_str("}}")
            || self.p.peek_str("-}}")
            || self.p.peek_char() == Some('|')
            || self.p.peek_char() == Some(')')
    }

    fn parse_command(&mut self) -> std::result::Result<Command, ParseError> {
        let mut args = Vec::new();
        loop {
            self.p.skip_ws();
            if self.at_command_end() {
                break;
            }
            args.push(self.parse_operand()?);
        }
        if args.is_empty() {
            return Err("empty command".to_string().into());
        }
        Ok(Command { args })
    }

    fn parse_operand(&mut self) -> std::result::Result<Arg, ParseError> {
        let start = self.p.pos();
        let c = self
            .p
            .peek_char()
            .ok_or_else(|| ParseError::from("unclosed action".to_string()))?;
        match c {
            '.' => {
                if self.p.peek_nth(1).is_some_and(is_ident_start) {
                    Ok(Arg::Field(self.parse_field_chain()?))
                } else {
                    self.p.advance(1);
                    Ok(Arg::Dot)
                }
            }
            '$' => {
                self.p.advance(1);
                let name = if self.p.peek_char().is_some_and(is_ident_start) {
                    format!("${}", self.p.parse_identifier()?)
                } else {
                    "$".to_string()
                };
                let fields = self.parse_field_chain()?;
                Ok(Arg::Variable { name, fields })
            }
            '"' | '`' => {
                let value = self.p.parse_quoted_string()?;
                let raw = self.p.slice(start, self.p.pos()).to_string();
                Ok(Arg::Str { raw, value })
            }
            '(' => {
                self.p.advance(1);
                let pipe = self.parse_pipeline("parenthesized pipeline")?;
                self.p.skip_ws();
                self.p
                    .expect(')')
                    .map_err(|_| ParseError::from("unclosed left paren".to_string()))?;
                Ok(Arg::Pipe(Box::new(pipe)))
            }
            c if c.is_ascii_digit()
                || ((c == '-' || c == '+')
                    && self.p.peek_nth(1).is_some_and(|n| n.is_ascii_digit())) =>
            {
                let value = self.p.parse_number_literal()?;
                let raw = self.p.slice(start, self.p.pos()).to_string();
                Ok(Arg::Number { raw, value })
            }
            c if is_ident_start(c) => {
                let ident = self.p.parse_identifier()?;
                match ident.as_str() {
                    "true" => Ok(Arg::Bool(true)),
                    "false" => Ok(Arg::Bool(false)),
                    "nil" => Ok(Arg::Nil),
                    name if self.funcs.contains(name) => Ok(Arg::Identifier(ident)),
                    name => Err(format!("function {name:?} not defined").into()),
                }
            }
            other => Err(format!("unexpected {other:?} in command").into()),
        }
    }

    // `.A.B.C` → ["A", "B", "C"]
    fn parse_field_chain(&mut self) -> std::result::Result<Vec<String>, ParseError> {
        let mut fields = Vec::new();
        while self.p.peek_char() == Some('.') && self.p.peek_nth(1).is_some_and(is_ident_start) {
            self.p.advance(1);
            fields.push(self.p.parse_identifier()?);
        }
        Ok(fields)
    }
}

fn is_ident_start(c: char) -> bool {
    c == '_' || c.is_alphabetic()
}
