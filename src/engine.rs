//! Tree-walking execution of a parsed template.

use itertools::Itertools;
use serde_json::Value;

use crate::errors::{Result, TemplateError};
use crate::functions::{describe_arity, Registry};
use crate::template::{Arg, Branch, Command, List, Node, Pipeline, Template};
use crate::value::{is_true, print_value, type_name};

/// Execute `template` with `data` as both `.` and `$`.
pub fn execute(template: &Template, data: &Value, funcs: &Registry) -> Result<String> {
    let mut state = State {
        funcs,
        root: data,
        vars: Vec::new(),
        out: String::new(),
    };
    state.walk_list(data, template.root()).map_err(|e| match e {
        TemplateError::Render(msg) => {
            TemplateError::Render(format!("template: {}: {}", template.name(), msg))
        }
        other => other,
    })?;
    Ok(state.out)
}

struct State<'a> {
    funcs: &'a Registry,
    root: &'a Value,
    // variable stack; scopes are restored by truncating
    vars: Vec<(String, Value)>,
    out: String,
}

impl<'a> State<'a> {
    fn walk_list(&mut self, dot: &Value, list: &List) -> Result<()> {
        list.nodes.iter().try_for_each(|node| self.walk(dot, node))
    }

    fn walk(&mut self, dot: &Value, node: &Node) -> Result<()> {
        match node {
            Node::Text(text) => {
                self.out.push_str(text);
                Ok(())
            }
            Node::Action(pipe) => {
                let value = self.eval_pipeline(dot, pipe)?;
                if pipe.decl.is_empty() {
                    self.out.push_str(&print_value(&value));
                }
                Ok(())
            }
            Node::If(branch) => {
                let mark = self.vars.len();
                let result = self.walk_if(dot, branch);
                self.vars.truncate(mark);
                result
            }
            Node::Range(branch) => {
                let mark = self.vars.len();
                let result = self.walk_range(dot, branch, mark);
                self.vars.truncate(mark);
                result
            }
            Node::List(list) => self.walk_list(dot, list),
        }
    }

    fn walk_if(&mut self, dot: &Value, branch: &Branch) -> Result<()> {
        let test = self.eval_pipeline(dot, &branch.pipe)?;
        if is_true(&test) {
            self.walk_list(dot, &branch.list)
        } else if let Some(else_list) = &branch.else_list {
            self.walk_list(dot, else_list)
        } else {
            Ok(())
        }
    }

    fn walk_range(&mut self, dot: &Value, branch: &Branch, mark: usize) -> Result<()> {
        let source = self.run_commands(dot, &branch.pipe.cmds)?;
        let items: Vec<(Value, Value)> = match source {
            Value::Array(items) => items
                .into_iter()
                .enumerate()
                .map(|(i, elem)| (Value::from(i), elem))
                .collect(),
            Value::Object(map) => map
                .into_iter()
                .sorted_by(|a, b| a.0.cmp(&b.0))
                .map(|(k, v)| (Value::String(k), v))
                .collect(),
            Value::Null => Vec::new(),
            other => {
                return Err(TemplateError::render(format!(
                    "range can't iterate over {}",
                    type_name(&other)
                )))
            }
        };

        if items.is_empty() {
            if let Some(else_list) = &branch.else_list {
                return self.walk_list(dot, else_list);
            }
            return Ok(());
        }

        for (key, elem) in items {
            match branch.pipe.decl.as_slice() {
                [] => {}
                [elem_var] => self.bind(elem_var, elem.clone(), branch.pipe.is_assign)?,
                [key_var, elem_var, ..] => {
                    self.bind(key_var, key, branch.pipe.is_assign)?;
                    self.bind(elem_var, elem.clone(), branch.pipe.is_assign)?;
                }
            }
            let result = self.walk_list(&elem, &branch.list);
            self.vars.truncate(mark);
            result?;
        }
        Ok(())
    }

    fn eval_pipeline(&mut self, dot: &Value, pipe: &Pipeline) -> Result<Value> {
        let value = self.run_commands(dot, &pipe.cmds)?;
        for name in &pipe.decl {
            self.bind(name, value.clone(), pipe.is_assign)?;
        }
        Ok(value)
    }

    // Each command's result is passed as the last argument of the next one.
    fn run_commands(&mut self, dot: &Value, cmds: &[Command]) -> Result<Value> {
        let mut piped = None;
        for cmd in cmds {
            piped = Some(self.eval_command(dot, cmd, piped.take())?);
        }
        piped.ok_or_else(|| TemplateError::render("empty pipeline"))
    }

    fn eval_command(&mut self, dot: &Value, cmd: &Command, piped: Option<Value>) -> Result<Value> {
        let first = cmd
            .args
            .first()
            .ok_or_else(|| TemplateError::render("empty command"))?;
        match first {
            Arg::Identifier(name) => {
                let mut args = cmd.args[1..]
                    .iter()
                    .map(|arg| self.eval_arg(dot, arg))
                    .collect::<Result<Vec<_>>>()?;
                args.extend(piped);
                self.call(name, &args)
            }
            _ if cmd.args.len() > 1 || piped.is_some() => Err(TemplateError::render(format!(
                "can't give argument to non-function {first}"
            ))),
            _ => self.eval_arg(dot, first),
        }
    }

    fn call(&self, name: &str, args: &[Value]) -> Result<Value> {
        let f = self
            .funcs
            .get(name)
            .ok_or_else(|| TemplateError::render(format!("function {name:?} not defined")))?;
        let arity = f.arity();
        if !arity.contains(&args.len()) {
            return Err(TemplateError::render(format!(
                "wrong number of args for {name}: want {} got {}",
                describe_arity(&arity),
                args.len()
            )));
        }
        f.call(args).map_err(|e| match e {
            TemplateError::Render(msg) => {
                TemplateError::Render(format!("error calling {name}: {msg}"))
            }
            other => other,
        })
    }

    fn eval_arg(&mut self, dot: &Value, arg: &Arg) -> Result<Value> {
        match arg {
            Arg::Dot => Ok(dot.clone()),
            Arg::Field(fields) => walk_fields(dot.clone(), fields),
            Arg::Variable { name, fields } => {
                let value = self.lookup(name)?;
                walk_fields(value, fields)
            }
            Arg::Identifier(name) => self.call(name, &[]),
            Arg::Str { value, .. } => Ok(Value::String(value.clone())),
            Arg::Number { value, .. } => Ok(value.clone()),
            Arg::Bool(b) => Ok(Value::Bool(*b)),
            Arg::Nil => Ok(Value::Null),
            Arg::Pipe(pipe) => {
                let mark = self.vars.len();
                let result = self.eval_pipeline(dot, pipe);
                self.vars.truncate(mark);
                result
            }
        }
    }

    fn lookup(&self, name: &str) -> Result<Value> {
        if name == "$" {
            return Ok(self.root.clone());
        }
        self.vars
            .iter()
            .rev()
            .find(|(var, _)| var == name)
            .map(|(_, value)| value.clone())
            .ok_or_else(|| TemplateError::render(format!("undefined variable: {name}")))
    }

    fn bind(&mut self, name: &str, value: Value, assign: bool) -> Result<()> {
        if !assign {
            self.vars.push((name.to_string(), value));
            return Ok(());
        }
        match self.vars.iter_mut().rev().find(|(var, _)| var == name) {
            Some(slot) => {
                slot.1 = value;
                Ok(())
            }
            None => Err(TemplateError::render(format!("undefined variable: {name}"))),
        }
    }
}

// `.A.B` on a map walks keys; a missing key is null.
fn walk_fields(mut value: Value, fields: &[String]) -> Result<Value> {
    for field in fields {
        value = match value {
            Value::Object(mut map) => map.remove(field).unwrap_or(Value::Null),
            Value::Null => {
                return Err(TemplateError::render(format!("nil pointer evaluating .{field}")))
            }
            other => {
                return Err(TemplateError::render(format!(
                    "can't evaluate field {field} in type {}",
                    type_name(&other)
                )))
            }
        };
    }
    Ok(value)
}
