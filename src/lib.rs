pub mod config;
pub mod context;
pub mod engine;
pub mod errors;
pub mod fields;
pub mod functions;
pub mod naming;
pub mod output;
pub mod template;
mod comparison;
mod parser;
mod value;

use serde_json::{Map, Value};
use tracing::{debug, info};

use context::{Binding, Resolver};
use functions::Registry;

pub use config::RenderConfig;
pub use context::EnvSnapshot;
pub use errors::{Result, TemplateError};
pub use naming::{field_to_env_key, DEFAULT_PREFIX};
pub use template::Template;

/// Renders templates against one environment snapshot.
///
/// The resolver and the `env` functions of the registry read the same
/// snapshot, so every render of a `Renderer` sees the same environment.
pub struct Renderer {
    prefix: String,
    env: EnvSnapshot,
    registry: Registry,
}

impl Renderer {
    pub fn new(prefix: impl Into<String>, env: EnvSnapshot) -> Self {
        let prefix = prefix.into();
        let registry = Registry::with_builtins(&env, &prefix);
        Self { prefix, env, registry }
    }

    /// Renderer over the current process environment.
    pub fn from_env(prefix: impl Into<String>) -> Self {
        Self::new(prefix, EnvSnapshot::capture())
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn parse(&self, name: &str, src: &str) -> Result<Template> {
        Template::parse(name, src, &self.registry)
    }

    pub fn bindings(&self, template: &Template) -> Vec<Binding> {
        let fields = fields::field_names(template);
        debug!(?fields, "fields referenced by {}", template.name());
        Resolver::new(&self.prefix, &self.env).bindings(&fields)
    }

    /// Context map for `template`: one entry per referenced field.
    pub fn context(&self, template: &Template) -> Map<String, Value> {
        let fields = fields::field_names(template);
        Resolver::new(&self.prefix, &self.env).resolve(&fields)
    }

    pub fn render(&self, template: &Template) -> Result<String> {
        let ctx = self.context(template);
        self.render_with(template, &ctx)
    }

    /// Render against an explicit context instead of the environment.
    pub fn render_with(&self, template: &Template, ctx: &Map<String, Value>) -> Result<String> {
        engine::execute(template, &Value::Object(ctx.clone()), &self.registry)
    }
}

/// Read, parse and render `config.source`, then write the result.
pub fn run(config: &RenderConfig) -> Result<()> {
    config.validate()?;
    let src = std::fs::read_to_string(&config.source)?;
    let renderer = Renderer::from_env(config.prefix.as_str());
    let name = config
        .source
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let template = renderer.parse(&name, &src)?;

    if config.explain {
        let report = serde_json::to_string_pretty(&renderer.bindings(&template))?;
        return output::write_output(config.target.as_deref(), &(report + "\n"));
    }

    let rendered = renderer.render(&template)?;
    output::write_output(config.target.as_deref(), &rendered)?;
    let output = config
        .target
        .as_ref()
        .map(|t| t.display().to_string())
        .unwrap_or_else(|| "-".into());
    info!(source = %config.source.display(), %output, "rendered template");
    Ok(())
}
