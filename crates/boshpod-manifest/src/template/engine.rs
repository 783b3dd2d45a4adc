//! Template engine for release job templates
//!
//! Standard Jinja delimiters (`{{ }}`, `{% %}`, `{# #}`) with strict undefined
//! handling, so a typo in a property path fails the render instead of
//! producing an empty value.

use std::fs;
use std::path::Path;

use minijinja::{Environment, UndefinedBehavior};

use super::context::TemplateContext;
use super::error::TemplateError;
use super::filters;

/// Renders `bpm.yml` and other job templates.
///
/// Registers the `default`, `required` and `base64_encode` filters and the
/// `p(path, default?)` property function.
pub struct TemplateEngine {
    env: Environment<'static>,
}

impl Default for TemplateEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateEngine {
    /// Create a new template engine
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env.set_keep_trailing_newline(true);

        env.add_filter("default", filters::default_filter);
        env.add_filter("base64_encode", filters::base64_encode);
        env.add_filter("required", filters::required);
        env.add_function("p", filters::p);

        Self { env }
    }

    /// Render template source against `ctx`.
    ///
    /// Fails on syntax errors, undefined variables and failed `p()` lookups.
    pub fn render(&self, template: &str, ctx: &TemplateContext) -> Result<String, TemplateError> {
        self.env
            .render_str(template, ctx.to_value())
            .map_err(TemplateError::from)
    }

    /// Read a template file and render it with the given context
    pub fn render_file(&self, path: &Path, ctx: &TemplateContext) -> Result<String, TemplateError> {
        let template = fs::read_to_string(path).map_err(|e| TemplateError::read(path, e))?;
        self.render(&template, ctx)
    }
}
