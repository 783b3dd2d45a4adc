//! Jinja templating for release job templates
//!
//! Job templates are rendered with minijinja. Each render sees:
//! - `properties` - the job's merged property tree
//! - `spec` - instance identity (`address`, `az`, `id`, `index`, `name`,
//!   `deployment`, `bootstrap`)
//! - `links` - consumed links, each with `instances` and `properties`
//!
//! `p("dotted.path", default)` looks up a property and fails when it is unset
//! and no default is given. Filters: `default`, `required`, `base64_encode`.

mod context;
mod engine;
mod error;
mod filters;

pub use context::{InstanceContext, TemplateContext, TemplateContextBuilder};
pub use engine::TemplateEngine;
pub use error::TemplateError;
