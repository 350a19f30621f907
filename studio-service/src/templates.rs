//! 页面模板
//!
//! Templates are embedded at compile time. `.html` templates are
//! auto-escaped.

use std::sync::LazyLock;

use minijinja::{AutoEscape, Environment, Error};
use serde::Serialize;

use common::errors::AppError;

pub const STUDIO_TEMPLATE: &str = "studio.html";

static ENV: LazyLock<Environment<'static>> = LazyLock::new(|| {
    let mut env = Environment::new();
    env.set_auto_escape_callback(|name| {
        if name.ends_with(".html") {
            AutoEscape::Html
        } else {
            AutoEscape::None
        }
    });
    if let Err(e) = env.add_template(STUDIO_TEMPLATE, include_str!("../templates/studio.html")) {
        tracing::error!(template = STUDIO_TEMPLATE, error = %e, "template failed to compile");
    }
    env
});

pub fn render_template<T: Serialize>(name: &str, ctx: T) -> Result<String, Error> {
    ENV.get_template(name)?.render(ctx)
}

/// Renders a template, mapping failures to [`AppError::Template`].
pub fn render_page<T: Serialize>(name: &str, ctx: T) -> Result<String, AppError> {
    render_template(name, ctx).map_err(|e| AppError::Template(e.to_string()))
}
