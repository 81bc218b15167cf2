//! Query template rendering.
//!
//! Templates are Handlebars with HTML escaping disabled and strict mode on, so
//! a reference to missing data fails instead of rendering as an empty string.
//! Go-style leading-dot references (`{{.ID}}`, `{{.}}`) are accepted as
//! aliases of `{{ID}}` and `{{this}}`.

mod store;

pub use store::{TemplateFile, TemplateStore};

use std::borrow::Cow;
use std::sync::OnceLock;

use handlebars::Handlebars;
use regex::{Captures, Regex};
use serde_json::Value;

use crate::error::{ApiError, RenderError, Result};

/// Registry name used for inline templates.
const INLINE_TEMPLATE: &str = "query";

/// Where the query template comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateSource {
    /// Template text supplied with the request.
    Inline(String),
    /// A template file from the template store, selected by name after
    /// parsing every file matched by `patterns`.
    Named { name: String, patterns: Vec<String> },
}

/// Renders a template source with the given data.
///
/// Named templates need a store; asking for one without a store configured is
/// a configuration error rather than a render error.
pub async fn render(
    source: &TemplateSource,
    store: Option<&TemplateStore>,
    data: &Value,
) -> Result<String> {
    match source {
        TemplateSource::Inline(text) => Ok(render_inline(text, data)?),
        TemplateSource::Named { name, patterns } => {
            let store =
                store.ok_or_else(|| ApiError::config("query templates are not configured"))?;
            let files = store.load_matching(patterns).await?;
            Ok(render_named(&files, name, data)?)
        }
    }
}

/// Parses and executes a template given as text.
pub fn render_inline(text: &str, data: &Value) -> std::result::Result<String, RenderError> {
    let mut registry = new_registry();
    registry
        .register_template_string(INLINE_TEMPLATE, normalize_field_refs(text))
        .map_err(|e| RenderError::parse(e.to_string()))?;

    registry
        .render(INLINE_TEMPLATE, data)
        .map_err(|e| RenderError::execute(e.to_string()))
}

/// Parses every file, then executes the one registered under `name`.
///
/// Files are registered under their base name in the order given, so a later
/// file replaces an earlier one with the same name. Files can include each
/// other as partials (`{{> other}}`).
pub fn render_named(
    files: &[TemplateFile],
    name: &str,
    data: &Value,
) -> std::result::Result<String, RenderError> {
    let mut registry = new_registry();
    for file in files {
        registry
            .register_template_string(file.name(), normalize_field_refs(&file.content))
            .map_err(|e| RenderError::parse(format!("{}: {e}", file.path)))?;
    }

    if !registry.has_template(name) {
        return Err(RenderError::lookup(format!(
            "no template named '{name}' among {} parsed file(s)",
            files.len()
        )));
    }

    registry
        .render(name, data)
        .map_err(|e| RenderError::execute(e.to_string()))
}

fn new_registry() -> Handlebars<'static> {
    let mut registry = Handlebars::new();
    registry.set_strict_mode(true);
    registry.register_escape_fn(handlebars::no_escape);
    registry
}

/// Rewrites `.Field` to `Field` and a lone `.` to `this` inside `{{ }}`.
fn normalize_field_refs(text: &str) -> Cow<'_, str> {
    static MUSTACHE: OnceLock<Regex> = OnceLock::new();
    static DOT_REF: OnceLock<Regex> = OnceLock::new();

    let mustache = MUSTACHE.get_or_init(|| Regex::new(r"\{\{[^{}]*\}\}").expect("valid regex"));
    let dot_ref = DOT_REF.get_or_init(|| {
        Regex::new(r"(^|[\s(~{])\.([A-Za-z_][A-Za-z0-9_]*|$|[\s)~}])").expect("valid regex")
    });

    mustache.replace_all(text, |tag: &Captures| {
        dot_ref
            .replace_all(&tag[0], |caps: &Captures| {
                let follow = &caps[2];
                if follow.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_') {
                    format!("{}{}", &caps[1], follow)
                } else {
                    format!("{}this{}", &caps[1], follow)
                }
            })
            .into_owned()
    })
}
