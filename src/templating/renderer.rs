//! Template compilation and execution with Tera.
//!
//! A [`CompiledTemplate`] owns a private Tera instance holding exactly one
//! template (the expanded, translated view) plus every configured filter.
//! Autoescaping is enabled for all template names so that `<%= %>` output is
//! HTML-escaped regardless of the view extension.

use regex::Regex;
use serde_json::Value;
use std::panic::{AssertUnwindSafe, catch_unwind};
use strsim::levenshtein;
use tera::{Context as TeraContext, Tera};

use super::filters::FilterRegistry;
use super::locals::Locals;
use super::syntax;
use crate::config::RenderConfig;
use crate::core::RenderError;

/// Maximum allowed Levenshtein distance as a percentage of target length for suggestions.
const SIMILARITY_THRESHOLD_PERCENT: usize = 50;

/// Executable form of a view, shared by the cache.
pub struct CompiledTemplate {
    name: String,
    tera: Tera,
}

impl CompiledTemplate {
    /// Translate and compile an expanded view.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Compile`] when a code region is never closed or
    /// Tera rejects the translated source.
    pub fn compile(
        name: &str,
        expanded: &str,
        config: &RenderConfig,
        filters: &FilterRegistry,
    ) -> Result<Self, RenderError> {
        let translated =
            syntax::translate(expanded, &config.open, &config.close).map_err(|e| RenderError::Compile {
                view: name.to_string(),
                message: e.message,
                line: Some(e.line),
            })?;

        let mut tera = Tera::default();
        tera.autoescape_on(vec![""]);
        filters.register(&mut tera);
        tera.add_raw_template(name, &translated).map_err(|e| RenderError::Compile {
            view: name.to_string(),
            message: format_tera_error(&e),
            line: None,
        })?;

        tracing::debug!(
            "Compiled view '{}' ({} source bytes, {} filters)",
            name,
            expanded.len(),
            filters.len()
        );

        Ok(Self {
            name: name.to_string(),
            tera,
        })
    }

    /// Normalized view name this template was compiled from
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Debug for CompiledTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledTemplate").field("name", &self.name).finish_non_exhaustive()
    }
}

/// Run a compiled template against a locals map.
///
/// # Errors
///
/// Returns [`RenderError::Execution`] when Tera fails (undefined variable,
/// failing filter) or when filter code panics. Undefined variables carry
/// similarly named locals as suggestions.
pub fn execute(template: &CompiledTemplate, locals: &Locals) -> Result<String, RenderError> {
    let mut context = TeraContext::new();
    for (key, value) in locals {
        context.insert(key.as_str(), value);
    }

    let outcome = catch_unwind(AssertUnwindSafe(|| template.tera.render(&template.name, &context)));

    match outcome {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(e)) => {
            let message = format_tera_error(&e);
            let suggestions = extract_variable_name(&message)
                .map(|name| find_similar_variables(&name, &available_variables(locals)))
                .unwrap_or_default();
            Err(RenderError::Execution {
                view: template.name.clone(),
                message,
                suggestions,
            })
        }
        Err(panic) => Err(RenderError::Execution {
            view: template.name.clone(),
            message: format!("template code panicked: {}", panic_message(panic.as_ref())),
            suggestions: Vec::new(),
        }),
    }
}

pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Collapse a Tera error chain into one line.
///
/// The generic "Failed to render" wrapper is dropped in favor of the causes
/// underneath it.
pub fn format_tera_error(error: &tera::Error) -> String {
    use std::error::Error;

    let mut all_messages = vec![error.to_string()];
    let mut current_error: Option<&dyn Error> = error.source();
    while let Some(err) = current_error {
        all_messages.push(err.to_string());
        current_error = err.source();
    }

    let has_cause = all_messages.len() > 1;
    let messages: Vec<String> = all_messages
        .into_iter()
        .map(|msg| msg.trim().to_string())
        .filter(|msg| !msg.is_empty())
        .filter(|msg| !(has_cause && msg.starts_with("Failed to render")))
        .collect();

    if messages.is_empty() {
        "Template error (no details available)".to_string()
    } else {
        messages.join(": ")
    }
}

/// Extract variable name from "Variable `foo` not found" message
fn extract_variable_name(error_msg: &str) -> Option<String> {
    let re = Regex::new(r"Variable `([^`]+)` not found").ok()?;
    let caps = re.captures(error_msg)?;
    caps.get(1).map(|m| m.as_str().to_string())
}

/// Top-level locals plus one level of nested object keys, as dotted names.
fn available_variables(locals: &Locals) -> Vec<String> {
    let mut vars = Vec::new();
    for (key, value) in locals {
        vars.push(key.clone());
        if let Value::Object(fields) = value {
            for field in fields.keys() {
                vars.push(format!("{}.{}", key, field));
            }
        }
    }
    vars
}

/// Find similar variable names using Levenshtein distance
fn find_similar_variables(target: &str, available: &[String]) -> Vec<String> {
    let mut scored: Vec<_> = available
        .iter()
        .map(|var| {
            let distance = levenshtein(target, var);
            (var.clone(), distance)
        })
        .collect();

    scored.sort_by_key(|(_, dist)| *dist);

    scored
        .into_iter()
        .filter(|(_, dist)| *dist <= target.len() * SIMILARITY_THRESHOLD_PERCENT / 100)
        .take(3)
        .map(|(var, _)| var)
        .collect()
}
