//! Per-render locals and render options.
//!
//! Locals are assembled for every render in a fixed precedence order:
//!
//! 1. the caller's options
//! 2. configured helpers, only for names the caller did not supply
//! 3. the inbound request under `request`, unless the caller supplied one
//! 4. configured filter names, which always shadow anything above
//!
//! Layout renders additionally receive the rendered view under `body`.

use http::request::Parts;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use super::filters::FilterRegistry;
use super::renderer::panic_message;
use crate::core::RenderError;

/// Key-value map visible to template code.
pub type Locals = Map<String, Value>;

/// Reserved key holding the rendered view inside its layout.
pub const BODY_KEY: &str = "body";

/// Key holding the inbound request snapshot.
pub const REQUEST_KEY: &str = "request";

/// Option key selecting the layout when options come from JSON.
pub const LAYOUT_KEY: &str = "layout";

/// Factory computing a helper value from the inbound request.
pub type HelperFn = Arc<dyn Fn(&Parts) -> Value + Send + Sync>;

/// A configured helper: a fixed value or a per-request factory.
#[derive(Clone)]
pub enum Helper {
    Value(Value),
    Factory(HelperFn),
}

impl Helper {
    /// Produce the helper's value for this request.
    ///
    /// A panicking factory yields the panic payload instead of unwinding
    /// into the caller.
    pub fn resolve(&self, request: &Parts) -> std::thread::Result<Value> {
        match self {
            Helper::Value(value) => Ok(value.clone()),
            Helper::Factory(factory) => catch_unwind(AssertUnwindSafe(|| factory(request))),
        }
    }
}

impl std::fmt::Debug for Helper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Helper::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Helper::Factory(_) => f.write_str("Factory(..)"),
        }
    }
}

/// Which layout wraps a rendered view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LayoutChoice {
    /// Use the configured default layout, if any
    #[default]
    Default,
    /// Render the view without a layout
    Disabled,
    /// Use this layout view
    Named(String),
}

/// Caller-supplied options for a single render.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderOptions {
    pub layout: LayoutChoice,
    pub locals: Locals,
}

impl RenderOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a local value.
    pub fn local(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.locals.insert(key.into(), value.into());
        self
    }

    /// Wrap the view in the named layout. An empty name disables the layout.
    pub fn layout(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.layout = if name.is_empty() {
            LayoutChoice::Disabled
        } else {
            LayoutChoice::Named(name)
        };
        self
    }

    /// Render the view on its own.
    pub fn without_layout(mut self) -> Self {
        self.layout = LayoutChoice::Disabled;
        self
    }

    /// Build options from a JSON object.
    ///
    /// A `layout` key selects the layout: a non-empty string names it, while
    /// `false`, `""` and `null` disable it. The key is not passed on as a local.
    /// `null` input yields default options.
    pub fn from_json(value: Value) -> Result<Self, RenderError> {
        let mut locals = match value {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                return Err(RenderError::config(format!(
                    "render options must be a JSON object, got {}",
                    json_type_name(&other)
                )));
            }
        };

        let layout = match locals.remove(LAYOUT_KEY) {
            None | Some(Value::Bool(true)) => LayoutChoice::Default,
            Some(Value::Null) | Some(Value::Bool(false)) => LayoutChoice::Disabled,
            Some(Value::String(name)) if name.is_empty() => LayoutChoice::Disabled,
            Some(Value::String(name)) => LayoutChoice::Named(name),
            Some(other) => {
                return Err(RenderError::config(format!(
                    "layout option must be a string or boolean, got {}",
                    json_type_name(&other)
                )));
            }
        };

        Ok(Self {
            layout,
            locals,
        })
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Snapshot of the inbound request exposed to templates as `request`.
pub fn request_snapshot(request: &Parts) -> Value {
    let mut headers: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in &request.headers {
        let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
        headers
            .entry(name.as_str().to_string())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(&value);
            })
            .or_insert(value);
    }

    serde_json::json!({
        "method": request.method.as_str(),
        "uri": request.uri.to_string(),
        "path": request.uri.path(),
        "query": request.uri.query().unwrap_or(""),
        "headers": headers,
    })
}

/// Merge caller options, helpers, the request and filter names into locals.
///
/// # Errors
///
/// Returns [`RenderError::Execution`] for `view` when a helper factory panics.
pub fn assemble_locals(
    view: &str,
    options: Locals,
    filters: &FilterRegistry,
    helpers: &BTreeMap<String, Helper>,
    request: &Parts,
) -> Result<Locals, RenderError> {
    let mut locals = options;

    for (name, helper) in helpers {
        if locals.contains_key(name) {
            continue;
        }
        let value = helper.resolve(request).map_err(|panic| RenderError::Execution {
            view: view.to_string(),
            message: format!("helper '{}' panicked: {}", name, panic_message(panic.as_ref())),
            suggestions: Vec::new(),
        })?;
        locals.insert(name.clone(), value);
    }

    if !locals.contains_key(REQUEST_KEY) {
        locals.insert(REQUEST_KEY.to_string(), request_snapshot(request));
    }

    for name in filters.names() {
        if locals.remove(name).is_some() {
            tracing::debug!("Local '{}' is shadowed by the configured filter of the same name", name);
        }
    }

    Ok(locals)
}
