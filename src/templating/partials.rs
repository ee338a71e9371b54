//! Static partial expansion.
//!
//! Before a view is compiled, every partial-include directive in its source
//! (`<%- partial('header.html') %>` or `<%= partial(page.sidebar) %>` with the
//! default delimiters) is replaced by the text of the referenced file, itself
//! expanded recursively. Expansion happens once per compile, so with caching
//! enabled the expanded text lives inside the cached template. A directive
//! closed with a trim marker (`<%- partial('nav.html') -%>`) also drops the
//! newline that follows it.
//!
//! # Partial expressions
//!
//! The argument of `partial(...)` is evaluated by [`PartialExpr`], which accepts:
//!
//! - a quoted literal: `'nav.html'` or `"nav.html"`
//! - a dotted lookup into the render locals: `page.sidebar`
//! - a `+` concatenation of the above: `'themes/' + theme + '/nav.html'`
//!
//! # Failure handling
//!
//! A partial never fails the page. Each of the following is logged with
//! `tracing::warn!` and the directive is replaced by an empty string:
//!
//! - an expression that cannot be parsed or evaluated
//! - a name that resolves outside the view root
//! - a file that cannot be read
//! - nesting deeper than [`MAX_PARTIAL_DEPTH`]
//!
//! A reference to a view already being expanded (the view itself or any
//! ancestor) is replaced by an empty string without a warning, which stops
//! both self-inclusion and mutual inclusion.

use futures::FutureExt;
use futures::future::BoxFuture;
use regex::Regex;
use serde_json::Value;
use thiserror::Error;

use super::locals::Locals;
use crate::config::RenderConfig;
use crate::core::FileOps;

/// Maximum number of nested partial levels expanded below a view.
pub const MAX_PARTIAL_DEPTH: usize = 32;

/// Why a partial expression produced no name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PartialExprError {
    #[error("unsupported partial expression '{0}'")]
    Unsupported(String),

    #[error("'{0}' is not defined in the render locals")]
    Undefined(String),

    #[error("'{path}' is {kind}, expected a string")]
    NotAString {
        path: String,
        kind: &'static str,
    },
}

/// Restricted expression naming a partial.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartialExpr {
    /// Quoted string literal
    Literal(String),
    /// Dotted path into the locals
    Lookup(Vec<String>),
    /// Terms joined with `+`
    Concat(Vec<PartialExpr>),
}

impl PartialExpr {
    /// Parse the text between the parentheses of `partial(...)`.
    pub fn parse(text: &str) -> Result<Self, PartialExprError> {
        let terms = split_terms(text).ok_or_else(|| PartialExprError::Unsupported(text.trim().to_string()))?;

        let mut parsed = Vec::with_capacity(terms.len());
        for term in &terms {
            parsed.push(parse_term(term).ok_or_else(|| PartialExprError::Unsupported(text.trim().to_string()))?);
        }

        if parsed.len() == 1 {
            Ok(parsed.remove(0))
        } else {
            Ok(PartialExpr::Concat(parsed))
        }
    }

    /// Evaluate against the render locals.
    ///
    /// Lookups must end at a string or a number; numbers are formatted as text.
    pub fn evaluate(&self, locals: &Locals) -> Result<String, PartialExprError> {
        match self {
            PartialExpr::Literal(text) => Ok(text.clone()),
            PartialExpr::Lookup(path) => {
                let dotted = path.join(".");
                let mut segments = path.iter();
                let mut current = segments
                    .next()
                    .and_then(|first| locals.get(first))
                    .ok_or_else(|| PartialExprError::Undefined(dotted.clone()))?;
                for segment in segments {
                    current = current
                        .get(segment.as_str())
                        .ok_or_else(|| PartialExprError::Undefined(dotted.clone()))?;
                }

                match current {
                    Value::String(text) => Ok(text.clone()),
                    Value::Number(number) => Ok(number.to_string()),
                    other => Err(PartialExprError::NotAString {
                        path: dotted,
                        kind: value_kind(other),
                    }),
                }
            }
            PartialExpr::Concat(terms) => {
                let mut joined = String::new();
                for term in terms {
                    joined.push_str(&term.evaluate(locals)?);
                }
                Ok(joined)
            }
        }
    }
}

/// Split on `+` outside quotes. `None` on an unterminated quote or empty term.
fn split_terms(text: &str) -> Option<Vec<String>> {
    let mut terms = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;

    for c in text.chars() {
        match quote {
            Some(q) => {
                current.push(c);
                if c == q {
                    quote = None;
                }
            }
            None if c == '\'' || c == '"' => {
                quote = Some(c);
                current.push(c);
            }
            None if c == '+' => terms.push(std::mem::take(&mut current)),
            None => current.push(c),
        }
    }

    if quote.is_some() {
        return None;
    }
    terms.push(current);

    let terms: Vec<String> = terms.into_iter().map(|t| t.trim().to_string()).collect();
    if terms.iter().any(String::is_empty) {
        return None;
    }
    Some(terms)
}

fn parse_term(term: &str) -> Option<PartialExpr> {
    let first = term.chars().next()?;
    if first == '\'' || first == '"' {
        let inner = term.strip_prefix(first)?.strip_suffix(first)?;
        if inner.contains(first) {
            return None;
        }
        return Some(PartialExpr::Literal(inner.to_string()));
    }

    let segments: Vec<String> = term.split('.').map(str::to_string).collect();
    if segments.iter().all(|segment| is_identifier(segment)) {
        Some(PartialExpr::Lookup(segments))
    } else {
        None
    }
}

fn is_identifier(segment: &str) -> bool {
    let mut chars = segment.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// A directive found in template source.
struct Directive {
    start: usize,
    end: usize,
    expr: String,
}

/// Expands partial directives against one configuration.
pub struct PartialExpander<'a> {
    config: &'a RenderConfig,
    pattern: &'a Regex,
}

impl<'a> PartialExpander<'a> {
    /// `pattern` is the matcher built by [`RenderConfig::partial_pattern`].
    pub fn new(config: &'a RenderConfig, pattern: &'a Regex) -> Self {
        Self {
            config,
            pattern,
        }
    }

    /// Expand every partial directive in the source of `view`.
    pub async fn expand(&self, view: &str, source: String, locals: &Locals) -> String {
        self.expand_with_chain(view, source, Vec::new(), locals).await
    }

    /// `chain` holds the partials currently being expanded, outermost first.
    fn expand_with_chain<'s>(
        &'s self,
        view: &'s str,
        source: String,
        chain: Vec<String>,
        locals: &'s Locals,
    ) -> BoxFuture<'s, String> {
        async move {
            let directives: Vec<Directive> = self
                .pattern
                .captures_iter(&source)
                .filter_map(|caps| {
                    let whole = caps.get(0)?;
                    Some(Directive {
                        start: whole.start(),
                        end: whole.end(),
                        expr: caps.get(1).map(|m| m.as_str().to_string()).unwrap_or_default(),
                    })
                })
                .collect();

            if directives.is_empty() {
                return source;
            }

            let mut output = String::with_capacity(source.len());
            let mut last = 0;
            for directive in directives {
                output.push_str(&source[last..directive.start]);
                last = directive.end;

                let Some(name) = self.partial_name(view, &directive.expr, &chain, locals) else {
                    continue;
                };

                let path = match self.config.view_path(&name) {
                    Ok(path) => path,
                    Err(e) => {
                        tracing::warn!("Skipping partial '{}' in view '{}': {}", name, view, e.source);
                        continue;
                    }
                };

                let text = match FileOps::read_with_context(
                    &path,
                    &self.config.root,
                    "partial include",
                    "partials",
                )
                .await
                {
                    Ok(text) => text,
                    Err(e) => {
                        tracing::warn!(
                            "Cannot read partial '{}' ({}) in view '{}': {}",
                            name,
                            path.display(),
                            view,
                            e.source
                        );
                        continue;
                    }
                };

                tracing::debug!("Expanding partial '{}' at depth {} in view '{}'", name, chain.len() + 1, view);
                let mut nested = chain.clone();
                nested.push(name);
                output.push_str(&self.expand_with_chain(view, text, nested, locals).await);
            }
            output.push_str(&source[last..]);
            output
        }
        .boxed()
    }

    /// Resolve a directive's expression to a normalized view name, or `None`
    /// when the directive should expand to nothing.
    fn partial_name(&self, view: &str, expr: &str, chain: &[String], locals: &Locals) -> Option<String> {
        let name = match PartialExpr::parse(expr).and_then(|parsed| parsed.evaluate(locals)) {
            Ok(name) => self.config.view_file(&name),
            Err(e) => {
                tracing::warn!("Skipping partial in view '{}': {}", view, e);
                return None;
            }
        };

        if chain.iter().any(|ancestor| ancestor == &name) {
            tracing::debug!("Partial '{}' is already being expanded in view '{}'", name, view);
            return None;
        }

        if chain.len() >= MAX_PARTIAL_DEPTH {
            tracing::warn!(
                "Skipping partial '{}' in view '{}': nesting exceeds {} levels",
                name,
                view,
                MAX_PARTIAL_DEPTH
            );
            return None;
        }

        Some(name)
    }
}
