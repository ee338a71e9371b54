//! View templating built on Tera.
//!
//! View files are plain text with code regions marked by a configurable
//! delimiter pair (`<%` / `%>` by default). Compiling a view runs three steps:
//!
//! 1. [`partials`] replaces every `<%- partial(expr) %>` directive with the
//!    referenced file's text, recursively
//! 2. [`syntax`] rewrites the delimiter regions into Tera syntax
//! 3. [`renderer`] compiles the result into a [`CompiledTemplate`] with every
//!    configured filter registered
//!
//! Executing a compiled template against a [`Locals`] map produces the page
//! text. [`cache`] keeps compiled templates per view name.
//!
//! # Template Syntax
//!
//! ```text
//! <h1><%= title %></h1>                    escaped output
//! <%- body %>                              unescaped output
//! <% for post in posts %>...<% endfor %>   Tera statements
//! <%# not rendered %>                      comment
//! <%- partial('nav.html') %>               static include
//! <%= title | shout %>                     configured filter
//! ```
//!
//! Expressions and statements use Tera's expression language, including its
//! built-in filters. Tera's own `{% include %}` and `{% extends %}` are not
//! available since each compiled template stands alone; use partials and
//! layouts instead.

pub mod cache;
pub mod filters;
pub mod locals;
pub mod partials;
pub mod renderer;
pub mod syntax;

pub use cache::{CacheStats, TemplateCache};
pub use filters::{FilterFn, FilterRegistry};
pub use locals::{
    BODY_KEY, Helper, HelperFn, LayoutChoice, Locals, REQUEST_KEY, RenderOptions, assemble_locals,
    request_snapshot,
};
pub use partials::{MAX_PARTIAL_DEPTH, PartialExpander, PartialExpr, PartialExprError};
pub use renderer::{CompiledTemplate, execute};
