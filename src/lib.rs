//! viewpress - view rendering for HTTP responses
//!
//! Renders named view templates into HTTP responses: static partial includes
//! are expanded, the view is compiled (and cached), executed against per-request
//! locals, optionally wrapped in a layout and emitted with `Content-Type` and
//! `Content-Length` headers.
//!
//! # Architecture Overview
//!
//! A render runs through these stages:
//!
//! 1. **Locals** - caller options merged with configured helpers, the inbound
//!    request and reserved filter names ([`templating::locals`])
//! 2. **Partial expansion** - `<%- partial('nav.html') %>` directives replaced
//!    by file contents, with a cycle guard ([`templating::partials`])
//! 3. **Compile/cache** - delimiter syntax translated to Tera and compiled once
//!    per view when caching is on ([`templating::renderer`], [`templating::cache`])
//! 4. **Layout composition** - the view output injected into its layout as
//!    `body` ([`render`])
//! 5. **Emission** - UTF-8 body with exact headers ([`render::response`])
//!
//! # Core Modules
//!
//! - [`config`] - [`RenderConfig`](config::RenderConfig) and its TOML form
//! - [`core`] - error types and file-operation context
//! - [`templating`] - syntax translation, partials, compilation and locals
//! - [`render`] - [`RenderService`](render::RenderService), the per-request entry point
//! - [`cli`] - the `viewpress` command-line interface
//!
//! # View Files
//!
//! ```text
//! <%# views/index.html %>
//! <%- partial('header.html') %>
//! <h1>Hi <%= name %></h1>
//! <% for post in posts %><li><%= post.title | upper %></li><% endfor %>
//! ```
//!
//! ```text
//! <%# views/layout.html %>
//! <html><body><%- body %></body></html>
//! ```
//!
//! # Configuration (viewpress.toml)
//!
//! ```toml
//! root = "views"
//! cache = true
//! layout = "layout.html"
//! view_ext = ""
//! open = "<%"
//! close = "%>"
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod render;
pub mod templating;

// test_utils module is available for both unit tests and integration tests
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
