//! The render service.
//!
//! [`RenderService`] is the per-request entry point. One render runs through
//! these states:
//!
//! ```text
//! RenderingView -> DecidingLayout -> RenderingLayout -> Emitting
//!       |                                  |
//!       +------------> Failed <------------+
//! ```
//!
//! A failure in either render state is returned to the caller and the response
//! builder is dropped untouched. Emission happens at most once, after the last
//! successful render.
//!
//! # Examples
//!
//! ```rust,no_run
//! use viewpress::config::RenderConfig;
//! use viewpress::render::RenderService;
//! use viewpress::templating::RenderOptions;
//!
//! # async fn example() -> Result<(), viewpress::core::RenderError> {
//! let service = RenderService::builder(RenderConfig::default())
//!     .helper_value("sitename", "My Blog".into())
//!     .build()?;
//!
//! let (request, _) = http::Request::get("/").body(())?.into_parts();
//! let response = service
//!     .render(
//!         &request,
//!         http::Response::builder(),
//!         "index.html",
//!         RenderOptions::new().local("name", "Ann"),
//!     )
//!     .await?;
//! assert!(response.headers().contains_key(http::header::CONTENT_LENGTH));
//! # Ok(())
//! # }
//! ```

pub mod response;

use http::Response;
use http::request::Parts;
use regex::Regex;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::config::RenderConfig;
use crate::core::{FileOps, RenderError};
use crate::templating::{
    BODY_KEY, CacheStats, CompiledTemplate, FilterRegistry, Helper, LayoutChoice, Locals,
    PartialExpander, RenderOptions, TemplateCache, assemble_locals, execute,
};

pub use response::{content_type_with_charset, emit};

/// Renders views into HTTP responses.
///
/// Built once from a [`RenderConfig`] plus filters and helpers, then shared
/// (typically behind an [`Arc`]) by every request handler.
pub struct RenderService {
    config: RenderConfig,
    partial_pattern: Regex,
    filters: FilterRegistry,
    helpers: BTreeMap<String, Helper>,
    cache: TemplateCache,
}

/// Collects filters and helpers for a [`RenderService`].
pub struct RenderServiceBuilder {
    config: RenderConfig,
    filters: FilterRegistry,
    helpers: BTreeMap<String, Helper>,
}

impl RenderServiceBuilder {
    pub fn new(config: RenderConfig) -> Self {
        Self {
            config,
            filters: FilterRegistry::new(),
            helpers: BTreeMap::new(),
        }
    }

    /// Register a filter, usable as `x | name` and as `name(value=x)`.
    ///
    /// Its name is reserved: a local with the same name is dropped.
    pub fn filter<F>(mut self, name: impl Into<String>, filter: F) -> Self
    where
        F: Fn(&Value, &HashMap<String, Value>) -> tera::Result<Value> + Send + Sync + 'static,
    {
        self.filters.insert(name, Arc::new(filter));
        self
    }

    /// Register a fixed helper value, used when the caller supplies none.
    pub fn helper_value(mut self, name: impl Into<String>, value: Value) -> Self {
        self.helpers.insert(name.into(), Helper::Value(value));
        self
    }

    /// Register a helper computed from each request, used when the caller supplies none.
    pub fn helper_fn<F>(mut self, name: impl Into<String>, helper: F) -> Self
    where
        F: Fn(&Parts) -> Value + Send + Sync + 'static,
    {
        self.helpers.insert(name.into(), Helper::Factory(Arc::new(helper)));
        self
    }

    /// Validate the configuration and build the service.
    ///
    /// Helpers named like a filter are dropped, since the filter always
    /// shadows them.
    pub fn build(self) -> Result<RenderService, RenderError> {
        let partial_pattern = self.config.partial_pattern()?;

        let filters = self.filters;
        let mut helpers = self.helpers;
        helpers.retain(|name, _| {
            let shadowed = filters.contains(name);
            if shadowed {
                tracing::warn!("Helper '{}' is shadowed by the filter of the same name and is ignored", name);
            }
            !shadowed
        });

        tracing::debug!(
            "Render service ready (root={}, cache={}, layout={:?}, filters={:?}, helpers={})",
            self.config.root.display(),
            self.config.cache,
            self.config.layout,
            filters,
            helpers.len()
        );

        Ok(RenderService {
            config: self.config,
            partial_pattern,
            filters,
            helpers,
            cache: TemplateCache::new(),
        })
    }
}

impl RenderService {
    /// Start building a service for this configuration.
    pub fn builder(config: RenderConfig) -> RenderServiceBuilder {
        RenderServiceBuilder::new(config)
    }

    /// Build a service without filters or helpers.
    pub fn new(config: RenderConfig) -> Result<Self, RenderError> {
        Self::builder(config).build()
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Render a view (and its layout) into a completed response.
    ///
    /// On failure the builder is dropped and no response exists.
    pub async fn render(
        &self,
        request: &Parts,
        response: http::response::Builder,
        view: &str,
        options: RenderOptions,
    ) -> Result<Response<Vec<u8>>, RenderError> {
        let text = self.render_to_string(request, view, options).await?;
        emit(response, text)
    }

    /// Render a view (and its layout) into page text.
    pub async fn render_to_string(
        &self,
        request: &Parts,
        view: &str,
        options: RenderOptions,
    ) -> Result<String, RenderError> {
        let RenderOptions {
            layout,
            locals,
        } = options;
        let name = self.config.view_file(view);
        let mut locals = assemble_locals(&name, locals, &self.filters, &self.helpers, request)?;

        let template = self.resolve(view, &locals).await?;
        let body = execute(&template, &locals)?;

        let layout = match layout {
            LayoutChoice::Default => self.config.layout.clone(),
            LayoutChoice::Disabled => None,
            LayoutChoice::Named(name) => Some(name),
        };
        let Some(layout) = layout else {
            tracing::debug!("Rendered '{}' without layout", template.name());
            return Ok(body);
        };

        tracing::debug!("Wrapping '{}' in layout '{}'", template.name(), layout);
        locals.insert(BODY_KEY.to_string(), Value::String(body));
        let layout_template = self.resolve(&layout, &locals).await?;
        execute(&layout_template, &locals)
    }

    /// Get the compiled template for a view, compiling it on a cache miss.
    ///
    /// `locals` feed partial expressions during expansion. With caching on,
    /// the first compile's expansion is kept for later renders.
    ///
    /// # Errors
    ///
    /// - [`RenderError::ViewRead`] when the name is not a path under the view
    ///   root or the file cannot be read
    /// - [`RenderError::Compile`] when the expanded source does not compile
    pub async fn resolve(&self, view: &str, locals: &Locals) -> Result<Arc<CompiledTemplate>, RenderError> {
        let name = self.config.view_file(view);

        if self.config.cache {
            if let Some(template) = self.cache.get(&name) {
                tracing::debug!("Template cache hit for '{}'", name);
                return Ok(template);
            }
            tracing::debug!("Template cache miss for '{}'", name);
        }

        let path = self.config.view_path(&name).map_err(|e| RenderError::ViewRead {
            view: name.clone(),
            source: Box::new(e),
        })?;
        let source = FileOps::read_with_context(&path, &self.config.root, "view rendering", "render service")
            .await
            .map_err(|e| RenderError::ViewRead {
                view: name.clone(),
                source: Box::new(e),
            })?;

        let expanded = PartialExpander::new(&self.config, &self.partial_pattern)
            .expand(&name, source, locals)
            .await;
        let compiled = Arc::new(CompiledTemplate::compile(&name, &expanded, &self.config, &self.filters)?);

        if self.config.cache {
            self.cache.insert(name, Arc::clone(&compiled));
        }
        Ok(compiled)
    }

    /// Drop every cached template so the next render re-reads view files.
    pub fn clear_cache(&self) {
        tracing::debug!("Clearing {} cached templates", self.cache.len());
        self.cache.clear();
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }
}
