//! Render configuration.
//!
//! [`RenderConfig`] holds every setting the pipeline reads on each render: the
//! view root, the cache policy, the default layout, the view extension and the
//! code-region delimiters. It is built once (from code or a TOML document),
//! moved into a [`RenderService`](crate::render::RenderService) and never
//! mutated afterwards.
//!
//! # File Format
//!
//! ```toml
//! root = "views"
//! cache = true            # keep compiled views for the process lifetime
//! layout = "layout.html"  # or `false` / "" for no layout
//! view_ext = ".html"      # appended to view names (`viewExt` also accepted)
//! open = "<%"
//! close = "%>"
//! ```
//!
//! Unrecognized keys are kept in [`RenderConfig::extra`] and otherwise ignored.
//!
//! # Caching precondition
//!
//! With `cache = true` view files must not change while the process runs: a
//! compiled view is never re-read. Use
//! [`RenderService::clear_cache`](crate::render::RenderService::clear_cache)
//! to pick up edits during development.

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

use crate::core::{FileOperation, FileOperationContext, FileOperationError, RenderError};

/// Default directory holding view files.
pub const DEFAULT_ROOT: &str = "views";

/// Default layout view wrapped around every render.
pub const DEFAULT_LAYOUT: &str = "layout.html";

/// Default code-region opening delimiter.
pub const DEFAULT_OPEN: &str = "<%";

/// Default code-region closing delimiter.
pub const DEFAULT_CLOSE: &str = "%>";

/// Settings for the render pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Directory views, layouts and partials are resolved against.
    pub root: PathBuf,

    /// Keep compiled views for the process lifetime.
    pub cache: bool,

    /// Default layout view, `None` when layouts are disabled.
    #[serde(serialize_with = "serialize_layout", deserialize_with = "deserialize_layout")]
    pub layout: Option<String>,

    /// Extension appended to view names, possibly empty.
    #[serde(alias = "viewExt")]
    pub view_ext: String,

    /// Opening delimiter of template code regions.
    pub open: String,

    /// Closing delimiter of template code regions.
    pub close: String,

    /// Keys the pipeline does not recognize.
    #[serde(flatten)]
    pub extra: BTreeMap<String, toml::Value>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from(DEFAULT_ROOT),
            cache: true,
            layout: Some(DEFAULT_LAYOUT.to_string()),
            view_ext: String::new(),
            open: DEFAULT_OPEN.to_string(),
            close: DEFAULT_CLOSE.to_string(),
            extra: BTreeMap::new(),
        }
    }
}

/// `layout` accepts a view name or a boolean in configuration files.
#[derive(Deserialize)]
#[serde(untagged)]
enum LayoutSetting {
    Name(String),
    Enabled(bool),
}

fn deserialize_layout<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match LayoutSetting::deserialize(deserializer)? {
        LayoutSetting::Name(name) if name.is_empty() => None,
        LayoutSetting::Name(name) => Some(name),
        LayoutSetting::Enabled(true) => Some(DEFAULT_LAYOUT.to_string()),
        LayoutSetting::Enabled(false) => None,
    })
}

fn serialize_layout<S>(layout: &Option<String>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match layout {
        Some(name) => serializer.serialize_str(name),
        None => serializer.serialize_bool(false),
    }
}

impl RenderConfig {
    /// Parse a configuration from TOML text.
    ///
    /// Missing keys take their defaults.
    pub fn from_toml_str(content: &str) -> Result<Self, RenderError> {
        toml::from_str(content)
            .map_err(|e| RenderError::config(format!("invalid configuration TOML: {}", e)))
    }

    /// Load a configuration file.
    ///
    /// Relative `root` values are resolved against the directory holding the
    /// configuration file.
    pub async fn load(path: &Path) -> Result<Self, RenderError> {
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            RenderError::config(format!("cannot read configuration {}: {}", path.display(), e))
        })?;

        let mut config = Self::from_toml_str(&content)?;
        if config.root.is_relative() {
            if let Some(parent) = path.parent() {
                config.root = parent.join(&config.root);
            }
        }

        tracing::debug!(
            "Loaded render configuration from {} (root={}, cache={}, layout={:?})",
            path.display(),
            config.root.display(),
            config.cache,
            config.layout
        );
        Ok(config)
    }

    /// Normalize a view name by appending the configured extension.
    ///
    /// Names that already end with the extension are left unchanged, so the
    /// operation is idempotent.
    pub fn view_file(&self, view: &str) -> String {
        if self.view_ext.is_empty() || view.ends_with(&self.view_ext) {
            view.to_string()
        } else {
            format!("{}{}", view, self.view_ext)
        }
    }

    /// Resolve a normalized view name to a path under the view root.
    ///
    /// Rejects empty names, absolute paths and `..` components that climb
    /// above the root. The file itself is not touched.
    pub fn view_path(&self, view_file: &str) -> Result<PathBuf, FileOperationError> {
        let path = Path::new(view_file);
        let invalid = |reason: String| {
            let context =
                FileOperationContext::new(FileOperation::Validate, path, "view lookup", "config")
                    .with_related_path(&self.root);
            FileOperationError::new(
                context,
                std::io::Error::new(std::io::ErrorKind::InvalidInput, reason),
            )
        };

        if view_file.trim().is_empty() {
            return Err(invalid("view name is empty".to_string()));
        }

        if path.is_absolute() {
            return Err(invalid(format!(
                "absolute view path '{}' is not allowed; names are relative to the view root",
                view_file
            )));
        }

        let mut depth: i32 = 0;
        for component in path.components() {
            match component {
                Component::Normal(_) => depth += 1,
                Component::ParentDir => {
                    depth -= 1;
                    if depth < 0 {
                        return Err(invalid(format!(
                            "view path '{}' escapes the view root",
                            view_file
                        )));
                    }
                }
                Component::CurDir => {}
                _ => {
                    return Err(invalid(format!(
                        "invalid path component in '{}'; only relative paths are allowed",
                        view_file
                    )));
                }
            }
        }

        Ok(self.root.join(path))
    }

    /// Build the matcher for partial-include directives.
    ///
    /// Matches `<open>` followed by `-` or `=`, optional whitespace,
    /// `partial(<expr>)`, optional whitespace and `<close>`. The expression is
    /// captured as group 1. A trim marker (`-<close>`) also consumes one
    /// following newline, as it does for every other tag.
    pub fn partial_pattern(&self) -> Result<Regex, RenderError> {
        self.validate()?;
        let close = regex::escape(&self.close);
        let pattern = format!(
            r"{}[-=]\s*partial\((.+?)\)\s*(?:-{}(?:\r?\n)?|{})",
            regex::escape(&self.open),
            close,
            close
        );
        Regex::new(&pattern)
            .map_err(|e| RenderError::config(format!("cannot build partial pattern: {}", e)))
    }

    /// Check the settings the pipeline cannot work without.
    pub fn validate(&self) -> Result<(), RenderError> {
        if self.open.is_empty() {
            return Err(RenderError::config("open delimiter must not be empty"));
        }
        if self.close.is_empty() {
            return Err(RenderError::config("close delimiter must not be empty"));
        }
        if self.open == self.close {
            return Err(RenderError::config(format!(
                "open and close delimiters must differ (both are '{}')",
                self.open
            )));
        }
        Ok(())
    }
}
