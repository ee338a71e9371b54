//! Render a view from the command line.
//!
//! Builds a [`RenderConfig`] from an optional TOML file plus flag overrides,
//! renders the view for a synthetic `GET /` request and writes the response
//! body to stdout.

use anyhow::{Context, Result};
use clap::Args;
use http::header::CONTENT_TYPE;
use http::{Request, Response};
use std::io::Write;
use std::path::PathBuf;

use crate::config::RenderConfig;
use crate::render::RenderService;
use crate::templating::RenderOptions;

/// Command to render a view.
#[derive(Args, Debug)]
pub struct RenderCommand {
    /// View name relative to the view root (e.g. `index.html` or `posts/show`)
    pub view: String,

    /// View root directory (overrides the configuration file)
    #[arg(long, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// TOML configuration file
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Render options as a JSON object, e.g. '{"name": "Ann", "layout": false}'
    #[arg(long, value_name = "JSON")]
    pub locals: Option<String>,

    /// Wrap the view in this layout instead of the configured one
    #[arg(long, value_name = "NAME", conflicts_with = "no_layout")]
    pub layout: Option<String>,

    /// Render the view without a layout
    #[arg(long)]
    pub no_layout: bool,

    /// Extension appended to view names (e.g. `.html`)
    #[arg(long, value_name = "EXT")]
    pub ext: Option<String>,

    /// Disable the compiled-template cache
    #[arg(long)]
    pub no_cache: bool,

    /// Content type declared before rendering; a charset is added or replaced
    #[arg(long, value_name = "TYPE")]
    pub content_type: Option<String>,

    /// Print the status line and response headers before the body
    #[arg(long)]
    pub headers: bool,
}

impl RenderCommand {
    /// Render the view and write the response to stdout.
    pub async fn execute(self) -> Result<()> {
        let mut stdout = std::io::stdout().lock();
        self.execute_with_writer(&mut stdout).await
    }

    /// Render the view and write the response to `out`.
    pub async fn execute_with_writer(self, out: &mut impl Write) -> Result<()> {
        let config = self.build_config().await?;
        let options = self.build_options()?;
        tracing::debug!("Rendering '{}' from {}", self.view, config.root.display());

        let service = RenderService::new(config)?;
        let (request, ()) = Request::get("/").body(())?.into_parts();

        let mut builder = Response::builder();
        if let Some(content_type) = &self.content_type {
            builder = builder.header(CONTENT_TYPE, content_type.as_str());
        }

        let response = service.render(&request, builder, &self.view, options).await?;

        if self.headers {
            writeln!(out, "{:?} {}", response.version(), response.status())?;
            for (name, value) in response.headers() {
                writeln!(out, "{}: {}", name, String::from_utf8_lossy(value.as_bytes()))?;
            }
            writeln!(out)?;
        }
        out.write_all(response.body())?;
        out.flush()?;
        Ok(())
    }

    /// Configuration file (or defaults) with flag overrides applied.
    async fn build_config(&self) -> Result<RenderConfig> {
        let mut config = match &self.config {
            Some(path) => RenderConfig::load(path).await?,
            None => RenderConfig::default(),
        };

        if let Some(root) = &self.root {
            config.root = root.clone();
        }
        if let Some(ext) = &self.ext {
            config.view_ext = ext.clone();
        }
        if self.no_cache {
            config.cache = false;
        }
        Ok(config)
    }

    /// Options from `--locals` with the layout flags applied on top.
    fn build_options(&self) -> Result<RenderOptions> {
        let mut options = match &self.locals {
            Some(text) => {
                let value = serde_json::from_str(text).context("--locals must be a JSON object")?;
                RenderOptions::from_json(value)?
            }
            None => RenderOptions::new(),
        };

        if let Some(layout) = &self.layout {
            options = options.layout(layout.clone());
        } else if self.no_layout {
            options = options.without_layout();
        }
        Ok(options)
    }
}
