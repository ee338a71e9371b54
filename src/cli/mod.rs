//! Command-line interface for viewpress.
//!
//! The binary renders views from a directory through the same pipeline a web
//! host uses, which makes it handy for checking templates, layouts and
//! partials without running a server.
//!
//! # Commands
//!
//! - `render` - Render a view (and its layout) to stdout
//!
//! # Global Options
//!
//! - `--verbose` - Enable debug logging on stderr
//! - `--quiet` - Only log errors
//!
//! `RUST_LOG` overrides both when set.
//!
//! # Examples
//!
//! ```bash
//! viewpress render index.html --root site/views --locals '{"name": "Ann"}'
//! viewpress render index --ext .ejs --no-layout
//! viewpress --verbose render posts/show.html --config viewpress.toml --headers
//! ```

pub mod render;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Main CLI structure for viewpress.
#[derive(Parser)]
#[command(
    name = "viewpress",
    about = "Render delimiter-marked view templates with partials and layouts",
    version,
    long_about = "viewpress renders view templates the way a web application does: partials are \
                  expanded, the view is compiled and cached, wrapped in its layout and emitted as \
                  an HTTP response body."
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a view to stdout.
    ///
    /// See [`render::RenderCommand`] for options.
    Render(render::RenderCommand),
}

impl Cli {
    /// Execute the parsed command.
    pub async fn execute(self) -> Result<()> {
        init_logging(self.log_directive());

        match self.command {
            Commands::Render(cmd) => cmd.execute().await,
        }
    }

    /// Default log directive when `RUST_LOG` is not set.
    fn log_directive(&self) -> &'static str {
        if self.verbose {
            "viewpress=debug"
        } else if self.quiet {
            "viewpress=error"
        } else {
            "viewpress=warn"
        }
    }
}

/// Install the stderr subscriber; later calls are ignored.
fn init_logging(default_directive: &str) {
    let _ = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init();
}
