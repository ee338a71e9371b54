//! Test utilities for viewpress
//!
//! Helpers shared by unit tests and the integration test target (through the
//! `test-utils` feature): once-only logging setup and a temporary view tree.
//!
//! # Example
//!
//! ```rust,no_run
//! use viewpress::render::RenderService;
//! use viewpress::test_utils::ViewFixture;
//!
//! let fixture = ViewFixture::new().unwrap();
//! fixture.write("index.html", "Hi <%= name %>").unwrap();
//! let service = RenderService::new(fixture.config_without_layout()).unwrap();
//! ```

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Once;
use tempfile::TempDir;
use tracing::Level;
use tracing_subscriber::EnvFilter;

use crate::config::RenderConfig;

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Respects `RUST_LOG` when set, otherwise uses `level`. Without either,
/// logging stays off. Safe to call from every test.
///
/// ```bash
/// RUST_LOG=viewpress=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .with_ansi(true)
            .try_init();
    });
}

/// A view root in a temporary directory.
///
/// The directory layout is `<temp>/views/...` with configuration files written
/// next to `views/`. Everything is removed when the fixture is dropped.
pub struct ViewFixture {
    pub temp_dir: TempDir,
    pub root: PathBuf,
}

impl ViewFixture {
    /// Create an empty view root
    pub fn new() -> Result<Self> {
        init_test_logging(None);

        let temp_dir = TempDir::new()?;
        let root = temp_dir.path().join("views");
        fs::create_dir_all(&root)?;

        Ok(Self {
            temp_dir,
            root,
        })
    }

    /// Directory containing `views/`
    pub fn base_dir(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Write a view file, creating parent directories as needed
    pub fn write(&self, name: &str, content: &str) -> Result<PathBuf> {
        let path = self.root.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
        fs::write(&path, content).with_context(|| format!("Failed to write view {}", path.display()))?;
        Ok(path)
    }

    /// Delete a view file
    pub fn remove(&self, name: &str) -> Result<()> {
        let path = self.root.join(name);
        fs::remove_file(&path).with_context(|| format!("Failed to remove view {}", path.display()))
    }

    /// Write a configuration file next to the view root
    pub fn write_config(&self, file_name: &str, content: &str) -> Result<PathBuf> {
        let path = self.base_dir().join(file_name);
        fs::write(&path, content).with_context(|| format!("Failed to write config {}", path.display()))?;
        Ok(path)
    }

    /// Default configuration rooted at this fixture
    pub fn config(&self) -> RenderConfig {
        RenderConfig {
            root: self.root.clone(),
            ..RenderConfig::default()
        }
    }

    /// Configuration rooted at this fixture with layouts disabled
    pub fn config_without_layout(&self) -> RenderConfig {
        RenderConfig {
            layout: None,
            ..self.config()
        }
    }
}
