//! Error handling for viewpress
//!
//! The library reports every fatal render failure through a single
//! [`RenderError`] value, returned from the render entry points exactly once.
//! Recoverable partial failures never surface here; they are logged and the
//! partial contributes nothing to the page.
//!
//! # Error Categories
//!
//! - [`RenderError::ViewRead`] - a view or layout file cannot be read, or its
//!   name does not resolve to a path inside the view root
//! - [`RenderError::Compile`] - delimiter translation or Tera parsing failed
//! - [`RenderError::Execution`] - the compiled template failed while producing
//!   output (undefined variable, failing filter or helper, panic in user code)
//! - [`RenderError::Response`] - the HTTP response could not be assembled
//! - [`RenderError::Config`] - the configuration is unusable
//!
//! For command-line display, [`user_friendly_error`] turns any error into an
//! [`ErrorContext`] with details and a suggestion.

use colored::Colorize;
use std::fmt;
use thiserror::Error;

use super::file_error::FileOperationError;

/// The main error type for render operations
#[derive(Error, Debug)]
pub enum RenderError {
    /// A view or layout file could not be read
    #[error("Cannot read view '{view}'")]
    ViewRead {
        view: String,
        #[source]
        source: Box<FileOperationError>,
    },

    /// The expanded template source was rejected before execution
    #[error("Failed to compile view '{view}': {message}")]
    Compile {
        view: String,
        message: String,
        line: Option<usize>,
    },

    /// The compiled template failed while producing output
    #[error("Failed to render view '{view}': {message}")]
    Execution {
        view: String,
        message: String,
        suggestions: Vec<String>,
    },

    /// Assembling the HTTP response failed
    #[error("Failed to build response: {0}")]
    Response(#[from] http::Error),

    /// The render configuration is invalid
    #[error("Invalid render configuration: {message}")]
    Config {
        message: String,
    },
}

impl RenderError {
    /// Build a [`RenderError::Config`] from any message.
    pub fn config(message: impl Into<String>) -> Self {
        RenderError::Config {
            message: message.into(),
        }
    }

    /// The view the error belongs to, if any.
    pub fn view(&self) -> Option<&str> {
        match self {
            RenderError::ViewRead {
                view,
                ..
            }
            | RenderError::Compile {
                view,
                ..
            }
            | RenderError::Execution {
                view,
                ..
            } => Some(view),
            RenderError::Response(_) | RenderError::Config {
                ..
            } => None,
        }
    }

    /// Generate a multi-line report with context and suggestions
    pub fn format_with_context(&self) -> String {
        match self {
            RenderError::ViewRead {
                view,
                source,
            } => {
                let mut msg = String::new();
                msg.push_str("ERROR: View Not Readable\n\n");
                msg.push_str(&format!("View: {}\n", view));
                msg.push_str(&source.user_message());
                msg.push('\n');
                msg
            }
            RenderError::Compile {
                view,
                message,
                line,
            } => {
                let mut msg = String::new();
                msg.push_str("ERROR: Template Syntax Error\n\n");
                msg.push_str(&format!("View: {}\n", view));
                if let Some(line) = line {
                    msg.push_str(&format!("Line: {}\n", line));
                }
                msg.push_str(&format!("Error: {}\n", message));
                msg.push_str("\nSUGGESTION: Check template syntax for unclosed tags or invalid expressions.\n");
                msg.push_str("Common issues:\n");
                msg.push_str("  - A code region opened without its closing delimiter\n");
                msg.push_str("  - A block statement (for/if) without its end statement\n");
                msg.push_str("  - Missing quotes around string values\n");
                msg
            }
            RenderError::Execution {
                view,
                message,
                suggestions,
            } => {
                let mut msg = String::new();
                msg.push_str("ERROR: Template Execution Failed\n\n");
                msg.push_str(&format!("View: {}\n", view));
                msg.push_str(&format!("Error: {}\n", message));
                if !suggestions.is_empty() {
                    msg.push_str("\nDid you mean one of these?\n");
                    for suggestion in suggestions {
                        msg.push_str(&format!("  - {}\n", suggestion));
                    }
                }
                msg
            }
            RenderError::Response(err) => {
                format!("ERROR: Response Assembly Failed\n\nError: {}\n", err)
            }
            RenderError::Config {
                message,
            } => format!("ERROR: Invalid Configuration\n\nError: {}\n", message),
        }
    }
}

/// Error wrapper with user-facing details and a suggestion
#[derive(Debug)]
pub struct ErrorContext {
    /// The error message
    pub error: String,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a new error context from a message
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion for resolving the error
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add additional details explaining the error
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Display the error context to stderr with terminal colors
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error into a user-friendly [`ErrorContext`]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    if let Some(render_error) = error.downcast_ref::<RenderError>() {
        let context = ErrorContext::new(render_error.to_string())
            .with_details(render_error.format_with_context().trim_end().to_string());
        return match render_error {
            RenderError::ViewRead {
                ..
            } => context.with_suggestion("Check --root and --ext, or the view name passed to render"),
            RenderError::Compile {
                ..
            } => context.with_suggestion("Fix the template source; every code region needs a closing delimiter"),
            RenderError::Execution {
                ..
            } => context.with_suggestion("Pass the missing values with --locals '{\"name\": ...}'"),
            RenderError::Config {
                ..
            } => context.with_suggestion("Check the configuration file and the open/close delimiters"),
            RenderError::Response(_) => context,
        };
    }

    let mut context = ErrorContext::new(error.to_string());
    if let Some(cause) = error.chain().nth(1) {
        context = context.with_details(cause.to_string());
    }
    context
}
