//! Core types shared across the render pipeline: the error taxonomy and the
//! file-operation context attached to view read failures.

pub mod error;
pub mod file_error;

pub use error::{ErrorContext, RenderError, user_friendly_error};
pub use file_error::{FileOperation, FileOperationContext, FileOperationError, FileOps, FileResultExt};
