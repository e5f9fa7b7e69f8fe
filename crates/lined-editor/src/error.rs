//! Error types for the editor core.
//!
//! Only loading can fail. Caret movement and click resolution absorb every
//! boundary condition as a clamp or a no-op, so they have no error channel.

use thiserror::Error;

use crate::source::SourceError;

/// Errors surfaced by [`DocumentController`](crate::controller::DocumentController).
#[derive(Error, Debug)]
pub enum EditorError {
    /// No source is bound, or the bound source could not produce text.
    /// The document and caret are left exactly as they were.
    #[error("document source unavailable: {0}")]
    SourceUnavailable(#[from] SourceError),
}

/// Result type for editor operations.
pub type Result<T> = std::result::Result<T, EditorError>;
