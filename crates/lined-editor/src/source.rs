//! Document sources — where loaded text comes from.
//!
//! A [`DocumentSource`] produces the full text to load, asynchronously. The
//! editor is single-threaded, so sources are `?Send`: a read may suspend on
//! I/O, but it is always awaited on the UI thread.
//!
//! Two sources ship with the crate:
//!
//! - [`FileSource`] reads a file chosen by the user (or reports that none
//!   was chosen)
//! - [`StaticSource`] serves a fixed string

use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;

/// Why a source could not produce text.
#[derive(Error, Debug)]
pub enum SourceError {
    /// `load_data` was called with no source bound.
    #[error("no document source bound")]
    NotBound,

    /// The source has nothing selected to read.
    #[error("no file selected")]
    NoFileSelected,

    /// Reading the file failed.
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid UTF-8.
    #[error("{}: not valid UTF-8", path.display())]
    InvalidUtf8 { path: PathBuf },
}

/// Supplies the full text of a document on request.
#[async_trait(?Send)]
pub trait DocumentSource {
    /// Read the whole document.
    async fn read_data(&self) -> Result<String, SourceError>;

    /// Short human-readable name for status lines and logs.
    fn name(&self) -> String;
}

// ---------------------------------------------------------------------------
// FileSource
// ---------------------------------------------------------------------------

/// Reads a file from disk. Constructed without a path, it behaves like a
/// file picker with nothing chosen.
#[derive(Debug, Clone, Default)]
pub struct FileSource {
    path: Option<PathBuf>,
}

impl FileSource {
    #[must_use]
    pub const fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }
}

#[async_trait(?Send)]
impl DocumentSource for FileSource {
    async fn read_data(&self) -> Result<String, SourceError> {
        let path = self.path.as_ref().ok_or(SourceError::NoFileSelected)?;
        let bytes = std::fs::read(path).map_err(|source| SourceError::Io {
            path: path.clone(),
            source,
        })?;
        String::from_utf8(bytes).map_err(|_| SourceError::InvalidUtf8 { path: path.clone() })
    }

    fn name(&self) -> String {
        self.path
            .as_ref()
            .map_or_else(|| "[No Name]".to_string(), |p| p.display().to_string())
    }
}

// ---------------------------------------------------------------------------
// StaticSource
// ---------------------------------------------------------------------------

/// Serves a fixed string. Handy for scratch content and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    text: String,
}

impl StaticSource {
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

#[async_trait(?Send)]
impl DocumentSource for StaticSource {
    async fn read_data(&self) -> Result<String, SourceError> {
        Ok(self.text.clone())
    }

    fn name(&self) -> String {
        "[Scratch]".to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
