//! Content source abstraction.
//!
//! A source enumerates documentation files and hands back their raw text.
//! Sources are eager: everything is listed and read in one pass.

pub mod markdown;

use crate::error::QuireError;

/// Raw documentation file as found by a source.
#[derive(Debug, Clone)]
pub struct RawDocument {
    /// Normalized path: relative to the source root, `/`-separated,
    /// extension stripped.
    pub path: String,
    /// Outcome of reading the file. A read failure only affects this
    /// document, not the whole discovery pass.
    pub raw: Result<String, String>,
}

/// Interface for documentation sources.
pub trait ContentSource: Send + Sync {
    /// Human-readable name for this source.
    fn name(&self) -> &str;

    /// Enumerate and read every document.
    ///
    /// An `Err` means the source as a whole is unusable (missing root,
    /// bad pattern) and the index cannot be built.
    fn discover(&self) -> Result<Vec<RawDocument>, QuireError>;
}
