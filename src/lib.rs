//! Documentation index and substring search for markdown doc sites.
//!
//! Sources are discovered, their front matter extracted and bodies rendered,
//! then assembled into a navigable tree. [`DocIndex`] builds that tree
//! lazily, once, no matter how many callers ask for it at the same time, and
//! answers [`DocIndex::documents`] and [`DocIndex::search`] from it.
//!
//! ```no_run
//! # async fn demo() -> Result<(), quire::QuireError> {
//! use std::time::Duration;
//!
//! use quire::sources::markdown::MarkdownFolderSource;
//! use quire::{DocIndex, MarkdownRenderer, SourceLoader, TreeOptions};
//!
//! let source = MarkdownFolderSource::new("docs", vec![".md".into()]);
//! let loader = SourceLoader::new(
//!     Box::new(source),
//!     Box::new(MarkdownRenderer),
//!     TreeOptions::default(),
//! );
//! let index = DocIndex::new(loader, Duration::from_secs(30));
//!
//! for section in index.search("mongo").await? {
//!     println!("{}", section.title);
//! }
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod classify;
pub mod config;
pub mod error;
pub mod frontmatter;
pub mod indexer;
pub mod render;
pub mod search;
pub mod sources;
pub mod tree;

pub use cache::{DocIndex, Documents, IndexLoader, IndexState};
pub use error::QuireError;
pub use indexer::{DocumentFailure, IndexSnapshot, SourceLoader};
pub use render::{ContentRenderer, MarkdownRenderer};
pub use tree::{DocumentNode, TreeOptions};
