//! Index building: discovery, front matter, rendering, tree assembly.
//!
//! A document that cannot be read or rendered is skipped and reported; only
//! a failure of discovery itself fails the build.

use chrono::{DateTime, Utc};
use tracing::{debug, debug_span, info, warn};

use crate::cache::IndexLoader;
use crate::error::QuireError;
use crate::frontmatter::extract;
use crate::render::ContentRenderer;
use crate::sources::ContentSource;
use crate::tree::{build, DocumentNode, SourceRecord, TreeOptions};

/// A document left out of the tree, and why.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentFailure {
    pub path: String,
    pub reason: String,
}

/// Immutable result of one index build.
#[derive(Debug, Clone)]
pub struct IndexSnapshot {
    pub roots: Vec<DocumentNode>,
    pub failures: Vec<DocumentFailure>,
    /// Documents with `publish: false`.
    pub drafts: usize,
    pub built_at: DateTime<Utc>,
}

impl IndexSnapshot {
    /// Total nodes in the tree, synthesized folders included.
    pub fn node_count(&self) -> usize {
        self.roots.iter().map(DocumentNode::subtree_len).sum()
    }
}

/// Run one full build over `source`.
pub fn build_index(
    source: &dyn ContentSource,
    renderer: &dyn ContentRenderer,
    options: &TreeOptions,
) -> Result<IndexSnapshot, QuireError> {
    let documents = source.discover()?;
    info!(
        "Indexing {} documents from {}",
        documents.len(),
        source.name()
    );

    let mut records = Vec::with_capacity(documents.len());
    let mut failures = Vec::new();
    let mut drafts = 0;

    for doc in documents {
        let span = debug_span!("document", path = %doc.path);
        let _enter = span.enter();

        let raw = match doc.raw {
            Ok(raw) => raw,
            Err(reason) => {
                warn!("Skipping {}: {reason}", doc.path);
                failures.push(DocumentFailure {
                    path: doc.path,
                    reason,
                });
                continue;
            }
        };

        let (metadata, body) = extract(&raw);
        if !metadata.is_published() {
            debug!("Skipping draft {}", doc.path);
            drafts += 1;
            continue;
        }

        match renderer.render(&body) {
            Ok(rendered_content) => records.push(SourceRecord {
                path: doc.path,
                metadata,
                rendered_content,
            }),
            Err(e) => {
                warn!("Skipping {}: {e}", doc.path);
                failures.push(DocumentFailure {
                    path: doc.path,
                    reason: e.to_string(),
                });
            }
        }
    }

    let indexed = records.len();
    let roots = build(records, options);
    let snapshot = IndexSnapshot {
        roots,
        failures,
        drafts,
        built_at: Utc::now(),
    };

    info!(
        "Indexed {indexed} documents into {} nodes ({} sections){}",
        snapshot.node_count(),
        snapshot.roots.len(),
        if snapshot.failures.is_empty() {
            String::new()
        } else {
            format!(", {} skipped with errors", snapshot.failures.len())
        }
    );

    Ok(snapshot)
}

/// Loader that builds from a content source with a renderer.
pub struct SourceLoader {
    source: Box<dyn ContentSource>,
    renderer: Box<dyn ContentRenderer>,
    options: TreeOptions,
}

impl SourceLoader {
    pub fn new(
        source: Box<dyn ContentSource>,
        renderer: Box<dyn ContentRenderer>,
        options: TreeOptions,
    ) -> Self {
        Self {
            source,
            renderer,
            options,
        }
    }
}

impl IndexLoader for SourceLoader {
    fn load(&self) -> Result<IndexSnapshot, QuireError> {
        build_index(self.source.as_ref(), self.renderer.as_ref(), &self.options)
    }
}
