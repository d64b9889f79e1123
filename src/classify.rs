//! Path classification.
//!
//! Decides where a document lands in the tree purely from its normalized
//! path (`/`-separated, no extension).

/// Placement of a document in the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathClass {
    pub segments: Vec<String>,
    /// The document supplies metadata and content for its parent folder
    /// instead of becoming a child of it.
    pub is_section_landing: bool,
    /// Key of the node this document belongs under. `None` for roots.
    pub parent_key: Option<String>,
}

impl PathClass {
    /// Key of the node this document's metadata is written to.
    pub fn node_key(&self) -> String {
        if self.is_section_landing {
            // Landing is only ever two segments deep
            self.segments[0].clone()
        } else {
            self.segments.join("/")
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent_key.is_none()
    }
}

/// Classify a normalized document path.
///
/// `landing_prefix` is compared against the lowercased file name, so it is
/// expected to be lowercase itself.
pub fn classify(path: &str, landing_prefix: &str) -> PathClass {
    let segments: Vec<String> = path
        .split('/')
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect();

    match segments.as_slice() {
        [] | [_] => PathClass {
            segments,
            is_section_landing: false,
            parent_key: None,
        },
        [parent, file] if file.to_lowercase().starts_with(landing_prefix) => {
            let parent_key = Some(parent.clone());
            PathClass {
                segments,
                is_section_landing: true,
                parent_key,
            }
        }
        [parents @ .., _] => {
            let parent_key = Some(parents.join("/"));
            PathClass {
                segments,
                is_section_landing: false,
                parent_key,
            }
        }
    }
}

/// Parent key of a node key, `None` at the top level.
pub fn parent_of(key: &str) -> Option<&str> {
    key.rsplit_once('/').map(|(parent, _)| parent)
}

/// Last segment of a path or key.
pub fn last_segment(key: &str) -> &str {
    key.rsplit('/').next().unwrap_or(key)
}
