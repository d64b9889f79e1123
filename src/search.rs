//! Substring search over the document tree.
//!
//! A node survives when it matches or when anything below it matches. The
//! result is a pruned copy; the cached tree is never touched.

use crate::cache::DocIndex;
use crate::error::QuireError;
use crate::tree::DocumentNode;

/// Longest accepted query, in characters.
pub const MAX_QUERY_LEN: usize = 512;

impl DocIndex {
    /// Search the index. An empty or blank query returns the whole tree.
    pub async fn search(&self, query: &str) -> Result<Vec<DocumentNode>, QuireError> {
        validate_query(query)?;
        let snapshot = self.ensure_ready().await?;
        Ok(search_tree(&snapshot.roots, query))
    }
}

/// Reject queries that can only be a caller bug.
pub fn validate_query(query: &str) -> Result<(), QuireError> {
    let len = query.chars().count();
    if len > MAX_QUERY_LEN {
        return Err(QuireError::Query(format!(
            "Query is {len} characters long, limit is {MAX_QUERY_LEN}"
        )));
    }
    if query.chars().any(|c| c.is_control() && !c.is_whitespace()) {
        return Err(QuireError::Query(
            "Query contains control characters".into(),
        ));
    }
    Ok(())
}

/// Pruned copy of `roots` holding only branches that match `query`.
pub fn search_tree(roots: &[DocumentNode], query: &str) -> Vec<DocumentNode> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return roots.to_vec();
    }

    roots
        .iter()
        .filter_map(|root| prune(root, &needle, ""))
        .collect()
}

/// `ancestors` is the lowercased path title of the parent, empty at the top.
fn prune(node: &DocumentNode, needle: &str, ancestors: &str) -> Option<DocumentNode> {
    let title = node.title.to_lowercase();
    let path_title = if ancestors.is_empty() {
        title
    } else {
        format!("{ancestors} {title}")
    };

    let children: Vec<DocumentNode> = node
        .children
        .iter()
        .filter_map(|child| prune(child, needle, &path_title))
        .collect();

    // The path title ends with the node's own title, so this covers both.
    let matched = path_title.contains(needle) || node.content.to_lowercase().contains(needle);

    (matched || !children.is_empty()).then(|| DocumentNode {
        path: node.path.clone(),
        title: node.title.clone(),
        icon: node.icon.clone(),
        description: node.description.clone(),
        content: node.content.clone(),
        order: node.order,
        children,
    })
}
