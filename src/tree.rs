//! Document tree assembly.
//!
//! Turns flat `(path, metadata, content)` records into an ordered tree.
//! Folders without their own document still get a node, with defaults
//! derived from the folder name.

use std::cmp::Ordering;
use std::collections::HashMap;

use serde::Serialize;

use crate::classify::{classify, last_segment, parent_of};
use crate::frontmatter::DocMetadata;

/// One discovered document after extraction and rendering.
#[derive(Debug, Clone)]
pub struct SourceRecord {
    /// Normalized path: `/`-separated, no extension.
    pub path: String,
    pub metadata: DocMetadata,
    pub rendered_content: String,
}

/// A node of the documentation tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentNode {
    pub path: String,
    pub title: String,
    pub icon: String,
    pub description: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,
    pub children: Vec<DocumentNode>,
}

impl DocumentNode {
    /// Placeholder for a folder that has children but no document of its own.
    fn synthesized(key: &str) -> Self {
        Self {
            path: key.to_string(),
            title: last_segment(key).to_string(),
            icon: String::new(),
            description: String::new(),
            content: String::new(),
            order: None,
            children: Vec::new(),
        }
    }

    fn from_record(key: &str, record: SourceRecord) -> Self {
        let meta = record.metadata;
        Self {
            path: key.to_string(),
            title: meta
                .title
                .unwrap_or_else(|| last_segment(key).to_string()),
            icon: meta.icon.unwrap_or_default(),
            description: meta.description.unwrap_or_default(),
            content: record.rendered_content,
            order: meta.order,
            children: Vec::new(),
        }
    }

    /// Number of nodes in this subtree, including `self`.
    pub fn subtree_len(&self) -> usize {
        1 + self.children.iter().map(Self::subtree_len).sum::<usize>()
    }

    /// Position among siblings: explicit `order`, else the title's numeric prefix.
    fn sort_rank(&self) -> i64 {
        self.order.unwrap_or_else(|| title_rank(&self.title))
    }
}

/// Knobs for tree assembly.
#[derive(Debug, Clone)]
pub struct TreeOptions {
    /// Root path forced to the first position.
    pub entry_point: String,
    /// Lowercase filename prefix marking a section landing document.
    pub landing_prefix: String,
}

impl Default for TreeOptions {
    fn default() -> Self {
        Self {
            entry_point: "getting-started".into(),
            landing_prefix: "01-".into(),
        }
    }
}

/// Node under construction; children are held as keys until assembly.
struct Entry {
    node: DocumentNode,
    child_keys: Vec<String>,
    attached: bool,
}

impl Entry {
    fn new(node: DocumentNode) -> Self {
        Self {
            node,
            child_keys: Vec::new(),
            attached: false,
        }
    }
}

/// Build the ordered tree from `records`.
///
/// When two records resolve to the same node (a folder's landing document
/// and a same-named top-level file, say) the later record wins.
pub fn build(records: Vec<SourceRecord>, options: &TreeOptions) -> Vec<DocumentNode> {
    let mut entries: HashMap<String, Entry> = HashMap::new();
    let mut root_keys: Vec<String> = Vec::new();

    for record in records {
        let class = classify(&record.path, &options.landing_prefix);
        if class.segments.is_empty() {
            continue;
        }

        let key = class.node_key();
        let parent = if class.is_section_landing {
            None
        } else {
            class.parent_key.clone()
        };

        let node = DocumentNode::from_record(&key, record);
        match entries.get_mut(&key) {
            Some(existing) => existing.node = node,
            None => {
                entries.insert(key.clone(), Entry::new(node));
            }
        }

        attach(&mut entries, &mut root_keys, key, parent);
    }

    let mut roots: Vec<DocumentNode> = root_keys
        .iter()
        .filter_map(|key| assemble(key, &mut entries))
        .collect();

    roots.sort_by(|a, b| compare_titles(&a.title, &b.title));
    if let Some(pos) = roots.iter().position(|r| r.path == options.entry_point) {
        let entry = roots.remove(pos);
        roots.insert(0, entry);
    }

    roots
}

/// Link `key` under `parent`, synthesizing missing ancestors on the way up.
fn attach(
    entries: &mut HashMap<String, Entry>,
    root_keys: &mut Vec<String>,
    mut key: String,
    mut parent: Option<String>,
) {
    loop {
        let Some(entry) = entries.get_mut(&key) else {
            return;
        };
        if entry.attached {
            return;
        }
        entry.attached = true;

        let Some(parent_key) = parent else {
            root_keys.push(key);
            return;
        };

        let parent_entry = entries
            .entry(parent_key.clone())
            .or_insert_with(|| Entry::new(DocumentNode::synthesized(&parent_key)));
        parent_entry.child_keys.push(key);

        parent = parent_of(&parent_key).map(String::from);
        key = parent_key;
    }
}

/// Move the entry for `key` and its descendants out of the map as a tree.
fn assemble(key: &str, entries: &mut HashMap<String, Entry>) -> Option<DocumentNode> {
    let Entry {
        mut node,
        child_keys,
        ..
    } = entries.remove(key)?;

    node.children = child_keys
        .iter()
        .filter_map(|child| assemble(child, entries))
        .collect();
    node.children.sort_by_key(DocumentNode::sort_rank);

    Some(node)
}

/// Integer formed by the title's leading ASCII digits, 0 when there are none.
pub fn title_rank(title: &str) -> i64 {
    let digits: &str = {
        let end = title
            .char_indices()
            .find(|(_, c)| !c.is_ascii_digit())
            .map_or(title.len(), |(i, _)| i);
        &title[..end]
    };

    if digits.is_empty() {
        0
    } else {
        digits.parse().unwrap_or(i64::MAX)
    }
}

fn compare_titles(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}
