//! Markdown folder content source.
//!
//! Walks a documentation root recursively and reads every file with one of
//! the configured extensions. Hidden files and directories are skipped.

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

use tracing::debug;

use crate::error::QuireError;
use crate::sources::{ContentSource, RawDocument};

/// Content source for a folder of markdown files.
pub struct MarkdownFolderSource {
    folder_path: PathBuf,
    display_name: String,
    extensions: Vec<String>,
}

impl MarkdownFolderSource {
    pub fn new(folder_path: impl Into<PathBuf>, extensions: Vec<String>) -> Self {
        let folder_path = folder_path.into();
        let folder_path = if folder_path.starts_with("~") {
            match (dirs::home_dir(), folder_path.strip_prefix("~")) {
                (Some(home), Ok(rest)) => home.join(rest),
                _ => folder_path,
            }
        } else {
            folder_path
        };

        let display_name = folder_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("docs")
            .to_string();

        let extensions = extensions
            .into_iter()
            .map(|ext| {
                if ext.starts_with('.') {
                    ext
                } else {
                    format!(".{ext}")
                }
            })
            .collect();

        Self {
            folder_path,
            display_name,
            extensions,
        }
    }

    pub fn root_path(&self) -> &Path {
        &self.folder_path
    }

    /// Relative paths of all matching files, keyed by normalized document path.
    ///
    /// When two files normalize to the same path (`intro.md` and `intro.mdx`)
    /// the one whose extension is listed first wins.
    fn list_files(&self) -> Result<BTreeMap<String, PathBuf>, QuireError> {
        let mut found = BTreeMap::new();

        for ext in &self.extensions {
            let root = glob::Pattern::escape(&self.folder_path.to_string_lossy());
            let pattern = format!("{root}/**/*{ext}");
            let entries = glob::glob(&pattern).map_err(|e| {
                QuireError::Source(format!("Invalid file pattern {pattern}: {e}"))
            })?;

            for entry in entries.flatten() {
                let rel = match entry.strip_prefix(&self.folder_path) {
                    Ok(r) => r.to_path_buf(),
                    Err(_) => continue,
                };

                if is_hidden(&rel) || !entry.is_file() {
                    continue;
                }

                let Some(doc_path) = normalize_path(&rel, ext) else {
                    continue;
                };
                found.entry(doc_path).or_insert(rel);
            }
        }

        Ok(found)
    }
}

impl ContentSource for MarkdownFolderSource {
    fn name(&self) -> &str {
        &self.display_name
    }

    fn discover(&self) -> Result<Vec<RawDocument>, QuireError> {
        if !self.folder_path.is_dir() {
            return Err(QuireError::Source(format!(
                "Docs directory not found: {}",
                self.folder_path.display()
            )));
        }

        let files = self.list_files()?;
        debug!(
            "{}: discovered {} files under {}",
            self.display_name,
            files.len(),
            self.folder_path.display()
        );

        Ok(files
            .into_iter()
            .map(|(path, rel)| RawDocument {
                path,
                raw: read_lossy(&self.folder_path.join(&rel)),
            })
            .collect())
    }
}

/// Skip anything under a dot-prefixed component.
fn is_hidden(rel: &Path) -> bool {
    rel.components()
        .any(|c| c.as_os_str().to_str().is_some_and(|s| s.starts_with('.')))
}

/// `guides/01-intro.md` -> `guides/01-intro`.
fn normalize_path(rel: &Path, ext: &str) -> Option<String> {
    let mut segments = Vec::new();
    for component in rel.components() {
        match component {
            Component::Normal(s) => segments.push(s.to_str()?.to_string()),
            _ => return None,
        }
    }

    let last = segments.pop()?;
    let stem = last.strip_suffix(ext).unwrap_or(&last);
    if stem.is_empty() {
        return None;
    }
    segments.push(stem.to_string());
    Some(segments.join("/"))
}

/// Read a file as UTF-8, replacing invalid bytes with the Unicode replacement character.
fn read_lossy(path: &Path) -> Result<String, String> {
    std::fs::read(path)
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        .map_err(|e| format!("Failed to read {}: {e}", path.display()))
}
