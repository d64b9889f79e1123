//! CLI command definitions and handlers.

pub mod doctor;
pub mod search;
pub mod tree;

use clap::Subcommand;

use quire::cache::DocIndex;
use quire::config::AppConfig;
use quire::indexer::SourceLoader;
use quire::render::MarkdownRenderer;
use quire::sources::markdown::MarkdownFolderSource;
use quire::tree::{DocumentNode, TreeOptions};

#[derive(Subcommand)]
pub enum Commands {
    /// Print the full documentation tree
    Tree {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Search the documentation
    Search {
        /// Search query (empty shows everything)
        query: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check config and docs directory, then build the index once
    Doctor,
}

/// Wire the markdown source and renderer into an index.
pub fn open_index(config: &AppConfig) -> DocIndex {
    let source = MarkdownFolderSource::new(&config.docs_dir, config.extensions.clone());
    let options = TreeOptions {
        entry_point: config.entry_point.clone(),
        landing_prefix: config.landing_prefix.clone(),
    };
    let loader = SourceLoader::new(Box::new(source), Box::new(MarkdownRenderer), options);
    DocIndex::new(loader, config.build_timeout)
}

/// Indented outline of `nodes`.
pub fn print_outline(nodes: &[DocumentNode], depth: usize) {
    for node in nodes {
        let indent = "  ".repeat(depth);
        if node.description.is_empty() {
            println!("{indent}- {} ({})", node.title, node.path);
        } else {
            println!(
                "{indent}- {} ({}): {}",
                node.title, node.path, node.description
            );
        }
        print_outline(&node.children, depth + 1);
    }
}
