//! `quire search`: substring search over the documentation tree.

use quire::config::load_config;
use quire::tree::DocumentNode;

use crate::cli::{open_index, print_outline};

pub async fn run(query: String, json: bool) -> anyhow::Result<()> {
    let config = load_config()?;
    let index = open_index(&config);
    let results = index.search(&query).await?;

    if json {
        let output = serde_json::json!({
            "query": query,
            "total_results": count_nodes(&results),
            "results": results,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    if results.is_empty() {
        eprintln!("No results found for: {query}");
        return Ok(());
    }

    print_outline(&results, 0);
    eprintln!("{} matching page(s)", count_nodes(&results));

    Ok(())
}

fn count_nodes(nodes: &[DocumentNode]) -> usize {
    nodes.iter().map(DocumentNode::subtree_len).sum()
}
