//! `quire tree`: print the documentation hierarchy.

use quire::config::load_config;

use crate::cli::{open_index, print_outline};

pub async fn run(json: bool) -> anyhow::Result<()> {
    let config = load_config()?;
    let index = open_index(&config);
    let docs = index.documents().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&*docs)?);
        return Ok(());
    }

    if docs.is_empty() {
        eprintln!("No documents found in {}", config.docs_dir.display());
        return Ok(());
    }

    print_outline(&docs, 0);

    let failures = &docs.snapshot().failures;
    if !failures.is_empty() {
        eprintln!("\n{} document(s) skipped:", failures.len());
        for failure in failures {
            eprintln!("  {}: {}", failure.path, failure.reason);
        }
    }

    Ok(())
}
