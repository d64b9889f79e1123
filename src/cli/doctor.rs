//! `quire doctor`: health check command.

use quire::config::{load_config, AppConfig};

use crate::cli::open_index;

pub async fn run() -> anyhow::Result<()> {
    eprintln!("Quire Doctor");
    eprintln!("============\n");

    // 1. Config
    eprint!("Config ... ");
    let config = match load_config() {
        Ok(config) => {
            eprintln!("OK ({})", AppConfig::config_path().display());
            eprintln!("  Extensions: {}", config.extensions.join(", "));
            eprintln!("  Entry point: {}", config.entry_point);
            eprintln!("  Landing prefix: {}", config.landing_prefix);
            eprintln!("  Build timeout: {}s", config.build_timeout.as_secs());
            config
        }
        Err(e) => {
            eprintln!("FAILED: {e}");
            eprintln!();
            return Ok(());
        }
    };

    // 2. Docs directory
    eprint!("\nDocs directory ... ");
    if config.docs_dir.is_dir() {
        eprintln!("OK ({})", config.docs_dir.display());
    } else {
        eprintln!("MISSING ({})", config.docs_dir.display());
        eprintln!("  Set docs.directory in the config or QUIRE_DOCS_DIR.");
    }

    // 3. Index
    eprint!("\nIndex ... ");
    let index = open_index(&config);
    match index.ensure_ready().await {
        Ok(snapshot) => {
            eprintln!("OK ({:?})", index.state());
            eprintln!("  Sections: {}", snapshot.roots.len());
            eprintln!("  Pages: {}", snapshot.node_count());
            eprintln!("  Drafts skipped: {}", snapshot.drafts);
            eprintln!("  Built at: {}", snapshot.built_at.to_rfc3339());
            if !snapshot.failures.is_empty() {
                eprintln!("  Failed documents: {}", snapshot.failures.len());
                for failure in &snapshot.failures {
                    eprintln!("    {}: {}", failure.path, failure.reason);
                }
            }
        }
        Err(e) => {
            eprintln!("FAILED ({:?})", index.state());
            eprintln!("  {e}");
        }
    }

    eprintln!();
    Ok(())
}
