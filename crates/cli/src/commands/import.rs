//! Catalog import command.
//!
//! Reads a catalog JSON file, validates it before connecting, then writes
//! each product with its status and notes. Running it twice duplicates the
//! products.
//!
//! # Environment Variables
//!
//! - `NEO4J_URI`, `NEO4J_USER`, `NEO4J_PASSWORD` - target database
//! - `GRAPH_TIMEOUT_SECS` - statement timeout (default: 10)

use std::path::Path;

use tracing::{error, info};

use perfume_bot::config::{GraphConfig, ToolConfig};
use perfume_bot::graph::{Neo4jGraph, import_catalog, load_catalog, validate_catalog};

/// Import a catalog file.
///
/// # Errors
///
/// Returns an error if the file is missing or invalid, or the database
/// cannot be reached.
pub async fn catalog(file_path: &Path, dry_run: bool) -> Result<(), Box<dyn std::error::Error>> {
    if !file_path.exists() {
        return Err(format!("File not found: {}", file_path.display()).into());
    }

    info!(path = %file_path.display(), "Loading catalog from file");
    let entries = load_catalog(file_path).await?;
    info!(products = entries.len(), "Parsed catalog");

    let errors = validate_catalog(&entries);
    if !errors.is_empty() {
        error!("Catalog validation failed:");
        for err in &errors {
            error!("  - {err}");
        }
        return Err(format!("{} validation errors found", errors.len()).into());
    }

    info!("Catalog validated successfully");

    if dry_run {
        info!("Dry run: {} products would be imported", entries.len());
        return Ok(());
    }

    let config = ToolConfig::from_env()?;
    let GraphConfig::Neo4j(neo4j) = config.graph()? else {
        return Err("Import needs NEO4J_URI; CATALOG_PATH graphs are read from file".into());
    };

    let graph = Neo4jGraph::connect(
        &neo4j.uri,
        &neo4j.user,
        &neo4j.password,
        config.graph_timeout,
    )
    .await?;
    graph.init_schema().await;
    info!("Connected to Neo4j");

    let result = import_catalog(&graph, &entries).await?;

    info!("Import complete!");
    info!("  Products imported: {}", result.imported);
    info!("  Products failed: {}", result.failed);

    if !result.errors.is_empty() {
        error!("  Errors: {}", result.errors.len());
        for (title, err) in &result.errors {
            error!("    - {title}: {err}");
        }
    }

    Ok(())
}
