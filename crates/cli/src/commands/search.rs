//! Product search command.
//!
//! Runs the same search the bot runs for an intent, including the most
//! reviewed fallback, against Neo4j or a `CATALOG_PATH` file.

use std::time::Duration;

use tracing::info;

use perfume_bot::config::ToolConfig;
use perfume_bot::graph::{ProductFilter, ProductStore};
use perfume_bot::services::CatalogService;
use perfume_bot::state::connect_graph;
use perfume_bot_core::Intent;

/// Print the products an intent would show.
///
/// Without an intent, lists the first products in storage order.
///
/// # Errors
///
/// Returns an error if the label is not a product intent or the graph query
/// fails.
pub async fn products(intent: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let product_intent = match intent {
        Some(label) => {
            let intent: Intent = label.parse()?;
            let product = intent
                .product()
                .ok_or_else(|| format!("'{intent}' does not search for products"))?;
            Some(product)
        }
        None => None,
    };

    let config = ToolConfig::from_env()?;
    let graph = connect_graph(config.graph()?, config.graph_timeout).await?;

    let products = match product_intent {
        Some(product_intent) => {
            CatalogService::new(graph, Duration::from_secs(60))
                .recommend(product_intent)
                .await?
        }
        None => graph.search(ProductFilter::Any).await?,
    };

    info!("{} products", products.len());
    for (i, product) in products.iter().enumerate() {
        info!(
            "{:>2}. {} | {} | {} | {} | {}",
            i + 1,
            product.title,
            product.price,
            product.size,
            product.review().unwrap_or("-"),
            product.stock
        );
    }

    Ok(())
}
