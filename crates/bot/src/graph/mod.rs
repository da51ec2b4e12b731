//! Graph storage for products, carts and chat history.
//!
//! # Schema
//!
//! - `(:Product {title, size, price, image_url, review, stock})`
//! - `(:Product)-[:HAS_STATUS]->(:Status {name})`
//! - `(:Product)-[:HAS_TOP_NOTE|HAS_HEART_NOTE|HAS_BASE_NOTE]->(:Note {type, description})`
//! - `(:User {user_id})-[:ADDED_TO_CART {quantity, timestamp}]->(:Product)`
//! - `(:User)-[:SENT]->(:UserMessage {id, message, timestamp})`
//! - `(:BotMessage {id, message, timestamp})-[:REPLIED_WITH]->(:User)`
//! - `(:BotMessage)-[:IN_REPLY_TO]->(:UserMessage)`
//!
//! # Backends
//!
//! - [`Neo4jGraph`] - production store over Bolt
//! - [`MemoryGraph`] - in-process store for local runs and tests

pub mod import;
mod memory;
mod neo4j;
pub mod queries;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use perfume_bot_core::{CartLine, CatalogEntry, Product, UserId};

pub use import::{
    ImportError, ImportResult, import_catalog, load_catalog, parse_catalog, validate_catalog,
};
pub use memory::{MemoryGraph, RecordedTurn};
pub use neo4j::Neo4jGraph;
pub use queries::{ProductFilter, SEARCH_LIMIT, TitleMatch};

/// Errors that can occur during graph operations.
#[derive(Debug, Error)]
pub enum GraphError {
    /// Could not connect to the graph database.
    #[error("connection failed: {0}")]
    Connection(String),

    /// Query failed to execute.
    #[error("query failed: {0}")]
    Query(#[from] neo4rs::Error),

    /// A returned row did not have the expected shape.
    #[error("unexpected row: {0}")]
    Decode(String),

    /// The database did not answer in time.
    #[error("graph operation timed out after {0:?}")]
    Timeout(Duration),
}

/// Result of adding a product to a cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartUpdate {
    /// The cart line now holds `quantity` items.
    Added { quantity: u32 },
    /// No product has the requested title; nothing was written.
    ProductMissing,
}

// =============================================================================
// Store Traits
// =============================================================================

/// Read access to the product catalog.
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Run a product search, returning at most [`SEARCH_LIMIT`] products.
    async fn search(&self, filter: ProductFilter) -> Result<Vec<Product>, GraphError>;

    /// First product whose title satisfies `mode`.
    async fn find_by_title(
        &self,
        title: &str,
        mode: TitleMatch,
    ) -> Result<Option<Product>, GraphError>;

    /// Every product title.
    async fn product_titles(&self) -> Result<Vec<String>, GraphError>;
}

/// Per-user shopping carts.
#[async_trait]
pub trait CartStore: Send + Sync {
    /// Add one unit of the product titled `title`.
    ///
    /// Concurrent adds for the same user and product may race; the
    /// increment is not guarded.
    async fn add_to_cart(&self, user: &UserId, title: &str) -> Result<CartUpdate, GraphError>;

    /// Remove every line from the cart, returning how many were removed.
    async fn clear_cart(&self, user: &UserId) -> Result<u64, GraphError>;

    /// Cart lines, most recently added first.
    async fn cart(&self, user: &UserId) -> Result<Vec<CartLine>, GraphError>;
}

/// Append-only chat history.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Store one user message and the bot's reply to it.
    async fn record_turn(
        &self,
        user: &UserId,
        user_message: &str,
        bot_message: &str,
    ) -> Result<(), GraphError>;
}

/// Catalog writes used by the importer.
#[async_trait]
pub trait CatalogWriter: Send + Sync {
    /// Create a product with its status and notes.
    async fn import_product(&self, entry: &CatalogEntry) -> Result<(), GraphError>;
}

/// Everything the bot needs from the graph.
#[async_trait]
pub trait GraphStore: ProductStore + CartStore + HistoryStore + CatalogWriter {
    /// Check that the store is reachable.
    async fn ping(&self) -> Result<(), GraphError>;
}
