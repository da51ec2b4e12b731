//! In-process graph store.
//!
//! Holds the catalog, carts and chat history in `tokio::sync::RwLock`
//! collections. Used when no Neo4j URI is configured and throughout the
//! tests. Filters are evaluated with the same rules the Cypher encodes.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::debug;

use perfume_bot_core::{CartLine, CatalogEntry, Product, UserId};

use super::queries::{is_rated_review, review_rank};
use super::{
    CartStore, CartUpdate, CatalogWriter, GraphError, GraphStore, HistoryStore, ProductFilter,
    ProductStore, SEARCH_LIMIT, TitleMatch,
};

#[derive(Debug, Clone)]
struct StoredProduct {
    product: Product,
    status: Option<String>,
}

#[derive(Debug, Clone)]
struct CartEdge {
    title: String,
    price: String,
    image_url: String,
    quantity: u32,
    added_at: DateTime<Utc>,
    /// Write order, breaks timestamp ties.
    sequence: u64,
}

/// One stored exchange, as written by [`HistoryStore::record_turn`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedTurn {
    pub user_id: UserId,
    pub user_message: String,
    pub bot_message: String,
    pub timestamp: DateTime<Utc>,
}

/// In-memory implementation of [`GraphStore`].
#[derive(Debug, Default)]
pub struct MemoryGraph {
    products: RwLock<Vec<StoredProduct>>,
    carts: RwLock<HashMap<UserId, Vec<CartEdge>>>,
    turns: RwLock<Vec<RecordedTurn>>,
    sequence: AtomicU64,
}

impl MemoryGraph {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding the given catalog, in order.
    #[must_use]
    pub fn with_catalog(entries: &[CatalogEntry]) -> Self {
        let products = entries.iter().map(stored).collect();
        Self {
            products: RwLock::new(products),
            ..Self::default()
        }
    }

    /// Number of products held.
    pub async fn product_count(&self) -> usize {
        self.products.read().await.len()
    }

    /// Every recorded exchange, oldest first.
    pub async fn turns(&self) -> Vec<RecordedTurn> {
        self.turns.read().await.clone()
    }

    fn next_sequence(&self) -> u64 {
        self.sequence.fetch_add(1, Ordering::Relaxed)
    }
}

fn stored(entry: &CatalogEntry) -> StoredProduct {
    let status = entry.status.trim();
    StoredProduct {
        product: entry.product(),
        status: (!status.is_empty()).then(|| status.to_string()),
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // positive constant
const LIMIT: usize = SEARCH_LIMIT as usize;

#[async_trait]
impl ProductStore for MemoryGraph {
    async fn search(&self, filter: ProductFilter) -> Result<Vec<Product>, GraphError> {
        let products = self.products.read().await;

        let mut matched: Vec<&Product> = match filter {
            ProductFilter::Any => products.iter().map(|p| &p.product).collect(),
            ProductFilter::Status(status) => products
                .iter()
                .filter(|p| p.status.as_deref() == Some(status.as_str()))
                .map(|p| &p.product)
                .collect(),
            ProductFilter::WellReviewed => {
                let mut rated: Vec<&Product> = products
                    .iter()
                    .map(|p| &p.product)
                    .filter(|p| is_rated_review(p.review.as_deref()))
                    .collect();
                rated.sort_by(|a, b| {
                    let rank = |p: &Product| review_rank(p.review.as_deref().unwrap_or_default());
                    rank(b).total_cmp(&rank(a))
                });
                rated
            }
            ProductFilter::Title(words) => products
                .iter()
                .map(|p| &p.product)
                .filter(|p| words.matches(&p.title))
                .collect(),
            ProductFilter::MostReviewed => {
                let mut all: Vec<&Product> = products.iter().map(|p| &p.product).collect();
                // descending order puts missing reviews first, as Neo4j does
                all.sort_by(|a, b| match (&a.review, &b.review) {
                    (None, None) => std::cmp::Ordering::Equal,
                    (None, Some(_)) => std::cmp::Ordering::Less,
                    (Some(_), None) => std::cmp::Ordering::Greater,
                    (Some(a), Some(b)) => b.cmp(a),
                });
                all
            }
        };

        matched.truncate(LIMIT);
        debug!(filter = filter.label(), count = matched.len(), "Memory search");
        Ok(matched.into_iter().cloned().collect())
    }

    async fn find_by_title(
        &self,
        title: &str,
        mode: TitleMatch,
    ) -> Result<Option<Product>, GraphError> {
        Ok(self
            .products
            .read()
            .await
            .iter()
            .find(|p| mode.matches(&p.product.title, title))
            .map(|p| p.product.clone()))
    }

    async fn product_titles(&self) -> Result<Vec<String>, GraphError> {
        Ok(self
            .products
            .read()
            .await
            .iter()
            .map(|p| p.product.title.clone())
            .collect())
    }
}

#[async_trait]
impl CartStore for MemoryGraph {
    async fn add_to_cart(&self, user: &UserId, title: &str) -> Result<CartUpdate, GraphError> {
        let Some(product) = self.find_by_title(title, TitleMatch::Exact).await? else {
            return Ok(CartUpdate::ProductMissing);
        };

        let sequence = self.next_sequence();
        let now = Utc::now();
        let mut carts = self.carts.write().await;
        let lines = carts.entry(user.clone()).or_default();

        let quantity = if let Some(edge) = lines.iter_mut().find(|e| e.title == product.title) {
            edge.quantity = edge.quantity.saturating_add(1);
            edge.added_at = now;
            edge.sequence = sequence;
            edge.quantity
        } else {
            lines.push(CartEdge {
                title: product.title,
                price: product.price,
                image_url: product.image_url,
                quantity: 1,
                added_at: now,
                sequence,
            });
            1
        };

        Ok(CartUpdate::Added { quantity })
    }

    async fn clear_cart(&self, user: &UserId) -> Result<u64, GraphError> {
        let removed = self
            .carts
            .write()
            .await
            .remove(user)
            .map_or(0, |lines| lines.len());
        Ok(u64::try_from(removed).unwrap_or(u64::MAX))
    }

    async fn cart(&self, user: &UserId) -> Result<Vec<CartLine>, GraphError> {
        let carts = self.carts.read().await;
        let mut edges: Vec<&CartEdge> = carts
            .get(user)
            .map(|l| l.iter().collect())
            .unwrap_or_default();
        edges.sort_by(|a, b| {
            b.added_at
                .cmp(&a.added_at)
                .then_with(|| b.sequence.cmp(&a.sequence))
        });

        Ok(edges
            .into_iter()
            .map(|edge| CartLine {
                title: edge.title.clone(),
                price: edge.price.clone(),
                image_url: edge.image_url.clone(),
                quantity: edge.quantity,
                added_at: Some(edge.added_at),
            })
            .collect())
    }
}

#[async_trait]
impl HistoryStore for MemoryGraph {
    async fn record_turn(
        &self,
        user: &UserId,
        user_message: &str,
        bot_message: &str,
    ) -> Result<(), GraphError> {
        self.turns.write().await.push(RecordedTurn {
            user_id: user.clone(),
            user_message: user_message.to_string(),
            bot_message: bot_message.to_string(),
            timestamp: Utc::now(),
        });
        Ok(())
    }
}

#[async_trait]
impl CatalogWriter for MemoryGraph {
    async fn import_product(&self, entry: &CatalogEntry) -> Result<(), GraphError> {
        self.products.write().await.push(stored(entry));
        Ok(())
    }
}

#[async_trait]
impl GraphStore for MemoryGraph {
    async fn ping(&self) -> Result<(), GraphError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use perfume_bot_core::{ProductIntent, ProductStatus};

    fn entry(title: &str, status: &str, review: Option<&str>) -> CatalogEntry {
        CatalogEntry {
            title: title.to_string(),
            size: "100 ml".to_string(),
            price: "฿3,200".to_string(),
            image_url: format!("https://cdn.example.com/{}.jpg", title.replace(' ', "-")),
            review: review.map(ToString::to_string),
            stock: "In stock".to_string(),
            status: status.to_string(),
            top_note: "Bergamot".to_string(),
            heart_note: "Rose".to_string(),
            base_note: "Musk".to_string(),
        }
    }

    fn store() -> MemoryGraph {
        MemoryGraph::with_catalog(&[
            entry("Rose Noir", "BESTSELLER", Some("4.8/5")),
            entry("Citrus Breeze", "NEW", Some("No Review")),
            entry("Vanilla Dream", "BESTSELLER", Some("5/5")),
            entry("Ocean Mist", "", None),
            entry("Amber Night", "Limited Edition", Some("3.6/5")),
        ])
    }

    fn titles(products: &[Product]) -> Vec<&str> {
        products.iter().map(|p| p.title.as_str()).collect()
    }

    // =========================================================================
    // Product Search
    // =========================================================================

    #[tokio::test]
    async fn test_status_search() {
        let found = store()
            .search(ProductFilter::Status(ProductStatus::Bestseller))
            .await
            .expect("search");
        assert_eq!(titles(&found), vec!["Rose Noir", "Vanilla Dream"]);
    }

    #[tokio::test]
    async fn test_well_reviewed_orders_by_bucket() {
        let found = store()
            .search(ProductFilter::WellReviewed)
            .await
            .expect("search");
        assert_eq!(titles(&found), vec!["Vanilla Dream", "Rose Noir", "Amber Night"]);
    }

    #[tokio::test]
    async fn test_title_keywords_search() {
        let filter = ProductFilter::for_intent(Some(ProductIntent::ScentFresh));
        let found = store().search(filter).await.expect("search");
        assert_eq!(titles(&found), vec!["Citrus Breeze", "Ocean Mist"]);
    }

    #[tokio::test]
    async fn test_most_reviewed_puts_missing_reviews_first() {
        let found = store()
            .search(ProductFilter::MostReviewed)
            .await
            .expect("search");
        assert_eq!(found.first().map(|p| p.title.as_str()), Some("Ocean Mist"));
        assert_eq!(found.len(), 5);
    }

    #[tokio::test]
    async fn test_search_is_limited() {
        let entries: Vec<_> = (0..8)
            .map(|i| entry(&format!("Perfume {i}"), "NEW", None))
            .collect();
        let graph = MemoryGraph::with_catalog(&entries);
        let found = graph
            .search(ProductFilter::Status(ProductStatus::New))
            .await
            .expect("search");
        assert_eq!(found.len(), 5);
    }

    #[tokio::test]
    async fn test_find_by_title_modes() {
        let graph = store();
        let exact = graph
            .find_by_title("rose noir", TitleMatch::Exact)
            .await
            .expect("lookup");
        assert!(exact.is_none());
        let ci = graph
            .find_by_title("rose noir", TitleMatch::CaseInsensitive)
            .await
            .expect("lookup");
        assert_eq!(ci.map(|p| p.title), Some("Rose Noir".to_string()));
        let partial = graph
            .find_by_title("mist", TitleMatch::Contains)
            .await
            .expect("lookup");
        assert_eq!(partial.map(|p| p.title), Some("Ocean Mist".to_string()));
    }

    // =========================================================================
    // Carts
    // =========================================================================

    #[tokio::test]
    async fn test_add_to_cart_increments_single_line() {
        let graph = store();
        let user = UserId::new("U1");

        let first = graph.add_to_cart(&user, "Rose Noir").await.expect("add");
        assert_eq!(first, CartUpdate::Added { quantity: 1 });
        let cart = graph.cart(&user).await.expect("cart");
        assert_eq!(cart.len(), 1);

        let second = graph.add_to_cart(&user, "Rose Noir").await.expect("add");
        assert_eq!(second, CartUpdate::Added { quantity: 2 });
        let cart = graph.cart(&user).await.expect("cart");
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.first().map(|l| l.quantity), Some(2));
    }

    #[tokio::test]
    async fn test_add_unknown_product_writes_nothing() {
        let graph = store();
        let user = UserId::new("U1");
        let result = graph.add_to_cart(&user, "Nope").await.expect("add");
        assert_eq!(result, CartUpdate::ProductMissing);
        assert!(graph.cart(&user).await.expect("cart").is_empty());
    }

    #[tokio::test]
    async fn test_cart_is_newest_first() {
        let graph = store();
        let user = UserId::new("U1");
        graph.add_to_cart(&user, "Rose Noir").await.expect("add");
        graph.add_to_cart(&user, "Ocean Mist").await.expect("add");
        let cart = graph.cart(&user).await.expect("cart");
        let order: Vec<_> = cart.iter().map(|l| l.title.as_str()).collect();
        assert_eq!(order, vec!["Ocean Mist", "Rose Noir"]);
    }

    #[tokio::test]
    async fn test_clear_cart_empties_cart() {
        let graph = store();
        let user = UserId::new("U1");
        graph.add_to_cart(&user, "Rose Noir").await.expect("add");
        graph.add_to_cart(&user, "Ocean Mist").await.expect("add");

        assert_eq!(graph.clear_cart(&user).await.expect("clear"), 2);
        assert!(graph.cart(&user).await.expect("cart").is_empty());
        assert_eq!(graph.clear_cart(&user).await.expect("clear"), 0);
    }

    #[tokio::test]
    async fn test_carts_are_per_user() {
        let graph = store();
        graph
            .add_to_cart(&UserId::new("U1"), "Rose Noir")
            .await
            .expect("add");
        assert!(graph.cart(&UserId::new("U2")).await.expect("cart").is_empty());
    }

    // =========================================================================
    // History & Import
    // =========================================================================

    #[tokio::test]
    async fn test_record_turn_appends() {
        let graph = MemoryGraph::new();
        let user = UserId::new("U1");
        graph.record_turn(&user, "hi", "hello").await.expect("record");
        graph.record_turn(&user, "/cart", "empty").await.expect("record");
        let turns = graph.turns().await;
        assert_eq!(turns.len(), 2);
        assert_eq!(turns.first().map(|t| t.bot_message.as_str()), Some("hello"));
    }

    #[tokio::test]
    async fn test_import_product_appends_duplicates() {
        let graph = MemoryGraph::new();
        let rose = entry("Rose Noir", "", None);
        graph.import_product(&rose).await.expect("import");
        graph.import_product(&rose).await.expect("import");
        assert_eq!(graph.product_count().await, 2);
        let none = graph
            .search(ProductFilter::Status(ProductStatus::New))
            .await
            .expect("search");
        assert!(none.is_empty());
    }
}
