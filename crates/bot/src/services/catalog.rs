//! Product lookups used by the conversation flow.
//!
//! Wraps the graph with the recommendation fallback, the three-step title
//! lookup and a short-lived cache of product titles.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use tracing::{debug, info, instrument};

use perfume_bot_core::{Product, ProductIntent};

use crate::graph::{GraphError, GraphStore, ProductFilter, ProductStore, TitleMatch};

/// Product catalog queries.
#[derive(Clone)]
pub struct CatalogService {
    store: Arc<dyn GraphStore>,
    titles: Cache<(), Arc<Vec<String>>>,
}

impl std::fmt::Debug for CatalogService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogService")
            .field("cached_titles", &self.titles.entry_count())
            .finish_non_exhaustive()
    }
}

impl CatalogService {
    /// Create a service; product titles are cached for `title_ttl`.
    #[must_use]
    pub fn new(store: Arc<dyn GraphStore>, title_ttl: Duration) -> Self {
        let titles = Cache::builder()
            .max_capacity(1)
            .time_to_live(title_ttl)
            .build();

        Self { store, titles }
    }

    /// Products for a recommendation intent.
    ///
    /// When the intent's query matches nothing, the most reviewed products
    /// are returned instead.
    ///
    /// # Errors
    ///
    /// Returns an error if either query fails.
    #[instrument(skip(self), fields(intent = %intent))]
    pub async fn recommend(&self, intent: ProductIntent) -> Result<Vec<Product>, GraphError> {
        let filter = ProductFilter::for_intent(Some(intent));
        let products = self.store.search(filter).await?;
        if !products.is_empty() {
            debug!(filter = filter.label(), count = products.len(), "Products found");
            return Ok(products);
        }

        info!(filter = filter.label(), "No products matched, using most reviewed");
        self.store.search(ProductFilter::MostReviewed).await
    }

    /// First product matching `title`: exact, then case-insensitive, then
    /// substring.
    ///
    /// # Errors
    ///
    /// Returns an error if a lookup query fails.
    #[instrument(skip(self))]
    pub async fn find_by_title(&self, title: &str) -> Result<Option<Product>, GraphError> {
        for mode in TitleMatch::ORDER {
            if let Some(product) = self.store.find_by_title(title, mode).await? {
                debug!(mode = ?mode, found = %product.title, "Title matched");
                return Ok(Some(product));
            }
        }
        Ok(None)
    }

    /// Whether `text` is exactly the title of a catalog product.
    ///
    /// # Errors
    ///
    /// Returns an error if the titles cannot be loaded.
    pub async fn is_product_title(&self, text: &str) -> Result<bool, GraphError> {
        Ok(self.titles().await?.iter().any(|title| title == text))
    }

    async fn titles(&self) -> Result<Arc<Vec<String>>, GraphError> {
        if let Some(titles) = self.titles.get(&()).await {
            debug!("Cache hit for product titles");
            return Ok(titles);
        }

        let titles = Arc::new(self.store.product_titles().await?);
        debug!(count = titles.len(), "Loaded product titles");
        self.titles.insert((), Arc::clone(&titles)).await;
        Ok(titles)
    }
}
