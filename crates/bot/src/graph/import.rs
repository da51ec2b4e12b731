//! Bulk import of a product catalog into the graph.
//!
//! ## JSON Format
//!
//! ```json
//! [
//!   {
//!     "title": "Rose Noir",
//!     "size": "100 ml",
//!     "price": "฿3,200",
//!     "image_url": "https://cdn.example.com/rose-noir.jpg",
//!     "review": "4.8/5",
//!     "Stock": "In stock",
//!     "status": "BESTSELLER",
//!     "top_note": "Bergamot",
//!     "Heart_Note": "Rose",
//!     "Base Note": "Patchouli"
//!   }
//! ]
//! ```
//!
//! Each product is written in one statement: the product node, its status
//! (merged by name) and three new note nodes. Importing the same file twice
//! duplicates products and notes.

use std::collections::HashSet;
use std::path::Path;

use thiserror::Error;
use tracing::{info, instrument, warn};

use perfume_bot_core::CatalogEntry;

use super::CatalogWriter;

/// Errors that stop an import before anything is written.
#[derive(Debug, Error)]
pub enum ImportError {
    /// The catalog file could not be read.
    #[error("IO error: {0}")]
    Io(String),

    /// The catalog is not valid JSON of the expected shape.
    #[error("invalid catalog: {0}")]
    Parse(String),

    /// The catalog failed validation.
    #[error("catalog validation failed: {}", .0.join("; "))]
    Invalid(Vec<String>),
}

/// Result of an import.
#[derive(Debug, Default)]
pub struct ImportResult {
    /// Products written.
    pub imported: u64,
    /// Products whose write failed.
    pub failed: u64,
    /// Errors encountered (`title`, error message).
    pub errors: Vec<(String, String)>,
}

/// Parse catalog JSON.
///
/// # Errors
///
/// Returns `ImportError::Parse` if the JSON is malformed.
pub fn parse_catalog(json: &str) -> Result<Vec<CatalogEntry>, ImportError> {
    serde_json::from_str(json).map_err(|e| ImportError::Parse(e.to_string()))
}

/// Read and parse a catalog file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
#[instrument(fields(path = %path.as_ref().display()))]
pub async fn load_catalog<P: AsRef<Path>>(path: P) -> Result<Vec<CatalogEntry>, ImportError> {
    let path = path.as_ref();
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ImportError::Io(format!("Failed to read {}: {}", path.display(), e)))?;
    parse_catalog(&content)
}

/// Validate a catalog, returning blocking errors.
///
/// Titles are the lookup key, so every product needs one. Duplicate titles
/// are allowed but logged: lookups return the first match.
#[must_use]
pub fn validate_catalog(entries: &[CatalogEntry]) -> Vec<String> {
    let mut errors = Vec::new();
    let mut seen = HashSet::new();

    for (i, entry) in entries.iter().enumerate() {
        let title = entry.title.trim();
        if title.is_empty() {
            errors.push(format!("Product at index {i} has no title"));
            continue;
        }
        if !seen.insert(title) {
            warn!(title, index = i, "Duplicate product title in catalog");
        }
    }

    errors
}

/// Write every catalog entry to the graph.
///
/// A failed write is recorded and the import continues with the next
/// product.
///
/// # Errors
///
/// Returns `ImportError::Invalid` if validation fails; nothing is written.
#[instrument(skip(writer, entries), fields(products = entries.len()))]
pub async fn import_catalog(
    writer: &dyn CatalogWriter,
    entries: &[CatalogEntry],
) -> Result<ImportResult, ImportError> {
    let errors = validate_catalog(entries);
    if !errors.is_empty() {
        return Err(ImportError::Invalid(errors));
    }

    let mut result = ImportResult::default();

    for entry in entries {
        match writer.import_product(entry).await {
            Ok(()) => result.imported += 1,
            Err(e) => {
                warn!(title = %entry.title, error = %e, "Failed to import product");
                result.failed += 1;
                result.errors.push((entry.title.clone(), e.to_string()));
            }
        }
    }

    info!(
        imported = result.imported,
        failed = result.failed,
        "Catalog import complete"
    );

    Ok(result)
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::graph::{GraphError, MemoryGraph, ProductFilter, ProductStore};
    use perfume_bot_core::ProductStatus;

    const CATALOG: &str = r#"[
        {
            "title": "Rose Noir",
            "size": "100 ml",
            "price": "฿3,200",
            "image_url": "https://cdn.example.com/rose-noir.jpg",
            "review": "4.8/5",
            "Stock": "In stock",
            "status": "BESTSELLER",
            "top_note": "Bergamot",
            "Heart_Note": "Rose",
            "Base Note": "Patchouli"
        },
        {
            "title": "Citrus Breeze",
            "size": "50 ml",
            "price": "฿2,100",
            "image_url": "https://cdn.example.com/citrus-breeze.jpg",
            "review": null,
            "Stock": "Temporarily out of stock",
            "status": "NEW",
            "top_note": "Lemon",
            "Heart_Note": "Neroli",
            "Base Note": "Cedar"
        }
    ]"#;

    struct RejectingWriter;

    #[async_trait]
    impl CatalogWriter for RejectingWriter {
        async fn import_product(&self, entry: &CatalogEntry) -> Result<(), GraphError> {
            if entry.title == "Rose Noir" {
                return Err(GraphError::Decode("rejected".to_string()));
            }
            Ok(())
        }
    }

    #[test]
    fn test_parse_catalog_reads_scraped_keys() {
        let entries = parse_catalog(CATALOG).expect("catalog");
        assert_eq!(entries.len(), 2);
        let citrus = entries.get(1).expect("second entry");
        assert_eq!(citrus.stock, "Temporarily out of stock");
        assert_eq!(citrus.heart_note, "Neroli");
        assert_eq!(citrus.base_note, "Cedar");
        assert!(citrus.review.is_none());
    }

    #[test]
    fn test_parse_catalog_rejects_malformed_json() {
        assert!(matches!(
            parse_catalog("[{\"title\": "),
            Err(ImportError::Parse(_))
        ));
    }

    #[test]
    fn test_validate_catalog_requires_titles() {
        let mut entries = parse_catalog(CATALOG).expect("catalog");
        if let Some(first) = entries.first_mut() {
            first.title = "  ".to_string();
        }
        let errors = validate_catalog(&entries);
        assert_eq!(errors, vec!["Product at index 0 has no title".to_string()]);
    }

    #[tokio::test]
    async fn test_import_catalog_writes_every_product() {
        let graph = MemoryGraph::new();
        let entries = parse_catalog(CATALOG).expect("catalog");

        let result = import_catalog(&graph, &entries).await.expect("import");
        assert_eq!(result.imported, 2);
        assert_eq!(result.failed, 0);

        let bestsellers = graph
            .search(ProductFilter::Status(ProductStatus::Bestseller))
            .await
            .expect("search");
        assert_eq!(bestsellers.len(), 1);
    }

    #[tokio::test]
    async fn test_import_continues_after_failed_write() {
        let entries = parse_catalog(CATALOG).expect("catalog");
        let result = import_catalog(&RejectingWriter, &entries)
            .await
            .expect("import");
        assert_eq!(result.imported, 1);
        assert_eq!(result.failed, 1);
        assert_eq!(
            result.errors.first().map(|(title, _)| title.as_str()),
            Some("Rose Noir")
        );
    }

    #[tokio::test]
    async fn test_invalid_catalog_writes_nothing() {
        let graph = MemoryGraph::new();
        let entries = parse_catalog(r#"[{"title": ""}]"#).expect("catalog");
        let result = import_catalog(&graph, &entries).await;
        assert!(matches!(result, Err(ImportError::Invalid(_))));
        assert_eq!(graph.product_count().await, 0);
    }
}
