//! Application state shared across handlers.
//!
//! Cloning is cheap: everything lives behind one `Arc`.

use std::sync::Arc;
use std::time::Duration;

use secrecy::SecretString;
use tracing::{info, instrument};

use crate::config::{BotConfig, EmbeddingConfig, GraphConfig};
use crate::error::AppError;
use crate::graph::{GraphStore, MemoryGraph, Neo4jGraph, load_catalog};
use crate::line::{LineClient, ReplySender};
use crate::nlp::{Embedder, EmbeddingClient, IntentResolver, NgramEmbedder, NlpError};
use crate::services::{CatalogService, ConversationService};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: BotConfig,
    graph: Arc<dyn GraphStore>,
    conversation: ConversationService,
    messenger: Arc<dyn ReplySender>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.inner.config)
            .field("conversation", &self.inner.conversation)
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// Assemble state from already-built parts.
    #[must_use]
    pub fn new(
        config: BotConfig,
        graph: Arc<dyn GraphStore>,
        resolver: IntentResolver,
        messenger: Arc<dyn ReplySender>,
    ) -> Self {
        let catalog = CatalogService::new(Arc::clone(&graph), config.title_cache_ttl);
        let conversation =
            ConversationService::new(Arc::new(resolver), catalog, Arc::clone(&graph));

        Self {
            inner: Arc::new(AppStateInner {
                config,
                graph,
                conversation,
                messenger,
            }),
        }
    }

    /// Connect the graph, train the intent resolver and build the LINE client.
    ///
    /// # Errors
    ///
    /// Returns an error if any backing service cannot be initialised.
    #[instrument(skip_all)]
    pub async fn from_config(config: BotConfig) -> Result<Self, AppError> {
        let graph = connect_graph(&config.graph, config.graph_timeout).await?;

        let embedder = build_embedder(config.embedding.as_ref(), config.http_timeout)?;
        let resolver =
            IntentResolver::load(config.intent_examples_path.as_deref(), embedder).await?;
        info!("Intent resolver ready");

        let messenger = LineClient::new(
            config.line.channel_access_token.clone(),
            config.line.api_base.clone(),
            config.http_timeout,
        )?;

        Ok(Self::new(config, graph, resolver, Arc::new(messenger)))
    }

    #[must_use]
    pub fn config(&self) -> &BotConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn graph(&self) -> &dyn GraphStore {
        self.inner.graph.as_ref()
    }

    #[must_use]
    pub fn conversation(&self) -> &ConversationService {
        &self.inner.conversation
    }

    #[must_use]
    pub fn messenger(&self) -> &dyn ReplySender {
        self.inner.messenger.as_ref()
    }

    /// Secret used to verify webhook signatures.
    #[must_use]
    pub fn channel_secret(&self) -> &SecretString {
        &self.inner.config.line.channel_secret
    }
}

/// Open the configured graph backend.
///
/// # Errors
///
/// Returns an error if Neo4j is unreachable or the catalog file is invalid.
pub async fn connect_graph(
    config: &GraphConfig,
    timeout: Duration,
) -> Result<Arc<dyn GraphStore>, AppError> {
    match config {
        GraphConfig::Neo4j(neo4j) => {
            let graph =
                Neo4jGraph::connect(&neo4j.uri, &neo4j.user, &neo4j.password, timeout).await?;
            graph.init_schema().await;
            Ok(Arc::new(graph))
        }
        GraphConfig::Memory { catalog_path } => {
            let entries = load_catalog(catalog_path)
                .await
                .map_err(|e| AppError::Internal(format!("Failed to load catalog: {e}")))?;
            info!(
                path = %catalog_path.display(),
                products = entries.len(),
                "Using in-memory graph"
            );
            Ok(Arc::new(MemoryGraph::with_catalog(&entries)))
        }
    }
}

/// Remote embeddings when configured, local n-gram vectors otherwise.
///
/// # Errors
///
/// Returns an error if the embedding client cannot be built.
pub fn build_embedder(
    config: Option<&EmbeddingConfig>,
    timeout: Duration,
) -> Result<Arc<dyn Embedder>, NlpError> {
    match config {
        Some(embedding) => {
            info!(model = %embedding.model, "Using remote embeddings");
            Ok(Arc::new(EmbeddingClient::new(
                &embedding.api_key,
                embedding.url.clone(),
                embedding.model.clone(),
                timeout,
            )?))
        }
        None => {
            info!("Using local n-gram embeddings");
            Ok(Arc::new(NgramEmbedder::default()))
        }
    }
}

impl Drop for AppStateInner {
    fn drop(&mut self) {
        tracing::info!("Application state dropped");
    }
}
