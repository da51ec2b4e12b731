//! Sentence embeddings for the nearest-neighbour fallback.
//!
//! Two implementations sit behind the [`Embedder`] trait:
//! - [`EmbeddingClient`] calls an `OpenAI`-compatible `/embeddings` endpoint
//! - [`NgramEmbedder`] hashes character n-grams locally, for deployments
//!   without an embedding service and for tests

use std::hash::{DefaultHasher, Hash, Hasher};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::NlpError;
use super::classifier::char_ngrams;

/// Default dimensionality of the local n-gram embedder.
pub const DEFAULT_NGRAM_DIMENSIONS: usize = 256;

/// Turns text into dense vectors.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, NlpError>;

    /// Embed several texts; the default issues one call per text.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, NlpError> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for text in texts {
            embeddings.push(self.embed(text).await?);
        }
        Ok(embeddings)
    }
}

/// Client for generating text embeddings via an `OpenAI`-compatible API.
#[derive(Clone)]
pub struct EmbeddingClient {
    client: reqwest::Client,
    url: String,
    model: String,
}

impl std::fmt::Debug for EmbeddingClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddingClient")
            .field("url", &self.url)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl EmbeddingClient {
    /// Create a new embedding client.
    ///
    /// # Errors
    ///
    /// Returns `NlpError::Config` if the API key is not a valid header value
    /// or the HTTP client cannot be built.
    pub fn new(
        api_key: &SecretString,
        url: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, NlpError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", api_key.expose_secret()))
            .map_err(|_| NlpError::Config("Invalid embedding API key for header".to_string()))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| NlpError::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            url: url.into(),
            model: model.into(),
        })
    }

    async fn request(&self, input: EmbeddingInput<'_>) -> Result<Vec<Vec<f32>>, NlpError> {
        let request = EmbeddingRequest {
            model: &self.model,
            input,
        };

        let response = self.client.post(&self.url).json(&request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NlpError::Embedding(format!(
                "Embedding API error ({status}): {body}"
            )));
        }

        let response: EmbeddingResponse = response.json().await?;
        Ok(response.data.into_iter().map(|d| d.embedding).collect())
    }
}

#[async_trait]
impl Embedder for EmbeddingClient {
    #[instrument(skip(self, text), fields(text_len = text.len()))]
    async fn embed(&self, text: &str) -> Result<Vec<f32>, NlpError> {
        let embedding = self
            .request(EmbeddingInput::Single(text))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| {
                NlpError::InvalidResponse("No embedding data in response".to_string())
            })?;

        if embedding.is_empty() {
            return Err(NlpError::InvalidResponse("Empty embedding".to_string()));
        }

        Ok(embedding)
    }

    #[instrument(skip(self, texts), fields(count = texts.len()))]
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, NlpError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let embeddings = self.request(EmbeddingInput::Batch(texts)).await?;

        if embeddings.len() != texts.len() {
            return Err(NlpError::InvalidResponse(format!(
                "Expected {} embeddings, got {}",
                texts.len(),
                embeddings.len()
            )));
        }

        Ok(embeddings)
    }
}

/// Local embedder: hashed bag of word-bounded character n-grams.
#[derive(Debug, Clone, Copy)]
pub struct NgramEmbedder {
    dimensions: usize,
}

impl Default for NgramEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_NGRAM_DIMENSIONS)
    }
}

impl NgramEmbedder {
    /// Create an embedder producing vectors of `dimensions` entries.
    #[must_use]
    pub const fn new(dimensions: usize) -> Self {
        Self {
            dimensions: if dimensions == 0 { 1 } else { dimensions },
        }
    }

    /// Embed without going through the async trait.
    #[must_use]
    pub fn embed_sync(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0_f32; self.dimensions];
        for gram in char_ngrams(&text.to_lowercase()) {
            let mut hasher = DefaultHasher::new();
            gram.hash(&mut hasher);
            #[allow(clippy::cast_possible_truncation)] // reduced modulo a usize
            let bucket = (hasher.finish() % self.dimensions as u64) as usize;
            if let Some(slot) = vector.get_mut(bucket) {
                *slot += 1.0;
            }
        }
        vector
    }
}

#[async_trait]
impl Embedder for NgramEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, NlpError> {
        Ok(self.embed_sync(text))
    }
}

/// Request body for the embeddings endpoint.
#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: EmbeddingInput<'a>,
}

/// A single string or a batch of strings.
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum EmbeddingInput<'a> {
    Single(&'a str),
    Batch(&'a [&'a str]),
}

/// Response from the embeddings endpoint.
#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

/// Single embedding in the response.
#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ngram_embedder_is_deterministic() {
        let embedder = NgramEmbedder::default();
        assert_eq!(embedder.embed_sync("สวัสดี"), embedder.embed_sync("สวัสดี"));
        assert_eq!(embedder.embed_sync("สวัสดี").len(), DEFAULT_NGRAM_DIMENSIONS);
    }

    #[test]
    fn test_ngram_embedder_counts_every_gram() {
        let embedder = NgramEmbedder::new(16);
        let total: f32 = embedder.embed_sync("ab").iter().sum();
        // 4 unigrams + 3 bigrams + 2 trigrams
        assert!((total - 9.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_ngram_embedder_ignores_case() {
        let embedder = NgramEmbedder::default();
        assert_eq!(embedder.embed_sync("AYYO"), embedder.embed_sync("ayyo"));
    }

    #[test]
    fn test_zero_dimensions_is_clamped() {
        assert_eq!(NgramEmbedder::new(0).embed_sync("hi").len(), 1);
    }

    #[tokio::test]
    async fn test_default_batch_embeds_each_text() {
        let embedder = NgramEmbedder::new(8);
        let batch = embedder
            .embed_batch(&["hello", "ayyo"])
            .await
            .expect("embed batch");
        assert_eq!(batch.len(), 2);
        assert_eq!(batch.first(), Some(&embedder.embed_sync("hello")));
    }

    #[test]
    fn test_request_serializes_single_and_batch_input() {
        let single = EmbeddingRequest {
            model: "text-embedding-3-small",
            input: EmbeddingInput::Single("hi"),
        };
        let json = serde_json::to_value(&single).expect("serialize");
        assert_eq!(json["input"], "hi");

        let texts = ["a", "b"];
        let batch = EmbeddingRequest {
            model: "text-embedding-3-small",
            input: EmbeddingInput::Batch(&texts),
        };
        let json = serde_json::to_value(&batch).expect("serialize");
        assert_eq!(json["input"], serde_json::json!(["a", "b"]));
    }

    #[test]
    fn test_client_debug_hides_key() {
        let client = EmbeddingClient::new(
            &SecretString::from("sk-test-key".to_string()),
            "https://api.openai.com/v1/embeddings",
            "text-embedding-3-small",
            Duration::from_secs(5),
        )
        .expect("client");
        let debug = format!("{client:?}");
        assert!(!debug.contains("sk-test-key"));
        assert!(debug.contains("text-embedding-3-small"));
    }
}
