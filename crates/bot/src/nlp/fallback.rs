//! Nearest-neighbour lookup consulted when intent confidence is low.
//!
//! A tiny in-memory index of seed phrases, searched by squared Euclidean
//! distance between l2-normalized embeddings. The only seed that changes the
//! conversation is the canonical greeting: a close match short-circuits the
//! turn with the seed's reply.

use std::sync::Arc;

use tracing::{debug, instrument};

use super::{Embedder, NlpError};

/// Seed phrase whose match short-circuits the turn with a greeting.
pub const GREETING_SEED: &str = "สวัสดี";

/// Maximum squared distance for a seed to count as a match.
pub const MATCH_THRESHOLD: f32 = 0.4;

/// Seed phrases and the reply category each maps to.
const SEEDS: [(&str, &str); 2] = [(GREETING_SEED, "สวัสดีค่ะ"), ("ayyo", "ayyo")];

/// Result of a fallback lookup.
///
/// Without a match within [`MATCH_THRESHOLD`], both fields echo the query.
#[derive(Debug, Clone, PartialEq)]
pub struct FallbackMatch {
    pub sentence: String,
    pub category: String,
    /// Squared distance to the nearest seed.
    pub distance: f32,
}

impl FallbackMatch {
    /// Whether the nearest seed is the canonical greeting.
    #[must_use]
    pub fn is_greeting(&self) -> bool {
        self.sentence == GREETING_SEED
    }
}

#[derive(Debug, Clone)]
struct Seed {
    sentence: &'static str,
    category: &'static str,
    vector: Vec<f32>,
}

/// In-memory seed index. Built once at startup, read-only afterwards.
#[derive(Clone)]
pub struct FallbackIndex {
    embedder: Arc<dyn Embedder>,
    seeds: Vec<Seed>,
}

impl std::fmt::Debug for FallbackIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FallbackIndex")
            .field("seeds", &self.seeds.len())
            .finish_non_exhaustive()
    }
}

impl FallbackIndex {
    /// Embed the seed phrases and build the index.
    ///
    /// # Errors
    ///
    /// Returns an error if embedding fails or the embedder returns vectors of
    /// inconsistent dimensions.
    #[instrument(skip(embedder))]
    pub async fn build(embedder: Arc<dyn Embedder>) -> Result<Self, NlpError> {
        let sentences: Vec<&str> = SEEDS.iter().map(|(sentence, _)| *sentence).collect();
        let vectors = embedder.embed_batch(&sentences).await?;

        if vectors.len() != SEEDS.len() {
            return Err(NlpError::InvalidResponse(format!(
                "Expected {} seed embeddings, got {}",
                SEEDS.len(),
                vectors.len()
            )));
        }

        let seeds: Vec<Seed> = SEEDS
            .iter()
            .zip(vectors)
            .map(|((sentence, category), vector)| Seed {
                sentence,
                category,
                vector: l2_normalize(vector),
            })
            .collect();

        let dimensions = seeds.first().map_or(0, |seed| seed.vector.len());
        if dimensions == 0 || seeds.iter().any(|seed| seed.vector.len() != dimensions) {
            return Err(NlpError::InvalidResponse(
                "Seed embeddings have inconsistent dimensions".to_string(),
            ));
        }

        debug!(seeds = seeds.len(), dimensions, "Fallback index built");

        Ok(Self { embedder, seeds })
    }

    /// Find the seed nearest to `text`.
    ///
    /// # Errors
    ///
    /// Returns an error if embedding fails or the query vector's dimension
    /// differs from the seeds'.
    #[instrument(skip(self, text))]
    pub async fn lookup(&self, text: &str) -> Result<FallbackMatch, NlpError> {
        let query = l2_normalize(self.embedder.embed(text).await?);

        let mut nearest: Option<(&Seed, f32)> = None;
        for seed in &self.seeds {
            if seed.vector.len() != query.len() {
                return Err(NlpError::InvalidResponse(format!(
                    "Query embedding has {} dimensions, seeds have {}",
                    query.len(),
                    seed.vector.len()
                )));
            }
            let distance = squared_distance(&seed.vector, &query);
            if nearest.is_none_or(|(_, best)| distance < best) {
                nearest = Some((seed, distance));
            }
        }

        let result = match nearest {
            Some((seed, distance)) if distance <= MATCH_THRESHOLD => FallbackMatch {
                sentence: seed.sentence.to_string(),
                category: seed.category.to_string(),
                distance,
            },
            Some((_, distance)) => FallbackMatch {
                sentence: text.to_string(),
                category: text.to_string(),
                distance,
            },
            None => FallbackMatch {
                sentence: text.to_string(),
                category: text.to_string(),
                distance: f32::INFINITY,
            },
        };

        debug!(
            sentence = %result.sentence,
            distance = result.distance,
            "Fallback lookup"
        );

        Ok(result)
    }
}

fn l2_normalize(mut vector: Vec<f32>) -> Vec<f32> {
    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in &mut vector {
            *x /= norm;
        }
    }
    vector
}

fn squared_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nlp::NgramEmbedder;
    use async_trait::async_trait;

    struct FixedEmbedder(Vec<f32>);

    #[async_trait]
    impl Embedder for FixedEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>, NlpError> {
            Ok(self.0.clone())
        }
    }

    struct FailingEmbedder;

    #[async_trait]
    impl Embedder for FailingEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>, NlpError> {
            Err(NlpError::Embedding("service unavailable".to_string()))
        }
    }

    async fn ngram_index() -> FallbackIndex {
        FallbackIndex::build(Arc::new(NgramEmbedder::default()))
            .await
            .expect("index")
    }

    #[tokio::test]
    async fn test_greeting_matches_itself() {
        let index = ngram_index().await;
        let result = index.lookup("สวัสดี").await.expect("lookup");
        assert!(result.is_greeting());
        assert_eq!(result.category, "สวัสดีค่ะ");
        assert!(result.distance < 1e-6);
    }

    #[tokio::test]
    async fn test_distant_text_echoes_query() {
        let index = ngram_index().await;
        let result = index.lookup("ขอดูกระเป๋าหนัง").await.expect("lookup");
        assert!(!result.is_greeting());
        assert_eq!(result.sentence, "ขอดูกระเป๋าหนัง");
        assert_eq!(result.category, "ขอดูกระเป๋าหนัง");
        assert!(result.distance > MATCH_THRESHOLD);
    }

    #[tokio::test]
    async fn test_non_greeting_seed_match_is_not_greeting() {
        let index = ngram_index().await;
        let result = index.lookup("ayyo").await.expect("lookup");
        assert_eq!(result.sentence, "ayyo");
        assert!(!result.is_greeting());
    }

    #[tokio::test]
    async fn test_build_propagates_embedding_errors() {
        let result = FallbackIndex::build(Arc::new(FailingEmbedder)).await;
        assert!(matches!(result, Err(NlpError::Embedding(_))));
    }

    #[tokio::test]
    async fn test_zero_vectors_are_rejected() {
        let result = FallbackIndex::build(Arc::new(FixedEmbedder(Vec::new()))).await;
        assert!(matches!(result, Err(NlpError::InvalidResponse(_))));
    }

    #[test]
    fn test_l2_normalize_unit_length() {
        let v = l2_normalize(vec![3.0, 4.0]);
        assert!((v.iter().map(|x| x * x).sum::<f32>() - 1.0).abs() < 1e-6);
        assert_eq!(l2_normalize(vec![0.0, 0.0]), vec![0.0, 0.0]);
    }

    #[test]
    fn test_squared_distance() {
        assert!((squared_distance(&[1.0, 0.0], &[0.0, 1.0]) - 2.0).abs() < 1e-6);
    }
}
