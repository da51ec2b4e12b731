//! Intent resolver combining keyword scores, the classifier and the
//! nearest-neighbour fallback.
//!
//! 1. Normalize the message
//! 2. Score keywords and run the classifier on the normalized text
//! 3. Prefer the keyword intent unless the classifier is confident
//! 4. Below [`FALLBACK_CONFIDENCE`], consult the fallback index with the raw
//!    message; a greeting match short-circuits the turn

use std::path::Path;
use std::sync::Arc;

use perfume_bot_core::Intent;
use tracing::{debug, info, instrument, warn};

use super::{
    Embedder, FallbackIndex, FallbackMatch, IntentClassifier, KeywordMatch, KeywordTable,
    NlpError, Prediction, TextNormalizer, TrainingSet, build_training_set, default_training_set,
    load_config,
};

/// Classifier confidence at or above which keyword scores are ignored.
pub const CLASSIFIER_OVERRIDE_CONFIDENCE: f64 = 0.8;

/// Winning confidence below which the fallback index is consulted.
pub const FALLBACK_CONFIDENCE: f64 = 0.5;

/// Which signal produced the intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntentSource {
    Keyword,
    Classifier,
}

impl IntentSource {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Keyword => "keyword",
            Self::Classifier => "classifier",
        }
    }
}

/// Outcome of intent resolution.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// A recognised intent.
    Intent {
        intent: Intent,
        confidence: f64,
        source: IntentSource,
    },
    /// The fallback matched the canonical greeting; reply with `reply`.
    Greeting { reply: String },
    /// Classification failed.
    Unknown,
}

/// Everything the resolver learned about a message.
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    pub normalized: String,
    pub keyword: Option<KeywordMatch>,
    pub prediction: Option<Prediction>,
    pub fallback: Option<FallbackMatch>,
    pub resolution: Resolution,
}

impl Analysis {
    /// The resolved intent, if any.
    #[must_use]
    pub const fn intent(&self) -> Option<Intent> {
        match &self.resolution {
            Resolution::Intent { intent, .. } => Some(*intent),
            Resolution::Greeting { .. } | Resolution::Unknown => None,
        }
    }
}

/// Resolves free text into an intent. Built once at startup.
#[derive(Debug, Clone)]
pub struct IntentResolver {
    normalizer: TextNormalizer,
    keywords: KeywordTable,
    classifier: IntentClassifier,
    fallback: FallbackIndex,
}

impl IntentResolver {
    /// Train the classifier and assemble the resolver.
    ///
    /// # Errors
    ///
    /// Returns an error if the training set is empty.
    pub fn new(training: &TrainingSet, fallback: FallbackIndex) -> Result<Self, NlpError> {
        let normalizer = TextNormalizer::new();
        let keywords = KeywordTable::new(&normalizer);
        let classifier = IntentClassifier::train(training)?;

        info!(
            examples = training.len(),
            features = classifier.feature_count(),
            "Intent resolver ready"
        );

        Ok(Self {
            normalizer,
            keywords,
            classifier,
            fallback,
        })
    }

    /// Train on `examples_path` (or the built-in phrases) and index the
    /// fallback seeds with `embedder`.
    ///
    /// # Errors
    ///
    /// Returns an error if the phrases cannot be loaded or the seeds cannot
    /// be embedded.
    pub async fn load(
        examples_path: Option<&Path>,
        embedder: Arc<dyn Embedder>,
    ) -> Result<Self, NlpError> {
        let normalizer = TextNormalizer::new();
        let training = match examples_path {
            Some(path) => build_training_set(&load_config(path).await?, &normalizer)?,
            None => default_training_set(&normalizer)?,
        };
        let fallback = FallbackIndex::build(embedder).await?;
        Self::new(&training, fallback)
    }

    #[must_use]
    pub const fn normalizer(&self) -> &TextNormalizer {
        &self.normalizer
    }

    #[must_use]
    pub const fn keywords(&self) -> &KeywordTable {
        &self.keywords
    }

    /// Resolve a raw message.
    ///
    /// Never fails: classification errors resolve to [`Resolution::Unknown`].
    #[instrument(skip(self, message), fields(message_len = message.len()))]
    pub async fn resolve(&self, message: &str) -> Analysis {
        let normalized = self.normalizer.normalize(message);
        let keyword = self.keywords.best_match(&normalized);
        let prediction = self.classifier.predict(&normalized);

        debug!(
            normalized = %normalized,
            keyword = ?keyword.map(|k| k.intent),
            keyword_score = keyword.map_or(0, |k| k.score),
            predicted = ?prediction.map(|p| p.intent),
            predicted_confidence = prediction.map_or(0.0, |p| p.confidence),
            "Intent signals"
        );

        let Some(predicted) = prediction else {
            warn!("Classifier produced no prediction");
            return Analysis {
                normalized,
                keyword,
                prediction,
                fallback: None,
                resolution: Resolution::Unknown,
            };
        };

        let (intent, confidence, source) = match keyword {
            Some(matched)
                if matched.score >= 1
                    && predicted.confidence < CLASSIFIER_OVERRIDE_CONFIDENCE =>
            {
                (matched.intent, matched.confidence(), IntentSource::Keyword)
            }
            _ => (
                predicted.intent,
                predicted.confidence,
                IntentSource::Classifier,
            ),
        };

        let mut fallback = None;
        if confidence < FALLBACK_CONFIDENCE {
            match self.fallback.lookup(message).await {
                Ok(matched) if matched.is_greeting() => {
                    let reply = matched.category.clone();
                    return Analysis {
                        normalized,
                        keyword,
                        prediction,
                        fallback: Some(matched),
                        resolution: Resolution::Greeting { reply },
                    };
                }
                Ok(matched) => fallback = Some(matched),
                Err(e) => {
                    warn!(error = %e, "Fallback lookup failed");
                    return Analysis {
                        normalized,
                        keyword,
                        prediction,
                        fallback: None,
                        resolution: Resolution::Unknown,
                    };
                }
            }
        }

        info!(
            intent = %intent,
            confidence,
            source = source.as_str(),
            "Intent resolved"
        );

        Analysis {
            normalized,
            keyword,
            prediction,
            fallback,
            resolution: Resolution::Intent {
                intent,
                confidence,
                source,
            },
        }
    }
}
