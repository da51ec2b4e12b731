//! Intent resolution for customer chat messages.
//!
//! Customers write in Thai, English, or a mix of both. Resolution runs in
//! three stages:
//!
//! 1. **Normalization** - fold languages, spelling variants and particles
//!    into one vocabulary ([`TextNormalizer`])
//! 2. **Scoring** - keyword counts ([`KeywordTable`]) and a character n-gram
//!    naive Bayes classifier ([`IntentClassifier`])
//! 3. **Fallback** - when neither signal is confident, a nearest-neighbour
//!    lookup over seed phrases ([`FallbackIndex`]) catches greetings
//!
//! ## Training
//!
//! The classifier is trained at startup from labelled phrases in YAML (see
//! [`training`]). Nothing is persisted; restarting the bot retrains it.

mod classifier;
mod embeddings;
mod error;
mod fallback;
mod keywords;
mod normalizer;
mod resolver;
pub mod training;

pub use classifier::{IntentClassifier, Prediction};
pub use embeddings::{DEFAULT_NGRAM_DIMENSIONS, Embedder, EmbeddingClient, NgramEmbedder};
pub use error::NlpError;
pub use fallback::{FallbackIndex, FallbackMatch, GREETING_SEED, MATCH_THRESHOLD};
pub use keywords::{KeywordMatch, KeywordTable};
pub use normalizer::TextNormalizer;
pub use resolver::{
    Analysis, CLASSIFIER_OVERRIDE_CONFIDENCE, FALLBACK_CONFIDENCE, IntentResolver, IntentSource,
    Resolution,
};
pub use training::{
    IntentExamplesConfig, TrainingExample, TrainingSet, build_training_set, default_training_set,
    load_config, parse_config, validate_config,
};
