//! Labelled training phrases for the intent classifier.
//!
//! Phrases are kept in YAML so they can be tuned without a rebuild. The
//! default set is compiled into the binary; `INTENT_EXAMPLES_PATH` points the
//! bot at a replacement file.
//!
//! ## YAML Format
//!
//! ```yaml
//! greeting:
//!   - สวัสดี
//!   - hello
//!
//! product_bestseller:
//!   - สินค้าขายดี
//!   - perfume ขายดี
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use perfume_bot_core::Intent;
use tracing::{info, instrument};

use super::{NlpError, TextNormalizer};

/// Built-in training phrases.
pub const DEFAULT_INTENT_EXAMPLES: &str = include_str!("../../data/intent_examples.yaml");

/// Intent label to example phrases, as written in the YAML file.
pub type IntentExamplesConfig = BTreeMap<String, Vec<String>>;

/// One normalized, labelled phrase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainingExample {
    pub text: String,
    pub intent: Intent,
}

/// Validated, normalized phrases ready for training.
#[derive(Debug, Clone, Default)]
pub struct TrainingSet {
    examples: Vec<TrainingExample>,
}

impl TrainingSet {
    /// The normalized examples.
    #[must_use]
    pub fn examples(&self) -> &[TrainingExample] {
        &self.examples
    }

    /// Number of examples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.examples.len()
    }

    /// Whether the set has no examples.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }
}

/// Parse a YAML training file.
///
/// # Errors
///
/// Returns `NlpError::Config` if the YAML is malformed.
pub fn parse_config(yaml: &str) -> Result<IntentExamplesConfig, NlpError> {
    serde_yaml::from_str(yaml).map_err(|e| NlpError::Config(format!("Failed to parse YAML: {e}")))
}

/// Read and parse a YAML training file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
#[instrument(fields(path = %path.as_ref().display()))]
pub async fn load_config<P: AsRef<Path>>(path: P) -> Result<IntentExamplesConfig, NlpError> {
    let path = path.as_ref();
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| NlpError::Io(format!("Failed to read {}: {}", path.display(), e)))?;
    parse_config(&content)
}

/// Validate a training configuration.
///
/// Checks that every label is a known intent and that phrases are not empty.
#[must_use]
pub fn validate_config(config: &IntentExamplesConfig) -> Vec<String> {
    let mut errors = Vec::new();

    for (label, phrases) in config {
        if label.parse::<Intent>().is_err() {
            errors.push(format!("Unknown intent: {label}"));
        }

        if phrases.is_empty() {
            errors.push(format!("No examples provided for intent: {label}"));
        }

        for (i, phrase) in phrases.iter().enumerate() {
            if phrase.trim().is_empty() {
                errors.push(format!(
                    "Empty example string at index {i} for intent: {label}"
                ));
            }
        }
    }

    errors
}

/// Validate and normalize a configuration into a training set.
///
/// # Errors
///
/// Returns `NlpError::Config` listing every validation problem, or
/// `NlpError::EmptyTrainingSet` if nothing survives normalization.
pub fn build_training_set(
    config: &IntentExamplesConfig,
    normalizer: &TextNormalizer,
) -> Result<TrainingSet, NlpError> {
    let errors = validate_config(config);
    if !errors.is_empty() {
        return Err(NlpError::Config(errors.join("; ")));
    }

    let mut examples = Vec::new();
    for (label, phrases) in config {
        let intent: Intent = label
            .parse()
            .map_err(|e: perfume_bot_core::IntentParseError| NlpError::Config(e.to_string()))?;
        for phrase in phrases {
            let text = normalizer.normalize(phrase);
            if !text.is_empty() {
                examples.push(TrainingExample { text, intent });
            }
        }
    }

    if examples.is_empty() {
        return Err(NlpError::EmptyTrainingSet);
    }

    info!(
        examples = examples.len(),
        intents = config.len(),
        "Training set prepared"
    );

    Ok(TrainingSet { examples })
}

/// Training set from the built-in phrases.
///
/// # Errors
///
/// Returns an error only if the embedded YAML is invalid.
pub fn default_training_set(normalizer: &TextNormalizer) -> Result<TrainingSet, NlpError> {
    build_training_set(&parse_config(DEFAULT_INTENT_EXAMPLES)?, normalizer)
}
