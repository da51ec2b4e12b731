//! Character n-gram naive Bayes intent classifier.
//!
//! Features are word-bounded character n-grams (1 to 3 characters, each
//! whitespace token padded with a space on both sides) weighted by TF-IDF with
//! smoothed IDF and l2-normalized per document. Classes are scored by a
//! multinomial naive Bayes model with additive smoothing. Character n-grams
//! suit Thai, which does not separate words with spaces.

use std::collections::HashMap;

use perfume_bot_core::Intent;
use tracing::debug;

use super::{NlpError, TrainingSet};

const MIN_NGRAM: usize = 1;
const MAX_NGRAM: usize = 3;
/// Vocabulary cap; the most frequent n-grams are kept.
const MAX_FEATURES: usize = 2000;
/// Additive (Lidstone) smoothing for feature counts.
const SMOOTHING_ALPHA: f64 = 0.1;

/// A classifier prediction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    pub intent: Intent,
    /// Posterior probability of `intent`, in `[0, 1]`.
    pub confidence: f64,
}

/// Trained intent classifier. Immutable once built.
#[derive(Debug, Clone)]
pub struct IntentClassifier {
    vocabulary: HashMap<String, usize>,
    idf: Vec<f64>,
    classes: Vec<Intent>,
    class_log_prior: Vec<f64>,
    /// `feature_log_prob[class][feature]`
    feature_log_prob: Vec<Vec<f64>>,
}

impl IntentClassifier {
    /// Fit the classifier on a normalized training set.
    ///
    /// # Errors
    ///
    /// Returns `NlpError::EmptyTrainingSet` if there are no examples or no
    /// example produces a feature.
    #[allow(clippy::cast_precision_loss)] // corpus sizes are tiny
    pub fn train(training: &TrainingSet) -> Result<Self, NlpError> {
        let examples = training.examples();
        if examples.is_empty() {
            return Err(NlpError::EmptyTrainingSet);
        }

        let counts: Vec<HashMap<String, f64>> = examples
            .iter()
            .map(|example| term_counts(&example.text))
            .collect();

        let mut totals: HashMap<&str, f64> = HashMap::new();
        let mut document_frequency: HashMap<&str, usize> = HashMap::new();
        for doc in &counts {
            for (term, count) in doc {
                *totals.entry(term.as_str()).or_insert(0.0) += count;
                *document_frequency.entry(term.as_str()).or_insert(0) += 1;
            }
        }
        if totals.is_empty() {
            return Err(NlpError::EmptyTrainingSet);
        }

        let mut ranked: Vec<(&str, f64)> = totals.into_iter().collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        ranked.truncate(MAX_FEATURES);
        let mut terms: Vec<&str> = ranked.into_iter().map(|(term, _)| term).collect();
        terms.sort_unstable();

        let n_documents = examples.len() as f64;
        let vocabulary: HashMap<String, usize> = terms
            .iter()
            .enumerate()
            .map(|(index, term)| ((*term).to_string(), index))
            .collect();
        let idf: Vec<f64> = terms
            .iter()
            .map(|term| {
                let df = document_frequency.get(term).copied().unwrap_or(0) as f64;
                ((1.0 + n_documents) / (1.0 + df)).ln() + 1.0
            })
            .collect();

        let mut classes: Vec<Intent> = examples.iter().map(|e| e.intent).collect();
        classes.sort_by_key(Intent::as_str);
        classes.dedup();

        let n_features = terms.len();
        let mut feature_count = vec![vec![0.0_f64; n_features]; classes.len()];
        let mut class_count = vec![0_usize; classes.len()];

        for (example, doc) in examples.iter().zip(&counts) {
            let Some(class) = classes.iter().position(|c| *c == example.intent) else {
                continue;
            };
            if let Some(slot) = class_count.get_mut(class) {
                *slot += 1;
            }
            let vector = tfidf_vector(doc, &vocabulary, &idf);
            if let Some(row) = feature_count.get_mut(class) {
                for (feature, weight) in vector {
                    if let Some(cell) = row.get_mut(feature) {
                        *cell += weight;
                    }
                }
            }
        }

        let class_log_prior = class_count
            .iter()
            .map(|&count| (count as f64 / n_documents).ln())
            .collect();

        let feature_log_prob = feature_count
            .iter()
            .map(|row| {
                let smoothed_total: f64 =
                    row.iter().sum::<f64>() + SMOOTHING_ALPHA * n_features as f64;
                row.iter()
                    .map(|count| (count + SMOOTHING_ALPHA).ln() - smoothed_total.ln())
                    .collect()
            })
            .collect();

        debug!(
            features = n_features,
            classes = classes.len(),
            documents = examples.len(),
            "Intent classifier trained"
        );

        Ok(Self {
            vocabulary,
            idf,
            classes,
            class_log_prior,
            feature_log_prob,
        })
    }

    /// Number of n-gram features retained.
    #[must_use]
    pub fn feature_count(&self) -> usize {
        self.vocabulary.len()
    }

    /// Predict the most probable intent for normalized text.
    ///
    /// Text with no known n-grams falls back to the class priors.
    #[must_use]
    pub fn predict(&self, normalized_text: &str) -> Option<Prediction> {
        let vector = tfidf_vector(&term_counts(normalized_text), &self.vocabulary, &self.idf);

        let joint: Vec<f64> = self
            .class_log_prior
            .iter()
            .zip(&self.feature_log_prob)
            .map(|(prior, log_probs)| {
                prior
                    + vector
                        .iter()
                        .map(|(feature, weight)| {
                            weight * log_probs.get(*feature).copied().unwrap_or(0.0)
                        })
                        .sum::<f64>()
            })
            .collect();

        let max = joint.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if !max.is_finite() {
            return None;
        }
        let normalizer: f64 = joint.iter().map(|score| (score - max).exp()).sum();

        let (best, best_score) = joint
            .iter()
            .enumerate()
            .fold(None, |best: Option<(usize, f64)>, (index, &score)| match best {
                Some((_, current)) if current >= score => best,
                _ => Some((index, score)),
            })?;

        Some(Prediction {
            intent: *self.classes.get(best)?,
            confidence: (best_score - max).exp() / normalizer,
        })
    }
}

/// Word-bounded character n-grams of a text.
pub(crate) fn char_ngrams(text: &str) -> Vec<String> {
    let mut grams = Vec::new();
    for word in text.split_whitespace() {
        let padded: Vec<char> = std::iter::once(' ')
            .chain(word.chars())
            .chain(std::iter::once(' '))
            .collect();
        for n in MIN_NGRAM..=MAX_NGRAM {
            if n >= padded.len() {
                // short word: count the whole padded word once
                grams.push(padded.iter().collect());
                break;
            }
            grams.extend(padded.windows(n).map(|window| window.iter().collect()));
        }
    }
    grams
}

fn term_counts(text: &str) -> HashMap<String, f64> {
    let mut counts = HashMap::new();
    for gram in char_ngrams(text) {
        *counts.entry(gram).or_insert(0.0) += 1.0;
    }
    counts
}

/// Sparse, l2-normalized TF-IDF vector restricted to the vocabulary.
fn tfidf_vector(
    counts: &HashMap<String, f64>,
    vocabulary: &HashMap<String, usize>,
    idf: &[f64],
) -> Vec<(usize, f64)> {
    let mut vector: Vec<(usize, f64)> = counts
        .iter()
        .filter_map(|(term, count)| {
            let feature = *vocabulary.get(term)?;
            Some((feature, count * idf.get(feature).copied().unwrap_or(1.0)))
        })
        .collect();

    let norm = vector.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
    if norm > 0.0 {
        for (_, weight) in &mut vector {
            *weight /= norm;
        }
    }
    vector
}
