//! Intent diagnostics.
//!
//! Trains the resolver the same way the server does and prints every signal
//! it produced for one message.

use tracing::info;

use perfume_bot::config::ToolConfig;
use perfume_bot::nlp::{IntentResolver, Resolution};
use perfume_bot::services::replies::{NOT_UNDERSTOOD, intent_reply};
use perfume_bot::state::build_embedder;

/// Classify a message and print the result.
///
/// # Errors
///
/// Returns an error if the training phrases or embeddings cannot be loaded.
pub async fn message(text: &str) -> Result<(), Box<dyn std::error::Error>> {
    let config = ToolConfig::from_env()?;
    let embedder = build_embedder(config.embedding.as_ref(), config.http_timeout)?;
    let resolver = IntentResolver::load(config.intent_examples_path.as_deref(), embedder).await?;

    let analysis = resolver.resolve(text).await;

    info!("Input:      {text}");
    info!("Normalized: {}", analysis.normalized);

    match &analysis.keyword {
        Some(m) => info!("Keywords:   {} ({}/{})", m.intent, m.score, m.total),
        None => info!("Keywords:   none"),
    }
    match &analysis.prediction {
        Some(p) => info!("Classifier: {} ({:.3})", p.intent, p.confidence),
        None => info!("Classifier: unavailable"),
    }
    if let Some(f) = &analysis.fallback {
        info!(
            "Fallback:   '{}' [{}] distance {:.3}",
            f.sentence, f.category, f.distance
        );
    }

    let reply = match &analysis.resolution {
        Resolution::Intent {
            intent,
            confidence,
            source,
        } => {
            info!(
                "Resolved:   {intent} ({confidence:.3} via {})",
                source.as_str()
            );
            intent_reply(*intent).to_string()
        }
        Resolution::Greeting { reply } => {
            info!("Resolved:   greeting (fallback)");
            reply.clone()
        }
        Resolution::Unknown => {
            info!("Resolved:   unknown");
            NOT_UNDERSTOOD.to_string()
        }
    };

    info!("Reply:      {reply}");

    let suggestions = resolver.keywords().matching_intents(&analysis.normalized);
    if !suggestions.is_empty() {
        let labels: Vec<&str> = suggestions.iter().map(|i| i.as_str()).collect();
        info!("Keyword hits: {}", labels.join(", "));
    }

    Ok(())
}
