//! Application configuration builders.
//!
//! Constructs the scoring weights and the post generator from `Config`.

use anyhow::Context;
use postforge_core::Config;
use postforge_llm::PostGenerator;
use postforge_scoring::{ScoringConfigError, ScoringWeights};
use tracing::{info, warn};

/// Weights from `SCORING_CONFIG` when set, built-in defaults otherwise.
/// A configured file that fails to load is an error, not a silent fallback.
pub fn load_weights(config: &Config) -> Result<ScoringWeights, ScoringConfigError> {
    match &config.generation.scoring_config {
        Some(path) => ScoringWeights::from_yaml_file(path),
        None => {
            info!("SCORING_CONFIG not set, using built-in engagement weights");
            Ok(ScoringWeights::default())
        }
    }
}

/// Build the post generator. `Ok(None)` if no LLM provider is usable; a
/// configured `PROMPT_TEMPLATE` that cannot be read or lacks the style
/// placeholder is an error.
pub fn build_generator(config: &Config) -> anyhow::Result<Option<PostGenerator>> {
    let generator = match PostGenerator::from_config(&config.llm, &config.ollama) {
        Ok(generator) => generator,
        Err(e) => {
            warn!("Post generator not available: {} (POST /api/generate disabled)", e);
            return Ok(None);
        }
    };
    let generator = match &config.generation.prompt_template {
        Some(path) => {
            let template = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read prompt template {}", path.display()))?;
            info!(path = %path.display(), "using custom post-writer prompt");
            generator.with_template(template)?
        }
        None => generator,
    };
    info!("Post generator ready (provider: {})", generator.provider_name());
    Ok(Some(generator))
}
