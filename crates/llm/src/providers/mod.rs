pub mod claude;
pub mod ollama;
pub mod openai;

use std::time::Duration;

use postforge_core::config::{LlmConfig, OllamaConfig};

use crate::provider::{LlmError, LlmProvider};

/// Generation calls are single, non-streamed completions; anything slower
/// than this is treated as a failed request.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

pub(crate) fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

/// Create the appropriate LLM provider based on config.
pub fn create_provider(
    llm_config: &LlmConfig,
    ollama_config: &OllamaConfig,
) -> Result<Box<dyn LlmProvider>, LlmError> {
    match llm_config.provider.as_str() {
        "openai" => {
            let api_key = llm_config
                .openai_api_key
                .as_ref()
                .ok_or_else(|| LlmError::NotConfigured("OPENAI_API_KEY not set".into()))?;
            let base_url = llm_config
                .openai_base_url
                .as_deref()
                .unwrap_or("https://api.openai.com");
            Ok(Box::new(openai::OpenAiProvider::new(
                api_key.clone(),
                llm_config.openai_model.clone(),
                base_url.trim_end_matches('/').to_string(),
            )))
        }
        "anthropic" | "claude" => {
            let api_key = llm_config
                .anthropic_api_key
                .as_ref()
                .ok_or_else(|| LlmError::NotConfigured("ANTHROPIC_API_KEY not set".into()))?;
            Ok(Box::new(claude::ClaudeProvider::new(
                api_key.clone(),
                llm_config.anthropic_model.clone(),
            )))
        }
        "ollama" => Ok(Box::new(ollama::OllamaProvider::new(
            ollama_config.url.trim_end_matches('/').to_string(),
            ollama_config.model.clone(),
        ))),
        other => Err(LlmError::NotConfigured(format!(
            "unknown LLM provider: '{}'",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn llm(provider: &str) -> LlmConfig {
        LlmConfig {
            provider: provider.into(),
            openai_api_key: None,
            openai_model: "gpt-4o-mini".into(),
            openai_base_url: None,
            anthropic_api_key: None,
            anthropic_model: "claude-sonnet-4-5-20250929".into(),
            temperature: 0.7,
            max_tokens: 1024,
        }
    }

    fn ollama() -> OllamaConfig {
        OllamaConfig { url: "http://localhost:11434/".into(), model: "llama3.2".into() }
    }

    #[test]
    fn missing_key_is_not_configured() {
        let err = create_provider(&llm("openai"), &ollama()).err().unwrap();
        assert!(matches!(err, LlmError::NotConfigured(msg) if msg.contains("OPENAI_API_KEY")));
        let err = create_provider(&llm("anthropic"), &ollama()).err().unwrap();
        assert!(matches!(err, LlmError::NotConfigured(msg) if msg.contains("ANTHROPIC_API_KEY")));
    }

    #[test]
    fn unknown_provider_rejected() {
        assert!(create_provider(&llm("bard"), &ollama()).is_err());
    }

    #[test]
    fn builds_each_known_provider() {
        let mut cfg = llm("openai");
        cfg.openai_api_key = Some("sk-test".into());
        assert_eq!(create_provider(&cfg, &ollama()).unwrap().name(), "openai");

        cfg.provider = "claude".into();
        cfg.anthropic_api_key = Some("sk-ant".into());
        assert_eq!(create_provider(&cfg, &ollama()).unwrap().name(), "anthropic");

        assert_eq!(create_provider(&llm("ollama"), &ollama()).unwrap().name(), "ollama");
    }
}
