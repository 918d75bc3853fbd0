use postforge_core::{extract_hashtags, PostLength, Tone, WritingStyle, MAX_POST_CHARS};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::provider::{LlmError, LlmProvider, Message};

/// System prompt template, bundled at compile time.
const POST_WRITER_TEMPLATE: &str = include_str!("../../../data/prompts/post-writer-system.md");

/// Placeholder in the template that gets replaced with the author's voice samples.
const STYLE_PLACEHOLDER: &str = "<<<style>>>";

pub const MIN_TOPIC_CHARS: usize = 3;
pub const MAX_TOPIC_CHARS: usize = 500;
pub const MAX_VARIANTS: u32 = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct GenerationRequest {
    pub topic: String,
    #[serde(default)]
    pub tone: Tone,
    #[serde(default)]
    pub length: PostLength,
    #[serde(default)]
    pub audience: Option<String>,
    /// Writing style to imitate; the user's default style when omitted.
    #[serde(default)]
    pub style_id: Option<Uuid>,
    #[serde(default = "default_true")]
    pub include_hashtags: bool,
    #[serde(default)]
    pub include_emojis: bool,
    #[serde(default = "default_variants")]
    pub variants: u32,
}

fn default_true() -> bool {
    true
}

fn default_variants() -> u32 {
    1
}

impl GenerationRequest {
    pub fn validate(&self) -> Result<(), GenerateError> {
        let topic_len = self.topic.trim().chars().count();
        if !(MIN_TOPIC_CHARS..=MAX_TOPIC_CHARS).contains(&topic_len) {
            return Err(GenerateError::InvalidRequest(format!(
                "topic must be {MIN_TOPIC_CHARS}-{MAX_TOPIC_CHARS} characters, got {topic_len}"
            )));
        }
        if !(1..=MAX_VARIANTS).contains(&self.variants) {
            return Err(GenerateError::InvalidRequest(format!(
                "variants must be between 1 and {MAX_VARIANTS}"
            )));
        }
        Ok(())
    }
}

/// The parts of a writing style the prompt needs.
#[derive(Debug, Clone, PartialEq)]
pub struct StyleContext {
    pub name: String,
    pub description: Option<String>,
    pub samples: Vec<String>,
}

impl From<&WritingStyle> for StyleContext {
    fn from(style: &WritingStyle) -> Self {
        Self {
            name: style.name.clone(),
            description: style.description.clone(),
            samples: style.sample_posts.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneratedPost {
    pub content: String,
    pub hashtags: Vec<String>,
    /// Provider that produced the text.
    pub provider: String,
}

#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    #[error("invalid generation request: {0}")]
    InvalidRequest(String),
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),
    #[error("the model returned an empty post")]
    EmptyOutput,
}

/// Turns a topic (plus an optional writing style) into finished post text.
pub struct PostGenerator {
    provider: Box<dyn LlmProvider>,
    temperature: f32,
    max_tokens: u32,
    system_prompt_template: String,
}

impl PostGenerator {
    pub fn new(provider: Box<dyn LlmProvider>, temperature: f32, max_tokens: u32) -> Self {
        Self {
            provider,
            temperature,
            max_tokens,
            system_prompt_template: POST_WRITER_TEMPLATE.to_string(),
        }
    }

    /// Replace the bundled system prompt. The template must contain the
    /// style placeholder exactly once.
    pub fn with_template(mut self, template: String) -> Result<Self, GenerateError> {
        let count = template.matches(STYLE_PLACEHOLDER).count();
        if count != 1 {
            return Err(GenerateError::InvalidRequest(format!(
                "prompt template must contain exactly one '{STYLE_PLACEHOLDER}' placeholder, found {count}"
            )));
        }
        self.system_prompt_template = template;
        Ok(self)
    }

    /// Build from config, creating the appropriate provider.
    pub fn from_config(
        llm_config: &postforge_core::config::LlmConfig,
        ollama_config: &postforge_core::config::OllamaConfig,
    ) -> Result<Self, LlmError> {
        let provider = crate::providers::create_provider(llm_config, ollama_config)?;
        Ok(Self::new(provider, llm_config.temperature, llm_config.max_tokens))
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Generate `req.variants` independent posts for one request.
    pub async fn generate(
        &self,
        req: &GenerationRequest,
        style: Option<&StyleContext>,
    ) -> Result<Vec<GeneratedPost>, GenerateError> {
        req.validate()?;
        info!(
            tone = %req.tone,
            variants = req.variants,
            styled = style.is_some(),
            provider = self.provider.name(),
            "generating post"
        );

        let system_prompt = self.system_prompt(style);
        let calls = (0..req.variants).map(|i| {
            let messages = vec![
                Message::system(system_prompt.clone()),
                Message::user(build_user_prompt(req, i)),
            ];
            self.complete_post(messages)
        });
        futures::future::try_join_all(calls).await
    }

    /// Rewrite an existing post, optionally following user instructions.
    pub async fn regenerate(
        &self,
        existing: &str,
        tone: Tone,
        instructions: Option<&str>,
        style: Option<&StyleContext>,
    ) -> Result<GeneratedPost, GenerateError> {
        if existing.trim().is_empty() {
            return Err(GenerateError::InvalidRequest("nothing to regenerate".into()));
        }
        info!(tone = %tone, provider = self.provider.name(), "regenerating post");

        let mut prompt = format!(
            "Rewrite the LinkedIn post below so it performs better. Keep the core message.\n{}\n",
            tone.instruction()
        );
        if let Some(extra) = instructions.map(str::trim).filter(|s| !s.is_empty()) {
            prompt.push_str(&format!("Additional instructions from the author: {extra}\n"));
        }
        prompt.push_str(&format!("\nOriginal post:\n\"\"\"\n{}\n\"\"\"", existing.trim()));

        let messages = vec![Message::system(self.system_prompt(style)), Message::user(prompt)];
        self.complete_post(messages).await
    }

    fn system_prompt(&self, style: Option<&StyleContext>) -> String {
        self.system_prompt_template
            .replace(STYLE_PLACEHOLDER, &style_block(style))
    }

    async fn complete_post(&self, messages: Vec<Message>) -> Result<GeneratedPost, GenerateError> {
        let raw = self
            .provider
            .complete(messages, self.temperature, self.max_tokens)
            .await?;
        debug!("LLM response: {} chars", raw.len());

        let content = clean_generated_text(&raw);
        if content.is_empty() {
            return Err(GenerateError::EmptyOutput);
        }
        Ok(GeneratedPost {
            hashtags: extract_hashtags(&content),
            content,
            provider: self.provider.name().to_string(),
        })
    }
}

fn style_block(style: Option<&StyleContext>) -> String {
    let Some(style) = style.filter(|s| !s.samples.is_empty()) else {
        return "No writing samples were provided. Use a natural, personal voice.".to_string();
    };

    let mut out = format!(
        "Imitate the voice of \"{}\". Mirror the sentence length, formatting, and vocabulary \
         of the samples below, but never reuse their content.\n",
        style.name
    );
    if let Some(desc) = &style.description {
        out.push_str(&format!("The author describes this voice as: {desc}\n"));
    }
    for (i, sample) in style.samples.iter().enumerate() {
        out.push_str(&format!("\n--- Sample {} ---\n{}\n", i + 1, sample.trim()));
    }
    out
}

fn build_user_prompt(req: &GenerationRequest, variant: u32) -> String {
    let (min_words, max_words) = req.length.word_range();
    let mut prompt = format!(
        "Write a LinkedIn post about: {}\n\n{}\nLength: {}-{} words.\n",
        req.topic.trim(),
        req.tone.instruction(),
        min_words,
        max_words
    );
    if let Some(audience) = req.audience.as_deref().map(str::trim).filter(|a| !a.is_empty()) {
        prompt.push_str(&format!("Audience: {audience}\n"));
    }
    if req.include_hashtags {
        prompt.push_str("Finish with 3-5 relevant hashtags on the last line.\n");
    } else {
        prompt.push_str("Do not use hashtags.\n");
    }
    if req.include_emojis {
        prompt.push_str("Use a few emojis where they add meaning, never more than one per paragraph.\n");
    } else {
        prompt.push_str("Do not use emojis.\n");
    }
    if variant > 0 {
        prompt.push_str(&format!(
            "This is alternative #{}: take a clearly different angle and hook than a first draft would.\n",
            variant + 1
        ));
    }
    prompt
}

/// Normalize raw model output into postable text: drops code fences, a
/// "Here's your post:" preamble line and wrapping quotes, then caps the
/// length at LinkedIn's limit.
pub fn clean_generated_text(raw: &str) -> String {
    let mut text = raw.trim();

    if let Some(rest) = text.strip_prefix("```") {
        // skip a language tag on the fence line
        let rest = rest.find('\n').map_or("", |n| &rest[n + 1..]);
        text = rest.trim_end().strip_suffix("```").unwrap_or(rest).trim();
    }

    if let Some((first, rest)) = text.split_once('\n') {
        let lowered = first.trim().to_lowercase();
        let is_preamble = (lowered.starts_with("here is")
            || lowered.starts_with("here's")
            || lowered.starts_with("sure"))
            && lowered.ends_with(':');
        if is_preamble {
            text = rest.trim();
        }
    }

    for (open, close) in [('"', '"'), ('\u{201c}', '\u{201d}')] {
        if text.len() > 1 && text.starts_with(open) && text.ends_with(close) {
            let inner = &text[open.len_utf8()..text.len() - close.len_utf8()];
            if !inner.contains(open) {
                text = inner.trim();
            }
        }
    }

    match text.char_indices().nth(MAX_POST_CHARS) {
        Some((cut, _)) => text[..cut].trim_end().to_string(),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;

    use super::*;

    /// Returns canned responses in order and records every prompt.
    struct MockProvider {
        responses: Mutex<Vec<Result<String, LlmError>>>,
        calls: Arc<Mutex<Vec<Vec<Message>>>>,
    }

    impl MockProvider {
        fn new(responses: Vec<Result<String, LlmError>>) -> (Self, Arc<Mutex<Vec<Vec<Message>>>>) {
            let calls = Arc::new(Mutex::new(Vec::new()));
            let mut responses = responses;
            responses.reverse();
            (Self { responses: Mutex::new(responses), calls: calls.clone() }, calls)
        }
    }

    #[async_trait]
    impl LlmProvider for MockProvider {
        async fn complete(
            &self,
            messages: Vec<Message>,
            _temperature: f32,
            _max_tokens: u32,
        ) -> Result<String, LlmError> {
            self.calls.lock().unwrap().push(messages);
            self.responses
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| Ok("fallback post #mock".to_string()))
        }

        fn name(&self) -> &str {
            "mock"
        }
    }

    fn request(topic: &str) -> GenerationRequest {
        GenerationRequest {
            topic: topic.to_string(),
            tone: Tone::Storytelling,
            length: PostLength::Short,
            audience: Some("engineering managers".into()),
            style_id: None,
            include_hashtags: true,
            include_emojis: false,
            variants: 1,
        }
    }

    #[test]
    fn bundled_template_has_one_placeholder() {
        assert_eq!(POST_WRITER_TEMPLATE.matches(STYLE_PLACEHOLDER).count(), 1);
    }

    #[test]
    fn custom_template_must_have_one_placeholder() {
        let (mock, _) = MockProvider::new(vec![]);
        let generator = PostGenerator::new(Box::new(mock), 0.7, 512);
        assert!(generator.with_template("no placeholder".into()).is_err());
    }

    #[test]
    fn request_validation() {
        assert!(request("ok topic").validate().is_ok());
        assert!(request("  a ").validate().is_err());
        assert!(request(&"x".repeat(MAX_TOPIC_CHARS + 1)).validate().is_err());
        let mut r = request("ok topic");
        r.variants = 0;
        assert!(r.validate().is_err());
        r.variants = MAX_VARIANTS + 1;
        assert!(r.validate().is_err());
    }

    #[test]
    fn request_defaults_from_json() {
        let r: GenerationRequest = serde_json::from_str(r#"{"topic":"remote work"}"#).unwrap();
        assert_eq!(r.tone, Tone::Professional);
        assert_eq!(r.length, PostLength::Medium);
        assert!(r.include_hashtags);
        assert!(!r.include_emojis);
        assert_eq!(r.variants, 1);
    }

    #[test]
    fn user_prompt_mentions_preferences() {
        let prompt = build_user_prompt(&request("first promotion"), 0);
        assert!(prompt.contains("first promotion"));
        assert!(prompt.contains("40-100 words"));
        assert!(prompt.contains("Audience: engineering managers"));
        assert!(prompt.contains("hashtags"));
        assert!(prompt.contains("Do not use emojis"));
        assert!(!prompt.contains("alternative"));
        assert!(build_user_prompt(&request("x y z"), 1).contains("alternative #2"));
    }

    #[test]
    fn style_block_includes_samples() {
        let style = StyleContext {
            name: "Founder".into(),
            description: Some("blunt".into()),
            samples: vec!["Sample one".into(), "Sample two".into()],
        };
        let block = style_block(Some(&style));
        assert!(block.contains("\"Founder\""));
        assert!(block.contains("blunt"));
        assert!(block.contains("--- Sample 2 ---\nSample two"));
        assert!(style_block(None).contains("No writing samples"));
    }

    #[tokio::test]
    async fn generate_cleans_and_extracts_hashtags() {
        let (mock, calls) = MockProvider::new(vec![Ok(
            "Here's your post:\n\nI failed my first interview.\n\nWhat did yours teach you?\n\n#career #hiring".into(),
        )]);
        let generator = PostGenerator::new(Box::new(mock), 0.7, 512);
        let style = StyleContext { name: "Me".into(), description: None, samples: vec!["old post".into()] };

        let posts = generator.generate(&request("first interview"), Some(&style)).await.unwrap();
        assert_eq!(posts.len(), 1);
        assert!(posts[0].content.starts_with("I failed"));
        assert_eq!(posts[0].hashtags, vec!["#career", "#hiring"]);
        assert_eq!(posts[0].provider, "mock");

        let calls = calls.lock().unwrap();
        assert!(calls[0][0].content.contains("old post"));
        assert!(!calls[0][0].content.contains(STYLE_PLACEHOLDER));
    }

    #[tokio::test]
    async fn generate_runs_one_call_per_variant() {
        let (mock, calls) = MockProvider::new(vec![Ok("one".into()), Ok("two".into()), Ok("three".into())]);
        let generator = PostGenerator::new(Box::new(mock), 0.7, 512);
        let mut req = request("three takes");
        req.variants = 3;
        let posts = generator.generate(&req, None).await.unwrap();
        assert_eq!(posts.len(), 3);
        assert_eq!(calls.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn empty_model_output_is_an_error() {
        let (mock, _) = MockProvider::new(vec![Ok("  \"\"  ".into())]);
        let generator = PostGenerator::new(Box::new(mock), 0.7, 512);
        let err = generator.generate(&request("anything"), None).await.unwrap_err();
        assert!(matches!(err, GenerateError::EmptyOutput));
    }

    #[tokio::test]
    async fn provider_errors_propagate() {
        let (mock, _) = MockProvider::new(vec![Err(LlmError::ApiError { status: 429, body: "slow down".into() })]);
        let generator = PostGenerator::new(Box::new(mock), 0.7, 512);
        let err = generator.generate(&request("anything"), None).await.unwrap_err();
        assert!(matches!(err, GenerateError::Llm(LlmError::ApiError { status: 429, .. })));
    }

    #[tokio::test]
    async fn invalid_request_never_reaches_provider() {
        let (mock, calls) = MockProvider::new(vec![]);
        let generator = PostGenerator::new(Box::new(mock), 0.7, 512);
        assert!(generator.generate(&request(""), None).await.is_err());
        assert!(calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn regenerate_sends_original_and_instructions() {
        let (mock, calls) = MockProvider::new(vec![Ok("Better post".into())]);
        let generator = PostGenerator::new(Box::new(mock), 0.7, 512);
        let out = generator
            .regenerate("Old post body", Tone::Casual, Some("make it shorter"), None)
            .await
            .unwrap();
        assert_eq!(out.content, "Better post");
        let calls = calls.lock().unwrap();
        let user = &calls[0][1].content;
        assert!(user.contains("Old post body"));
        assert!(user.contains("make it shorter"));
    }

    #[test]
    fn clean_strips_fences_and_quotes() {
        assert_eq!(clean_generated_text("```text\nHello\n```"), "Hello");
        assert_eq!(clean_generated_text("```\nHello\n```"), "Hello");
        assert_eq!(clean_generated_text("\"Hello there\""), "Hello there");
        assert_eq!(clean_generated_text("\u{201c}Hello\u{201d}"), "Hello");
        assert_eq!(clean_generated_text("Sure! Here is the post:\nBody"), "Body");
    }

    #[test]
    fn clean_keeps_inner_quotes() {
        let text = "\"Done\" is better than \"perfect\"";
        assert_eq!(clean_generated_text(text), text);
    }

    #[test]
    fn clean_keeps_non_preamble_first_line() {
        assert_eq!(clean_generated_text("Here is what I learned.\nBody"), "Here is what I learned.\nBody");
    }

    #[test]
    fn clean_truncates_to_limit() {
        let long = "é".repeat(MAX_POST_CHARS + 50);
        assert_eq!(clean_generated_text(&long).chars().count(), MAX_POST_CHARS);
    }
}
