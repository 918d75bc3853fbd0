pub mod generator;
pub mod provider;
pub mod providers;

pub use generator::{
    clean_generated_text, GenerateError, GeneratedPost, GenerationRequest, PostGenerator,
    StyleContext,
};
pub use provider::{LlmError, LlmProvider, Message, Role};
pub use providers::create_provider;
