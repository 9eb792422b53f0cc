//! Turns free text into question/answer pairs using a chat-completions model.

use async_trait::async_trait;
use recall_core::RawCard;
use thiserror::Error;

mod openai;
mod parse;

pub use openai::{GeneratorConfig, OpenAiGenerator, DEFAULT_BASE_URL, DEFAULT_MODEL, DEFAULT_TEMPERATURE};
pub use parse::parse_pairs;

#[derive(Debug, Error)]
pub enum GenError {
    #[error("no API key configured (set OPENAI_API_KEY)")]
    MissingKey,
    #[error("nothing to generate from: input text is empty")]
    EmptyInput,
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("could not parse flashcards from response: {0}")]
    Parse(String),
}

pub type GenResult<T> = Result<T, GenError>;

/// Source of new card pairs.
///
/// Returned pairs are non-blank; the caller turns them into scheduled cards.
#[async_trait]
pub trait CardGenerator: Send + Sync {
    async fn generate(&self, text: &str) -> GenResult<Vec<RawCard>>;
}
