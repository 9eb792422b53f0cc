//! OpenAI-compatible chat-completions generator.

use async_trait::async_trait;
use recall_core::RawCard;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{parse_pairs, CardGenerator, GenError, GenResult};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

const SYSTEM_PROMPT: &str = "You are a helpful assistant that creates flashcards. \
Generate 5-10 flashcards from the given text. Return ONLY a JSON array with objects \
containing \"question\" and \"answer\" fields. No other text.";

#[derive(Clone, Debug)]
pub struct GeneratorConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub temperature: f32,
    pub base_url: String,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

pub struct OpenAiGenerator {
    client: Client,
    api_key: String,
    config: GeneratorConfig,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

impl OpenAiGenerator {
    pub fn new(config: GeneratorConfig) -> GenResult<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or(GenError::MissingKey)?;
        let client = Client::builder().build()?;
        Ok(Self {
            client,
            api_key,
            config,
        })
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }
}

fn user_prompt(text: &str) -> String {
    format!("Create flashcards from this text:\n\n{text}")
}

fn error_message(body: &str) -> String {
    serde_json::from_str::<ApiErrorBody>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.trim().to_string())
}

#[async_trait]
impl CardGenerator for OpenAiGenerator {
    async fn generate(&self, text: &str) -> GenResult<Vec<RawCard>> {
        let text = text.trim();
        if text.is_empty() {
            return Err(GenError::EmptyInput);
        }

        let prompt = user_prompt(text);
        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt,
                },
            ],
            temperature: self.config.temperature,
        };

        debug!(model = %self.config.model, chars = text.len(), "requesting flashcards");
        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(GenError::Api {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        let reply: ChatResponse =
            serde_json::from_str(&body).map_err(|e| GenError::Parse(e.to_string()))?;
        let content = reply
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| GenError::Parse("response has no message content".into()))?;

        let pairs = parse_pairs(&content)?;
        info!(count = pairs.len(), "generated flashcards");
        Ok(pairs)
    }
}
