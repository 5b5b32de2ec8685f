pub mod claude;
pub mod gemini;
pub mod openai;

use crate::config::{GenerationConfig, ProviderKind};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    pub model: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ChatResponse {
    pub content: String,
    pub model: String,
}

/// Text-generation backend as seen by the review generator.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError>;
}

/// Unified LLM provider enum. Dispatches to Gemini, OpenAI-compatible or Claude backends.
#[derive(Debug, Clone)]
pub enum Provider {
    Gemini(gemini::GeminiConfig),
    OpenAi(openai::OpenAiConfig),
    Claude(claude::ClaudeConfig),
}

impl Provider {
    pub fn gemini(api_key: String) -> Self {
        Provider::Gemini(gemini::GeminiConfig {
            api_key,
            base_url: gemini::DEFAULT_BASE_URL.to_string(),
        })
    }

    pub fn openai(api_key: String) -> Self {
        Provider::OpenAi(openai::OpenAiConfig {
            api_key,
            base_url: openai::DEFAULT_BASE_URL.to_string(),
        })
    }

    pub fn claude(api_key: String) -> Self {
        Provider::Claude(claude::ClaudeConfig {
            api_key,
            base_url: claude::DEFAULT_BASE_URL.to_string(),
        })
    }

    pub fn from_config(config: &GenerationConfig) -> Self {
        let mut provider = match config.provider {
            ProviderKind::Gemini => Provider::gemini(config.api_key.clone()),
            ProviderKind::OpenAi => Provider::openai(config.api_key.clone()),
            ProviderKind::Claude => Provider::claude(config.api_key.clone()),
        };
        if let Some(base_url) = &config.base_url {
            provider.set_base_url(base_url.trim_end_matches('/').to_string());
        }
        provider
    }

    fn set_base_url(&mut self, url: String) {
        match self {
            Provider::Gemini(config) => config.base_url = url,
            Provider::OpenAi(config) => config.base_url = url,
            Provider::Claude(config) => config.base_url = url,
        }
    }

    pub async fn chat(
        &self,
        client: &Client,
        request: &ChatRequest,
    ) -> Result<ChatResponse, LlmError> {
        match self {
            Provider::Gemini(config) => gemini::chat(client, config, request).await,
            Provider::OpenAi(config) => openai::chat(client, config, request).await,
            Provider::Claude(config) => claude::chat(client, config, request).await,
        }
    }
}

/// A provider bound to a model and an HTTP client.
pub struct Backend {
    provider: Provider,
    model: String,
    client: Client,
}

impl Backend {
    pub fn new(config: &GenerationConfig) -> Result<Self, LlmError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            provider: Provider::from_config(config),
            model: config.model.clone(),
            client,
        })
    }
}

#[async_trait]
impl TextGenerator for Backend {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        let request = ChatRequest {
            messages: vec![ChatMessage::user(prompt)],
            model: self.model.clone(),
        };
        let response = self.provider.chat(&self.client, &request).await?;
        if response.content.trim().is_empty() {
            return Err(LlmError::EmptyResponse);
        }
        Ok(response.content)
    }
}

/// Turns a non-success HTTP response into `LlmError::Api`.
pub(crate) async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, LlmError> {
    if resp.status().is_success() {
        return Ok(resp);
    }
    let status = resp.status().as_u16();
    let text = resp.text().await.unwrap_or_default();
    Err(LlmError::Api {
        status,
        message: text,
    })
}

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Backend returned no text")]
    EmptyResponse,
}
