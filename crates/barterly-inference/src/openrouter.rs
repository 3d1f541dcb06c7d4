//! OpenRouter inference backend (OpenAI-compatible API).

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

use barterly_core::{defaults, EmbeddingBackend, Error, GenerationBackend, Result, Vector};

/// Default OpenRouter API endpoint.
pub const DEFAULT_OPENROUTER_URL: &str = defaults::OPENROUTER_URL;

/// Default embedding model.
pub const DEFAULT_EMBED_MODEL: &str = defaults::EMBED_MODEL;

/// Default generation model.
pub const DEFAULT_GEN_MODEL: &str = defaults::GEN_MODEL;

/// Configuration for the OpenRouter backend.
#[derive(Debug, Clone)]
pub struct OpenRouterConfig {
    /// Base URL for the API endpoint.
    pub base_url: String,
    /// API key for authentication.
    pub api_key: Option<String>,
    /// Model to use for embeddings.
    pub embed_model: String,
    /// Model to use for generation.
    pub gen_model: String,
    /// Sampling temperature for generation.
    pub temperature: f32,
    /// Maximum tokens in a generation response.
    pub max_tokens: u32,
    /// Embedding request timeout in seconds.
    pub embed_timeout_secs: u64,
    /// Generation request timeout in seconds.
    pub gen_timeout_secs: u64,
    /// HTTP-Referer header for OpenRouter rankings (optional).
    pub http_referer: Option<String>,
    /// X-Title header for app name on OpenRouter (optional).
    pub x_title: Option<String>,
}

impl Default for OpenRouterConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_OPENROUTER_URL.to_string(),
            api_key: None,
            embed_model: DEFAULT_EMBED_MODEL.to_string(),
            gen_model: DEFAULT_GEN_MODEL.to_string(),
            temperature: defaults::GEN_TEMPERATURE,
            max_tokens: defaults::GEN_MAX_TOKENS,
            embed_timeout_secs: defaults::EMBED_TIMEOUT_SECS,
            gen_timeout_secs: defaults::JUDGMENT_TIMEOUT_SECS,
            http_referer: None,
            x_title: None,
        }
    }
}

/// Expected vector dimension for a given embedding model slug.
///
/// Unknown models fall back to the text-embedding-3-small dimension.
pub fn embedding_dimension_for(model: &str) -> usize {
    if model.contains("text-embedding-3-large") {
        3072
    } else {
        defaults::EMBED_DIMENSION
    }
}

/// OpenRouter inference backend.
///
/// Speaks the OpenAI-compatible `/embeddings` and `/chat/completions`
/// endpoints. One instance serves both the embedding and the generation
/// capability; construct it once at process start and share it by handle.
pub struct OpenRouterBackend {
    client: Client,
    config: OpenRouterConfig,
    dimension: usize,
}

impl OpenRouterBackend {
    /// Create a new backend with the given configuration.
    pub fn new(config: OpenRouterConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.gen_timeout_secs.max(config.embed_timeout_secs)))
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        info!(
            subsystem = "inference",
            component = "openrouter",
            base_url = %config.base_url,
            embed_model = %config.embed_model,
            gen_model = %config.gen_model,
            "Initializing OpenRouter backend"
        );

        let dimension = embedding_dimension_for(&config.embed_model);
        Ok(Self {
            client,
            config,
            dimension,
        })
    }

    /// Create from environment variables.
    ///
    /// Reads `OPENROUTER_API_KEY`, `OPENROUTER_BASE_URL`,
    /// `OPENROUTER_EMBED_MODEL`, `OPENROUTER_GEN_MODEL`,
    /// `OPENROUTER_HTTP_REFERER`, and `OPENROUTER_X_TITLE`.
    pub fn from_env() -> Result<Self> {
        let config = OpenRouterConfig {
            base_url: std::env::var("OPENROUTER_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_OPENROUTER_URL.to_string()),
            api_key: std::env::var("OPENROUTER_API_KEY").ok(),
            embed_model: std::env::var("OPENROUTER_EMBED_MODEL")
                .unwrap_or_else(|_| DEFAULT_EMBED_MODEL.to_string()),
            gen_model: std::env::var("OPENROUTER_GEN_MODEL")
                .unwrap_or_else(|_| DEFAULT_GEN_MODEL.to_string()),
            http_referer: std::env::var("OPENROUTER_HTTP_REFERER").ok(),
            x_title: std::env::var("OPENROUTER_X_TITLE").ok(),
            ..Default::default()
        };

        Self::new(config)
    }

    /// Get the current configuration.
    pub fn config(&self) -> &OpenRouterConfig {
        &self.config
    }

    /// Build a POST request with authentication and ranking headers.
    fn build_request(&self, endpoint: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.config.base_url.trim_end_matches('/'), endpoint);
        let mut req = self.client.post(&url);

        if let Some(ref api_key) = self.config.api_key {
            req = req.header("Authorization", format!("Bearer {}", api_key));
        }
        if let Some(ref referer) = self.config.http_referer {
            req = req.header("HTTP-Referer", referer);
        }
        if let Some(ref title) = self.config.x_title {
            req = req.header("X-Title", title);
        }

        req.header("Content-Type", "application/json")
    }
}

// ---------------------------------------------------------------------------
// Wire types (OpenAI-compatible)
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct EmbeddingRequest {
    model: String,
    input: Vec<String>,
    encoding_format: &'static str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

#[derive(Serialize, Deserialize, Clone)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ApiErrorResponse {
    error: ApiError,
}

#[derive(Deserialize)]
struct ApiError {
    message: String,
}

async fn error_body(response: reqwest::Response) -> String {
    match response.json::<ApiErrorResponse>().await {
        Ok(body) => body.error.message,
        Err(_) => "Unknown error".to_string(),
    }
}

// ---------------------------------------------------------------------------
// Trait implementations
// ---------------------------------------------------------------------------

#[async_trait]
impl EmbeddingBackend for OpenRouterBackend {
    async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vector>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        debug!(
            subsystem = "inference",
            component = "openrouter",
            op = "embed_texts",
            input_count = texts.len(),
            model = %self.config.embed_model,
            "Embedding texts"
        );

        let request = EmbeddingRequest {
            model: self.config.embed_model.clone(),
            input: texts.to_vec(),
            encoding_format: "float",
        };

        let response = self
            .build_request("/embeddings")
            .timeout(Duration::from_secs(self.config.embed_timeout_secs))
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Embedding(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let message = error_body(response).await;
            return Err(Error::Embedding(format!(
                "OpenRouter returned {}: {}",
                status, message
            )));
        }

        let result: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| Error::Embedding(format!("Failed to parse response: {}", e)))?;

        // Sort by index to ensure input ordering.
        let mut data = result.data;
        data.sort_by_key(|d| d.index);

        Ok(data.into_iter().map(|d| Vector::from(d.embedding)).collect())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.config.embed_model
    }
}

#[async_trait]
impl GenerationBackend for OpenRouterBackend {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.generate_with_system("", prompt).await
    }

    async fn generate_with_system(&self, system: &str, prompt: &str) -> Result<String> {
        debug!(
            subsystem = "inference",
            component = "openrouter",
            op = "generate",
            model = %self.config.gen_model,
            prompt_len = prompt.len(),
            "Starting generation"
        );

        let mut messages = Vec::new();
        if !system.is_empty() {
            messages.push(ChatMessage {
                role: "system".to_string(),
                content: system.to_string(),
            });
        }
        messages.push(ChatMessage {
            role: "user".to_string(),
            content: prompt.to_string(),
        });

        let request = ChatRequest {
            model: self.config.gen_model.clone(),
            messages,
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        let response = self
            .build_request("/chat/completions")
            .timeout(Duration::from_secs(self.config.gen_timeout_secs))
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Inference(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let message = error_body(response).await;
            return Err(Error::Inference(format!(
                "OpenRouter returned {}: {}",
                status, message
            )));
        }

        let result: ChatResponse = response
            .json()
            .await
            .map_err(|e| Error::Inference(format!("Failed to parse response: {}", e)))?;

        let content = result
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| Error::Inference("Response contained no choices".to_string()))?;

        debug!(
            subsystem = "inference",
            component = "openrouter",
            op = "generate",
            response_len = content.len(),
            "Generation complete"
        );
        Ok(content)
    }

    fn model_name(&self) -> &str {
        &self.config.gen_model
    }
}
