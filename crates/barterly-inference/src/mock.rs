//! Deterministic mock backends for testing.
//!
//! The mock embedding backend derives vectors from text content, so the
//! same text always produces the same embedding; exact vectors can be
//! pinned per text for tests that need controlled similarities. Both mocks
//! log calls for assertion and can be switched into a failing state to
//! exercise fallback paths.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use barterly_core::{EmbeddingBackend, Error, GenerationBackend, Result, Vector};

/// Deterministic mock embedding backend.
#[derive(Clone)]
pub struct MockEmbeddingBackend {
    config: Arc<EmbedConfig>,
    calls: Arc<Mutex<Vec<Vec<String>>>>,
}

struct EmbedConfig {
    dimension: usize,
    model_name: String,
    pinned: HashMap<String, Vec<f32>>,
    failing: bool,
}

impl MockEmbeddingBackend {
    /// Create a mock with the given dimension.
    pub fn new(dimension: usize) -> Self {
        Self {
            config: Arc::new(EmbedConfig {
                dimension,
                model_name: "mock-embed".to_string(),
                pinned: HashMap::new(),
                failing: false,
            }),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Override the reported model name.
    pub fn with_model_name(mut self, name: impl Into<String>) -> Self {
        self.config_mut().model_name = name.into();
        self
    }

    /// Pin an exact vector for a specific input text.
    pub fn with_vector_for(mut self, text: impl Into<String>, vector: Vec<f32>) -> Self {
        let text = text.into();
        self.config_mut().pinned.insert(text, vector);
        self
    }

    /// Make every call fail.
    pub fn failing(mut self) -> Self {
        self.config_mut().failing = true;
        self
    }

    fn config_mut(&mut self) -> &mut EmbedConfig {
        Arc::get_mut(&mut self.config).expect("configure the mock before sharing it")
    }

    /// Number of `embed_texts` invocations (not individual texts).
    pub fn embed_call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// All texts embedded so far, in call order.
    pub fn embedded_texts(&self) -> Vec<String> {
        self.calls.lock().unwrap().iter().flatten().cloned().collect()
    }

    /// Deterministic embedding derived from text content, unit-normalized.
    pub fn vector_for(text: &str, dimension: usize) -> Vec<f32> {
        let mut vec = vec![0.0f32; dimension];
        for (i, c) in text.chars().enumerate() {
            let idx = (c as usize + i) % dimension;
            vec[idx] += 0.1;
        }
        let magnitude: f32 = vec.iter().map(|x| x * x).sum::<f32>().sqrt();
        if magnitude > 0.0 {
            vec.iter_mut().for_each(|x| *x /= magnitude);
        }
        vec
    }
}

#[async_trait]
impl EmbeddingBackend for MockEmbeddingBackend {
    async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vector>> {
        self.calls.lock().unwrap().push(texts.to_vec());

        if self.config.failing {
            return Err(Error::Embedding("simulated embedding failure".to_string()));
        }

        Ok(texts
            .iter()
            .map(|t| {
                let v = self
                    .config
                    .pinned
                    .get(t)
                    .cloned()
                    .unwrap_or_else(|| Self::vector_for(t, self.config.dimension));
                Vector::from(v)
            })
            .collect())
    }

    fn dimension(&self) -> usize {
        self.config.dimension
    }

    fn model_name(&self) -> &str {
        &self.config.model_name
    }
}

/// Mock generation backend with canned responses.
#[derive(Clone)]
pub struct MockGenerationBackend {
    config: Arc<GenConfig>,
    queued: Arc<Mutex<Vec<String>>>,
    calls: Arc<Mutex<Vec<String>>>,
}

struct GenConfig {
    model_name: String,
    default_response: String,
    failing: bool,
}

impl MockGenerationBackend {
    /// Create a mock that echoes a generic default response.
    pub fn new() -> Self {
        Self {
            config: Arc::new(GenConfig {
                model_name: "mock-gen".to_string(),
                default_response: "Mock response".to_string(),
                failing: false,
            }),
            queued: Arc::new(Mutex::new(Vec::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Set the default response returned by every call.
    pub fn with_response(mut self, response: impl Into<String>) -> Self {
        self.config_mut().default_response = response.into();
        self
    }

    /// Queue a one-shot response; queued responses are consumed in order
    /// before the default applies.
    pub fn push_response(&self, response: impl Into<String>) {
        self.queued.lock().unwrap().push(response.into());
    }

    /// Make every call fail.
    pub fn failing(mut self) -> Self {
        self.config_mut().failing = true;
        self
    }

    fn config_mut(&mut self) -> &mut GenConfig {
        Arc::get_mut(&mut self.config).expect("configure the mock before sharing it")
    }

    /// Number of generation calls so far.
    pub fn generate_call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// All prompts seen so far, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl Default for MockGenerationBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GenerationBackend for MockGenerationBackend {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.generate_with_system("", prompt).await
    }

    async fn generate_with_system(&self, _system: &str, prompt: &str) -> Result<String> {
        self.calls.lock().unwrap().push(prompt.to_string());

        if self.config.failing {
            return Err(Error::Inference("simulated inference failure".to_string()));
        }

        let mut queued = self.queued.lock().unwrap();
        if queued.is_empty() {
            Ok(self.config.default_response.clone())
        } else {
            Ok(queued.remove(0))
        }
    }

    fn model_name(&self) -> &str {
        &self.config.model_name
    }
}
