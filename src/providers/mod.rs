use serde::Serialize;
use std::future::Future;
use std::pin::Pin;

use crate::error::CallError;

mod openai;

pub use openai::OpenAI;

/// Sampling parameters for one completion call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GenerationParams {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl GenerationParams {
    pub const fn new(temperature: f32, max_tokens: u32) -> Self {
        Self {
            temperature,
            max_tokens,
        }
    }
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self::new(1.0, 256)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProviderUsage {
    pub prompt_tokens: Option<u64>,
    pub completion_tokens: Option<u64>,
    pub total_tokens: Option<u64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProviderResponse {
    pub text: String,
    pub model: Option<String>,
    pub usage: Option<ProviderUsage>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
}

#[derive(Debug, Clone, Serialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn user(content: String) -> Self {
        Self {
            role: MessageRole::User,
            content,
        }
    }
}

/// Voice settings for speech synthesis.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeechOptions {
    pub model: String,
    pub voice: String,
    pub format: String,
    pub speed: f32,
}

impl Default for SpeechOptions {
    fn default() -> Self {
        Self {
            model: "tts-1".to_string(),
            voice: "shimmer".to_string(),
            format: "mp3".to_string(),
            speed: 1.0,
        }
    }
}

pub type ProviderFuture = Pin<Box<dyn Future<Output = Result<ProviderResponse, CallError>> + Send>>;
pub type SpeechFuture = Pin<Box<dyn Future<Output = Result<Vec<u8>, CallError>> + Send>>;

/// Chat-completion backend. Builder methods consume and return the provider so
/// a configured base can be cloned per request.
pub trait Provider: Clone + Send + Sync {
    fn append_user_input(self, input: String) -> Self;
    fn with_generation(self, params: GenerationParams) -> Self;
    fn complete(self) -> ProviderFuture;
}

/// Text-to-speech backend returning the raw audio payload.
pub trait SpeechProvider: Send + Sync {
    fn audio_format(&self) -> &str;
    fn synthesize(&self, input: String) -> SpeechFuture;
}

/// `override_key` wins over `OPENAI_API_KEY`; both are trimmed and blank values ignored.
pub fn resolve_key(override_key: Option<&str>) -> Option<String> {
    if let Some(key) = override_key {
        let key = key.trim();
        if !key.is_empty() {
            return Some(key.to_string());
        }
    }
    get_env("OPENAI_API_KEY").map(|key| key.trim().to_string())
}

fn get_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .filter(|value| !value.trim().is_empty())
}
