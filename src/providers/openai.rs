use serde::Deserialize;
use serde_json::json;

use super::{
    GenerationParams, Message, Provider, ProviderFuture, ProviderResponse, ProviderUsage,
    SpeechFuture, SpeechOptions, SpeechProvider,
};
use crate::error::CallError;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub(crate) const DEFAULT_MODEL: &str = "gpt-4o-mini";

#[derive(Debug, Clone)]
pub struct OpenAI {
    client: reqwest::Client,
    key: Option<String>,
    model: String,
    speech: SpeechOptions,
    messages: Vec<Message>,
    params: GenerationParams,
}

impl OpenAI {
    /// The key is checked lazily: a missing key fails the first call, not construction.
    pub fn new(key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            key: key.filter(|key| !key.trim().is_empty()),
            model: DEFAULT_MODEL.to_string(),
            speech: SpeechOptions::default(),
            messages: Vec::new(),
            params: GenerationParams::default(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        let model = model.into();
        if !model.trim().is_empty() {
            self.model = model;
        }
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn with_speech(mut self, speech: SpeechOptions) -> Self {
        self.speech = speech;
        self
    }

    fn key(&self) -> Result<&str, CallError> {
        self.key.as_deref().ok_or(CallError::MissingApiKey)
    }
}

impl Provider for OpenAI {
    fn append_user_input(mut self, input: String) -> Self {
        self.messages.push(Message::user(input));
        self
    }

    fn with_generation(mut self, params: GenerationParams) -> Self {
        self.params = params;
        self
    }

    fn complete(self) -> ProviderFuture {
        Box::pin(async move { call_with_chat_completions(self).await })
    }
}

impl SpeechProvider for OpenAI {
    fn audio_format(&self) -> &str {
        &self.speech.format
    }

    fn synthesize(&self, input: String) -> SpeechFuture {
        let provider = self.clone();
        Box::pin(async move { call_speech(provider, input).await })
    }
}

fn base_url() -> String {
    std::env::var("OPENAI_BASE_URL")
        .ok()
        .map(|url| url.trim().trim_end_matches('/').to_string())
        .filter(|url| !url.is_empty())
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
}

async fn call_with_chat_completions(provider: OpenAI) -> Result<ProviderResponse, CallError> {
    let key = provider.key()?;
    let url = format!("{}/chat/completions", base_url());
    let body = json!({
        "model": provider.model,
        "messages": provider.messages,
        "temperature": provider.params.temperature,
        "max_tokens": provider.params.max_tokens,
    });

    let response = provider
        .client
        .post(&url)
        .bearer_auth(key)
        .json(&body)
        .send()
        .await?;

    let status = response.status();
    let text = response.text().await.unwrap_or_default();
    if status.is_success() {
        return extract_completion(&text, &provider.model);
    }
    let message = extract_openai_error(&text).unwrap_or_else(|| text.clone());
    Err(CallError::from_status(status, &text, message))
}

async fn call_speech(provider: OpenAI, input: String) -> Result<Vec<u8>, CallError> {
    let key = provider.key()?;
    let url = format!("{}/audio/speech", base_url());
    let body = json!({
        "model": provider.speech.model,
        "input": input,
        "voice": provider.speech.voice,
        "response_format": provider.speech.format,
        "speed": provider.speech.speed,
    });

    let response = provider
        .client
        .post(&url)
        .bearer_auth(key)
        .json(&body)
        .send()
        .await?;

    let status = response.status();
    if status.is_success() {
        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Err(CallError::MalformedResponse(
                "speech endpoint returned no audio".to_string(),
            ));
        }
        return Ok(bytes.to_vec());
    }
    let text = response.text().await.unwrap_or_default();
    let message = extract_openai_error(&text).unwrap_or_else(|| text.clone());
    Err(CallError::from_status(status, &text, message))
}

fn extract_completion(text: &str, fallback_model: &str) -> Result<ProviderResponse, CallError> {
    let payload: OpenAIResponse = serde_json::from_str(text).map_err(|err| {
        CallError::MalformedResponse(format!("failed to parse OpenAI response JSON: {}", err))
    })?;
    let choice = payload.choices.into_iter().next().ok_or_else(|| {
        CallError::MalformedResponse("no choices returned from OpenAI".to_string())
    })?;
    let content = choice.message.content.unwrap_or_default();

    let model = payload
        .model
        .filter(|value| !value.trim().is_empty())
        .or_else(|| Some(fallback_model.to_string()));
    let usage = payload.usage.map(|usage| ProviderUsage {
        prompt_tokens: usage.prompt_tokens,
        completion_tokens: usage.completion_tokens,
        total_tokens: usage.total_tokens,
    });
    Ok(ProviderResponse {
        text: content.trim().to_string(),
        model,
        usage,
    })
}

fn extract_openai_error(body: &str) -> Option<String> {
    #[derive(Deserialize)]
    struct ErrorBody {
        error: Option<OpenAIError>,
    }

    #[derive(Deserialize)]
    struct OpenAIError {
        message: Option<String>,
        #[serde(rename = "type")]
        kind: Option<String>,
        code: Option<String>,
    }

    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    let error = parsed.error?;
    Some(format_error_parts(error.message, error.kind, error.code))
}

fn format_error_parts(
    message: Option<String>,
    kind: Option<String>,
    code: Option<String>,
) -> String {
    let mut parts = Vec::new();
    if let Some(message) = message {
        if !message.trim().is_empty() {
            parts.push(message);
        }
    }
    if let Some(kind) = kind {
        if !kind.trim().is_empty() {
            parts.push(format!("type: {}", kind));
        }
    }
    if let Some(code) = code {
        if !code.trim().is_empty() {
            parts.push(format!("code: {}", code));
        }
    }
    if parts.is_empty() {
        "unknown error".to_string()
    } else {
        parts.join(" | ")
    }
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    model: Option<String>,
    #[serde(default)]
    choices: Vec<OpenAIChoice>,
    usage: Option<OpenAIUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAIMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIUsage {
    prompt_tokens: Option<u64>,
    completion_tokens: Option<u64>,
    total_tokens: Option<u64>,
}
