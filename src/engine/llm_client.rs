use std::time::Duration;

use anyhow::Result;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use crate::config::settings::{EngineSettings, Provider, ANTHROPIC_API_KEY_VAR};
use crate::engine::offline::OfflineGenerator;
use crate::engine::prompt_builder::PromptBuilder;
use crate::error::{ConfigError, GeneratorError};
use crate::model::generation::GenerationRequest;

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// The external, untrusted source of candidate turns.
///
/// Implementations return the raw text the model produced. Whether that text
/// is usable is decided later by the turn decoder, never here.
pub trait NarrativeGenerator: Send {
    fn generate(&self, req: &GenerationRequest) -> Result<String, GeneratorError>;
}

impl<G: NarrativeGenerator + ?Sized> NarrativeGenerator for Box<G> {
    fn generate(&self, req: &GenerationRequest) -> Result<String, GeneratorError> {
        (**self).generate(req)
    }
}

/// Picks the generator named in the settings.
///
/// This is where missing credentials surface: a `ConfigError` here means the
/// operator has to fix the setup, not that a turn went wrong.
pub fn build_generator(settings: &EngineSettings, seed: u64) -> Result<Box<dyn NarrativeGenerator>, ConfigError> {
    let generator: Box<dyn NarrativeGenerator> = match settings.provider {
        Provider::Anthropic => Box::new(AnthropicClient::from_env(settings)?),
        Provider::LmStudio => Box::new(LmStudioClient::new(settings)?),
        Provider::Offline => Box::new(OfflineGenerator::seeded(seed)),
    };
    log::info!("Narrative generator: {:?}", settings.provider);
    Ok(generator)
}

fn http_client(timeout_secs: u64) -> Result<Client, ConfigError> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| ConfigError::Client(e.to_string()))
}

fn check_status(resp: reqwest::blocking::Response) -> Result<reqwest::blocking::Response, GeneratorError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().unwrap_or_default();
    Err(GeneratorError::HttpStatus {
        status: status.as_u16(),
        body,
    })
}

/* =========================
   Anthropic Messages API
   ========================= */

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<ChatMessage>,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

pub struct AnthropicClient {
    client: Client,
    api_key: String,
    url: String,
    model: String,
    max_tokens: u32,
}

impl AnthropicClient {
    pub fn new(api_key: String, settings: &EngineSettings) -> Result<Self, ConfigError> {
        if api_key.trim().is_empty() {
            return Err(ConfigError::MissingApiKey(ANTHROPIC_API_KEY_VAR));
        }
        Ok(Self {
            client: http_client(settings.timeout_secs)?,
            api_key,
            url: settings.anthropic_url.clone(),
            model: settings.anthropic_model.clone(),
            max_tokens: settings.max_tokens,
        })
    }

    pub fn from_env(settings: &EngineSettings) -> Result<Self, ConfigError> {
        let api_key = std::env::var(ANTHROPIC_API_KEY_VAR)
            .map_err(|_| ConfigError::MissingApiKey(ANTHROPIC_API_KEY_VAR))?;
        Self::new(api_key, settings)
    }
}

impl NarrativeGenerator for AnthropicClient {
    fn generate(&self, req: &GenerationRequest) -> Result<String, GeneratorError> {
        let prompt = PromptBuilder::build(req);
        log::debug!("System prompt:\n{}", prompt.system);
        log::debug!("User prompt: {}", prompt.user);

        let body = MessagesRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            system: &prompt.system,
            messages: vec![ChatMessage {
                role: "user".into(),
                content: prompt.user,
            }],
        };

        let resp = self
            .client
            .post(&self.url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()?;

        let resp: MessagesResponse = check_status(resp)?.json()?;

        let text = resp
            .content
            .into_iter()
            .find(|block| block.kind == "text")
            .and_then(|block| block.text)
            .ok_or_else(|| GeneratorError::MalformedEnvelope("no text content block".into()))?;

        log::debug!("Generator raw response: {}", text);
        Ok(text)
    }
}

/* =========================
   OpenAI-compatible local server
   ========================= */

#[derive(Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Deserialize)]
pub struct ChatCompletionResponse {
    pub choices: Vec<Choice>,
}

#[derive(Deserialize)]
pub struct Choice {
    pub message: ChatMessageResponse,
}

#[derive(Deserialize)]
pub struct ChatMessageResponse {
    pub content: String,
}

pub struct LmStudioClient {
    client: Client,
    base_url: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl LmStudioClient {
    pub fn new(settings: &EngineSettings) -> Result<Self, ConfigError> {
        Ok(Self {
            client: http_client(settings.timeout_secs)?,
            base_url: settings.lm_studio_url.trim_end_matches('/').to_string(),
            model: settings.lm_studio_model.clone(),
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
        })
    }

    pub fn test_connection(&self) -> Result<String> {
        let resp: serde_json::Value = self
            .client
            .get(format!("{}/models", self.base_url))
            .send()?
            .error_for_status()?
            .json()?;

        Ok(format!(
            "Connected ({} models available)",
            resp["data"].as_array().map(|a| a.len()).unwrap_or(0)
        ))
    }
}

impl NarrativeGenerator for LmStudioClient {
    fn generate(&self, req: &GenerationRequest) -> Result<String, GeneratorError> {
        let prompt = PromptBuilder::build(req);
        log::debug!("System prompt:\n{}", prompt.system);

        let body = ChatCompletionRequest {
            model: self.model.clone(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            messages: vec![
                ChatMessage {
                    role: "system".into(),
                    content: prompt.system,
                },
                ChatMessage {
                    role: "user".into(),
                    content: prompt.user,
                },
            ],
        };

        let resp = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .json(&body)
            .send()?;

        let resp: ChatCompletionResponse = check_status(resp)?.json()?;

        let text = resp
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| GeneratorError::MalformedEnvelope("no choices returned".into()))?;

        log::debug!("Generator raw response: {}", text);
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_api_key_is_a_config_error() {
        let err = AnthropicClient::new("  ".into(), &EngineSettings::default())
            .err()
            .unwrap();
        assert!(matches!(err, ConfigError::MissingApiKey(ANTHROPIC_API_KEY_VAR)));
    }

    #[test]
    fn offline_provider_needs_no_credentials() {
        let settings = EngineSettings {
            provider: Provider::Offline,
            ..EngineSettings::default()
        };
        assert!(build_generator(&settings, 1).is_ok());
    }

    #[test]
    fn anthropic_envelope_text_block_is_found() {
        let resp: MessagesResponse = serde_json::from_str(
            r#"{"content":[{"type":"tool_use","id":"x"},{"type":"text","text":"{\"msg\":\"gm\"}"}]}"#,
        )
        .unwrap();
        let text = resp
            .content
            .into_iter()
            .find(|b| b.kind == "text")
            .and_then(|b| b.text);
        assert_eq!(text.as_deref(), Some("{\"msg\":\"gm\"}"));
    }
}
