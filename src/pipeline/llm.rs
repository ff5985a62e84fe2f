//! Answer request: send prompt + document text to a generative model.
//!
//! The default backend is [`GeminiClient`], which talks to the
//! `generateContent` REST endpoint directly so that the exact status code,
//! error body and response shape are visible to the caller. Any other
//! provider supported by `edgequake-llm` can be used through
//! [`ProviderClient`] (CLI `--provider`).
//!
//! No retries: one request, one answer or one error.

use crate::config::ExtractionConfig;
use crate::error::{ExtractError, HttpErrorDetails};
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, ProviderFactory};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Produces an answer for a fully composed prompt.
#[async_trait]
pub trait AnswerClient: Send + Sync {
    /// Send `prompt` as a single user turn and return the answer text unmodified.
    async fn answer(&self, prompt: &str) -> Result<String, ExtractError>;
}

/// Pick the answer backend for a config: a named `edgequake-llm` provider
/// when `provider_name` is set, the Gemini REST client otherwise.
pub fn client_for(config: &ExtractionConfig) -> Result<Arc<dyn AnswerClient>, ExtractError> {
    match config.provider_name.as_deref() {
        Some(name) => Ok(Arc::new(ProviderClient::from_config(name, config)?)),
        None => Ok(Arc::new(GeminiClient::from_config(config)?)),
    }
}

// ── Gemini REST ──────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    generation_config: Option<GenerationConfig>,
}

impl GeminiClient {
    pub fn new(
        base_url: &str,
        model: &str,
        api_key: impl Into<String>,
        timeout_secs: Option<u64>,
    ) -> Result<Self, ExtractError> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http = builder
            .build()
            .map_err(|e| ExtractError::Internal(format!("HTTP client: {}", e)))?;

        Ok(Self {
            http,
            endpoint: format!(
                "{}/v1beta/models/{}:generateContent",
                base_url.trim_end_matches('/'),
                model
            ),
            api_key: api_key.into(),
            generation_config: None,
        })
    }

    pub fn from_config(config: &ExtractionConfig) -> Result<Self, ExtractError> {
        let mut client = Self::new(
            &config.gemini_base_url,
            &config.model,
            config.api_key.clone(),
            config.request_timeout_secs,
        )?;
        if config.temperature.is_some() || config.max_output_tokens.is_some() {
            client.generation_config = Some(GenerationConfig {
                temperature: config.temperature,
                max_output_tokens: config.max_output_tokens,
            });
        }
        Ok(client)
    }

    fn request_body<'a>(&'a self, prompt: &'a str) -> GenerateRequest<'a> {
        GenerateRequest {
            contents: [Content {
                parts: [Part { text: prompt }],
            }],
            generation_config: self.generation_config.as_ref(),
        }
    }
}

#[async_trait]
impl AnswerClient for GeminiClient {
    async fn answer(&self, prompt: &str) -> Result<String, ExtractError> {
        debug!("Sending {} chars to {}", prompt.len(), self.endpoint);

        let response = self
            .http
            .post(&self.endpoint)
            .query(&[("key", self.api_key.as_str())])
            .json(&self.request_body(prompt))
            .send()
            .await
            .map_err(ExtractError::transport)?;

        let status = response.status();
        let status_error = response.error_for_status_ref().err().map(|e| e.without_url());
        let raw = response.text().await.map_err(ExtractError::transport)?;

        if let Some(e) = status_error {
            let details = match serde_json::from_str::<Value>(&raw) {
                Ok(json) => HttpErrorDetails::Json(json),
                Err(_) => HttpErrorDetails::Raw(raw),
            };
            return Err(ExtractError::HttpStatus {
                message: e.to_string(),
                status: status.as_u16(),
                details,
            });
        }

        let json: Value =
            serde_json::from_str(&raw).map_err(|e| ExtractError::UnexpectedShape {
                detail: format!("body is not JSON: {}", e),
                raw: raw.clone(),
            })?;

        parse_answer(&json, &raw)
    }
}

/// Walk `candidates[0].content.parts[0].text`.
///
/// Missing or empty lists and a missing `text` map to the dedicated shape
/// errors; anything present but of the wrong type keeps the raw body.
pub fn parse_answer(json: &Value, raw: &str) -> Result<String, ExtractError> {
    let unexpected = |detail: &str| ExtractError::UnexpectedShape {
        detail: detail.to_string(),
        raw: raw.to_string(),
    };

    let candidate = match json.get("candidates") {
        None | Some(Value::Null) => return Err(ExtractError::NoCandidates),
        Some(Value::Array(list)) => list.first().ok_or(ExtractError::NoCandidates)?,
        Some(_) => return Err(unexpected("'candidates' is not a list")),
    };

    let content = match candidate.get("content") {
        Some(Value::Object(content)) => content,
        _ => return Err(unexpected("first candidate has no 'content' object")),
    };

    let part = match content.get("parts") {
        None | Some(Value::Null) => return Err(ExtractError::NoParts),
        Some(Value::Array(list)) => list.first().ok_or(ExtractError::NoParts)?,
        Some(_) => return Err(unexpected("'parts' is not a list")),
    };

    match part.get("text") {
        None => Err(ExtractError::NoText),
        Some(Value::String(text)) => Ok(text.clone()),
        Some(_) => Err(unexpected("'text' is not a string")),
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<&'a GenerationConfig>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

// ── edgequake-llm provider ───────────────────────────────────────────────

/// Answer backend routed through an `edgequake-llm` provider
/// (`openai`, `anthropic`, `ollama`, ...). The provider reads its own API
/// key from the environment.
pub struct ProviderClient {
    provider: Arc<dyn LLMProvider>,
    name: String,
    options: CompletionOptions,
}

impl ProviderClient {
    pub fn from_config(name: &str, config: &ExtractionConfig) -> Result<Self, ExtractError> {
        let provider = ProviderFactory::create_llm_provider(name, &config.model).map_err(|e| {
            ExtractError::ProviderFailed {
                provider: name.to_string(),
                detail: format!("provider could not be created: {e}"),
            }
        })?;
        Ok(Self::with_provider(provider, name, config))
    }

    /// Wrap an already constructed provider.
    pub fn with_provider(
        provider: Arc<dyn LLMProvider>,
        name: impl Into<String>,
        config: &ExtractionConfig,
    ) -> Self {
        Self {
            provider,
            name: name.into(),
            options: build_options(config),
        }
    }
}

#[async_trait]
impl AnswerClient for ProviderClient {
    async fn answer(&self, prompt: &str) -> Result<String, ExtractError> {
        let messages = [ChatMessage::user(prompt)];
        let response = self
            .provider
            .chat(&messages, Some(&self.options))
            .await
            .map_err(|e| ExtractError::ProviderFailed {
                provider: self.name.clone(),
                detail: e.to_string(),
            })?;
        debug!(
            "{}: {} input tokens, {} output tokens",
            self.name, response.prompt_tokens, response.completion_tokens
        );
        Ok(response.content)
    }
}

fn build_options(config: &ExtractionConfig) -> CompletionOptions {
    CompletionOptions {
        temperature: config.temperature,
        max_tokens: config.max_output_tokens.map(|n| n as usize),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use serde_json::json;

    fn parse(value: Value) -> Result<String, ExtractError> {
        let raw = value.to_string();
        parse_answer(&value, &raw)
    }

    #[test]
    fn answer_text_is_returned_verbatim() {
        let text = "```json\n{\"total_assets\": \"1.234.567\", \"date\": \"31/12/2022\"}\n```";
        let got = parse(json!({
            "candidates": [{"content": {"parts": [{"text": text}], "role": "model"}}]
        }))
        .unwrap();
        assert_eq!(got, text);
    }

    #[test]
    fn only_first_candidate_and_part_are_used() {
        let got = parse(json!({
            "candidates": [
                {"content": {"parts": [{"text": "first"}, {"text": "second"}]}},
                {"content": {"parts": [{"text": "other"}]}}
            ]
        }))
        .unwrap();
        assert_eq!(got, "first");
    }

    #[test]
    fn missing_or_empty_candidates() {
        assert!(matches!(parse(json!({})), Err(ExtractError::NoCandidates)));
        assert!(matches!(parse(json!({"candidates": []})), Err(ExtractError::NoCandidates)));
        assert!(matches!(parse(json!({"candidates": null})), Err(ExtractError::NoCandidates)));
    }

    #[test]
    fn missing_or_empty_parts() {
        assert!(matches!(
            parse(json!({"candidates": [{"content": {}}]})),
            Err(ExtractError::NoParts)
        ));
        assert!(matches!(
            parse(json!({"candidates": [{"content": {"parts": []}}]})),
            Err(ExtractError::NoParts)
        ));
    }

    #[test]
    fn missing_text_field() {
        let err = parse(json!({"candidates": [{"content": {"parts": [{"inlineData": {}}]}}]}))
            .unwrap_err();
        assert!(matches!(err, ExtractError::NoText));
        assert_eq!(err.kind(), ErrorKind::ShapeError);
    }

    #[test]
    fn wrong_types_keep_raw_body() {
        let err = parse(json!({"candidates": "nope"})).unwrap_err();
        match err {
            ExtractError::UnexpectedShape { raw, .. } => assert!(raw.contains("nope")),
            other => panic!("unexpected error: {other:?}"),
        }

        let err = parse(json!({"candidates": [{"finishReason": "SAFETY"}]})).unwrap_err();
        assert!(matches!(err, ExtractError::UnexpectedShape { .. }));

        let err = parse(json!({"candidates": [{"content": {"parts": [{"text": 5}]}}]})).unwrap_err();
        assert!(err.to_string().contains("Full Gemini response"));
    }

    #[test]
    fn endpoint_and_body() {
        let client =
            GeminiClient::new("https://gl.example/", "gemini-1.5-flash", "k", None).unwrap();
        assert_eq!(
            client.endpoint,
            "https://gl.example/v1beta/models/gemini-1.5-flash:generateContent"
        );
        let body = serde_json::to_value(client.request_body("Q:doc")).unwrap();
        assert_eq!(body, json!({"contents": [{"parts": [{"text": "Q:doc"}]}]}));
    }

    #[test]
    fn generation_config_only_when_tuned() {
        let config = ExtractionConfig::builder("k").build().unwrap();
        let client = GeminiClient::from_config(&config).unwrap();
        assert!(client.generation_config.is_none());

        let config = ExtractionConfig::builder("k")
            .temperature(0.2)
            .max_output_tokens(512)
            .build()
            .unwrap();
        let client = GeminiClient::from_config(&config).unwrap();
        let body = serde_json::to_value(client.request_body("x")).unwrap();
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 512);
        assert!(body["generationConfig"]["temperature"].is_number());
    }

    #[test]
    fn provider_options_follow_config() {
        let config = ExtractionConfig::builder("k")
            .max_output_tokens(256)
            .build()
            .unwrap();
        let opts = build_options(&config);
        assert_eq!(opts.max_tokens, Some(256));
        assert_eq!(opts.temperature, None);
    }
}
