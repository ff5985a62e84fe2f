//! OCR client: one Cloud Vision `DOCUMENT_TEXT_DETECTION` request per page.
//!
//! The engine sits behind the [`OcrEngine`] trait so the orchestration in
//! [`crate::extract`] can be driven by a fake in tests. Every failure here is
//! page-scoped: a [`PageError`] is returned, the caller logs it and moves on
//! to the next page. Nothing is retried.

use crate::config::ExtractionConfig;
use crate::error::{ExtractError, PageError};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Recognises text in a single rendered page.
#[async_trait]
pub trait OcrEngine: Send + Sync {
    /// Return the full text of the page, or why the page has none.
    async fn detect_text(&self, page_num: usize, png: &[u8]) -> Result<String, PageError>;
}

/// Cloud Vision REST client (`v1/images:annotate`), authenticated with an API key.
#[derive(Debug, Clone)]
pub struct VisionClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    language_hints: Vec<String>,
}

impl VisionClient {
    pub fn new(
        base_url: &str,
        api_key: impl Into<String>,
        language_hints: Vec<String>,
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
            endpoint: format!("{}/v1/images:annotate", base_url.trim_end_matches('/')),
            api_key: api_key.into(),
            language_hints,
        })
    }

    pub fn from_config(config: &ExtractionConfig) -> Result<Self, ExtractError> {
        Self::new(
            &config.vision_base_url,
            config.effective_vision_key(),
            config.language_hints.clone(),
            config.request_timeout_secs,
        )
    }

    fn request_body<'a>(&'a self, png: &[u8]) -> AnnotateBatchRequest<'a> {
        AnnotateBatchRequest {
            requests: [AnnotateImageRequest {
                image: VisionImage {
                    content: STANDARD.encode(png),
                },
                features: [Feature {
                    kind: "DOCUMENT_TEXT_DETECTION",
                }],
                image_context: (!self.language_hints.is_empty()).then(|| ImageContext {
                    language_hints: &self.language_hints,
                }),
            }],
        }
    }
}

#[async_trait]
impl OcrEngine for VisionClient {
    async fn detect_text(&self, page_num: usize, png: &[u8]) -> Result<String, PageError> {
        let request_failed = |detail: String| PageError::OcrRequestFailed {
            page: page_num,
            detail,
        };

        let response = self
            .http
            .post(&self.endpoint)
            .query(&[("key", self.api_key.as_str())])
            .json(&self.request_body(png))
            .send()
            .await
            .map_err(|e| request_failed(e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(request_failed(format!(
                "HTTP {}: {}",
                status,
                truncate(&body, 500)
            )));
        }

        let batch: AnnotateBatchResponse = response
            .json()
            .await
            .map_err(|e| request_failed(format!("invalid response: {}", e.without_url())))?;

        interpret(page_num, batch)
    }
}

/// Reduce a batch response to the page text or a page error.
fn interpret(page_num: usize, batch: AnnotateBatchResponse) -> Result<String, PageError> {
    let Some(response) = batch.responses.into_iter().next() else {
        return Err(PageError::NoText { page: page_num });
    };

    if let Some(status) = response.error {
        if !status.message.is_empty() {
            return Err(PageError::OcrServiceError {
                page: page_num,
                message: status.message,
            });
        }
    }

    match response.full_text_annotation {
        Some(annotation) if !annotation.text.is_empty() => {
            debug!("Page {}: {} chars recognised", page_num, annotation.text.len());
            Ok(annotation.text)
        }
        _ => Err(PageError::NoText { page: page_num }),
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}…", &s[..idx]),
        None => s.to_string(),
    }
}

// ── Wire types ───────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct AnnotateBatchRequest<'a> {
    requests: [AnnotateImageRequest<'a>; 1],
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AnnotateImageRequest<'a> {
    image: VisionImage,
    features: [Feature; 1],
    #[serde(skip_serializing_if = "Option::is_none")]
    image_context: Option<ImageContext<'a>>,
}

#[derive(Debug, Serialize)]
struct VisionImage {
    content: String,
}

#[derive(Debug, Serialize)]
struct Feature {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImageContext<'a> {
    language_hints: &'a [String],
}

#[derive(Debug, Default, Deserialize)]
struct AnnotateBatchResponse {
    #[serde(default)]
    responses: Vec<AnnotateImageResponse>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnnotateImageResponse {
    full_text_annotation: Option<TextAnnotation>,
    error: Option<RpcStatus>,
}

#[derive(Debug, Deserialize)]
struct TextAnnotation {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct RpcStatus {
    #[serde(default)]
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: serde_json::Value) -> AnnotateBatchResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn full_text_is_returned() {
        let batch = parse(json!({
            "responses": [{"fullTextAnnotation": {"text": "Ativo total 1.234"}}]
        }));
        assert_eq!(interpret(1, batch).unwrap(), "Ativo total 1.234");
    }

    #[test]
    fn service_error_skips_page() {
        let batch = parse(json!({
            "responses": [{"error": {"code": 3, "message": "Bad image data."}}]
        }));
        let err = interpret(2, batch).unwrap_err();
        assert!(matches!(err, PageError::OcrServiceError { page: 2, ref message } if message == "Bad image data."));
    }

    #[test]
    fn missing_annotation_is_no_text() {
        let batch = parse(json!({"responses": [{}]}));
        assert!(matches!(interpret(3, batch), Err(PageError::NoText { page: 3 })));

        let batch = parse(json!({"responses": [{"fullTextAnnotation": {"text": ""}}]}));
        assert!(matches!(interpret(3, batch), Err(PageError::NoText { page: 3 })));

        assert!(matches!(
            interpret(4, AnnotateBatchResponse::default()),
            Err(PageError::NoText { page: 4 })
        ));
    }

    #[test]
    fn empty_error_message_is_not_an_error() {
        let batch = parse(json!({
            "responses": [{"error": {"message": ""}, "fullTextAnnotation": {"text": "ok"}}]
        }));
        assert_eq!(interpret(1, batch).unwrap(), "ok");
    }

    #[test]
    fn request_body_shape() {
        let client = VisionClient::new("https://vision.example", "k", vec!["pt".into()], None).unwrap();
        let body = serde_json::to_value(client.request_body(b"png")).unwrap();
        assert_eq!(body["requests"][0]["features"][0]["type"], "DOCUMENT_TEXT_DETECTION");
        assert_eq!(body["requests"][0]["image"]["content"], STANDARD.encode(b"png"));
        assert_eq!(body["requests"][0]["imageContext"]["languageHints"][0], "pt");
        assert_eq!(client.endpoint, "https://vision.example/v1/images:annotate");
    }

    #[test]
    fn request_body_omits_empty_context() {
        let client = VisionClient::new("https://vision.example/", "k", vec![], None).unwrap();
        let body = serde_json::to_value(client.request_body(b"png")).unwrap();
        assert!(body["requests"][0].get("imageContext").is_none());
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("ação", 2), "aç…");
        assert_eq!(truncate("abc", 10), "abc");
    }
}
