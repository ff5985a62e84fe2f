//! Configuration types for OCR-based figure extraction.
//!
//! All run behaviour is controlled through [`ExtractionConfig`], built once
//! at process start and passed by reference into every entry point. Nothing
//! below the CLI reads the environment directly, so tests can inject fake
//! keys and point the clients at a local server.
//!
//! [`ExtractionConfig::from_env`] is the only place that looks at process
//! environment variables:
//!
//! | Variable | Required | Purpose |
//! |----------|----------|---------|
//! | `GEMINI_API_KEY` | yes | generative-text API key (query parameter) |
//! | `GOOGLE_VISION_API_KEY` | no | Vision API key; falls back to the Gemini key |
//! | `GEMINI_MODEL` | no | model id, default `gemini-1.5-flash` |
//! | `PDFIUM_LIB_PATH` | no | explicit path to the pdfium shared library |

use crate::error::ExtractError;
use crate::progress::ProgressCallback;
use crate::prompts::DEFAULT_PROMPT;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Environment variable holding the generative-text API key.
pub const API_KEY_VAR: &str = "GEMINI_API_KEY";
/// Environment variable holding an optional dedicated Vision API key.
pub const VISION_API_KEY_VAR: &str = "GOOGLE_VISION_API_KEY";
/// Environment variable overriding the Gemini model id.
pub const MODEL_VAR: &str = "GEMINI_MODEL";
/// Environment variable pointing at an existing pdfium library.
pub const PDFIUM_LIB_VAR: &str = "PDFIUM_LIB_PATH";

pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_VISION_BASE_URL: &str = "https://vision.googleapis.com";

/// Configuration for a single extraction run.
///
/// Built via [`ExtractionConfig::builder()`] or [`ExtractionConfig::from_env()`].
///
/// # Example
/// ```rust
/// use pdf_ocr_extract::ExtractionConfig;
///
/// let config = ExtractionConfig::builder("my-key")
///     .model("gemini-1.5-pro")
///     .ocr_concurrency(4)
///     .build()
///     .unwrap();
/// assert_eq!(config.render_scale, 3.0);
/// ```
#[derive(Clone)]
pub struct ExtractionConfig {
    /// Generative-text API key, sent as the `key` query parameter.
    pub api_key: String,

    /// Cloud Vision API key. Falls back to `api_key` when `None`.
    pub vision_api_key: Option<String>,

    /// Gemini model identifier. Default: `gemini-1.5-flash`.
    pub model: String,

    /// Scheme + host of the generative-text endpoint.
    pub gemini_base_url: String,

    /// Scheme + host of the Cloud Vision endpoint.
    pub vision_base_url: String,

    /// Instruction prepended verbatim to the aggregated document text.
    pub prompt: String,

    /// Uniform scale applied when rasterising each page. Default: 3.0.
    ///
    /// 3x in each direction (9x the pixel area of a 72-DPI render) keeps
    /// small print legible for OCR on scanned statements.
    pub render_scale: f32,

    /// Number of OCR requests in flight at once. Default: 1.
    ///
    /// Results are always collected in ascending page order regardless of
    /// this value; it only bounds how many pages are rendered ahead.
    pub ocr_concurrency: usize,

    /// Page selection. Default: all pages.
    pub pages: PageSelection,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// BCP-47 language hints for the OCR service (e.g. `pt`).
    pub language_hints: Vec<String>,

    /// Sampling temperature. `None` sends no `generationConfig`.
    pub temperature: Option<f32>,

    /// Output token cap. `None` sends no `generationConfig`.
    pub max_output_tokens: Option<u32>,

    /// Per-request HTTP timeout. `None` leaves the client default in place.
    pub request_timeout_secs: Option<u64>,

    /// Name of an `edgequake-llm` provider (e.g. `openai`, `anthropic`).
    /// If None, answers come from the built-in Gemini REST client.
    pub provider_name: Option<String>,

    /// Explicit pdfium library path. If None, the working directory and
    /// then the system library path are searched.
    pub pdfium_lib_path: Option<PathBuf>,

    /// Per-page progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl fmt::Debug for ExtractionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionConfig")
            .field("api_key", &"<redacted>")
            .field(
                "vision_api_key",
                &self.vision_api_key.as_ref().map(|_| "<redacted>"),
            )
            .field("model", &self.model)
            .field("gemini_base_url", &self.gemini_base_url)
            .field("vision_base_url", &self.vision_base_url)
            .field("render_scale", &self.render_scale)
            .field("ocr_concurrency", &self.ocr_concurrency)
            .field("pages", &self.pages)
            .field("language_hints", &self.language_hints)
            .field("temperature", &self.temperature)
            .field("max_output_tokens", &self.max_output_tokens)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("provider_name", &self.provider_name)
            .field("pdfium_lib_path", &self.pdfium_lib_path)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn callback>"),
            )
            .finish()
    }
}

impl ExtractionConfig {
    /// Create a new builder with every knob at its default.
    pub fn builder(api_key: impl Into<String>) -> ExtractionConfigBuilder {
        ExtractionConfigBuilder {
            config: Self {
                api_key: api_key.into(),
                vision_api_key: None,
                model: DEFAULT_MODEL.to_string(),
                gemini_base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
                vision_base_url: DEFAULT_VISION_BASE_URL.to_string(),
                prompt: DEFAULT_PROMPT.to_string(),
                render_scale: 3.0,
                ocr_concurrency: 1,
                pages: PageSelection::default(),
                password: None,
                language_hints: Vec::new(),
                temperature: None,
                max_output_tokens: None,
                request_timeout_secs: None,
                provider_name: None,
                pdfium_lib_path: None,
                progress_callback: None,
            },
        }
    }

    /// Build a builder from process environment variables.
    ///
    /// Fails with [`ExtractError::MissingApiKey`] before anything else
    /// happens when `GEMINI_API_KEY` is unset or empty.
    pub fn from_env() -> Result<ExtractionConfigBuilder, ExtractError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Same as [`from_env`](Self::from_env) against an arbitrary lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<ExtractionConfigBuilder, ExtractError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        let api_key = non_empty(API_KEY_VAR).ok_or_else(|| ExtractError::MissingApiKey {
            var: API_KEY_VAR.to_string(),
        })?;

        let mut builder = Self::builder(api_key);
        if let Some(key) = non_empty(VISION_API_KEY_VAR) {
            builder = builder.vision_api_key(key);
        }
        if let Some(model) = non_empty(MODEL_VAR) {
            builder = builder.model(model);
        }
        if let Some(path) = non_empty(PDFIUM_LIB_VAR) {
            builder = builder.pdfium_lib_path(path);
        }
        Ok(builder)
    }

    /// The key used for Cloud Vision requests.
    pub fn effective_vision_key(&self) -> &str {
        self.vision_api_key.as_deref().unwrap_or(&self.api_key)
    }
}

/// Builder for [`ExtractionConfig`].
pub struct ExtractionConfigBuilder {
    config: ExtractionConfig,
}

impl fmt::Debug for ExtractionConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionConfigBuilder")
            .field("config", &self.config)
            .finish()
    }
}

impl ExtractionConfigBuilder {
    pub fn vision_api_key(mut self, key: impl Into<String>) -> Self {
        self.config.vision_api_key = Some(key.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn gemini_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.gemini_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn vision_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.vision_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.prompt = prompt.into();
        self
    }

    pub fn render_scale(mut self, scale: f32) -> Self {
        self.config.render_scale = scale.clamp(1.0, 6.0);
        self
    }

    pub fn ocr_concurrency(mut self, n: usize) -> Self {
        self.config.ocr_concurrency = n.max(1);
        self
    }

    pub fn pages(mut self, selection: PageSelection) -> Self {
        self.config.pages = selection;
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn language_hint(mut self, hint: impl Into<String>) -> Self {
        self.config.language_hints.push(hint.into());
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = Some(t.clamp(0.0, 2.0));
        self
    }

    pub fn max_output_tokens(mut self, n: u32) -> Self {
        self.config.max_output_tokens = Some(n);
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = Some(secs);
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn pdfium_lib_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pdfium_lib_path = Some(path.into());
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ExtractionConfig, ExtractError> {
        let c = &self.config;
        if c.api_key.trim().is_empty() {
            return Err(ExtractError::MissingApiKey {
                var: API_KEY_VAR.to_string(),
            });
        }
        if c.model.trim().is_empty() {
            return Err(ExtractError::InvalidConfig("model must not be empty".into()));
        }
        if !c.render_scale.is_finite() {
            return Err(ExtractError::InvalidConfig(format!(
                "render scale must be finite, got {}",
                c.render_scale
            )));
        }
        Ok(self.config)
    }
}

// ── Page selection ───────────────────────────────────────────────────────

/// Specifies which pages of the PDF to process.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageSelection {
    /// Every page (default).
    #[default]
    All,
    /// A single page (1-indexed).
    Single(usize),
    /// A contiguous range of pages (1-indexed, inclusive).
    Range(usize, usize),
    /// Specific pages (1-indexed, deduplicated).
    Set(Vec<usize>),
}

impl PageSelection {
    /// Expand the selection into a sorted, deduplicated list of 0-indexed page numbers.
    pub fn to_indices(&self, total_pages: usize) -> Vec<usize> {
        let mut indices: Vec<usize> = match self {
            PageSelection::All => (0..total_pages).collect(),
            PageSelection::Single(p) => {
                if *p >= 1 && *p <= total_pages {
                    vec![p - 1]
                } else {
                    vec![]
                }
            }
            PageSelection::Range(start, end) => {
                let s = (*start).max(1) - 1;
                let e = (*end).min(total_pages);
                (s..e).collect()
            }
            PageSelection::Set(pages) => pages
                .iter()
                .filter(|&&p| p >= 1 && p <= total_pages)
                .map(|p| p - 1)
                .collect(),
        };
        indices.sort_unstable();
        indices.dedup();
        indices
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var: &str| map.get(var).cloned()
    }

    #[test]
    fn missing_api_key_fails_before_build() {
        let err = ExtractionConfig::from_lookup(lookup_from(&[])).unwrap_err();
        assert!(matches!(err, ExtractError::MissingApiKey { ref var } if var == API_KEY_VAR));
        assert_eq!(err.kind(), crate::error::ErrorKind::Config);
    }

    #[test]
    fn empty_api_key_counts_as_missing() {
        let err = ExtractionConfig::from_lookup(lookup_from(&[(API_KEY_VAR, "  ")])).unwrap_err();
        assert!(matches!(err, ExtractError::MissingApiKey { .. }));
    }

    #[test]
    fn env_lookup_populates_keys_and_model() {
        let config = ExtractionConfig::from_lookup(lookup_from(&[
            (API_KEY_VAR, "gem-key"),
            (VISION_API_KEY_VAR, "vis-key"),
            (MODEL_VAR, "gemini-1.5-pro"),
        ]))
        .unwrap()
        .build()
        .unwrap();
        assert_eq!(config.api_key, "gem-key");
        assert_eq!(config.effective_vision_key(), "vis-key");
        assert_eq!(config.model, "gemini-1.5-pro");
    }

    #[test]
    fn vision_key_falls_back_to_api_key() {
        let config = ExtractionConfig::builder("gem-key").build().unwrap();
        assert_eq!(config.effective_vision_key(), "gem-key");
    }

    #[test]
    fn defaults_render_at_3x_sequentially() {
        let config = ExtractionConfig::builder("k").build().unwrap();
        assert_eq!(config.render_scale, 3.0);
        assert_eq!(config.ocr_concurrency, 1);
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.pages, PageSelection::All);
        assert!(config.temperature.is_none());
        assert!(config.request_timeout_secs.is_none());
        assert!(config.prompt.ends_with("\n\n"));
    }

    #[test]
    fn builder_clamps_values() {
        let config = ExtractionConfig::builder("k")
            .render_scale(50.0)
            .ocr_concurrency(0)
            .gemini_base_url("http://127.0.0.1:9000/")
            .build()
            .unwrap();
        assert_eq!(config.render_scale, 6.0);
        assert_eq!(config.ocr_concurrency, 1);
        assert_eq!(config.gemini_base_url, "http://127.0.0.1:9000");
    }

    #[test]
    fn debug_redacts_keys() {
        let config = ExtractionConfig::builder("super-secret")
            .vision_api_key("also-secret")
            .build()
            .unwrap();
        let dbg = format!("{config:?}");
        assert!(!dbg.contains("super-secret"));
        assert!(!dbg.contains("also-secret"));
    }

    #[test]
    fn page_selection_to_indices() {
        assert_eq!(PageSelection::All.to_indices(3), vec![0, 1, 2]);
        assert_eq!(PageSelection::Single(3).to_indices(5), vec![2]);
        assert_eq!(PageSelection::Single(6).to_indices(5), Vec::<usize>::new());
        assert_eq!(PageSelection::Range(2, 9).to_indices(4), vec![1, 2, 3]);
        assert_eq!(
            PageSelection::Set(vec![3, 1, 3]).to_indices(5),
            vec![0, 2]
        );
    }
}
