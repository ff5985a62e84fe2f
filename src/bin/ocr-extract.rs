//! CLI binary for pdf-ocr-extract.
//!
//! A thin shim over the library crate: maps flags onto `ExtractionConfig`,
//! runs the pipeline and prints the outcome as one report string.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pdf_ocr_extract::{
    extract, recognise, report_outcome, ExtractError, ExtractionConfig,
    ExtractionProgressCallback, PageSelection, ProgressCallback,
};
use serde::Serialize;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Spinner while the PDF opens, then a page bar; one log line per page.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(TICKS),
        );
        bar.set_prefix("Preparing");
        bar.set_message("Opening PDF…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self { bar })
    }
}

impl ExtractionProgressCallback for CliProgressCallback {
    fn on_document_opened(&self, total_pages: usize, selected_pages: usize) {
        self.bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.cyan} {prefix:.bold}  [{bar:42.green/238}] {pos:>3}/{len} pages  {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏  ")
            .tick_strings(TICKS),
        );
        self.bar.set_length(selected_pages as u64);
        self.bar.set_prefix("OCR");
        self.bar.set_message(dim(&format!("{total_pages} in document")));
    }

    fn on_page_start(&self, page_num: usize) {
        self.bar.set_message(format!("page {page_num}"));
    }

    fn on_page_complete(&self, page_num: usize, text_len: usize) {
        self.bar.println(format!(
            "  {} Page {:>3}  {}",
            green("✓"),
            page_num,
            dim(&format!("{text_len:>6} chars")),
        ));
        self.bar.inc(1);
    }

    fn on_page_skipped(&self, page_num: usize, reason: &str) {
        let msg: String = if reason.chars().count() > 80 {
            reason.chars().take(79).chain(['…']).collect()
        } else {
            reason.to_string()
        };
        self.bar
            .println(format!("  {} Page {:>3}  {}", red("✗"), page_num, red(&msg)));
        self.bar.inc(1);
    }

    fn on_answer_start(&self, text_len: usize) {
        self.bar.set_prefix("Asking");
        self.bar
            .set_message(format!("sending {text_len} chars to the model…"));
    }

    fn on_run_complete(&self, recognised_pages: usize, skipped_pages: usize) {
        self.bar.finish_and_clear();
        let mark = if skipped_pages == 0 { green("✔") } else { red("⚠") };
        eprintln!("{mark} {recognised_pages} pages recognised, {skipped_pages} skipped");
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Default document and prompt
  ocr-extract

  # Another statement, Portuguese OCR hint, first three pages
  ocr-extract --language-hint pt --pages 1-3 balanco-2023.pdf

  # Only run OCR and print the aggregated text
  ocr-extract --text-only report.pdf

  # Custom instruction, JSON output with per-page details
  ocr-extract --prompt-file ask-net-income.txt --json report.pdf

  # Answer with another LLM provider through edgequake-llm
  ocr-extract --provider openai --model gpt-4.1-mini report.pdf

ENVIRONMENT VARIABLES:
  GEMINI_API_KEY          Gemini API key (required)
  GOOGLE_VISION_API_KEY   Cloud Vision API key (defaults to GEMINI_API_KEY)
  GEMINI_MODEL            Model ID (default: gemini-1.5-flash)
  PDFIUM_LIB_PATH         Path to libpdfium
  RUST_LOG                Log filter, overrides --verbose/--quiet

  Variables are also read from a .env file in the working directory.
"#;

/// Extract a figure from a scanned PDF with OCR and a generative model.
#[derive(Parser, Debug)]
#[command(
    name = "ocr-extract",
    version,
    about = "Extract figures from scanned PDFs: pdfium → Cloud Vision OCR → Gemini",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// PDF file to read.
    #[arg(default_value = "orestes.pdf")]
    input: PathBuf,

    /// Read the instruction prompt from this file instead of the built-in one.
    #[arg(long, env = "OCR_EXTRACT_PROMPT_FILE")]
    prompt_file: Option<PathBuf>,

    /// Model ID (overrides GEMINI_MODEL).
    #[arg(long)]
    model: Option<String>,

    /// Answer through an edgequake-llm provider (openai, anthropic, ollama, ...)
    /// instead of the Gemini REST API.
    #[arg(long, env = "OCR_EXTRACT_PROVIDER")]
    provider: Option<String>,

    /// Page selection: all, 5, 3-15, or 1,3,5,7.
    #[arg(long, env = "OCR_EXTRACT_PAGES", default_value = "all")]
    pages: String,

    /// Render scale factor (1.0–6.0).
    #[arg(long, env = "OCR_EXTRACT_SCALE", default_value_t = 3.0)]
    scale: f32,

    /// OCR requests in flight at once.
    #[arg(short, long, env = "OCR_EXTRACT_CONCURRENCY", default_value_t = 1)]
    concurrency: usize,

    /// OCR language hint (BCP-47, repeatable), e.g. `pt`.
    #[arg(long = "language-hint")]
    language_hints: Vec<String>,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "OCR_EXTRACT_PASSWORD")]
    password: Option<String>,

    /// Per-request HTTP timeout in seconds (default: none).
    #[arg(long, env = "OCR_EXTRACT_TIMEOUT")]
    timeout: Option<u64>,

    /// Stop after OCR and print the aggregated text.
    #[arg(long)]
    text_only: bool,

    /// Print the full result as JSON.
    #[arg(long)]
    json: bool,

    /// Disable the progress bar.
    #[arg(long, env = "OCR_EXTRACT_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long)]
    verbose: bool,

    /// Suppress everything except the report.
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Serialize)]
struct JsonError {
    kind: pdf_ocr_extract::ErrorKind,
    error: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build config ─────────────────────────────────────────────────────
    // A missing API key is the one failure that stops before any work.
    let builder = match ExtractionConfig::from_env() {
        Ok(builder) => builder,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(2);
        }
    };

    let progress: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn ExtractionProgressCallback>)
    } else {
        None
    };
    let config = apply_cli(builder, &cli, progress)
        .await?
        .build()
        .context("Invalid configuration")?;

    // ── Run ──────────────────────────────────────────────────────────────
    let report = if cli.text_only {
        let outcome = recognise(&cli.input, &config).await;
        render(&outcome, cli.json)?
    } else {
        let outcome = extract(&cli.input, &config).await;
        if !cli.quiet && !cli.json {
            if let Ok(ref out) = outcome {
                eprintln!(
                    "{}",
                    dim(&format!(
                        "{}/{} pages in {}ms (OCR {}ms, model {}ms)",
                        out.stats.recognised_pages,
                        out.stats.selected_pages,
                        out.stats.total_duration_ms,
                        out.stats.ocr_duration_ms,
                        out.stats.llm_duration_ms
                    ))
                );
            }
        }
        render(&outcome, cli.json)?
    };

    println!("{report}");
    Ok(())
}

/// Either the plain report string or, with `--json`, the serialised result.
fn render<T>(outcome: &Result<T, ExtractError>, json: bool) -> Result<String>
where
    T: Serialize + pdf_ocr_extract::report::Reportable,
{
    if !json {
        return Ok(report_outcome(outcome));
    }
    let value = match outcome {
        Ok(value) => serde_json::to_string_pretty(value),
        Err(e) => serde_json::to_string_pretty(&JsonError {
            kind: e.kind(),
            error: e.to_string(),
        }),
    };
    value.context("Failed to serialise output")
}

/// Map CLI args onto the env-derived builder.
async fn apply_cli(
    mut builder: pdf_ocr_extract::ExtractionConfigBuilder,
    cli: &Cli,
    progress: Option<ProgressCallback>,
) -> Result<pdf_ocr_extract::ExtractionConfigBuilder> {
    if let Some(ref path) = cli.prompt_file {
        let prompt = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read prompt from {:?}", path))?;
        builder = builder.prompt(prompt);
    }
    if let Some(ref model) = cli.model {
        builder = builder.model(model.clone());
    }
    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider.clone());
    }
    if let Some(ref password) = cli.password {
        builder = builder.password(password.clone());
    }
    if let Some(secs) = cli.timeout {
        builder = builder.request_timeout_secs(secs);
    }
    for hint in &cli.language_hints {
        builder = builder.language_hint(hint.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    Ok(builder
        .pages(parse_pages(&cli.pages)?)
        .render_scale(cli.scale)
        .ocr_concurrency(cli.concurrency))
}

/// Parse `--pages` string into `PageSelection`.
fn parse_pages(s: &str) -> Result<PageSelection> {
    let s = s.trim().to_lowercase();

    if s == "all" {
        return Ok(PageSelection::All);
    }

    // Range: "3-15"
    if let Some((start, end)) = s.split_once('-') {
        let start: usize = start.trim().parse().context("Invalid start page in range")?;
        let end: usize = end.trim().parse().context("Invalid end page in range")?;
        if start < 1 {
            anyhow::bail!("Pages are 1-indexed, minimum is 1 (got {})", start);
        }
        if start > end {
            anyhow::bail!("Invalid page range '{}-{}': start must be <= end", start, end);
        }
        return Ok(PageSelection::Range(start, end));
    }

    // Set: "1,3,5,7"
    if s.contains(',') {
        let pages = s
            .split(',')
            .map(|p| {
                p.trim()
                    .parse::<usize>()
                    .with_context(|| format!("Invalid page number: '{}'", p.trim()))
            })
            .collect::<Result<Vec<_>>>()?;
        if pages.contains(&0) {
            anyhow::bail!("Pages are 1-indexed, minimum is 1 (got 0)");
        }
        return Ok(PageSelection::Set(pages));
    }

    let page: usize = s.parse().context("Invalid page number")?;
    if page < 1 {
        anyhow::bail!("Pages are 1-indexed, minimum is 1 (got {})", page);
    }
    Ok(PageSelection::Single(page))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pages_flag_forms() {
        assert_eq!(parse_pages("all").unwrap(), PageSelection::All);
        assert_eq!(parse_pages(" 4 ").unwrap(), PageSelection::Single(4));
        assert_eq!(parse_pages("2-5").unwrap(), PageSelection::Range(2, 5));
        assert_eq!(parse_pages("1,3").unwrap(), PageSelection::Set(vec![1, 3]));
    }

    #[test]
    fn pages_flag_rejects_bad_input() {
        assert!(parse_pages("0").is_err());
        assert!(parse_pages("5-2").is_err());
        assert!(parse_pages("1,x").is_err());
        assert!(parse_pages("0,2").is_err());
    }

    #[test]
    fn input_defaults_to_orestes() {
        let cli = Cli::parse_from(["ocr-extract"]);
        assert_eq!(cli.input, PathBuf::from("orestes.pdf"));
        assert_eq!(cli.concurrency, 1);
        assert!(!cli.text_only);
    }
}
