//! CLI binary for edgequake-idextract.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ExtractionConfig`, prints progress and the final per-image report, and
//! writes the JSON report file.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_idextract::{
    extract_to_file, BatchStats, ExtractionConfig, ExtractionOutput, ExtractionProgressCallback,
    ImageRecord, ProgressCallback,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── Console progress callback ────────────────────────────────────────────────

/// Prints `Processing <file>...` before each image and
/// `Error processing <file>: <err>` on contained failures. With a bar, lines
/// go through `ProgressBar::println` so they don't tear the bar.
struct ConsoleProgress {
    bar: Option<ProgressBar>,
}

impl ConsoleProgress {
    fn new(show_bar: bool) -> Arc<Self> {
        let bar = show_bar.then(|| {
            let bar = ProgressBar::new(0);
            bar.set_style(
                ProgressStyle::with_template(
                    "{spinner:.cyan} {prefix:.bold}  \
                     [{bar:42.green/238}] {pos:>3}/{len} images  \
                     ⏱ {elapsed_precise}",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("█▉▊▋▌▍▎▏  ")
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
            );
            bar.set_prefix("Extracting");
            bar.enable_steady_tick(Duration::from_millis(80));
            bar
        });
        Arc::new(Self { bar })
    }

    fn line(&self, msg: String) {
        match self.bar {
            Some(ref bar) => bar.println(msg),
            None => println!("{msg}"),
        }
    }
}

impl ExtractionProgressCallback for ConsoleProgress {
    fn on_batch_start(&self, total_images: usize) {
        if let Some(ref bar) = self.bar {
            bar.set_length(total_images as u64);
        }
    }

    fn on_image_start(&self, file_name: &str, _index: usize, _total: usize) {
        if let Some(ref bar) = self.bar {
            bar.set_message(file_name.to_string());
        }
        self.line(processing_line(file_name));
    }

    fn on_image_error(&self, file_name: &str, error: &str) {
        self.line(red(&error_line(file_name, error)));
    }

    fn on_image_complete(&self, _file_name: &str, _record: &ImageRecord) {
        if let Some(ref bar) = self.bar {
            bar.inc(1);
        }
    }

    fn on_batch_complete(&self, _stats: &BatchStats) {
        if let Some(ref bar) = self.bar {
            bar.finish_and_clear();
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Process ./data, write ./extracted_data.json
  idextract

  # Another directory and report path
  idextract scans/ -o reports/ids.json

  # Use a specific model
  idextract --model gpt-4.1 --provider openai scans/

OUTPUT:
  The report maps each image file name to either the extracted fields plus
  "document_type", or an error record:
    {"error": "Unsupported document type", "type": "<classifier reply>"}
    {"error": "Failed to parse response: ...", "raw_response": "...", "document_type": "..."}
    {"error": "<read or API error>"}

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY          OpenAI API key
  ANTHROPIC_API_KEY       Anthropic API key
  GEMINI_API_KEY          Google Gemini API key
  EDGEQUAKE_LLM_PROVIDER  Override provider (openai, anthropic, gemini, ollama)
  EDGEQUAKE_MODEL         Override model ID
"#;

/// Extract identity fields from driver's license and passport photos.
#[derive(Parser, Debug)]
#[command(
    name = "idextract",
    version,
    about = "Extract identity fields from ID document photos using Vision LLMs",
    long_about = "Classify each image in a directory as a driver's license, passport or other \
document, extract the type's fields with a Vision Language Model, and write a JSON report keyed \
by file name. Supports every provider edgequake-llm supports (OpenAI, Anthropic, Gemini, Ollama, …).",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Directory containing .png / .jpg / .jpeg images.
    #[arg(default_value = "data", env = "IDEXTRACT_INPUT")]
    input: PathBuf,

    /// Where to write the JSON report.
    #[arg(short, long, env = "IDEXTRACT_OUTPUT", default_value = "extracted_data.json")]
    output: PathBuf,

    /// LLM model ID (e.g. gpt-4.1-nano, gpt-4.1, claude-sonnet-4-20250514).
    #[arg(long, env = "EDGEQUAKE_MODEL")]
    model: Option<String>,

    /// LLM provider: openai, anthropic, gemini, ollama, azure.
    #[arg(long, env = "EDGEQUAKE_PROVIDER")]
    provider: Option<String>,

    /// LLM temperature (0.0–2.0).
    #[arg(long, env = "IDEXTRACT_TEMPERATURE", default_value_t = 0.1)]
    temperature: f32,

    /// Max LLM output tokens per call.
    #[arg(long, env = "IDEXTRACT_MAX_TOKENS", default_value_t = 1024)]
    max_tokens: usize,

    /// Per-call LLM timeout in seconds.
    #[arg(long, env = "IDEXTRACT_API_TIMEOUT", default_value_t = 60)]
    api_timeout: u64,

    /// Disable progress bar.
    #[arg(long, env = "IDEXTRACT_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "IDEXTRACT_VERBOSE")]
    verbose: bool,

    /// Suppress progress and the per-image report; only errors and the summary.
    #[arg(short, long, env = "IDEXTRACT_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar provides the feedback that matters; keep library
    // INFO logs out of its way unless asked for.
    let show_progress = !cli.quiet && !cli.no_progress;
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

    let progress: Option<ProgressCallback> = if cli.quiet {
        None
    } else {
        Some(ConsoleProgress::new(show_progress) as ProgressCallback)
    };

    let config = build_config(&cli, progress)?;

    let output = extract_to_file(&cli.input, &cli.output, &config)
        .await
        .context("Extraction failed")?;

    if !cli.quiet {
        print_report(&output)?;
    }
    print_summary(&output.stats, &cli);

    Ok(())
}

/// Map CLI args to `ExtractionConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ExtractionConfig> {
    let mut builder = ExtractionConfig::builder()
        .temperature(cli.temperature)
        .max_tokens(cli.max_tokens)
        .api_timeout_secs(cli.api_timeout);

    if let Some(ref model) = cli.model {
        builder = builder.model(model);
    }
    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

fn print_report(output: &ExtractionOutput) -> Result<()> {
    for (file_name, record) in output.results.iter() {
        println!(
            "{}",
            report_block(file_name, record).context("Failed to serialise record")?
        );
    }
    Ok(())
}

// ── Console lines ────────────────────────────────────────────────────────────

fn processing_line(file_name: &str) -> String {
    format!("\nProcessing {file_name}...")
}

fn error_line(file_name: &str, error: &str) -> String {
    format!("Error processing {file_name}: {error}")
}

/// `=== <file> ===` followed by the pretty JSON of the record.
fn report_block(file_name: &str, record: &ImageRecord) -> serde_json::Result<String> {
    Ok(format!(
        "\n=== {file_name} ===\n{}",
        serde_json::to_string_pretty(record)?
    ))
}

fn print_summary(stats: &BatchStats, cli: &Cli) {
    let not_extracted = stats.total_images - stats.extracted;
    eprintln!(
        "\n{}  {}/{} extracted  {}ms  →  {}",
        if not_extracted == 0 {
            green("✔")
        } else {
            cyan("⚠")
        },
        bold(&stats.extracted.to_string()),
        stats.total_images,
        stats.total_duration_ms,
        bold(&cli.output.display().to_string()),
    );
    if not_extracted > 0 {
        eprintln!(
            "   {}",
            dim(&format!(
                "{} unsupported  /  {} unparseable  /  {} failed",
                stats.unsupported, stats.parse_failures, stats.failed
            )),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use edgequake_idextract::{DocumentType, ErrorRecord, ExtractedRecord};

    #[test]
    fn progress_lines() {
        assert_eq!(processing_line("front.jpg"), "\nProcessing front.jpg...");
        assert_eq!(
            error_line("front.jpg", "classification call failed: timed out after 60s"),
            "Error processing front.jpg: classification call failed: timed out after 60s"
        );
    }

    #[test]
    fn report_block_for_error_record() {
        let record = ImageRecord::from(ErrorRecord::unsupported("OTHER"));
        assert_eq!(
            report_block("card.png", &record).unwrap(),
            "\n=== card.png ===\n{\n  \"error\": \"Unsupported document type\",\n  \"type\": \"OTHER\"\n}"
        );
    }

    #[test]
    fn report_block_for_extracted_record() {
        let mut fields = serde_json::Map::new();
        fields.insert("passport_number".into(), "X1".into());
        let record = ImageRecord::from(ExtractedRecord::new(fields, &DocumentType::Passport));
        assert_eq!(
            report_block("p.jpg", &record).unwrap(),
            "\n=== p.jpg ===\n{\n  \"passport_number\": \"X1\",\n  \"document_type\": \"PASSPORT\"\n}"
        );
    }

    #[test]
    fn cli_defaults() {
        let cli = Cli::parse_from(["idextract"]);
        assert_eq!(cli.input, PathBuf::from("data"));
        assert_eq!(cli.output, PathBuf::from("extracted_data.json"));
        assert_eq!(cli.api_timeout, 60);
    }
}
