//! CLI binary for pdf-ocr-redact.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `RedactionConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pdf_ocr_redact::pipeline::input::load_pdf;
use pdf_ocr_redact::redact::write_atomic;
use pdf_ocr_redact::{
    inspect, redact_passes, RedactionConfig, RedactionProgressCallback, RedactionReport,
    ProgressCallback, MAX_INPUT_BYTES,
};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
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

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback. Each page advances the bar twice: once when
/// rasterised and once when OCR finishes, so the bar length is `2 × pages`.
struct CliProgressCallback {
    bar: ProgressBar,
    total_pages: AtomicUsize,
}

impl CliProgressCallback {
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Opening PDF…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            total_pages: AtomicUsize::new(0),
        })
    }

    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {msg:<18}  \
             ⏱ {elapsed_precise}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(2 * total as u64);
        self.bar.set_position(0);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Rendering");
        self.bar.reset_eta();
    }
}

impl RedactionProgressCallback for CliProgressCallback {
    fn on_run_start(&self, total_pages: usize) {
        self.total_pages.store(total_pages, Ordering::SeqCst);
        self.activate_bar(total_pages);
    }

    fn on_page_rendered(&self, page_num: usize, total_pages: usize) {
        self.bar.set_message(format!("page {page_num}/{total_pages}"));
        self.bar.inc(1);
    }

    fn on_page_recognized(&self, page_num: usize, total_pages: usize, fragments: usize) {
        if page_num == 1 {
            self.bar.set_prefix("OCR");
        }
        self.bar.set_message(format!("page {page_num}/{total_pages}"));
        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {}",
            green("✓"),
            page_num,
            total_pages,
            dim(&format!("{fragments:>4} lines")),
        ));
        self.bar.inc(1);
    }

    fn on_targets_found(&self, count: usize) {
        self.bar.set_prefix("Redacting");
        self.bar.set_message(format!("{count} targets"));
    }

    fn on_run_complete(&self, applied: usize, skipped: usize) {
        self.bar.finish_and_clear();
        let pages = self.total_pages.load(Ordering::SeqCst);
        eprintln!(
            "{} {} pages scanned, {} redactions drawn{}",
            green("✔"),
            bold(&pages.to_string()),
            bold(&applied.to_string()),
            if skipped > 0 {
                format!(", {} skipped", cyan(&skipped.to_string()))
            } else {
                String::new()
            }
        );
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Redact a name (writes scan_redacted.pdf next to the input)
  pdfredact scan.pdf -q "Jane Doe"

  # Several phrases, explicit output
  pdfredact scan.pdf -q "Jane Doe" -q "555-0199" -o public.pdf

  # Small print: render at 3× for better OCR
  pdfredact --scale 3 contract.pdf -q "Acme"

  # Re-run on the output until nothing new matches (at most 3 passes)
  pdfredact --passes 3 scan.pdf -q confidential

  # Machine-readable report
  pdfredact --json scan.pdf -q "Jane Doe" > report.json

  # Page count and sizes only
  pdfredact --inspect-only scan.pdf

REDACTION POLICY (fixed):
  Whole OCR lines are covered, never single words. A line is redacted when it
  contains any query (case-insensitive) and OCR confidence is above 60.
  Rectangles covering >80% of a page, >95% of its width or >50% of its
  height are refused and reported as skipped.

  Redaction is a visual overlay. The scanned image underneath is kept.

ENVIRONMENT VARIABLES:
  PDFIUM_LIB_PATH         pdfium library file or directory
  PDFREDACT_TESSERACT     tesseract executable
  PDFREDACT_LANG          tesseract language(s), e.g. eng+deu
  RUST_LOG                log filter override (e.g. pdf_ocr_redact=debug)
"#;

/// Black out phrases in scanned PDFs using OCR.
#[derive(Parser, Debug)]
#[command(
    name = "pdfredact",
    version,
    about = "Black out phrases in scanned PDFs using OCR",
    long_about = "Rasterise each page of a PDF, recognise its text with tesseract, and draw \
opaque black rectangles over every line containing one of the query phrases. Page count and \
page sizes are preserved.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local PDF file path.
    input: PathBuf,

    /// Phrase to redact (repeatable, case-insensitive).
    #[arg(short = 'q', long = "query", env = "PDFREDACT_QUERY",
          required_unless_present = "inspect_only")]
    queries: Vec<String>,

    /// Write the redacted PDF here. Default: <input stem>_redacted.pdf.
    #[arg(short, long, env = "PDFREDACT_OUTPUT")]
    output: Option<PathBuf>,

    /// Render scale for OCR (0.25–8.0).
    #[arg(long, env = "PDFREDACT_SCALE", default_value_t = 2.0)]
    scale: f32,

    /// Maximum redaction passes; each pass re-reads the previous output.
    #[arg(long, env = "PDFREDACT_PASSES", default_value_t = 1,
          value_parser = clap::value_parser!(u32).range(1..=10))]
    passes: u32,

    /// Tesseract language(s), e.g. eng or eng+deu.
    #[arg(long, env = "PDFREDACT_LANG", default_value = "eng")]
    lang: String,

    /// Tesseract page segmentation mode (0–13).
    #[arg(long, env = "PDFREDACT_PSM", default_value_t = 3)]
    psm: u8,

    /// Tesseract executable.
    #[arg(long, env = "PDFREDACT_TESSERACT", default_value = "tesseract")]
    tesseract: PathBuf,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "PDFREDACT_PASSWORD")]
    password: Option<String>,

    /// Time budget per pipeline stage in seconds.
    #[arg(long, env = "PDFREDACT_STAGE_TIMEOUT", default_value_t = 600)]
    stage_timeout: u64,

    /// Print the run report as JSON on stdout.
    #[arg(long, env = "PDFREDACT_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "PDFREDACT_NO_PROGRESS")]
    no_progress: bool,

    /// Print page count and sizes only, no OCR.
    #[arg(long)]
    inspect_only: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDFREDACT_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(long, env = "PDFREDACT_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the progress bar is active;
    // the bar provides all the feedback that matters to the user.
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

    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        let config = build_config(&cli, None)?;
        let info = inspect(&cli.input, &config)
            .await
            .context("Failed to inspect PDF")?;

        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&info).context("Failed to serialize page info")?
            );
        } else {
            println!("File:         {}", cli.input.display());
            println!(
                "Size:         {} bytes (limit {})",
                info.file_size, MAX_INPUT_BYTES
            );
            println!("Pages:        {}", info.page_count);
            for (i, page) in info.pages.iter().enumerate() {
                println!(
                    "  {:>4}  {:.1} × {:.1} pt",
                    i + 1,
                    page.width,
                    page.height
                );
            }
        }
        return Ok(());
    }

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        let cb = CliProgressCallback::new_dynamic();
        Some(cb as Arc<dyn RedactionProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb)?;

    let output_path = cli
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&cli.input));
    if is_same_file(&output_path, &cli.input) {
        anyhow::bail!(
            "Refusing to overwrite the input file {}; pass a different --output",
            cli.input.display()
        );
    }

    // ── Run redaction ────────────────────────────────────────────────────
    let pdf = load_pdf(&cli.input)
        .with_context(|| format!("Failed to read {}", cli.input.display()))?;
    let result = redact_passes(pdf, &cli.queries, &config, cli.passes as usize)
        .await
        .context("Redaction failed")?;

    if let Some(ref doc) = result.document {
        write_atomic(&output_path, &doc.bytes)
            .await
            .with_context(|| format!("Failed to write {}", output_path.display()))?;
    }

    if cli.json {
        let json = serde_json::to_string_pretty(&result.reports)
            .context("Failed to serialise report")?;
        println!("{json}");
    } else if !cli.quiet {
        print_summary(&result.reports, result.document.as_ref().map(|_| output_path.as_path()));
    }

    Ok(())
}

/// Map CLI args to `RedactionConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<RedactionConfig> {
    let mut builder = RedactionConfig::builder()
        .render_scale(cli.scale)
        .ocr_language(cli.lang.clone())
        .page_segmentation_mode(cli.psm)
        .tesseract_path(cli.tesseract.clone())
        .stage_timeout_secs(cli.stage_timeout);

    if let Some(ref pwd) = cli.password {
        builder = builder.password(pwd.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// `<dir>/<stem>_redacted.pdf` next to the input.
fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());
    input.with_file_name(format!("{stem}_redacted.pdf"))
}

/// True when `output` names the existing file at `input`, however spelled.
fn is_same_file(output: &Path, input: &Path) -> bool {
    match (std::fs::canonicalize(output), std::fs::canonicalize(input)) {
        (Ok(out), Ok(inp)) => out == inp,
        _ => output == input,
    }
}

fn print_summary(reports: &[RedactionReport], written: Option<&Path>) {
    let applied: usize = reports.iter().map(|r| r.stats.applied).sum();
    let skipped: usize = reports.iter().map(|r| r.stats.skipped).sum();
    let total_ms: u64 = reports.iter().map(|r| r.stats.total_duration_ms).sum();

    match written {
        Some(path) => eprintln!(
            "{}  {} redactions in {} pass(es)  {}ms  →  {}",
            green("✔"),
            applied,
            reports.len(),
            total_ms,
            bold(&path.display().to_string()),
        ),
        None => eprintln!(
            "{}  No text matched the queries; no file written",
            cyan("ℹ")
        ),
    }

    if skipped > 0 {
        eprintln!("   {} targets skipped:", cyan(&skipped.to_string()));
        for report in reports {
            for (reason, count) in &report.stats.skipped_by_reason {
                eprintln!("     {:>4}  {}", count, dim(&reason.to_string()));
            }
        }
    }
}
