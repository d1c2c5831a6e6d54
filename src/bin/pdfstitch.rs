//! CLI binary for edgequake-pdfstitch.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ConversionOptions`, runs one of the conversion modes, and prints the
//! result record as JSON on stdout.

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use edgequake_pdfstitch::{
    convert_batch, convert_file, convert_url, parse_hex_color, skill_info, ConversionOptions,
    ConversionProgressCallback, ConversionResult, PdfStitchError, PdfiumRenderer,
    ProgressCallback,
};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use serde::Serialize;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
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

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress: a spinner per stage for single files, and a counted
/// bar with one log line per file in batch mode.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    /// Starts hidden; the first conversion or batch event draws it.
    fn new() -> Arc<Self> {
        let bar = ProgressBar::hidden();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(TICKS),
        );
        bar.set_prefix("Preparing");
        Arc::new(Self { bar })
    }

    fn show(&self) {
        if self.bar.is_hidden() && !self.bar.is_finished() {
            self.bar.set_draw_target(ProgressDrawTarget::stderr());
            self.bar.enable_steady_tick(Duration::from_millis(80));
        }
    }

    fn in_batch(&self) -> bool {
        self.bar.length().unwrap_or(0) > 0
    }

    fn clear(&self) {
        if !self.bar.is_finished() {
            self.bar.finish_and_clear();
        }
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_conversion_start(&self, input: &Path) {
        let name = input
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.show();
        if !self.in_batch() {
            self.bar.set_prefix("Rendering");
        }
        self.bar.set_message(name);
    }

    fn on_render_complete(&self, pages: usize, elapsed_ms: u64) {
        if !self.in_batch() {
            self.bar.println(format!(
                "  {} Rendered {} pages  {}",
                green("✓"),
                bold(&pages.to_string()),
                dim(&format!("{:.1}s", elapsed_ms as f64 / 1000.0)),
            ));
            self.bar.set_prefix("Stitching");
        }
    }

    fn on_stitch_complete(&self, width: u32, height: u32) {
        if !self.in_batch() {
            self.bar.println(format!(
                "  {} Stitched {}",
                green("✓"),
                dim(&format!("{width}x{height} px")),
            ));
            self.bar.set_prefix("Writing");
        }
    }

    fn on_conversion_complete(&self, result: &ConversionResult) {
        if self.in_batch() {
            return;
        }
        self.bar.finish_and_clear();
        if result.success {
            eprintln!(
                "{} {}  {}",
                green("✔"),
                bold(
                    &result
                        .output_path
                        .as_deref()
                        .map(|p| p.display().to_string())
                        .unwrap_or_default()
                ),
                dim(result.file_size_str.as_deref().unwrap_or("")),
            );
        } else {
            eprintln!("{} {}", red("✘"), result.error.as_deref().unwrap_or("failed"));
        }
    }

    fn on_batch_start(&self, total: usize) {
        self.show();
        self.bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.cyan} {prefix:.bold}  \
                 [{bar:42.green/238}] {pos:>3}/{len} files  \
                 ⏱ {elapsed_precise}  ETA {eta_precise}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏  ")
            .tick_strings(TICKS),
        );
        self.bar.set_length(total as u64);
        self.bar.set_prefix("Converting");
        self.bar.reset_eta();
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Converting {total} PDF files…"))
        ));
    }

    fn on_batch_file_complete(&self, index: usize, total: usize, file: &str, success: bool) {
        self.bar.println(format!(
            "  {} [{:>3}/{:<3}] {}",
            if success { green("✓") } else { red("✗") },
            index,
            total,
            file,
        ));
        self.bar.inc(1);
        if index == total {
            self.bar.finish_and_clear();
        }
    }
}

const AFTER_HELP: &str = r##"EXAMPLES:
  # Stitch a deck into deck_stitched.png next to it
  pdfstitch deck.pdf

  # Custom output, resolution and gap between pages
  pdfstitch deck.pdf -o long.png -d 200 -s 20

  # JPEG output on a dark background
  pdfstitch deck.pdf -o deck.jpg --background "#202020"

  # Convert from URL
  pdfstitch -u https://example.com/slides.pdf

  # Convert every PDF in a directory (writes to ./pdfs/converted/)
  pdfstitch -b --pdf-dir ./pdfs

  # Describe this tool as JSON
  pdfstitch --skill-info

OUTPUT:
  A JSON result is printed on stdout; progress and logs go to stderr.
  Exit status is 0 on success and 1 on failure.

ENVIRONMENT VARIABLES:
  PDFIUM_LIB_PATH             Path to an existing libpdfium, skips auto-download
  PDFIUM_PROVISION_CACHE_DIR  Override the default pdfium cache directory
  PDFIUM_PROVISION_OFFLINE    Never download pdfium (1/true)
  RUST_LOG                    Override the log filter

SETUP:
  PDFium (~30 MB) is downloaded automatically on first run and cached in
  ~/.cache/pdfstitch/pdfium-7690/. To use an existing copy:
  PDFIUM_LIB_PATH=/path/to/libpdfium pdfstitch deck.pdf
"##;

/// Render each page of a PDF and stitch them into one long image.
#[derive(Parser, Debug)]
#[command(
    name = "pdfstitch",
    version,
    about = "Render each PDF page and stitch them vertically into one image",
    long_about = "Render every page of a PDF (local file or URL) at a chosen DPI and stack \
the pages top to bottom into a single PNG or JPEG, separated by a configurable gap. \
The result scrolls like a slideshow.",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local PDF file path.
    pdf: Option<PathBuf>,

    /// Output image path (.png or .jpg). Default: <input stem>_stitched.png.
    #[arg(short, long, env = "PDFSTITCH_OUTPUT")]
    output: Option<PathBuf>,

    /// Rendering DPI (1–1200).
    #[arg(short, long, env = "PDFSTITCH_DPI", default_value_t = 150,
          value_parser = clap::value_parser!(u32).range(1..=1200))]
    dpi: u32,

    /// Vertical gap between pages, in pixels.
    #[arg(short, long, env = "PDFSTITCH_SPACING", default_value_t = 10)]
    spacing: u32,

    /// Download the PDF from this HTTP/HTTPS URL.
    #[arg(short, long)]
    url: Option<String>,

    /// Batch mode: convert every PDF in --pdf-dir.
    #[arg(short, long)]
    batch: bool,

    /// Directory scanned in batch mode (not recursive).
    #[arg(long)]
    pdf_dir: Option<PathBuf>,

    /// Batch output directory. Default: <pdf-dir>/converted.
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Canvas colour shown in gaps, as #RRGGBB or #RGB.
    #[arg(long, env = "PDFSTITCH_BACKGROUND", default_value = "#FFFFFF")]
    background: String,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "PDFSTITCH_PASSWORD")]
    password: Option<String>,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "PDFSTITCH_DOWNLOAD_TIMEOUT", default_value_t = 30)]
    download_timeout: u64,

    /// Print the skill descriptor as JSON and exit.
    #[arg(long)]
    skill_info: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDFSTITCH_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors and the JSON result.
    #[arg(short, long, env = "PDFSTITCH_QUIET")]
    quiet: bool,

    /// Disable progress bar.
    #[arg(long, env = "PDFSTITCH_NO_PROGRESS")]
    no_progress: bool,
}

/// What the invocation asks for, in dispatch order.
enum Mode {
    SkillInfo,
    Batch(PathBuf),
    Url(String),
    File(PathBuf),
    Help,
}

impl Cli {
    fn mode(&self) -> Mode {
        if self.skill_info {
            return Mode::SkillInfo;
        }
        // A positional file wins over -u unless batch mode was requested.
        if let (Some(p), false) = (&self.pdf, self.batch) {
            return Mode::File(p.clone());
        }
        if let Some(ref url) = self.url {
            return Mode::Url(url.clone());
        }
        match (self.batch, &self.pdf_dir) {
            (true, Some(dir)) => Mode::Batch(dir.clone()),
            _ => Mode::Help,
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let mode = cli.mode();
    match mode {
        Mode::SkillInfo => {
            print_json(&skill_info())?;
            return Ok(ExitCode::SUCCESS);
        }
        Mode::Help => {
            Cli::command().print_help().context("Failed to print help")?;
            return Ok(ExitCode::SUCCESS);
        }
        _ => {}
    }

    // ── Logging setup ────────────────────────────────────────────────────
    // Keep INFO library logs out of the way while the progress bar is active.
    let show_progress = !cli.quiet && !cli.no_progress;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else if show_progress {
        "warn"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build options ────────────────────────────────────────────────────
    let cli_progress = show_progress.then(CliProgressCallback::new);
    let progress_cb: Option<ProgressCallback> = cli_progress
        .clone()
        .map(|cb| cb as Arc<dyn ConversionProgressCallback>);
    let options = match build_options(&cli, progress_cb) {
        Ok(o) => o,
        Err(e) => return finish(&ConversionResult::failed(&e, 0)),
    };

    // ── Ensure PDFium engine is available ────────────────────────────────
    // On the very first run the library (~30 MB) is downloaded from
    // bblanchon/pdfium-binaries into the user cache; later runs only bind.
    let renderer = match tokio::task::block_in_place(|| initialise_renderer(cli.quiet)) {
        Ok(r) => r,
        Err(e) => {
            if !cli.quiet {
                eprintln!("{} {}", red("✘"), e);
            }
            return finish(&ConversionResult::failed(&e, 0));
        }
    };

    // ── Run conversion ───────────────────────────────────────────────────
    let clear_progress = || {
        if let Some(ref cb) = cli_progress {
            cb.clear();
        }
    };
    match mode {
        Mode::Batch(dir) => {
            let batch = tokio::task::block_in_place(|| {
                convert_batch(&renderer, &dir, cli.output_dir.as_deref(), &options)
            });
            clear_progress();
            if !cli.quiet {
                eprintln!(
                    "{}  {}/{} files converted",
                    if batch.fail_count == 0 && batch.success {
                        green("✔")
                    } else {
                        cyan("⚠")
                    },
                    batch.success_count,
                    batch.total,
                );
            }
            print_json(&batch)?;
            Ok(exit_code(batch.success))
        }
        Mode::Url(url) => {
            let result = convert_url(&renderer, &url, cli.output.as_deref(), &options).await;
            clear_progress();
            finish(&result)
        }
        Mode::File(pdf) => {
            let result = tokio::task::block_in_place(|| {
                convert_file(&renderer, &pdf, cli.output.as_deref(), &options)
            });
            clear_progress();
            finish(&result)
        }
        Mode::SkillInfo | Mode::Help => Ok(ExitCode::SUCCESS),
    }
}

/// Map CLI args to `ConversionOptions`.
fn build_options(
    cli: &Cli,
    progress: Option<ProgressCallback>,
) -> Result<ConversionOptions, PdfStitchError> {
    let mut builder = ConversionOptions::builder()
        .dpi(cli.dpi)
        .spacing(cli.spacing)
        .background(parse_hex_color(&cli.background)?)
        .download_timeout_secs(cli.download_timeout);

    if let Some(ref pwd) = cli.password {
        builder = builder.password(pwd.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }
    builder.build()
}

/// Bind pdfium, drawing a download bar only if a download actually starts.
fn initialise_renderer(quiet: bool) -> Result<PdfiumRenderer, PdfStitchError> {
    if quiet {
        return PdfiumRenderer::initialise(None);
    }

    let dl_bar = ProgressBar::hidden();
    dl_bar.set_style(
        ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {bytes}/{total_bytes}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS),
    );
    dl_bar.set_prefix("PDF engine");

    let bar = dl_bar.clone();
    let result = PdfiumRenderer::initialise(Some(&|downloaded, total| {
        if bar.is_hidden() {
            bar.set_draw_target(ProgressDrawTarget::stderr());
            bar.enable_steady_tick(Duration::from_millis(80));
        }
        if let Some(t) = total {
            if bar.length().unwrap_or(0) != t {
                bar.set_length(t);
            }
        }
        bar.set_position(downloaded);
    }));

    if !dl_bar.is_hidden() {
        dl_bar.finish_with_message("ready ✓");
    }
    result
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialise result")?;
    println!("{json}");
    Ok(())
}

fn finish(result: &ConversionResult) -> Result<ExitCode> {
    print_json(result)?;
    Ok(exit_code(result.success))
}

fn exit_code(success: bool) -> ExitCode {
    if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("pdfstitch").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn defaults() {
        let cli = parse(&["deck.pdf"]);
        assert_eq!(cli.dpi, 150);
        assert_eq!(cli.spacing, 10);
        assert_eq!(cli.background, "#FFFFFF");
        assert!(matches!(cli.mode(), Mode::File(p) if p == Path::new("deck.pdf")));
    }

    #[test]
    fn dispatch_order() {
        assert!(matches!(parse(&["--skill-info", "a.pdf"]).mode(), Mode::SkillInfo));
        assert!(matches!(
            parse(&["-u", "https://x/a.pdf", "a.pdf"]).mode(),
            Mode::File(p) if p == Path::new("a.pdf")
        ));
        assert!(matches!(
            parse(&["-u", "https://x/a.pdf"]).mode(),
            Mode::Url(u) if u == "https://x/a.pdf"
        ));
        // In batch mode the positional file is ignored.
        assert!(matches!(
            parse(&["-b", "--pdf-dir", "pdfs", "a.pdf"]).mode(),
            Mode::Batch(d) if d == Path::new("pdfs")
        ));
        assert!(matches!(
            parse(&["-b", "--pdf-dir", "pdfs", "-u", "https://x/a.pdf"]).mode(),
            Mode::Url(_)
        ));
        assert!(matches!(parse(&["-b", "a.pdf"]).mode(), Mode::Help));
        assert!(matches!(parse(&["--pdf-dir", "pdfs"]).mode(), Mode::Help));
        assert!(matches!(parse(&[]).mode(), Mode::Help));
    }

    #[test]
    fn url_flag_keeps_non_url_values() {
        // -u never falls back to a local path; the download step rejects it.
        assert!(matches!(
            parse(&["-u", "deck.pdf"]).mode(),
            Mode::Url(u) if u == "deck.pdf"
        ));
    }

    #[test]
    fn long_help_renders_examples() {
        Cli::command().debug_assert();
        let help = Cli::command().render_long_help().to_string();
        assert!(help.contains("--background \"#202020\""));
        assert!(help.contains("PDFIUM_LIB_PATH=/path/to/libpdfium pdfstitch deck.pdf"));
    }

    #[test]
    fn dpi_range_is_enforced() {
        assert!(Cli::try_parse_from(["pdfstitch", "-d", "0", "a.pdf"]).is_err());
        assert!(Cli::try_parse_from(["pdfstitch", "-d", "1201", "a.pdf"]).is_err());
        assert_eq!(parse(&["-d", "300", "a.pdf"]).dpi, 300);
    }

    #[test]
    fn bad_background_is_invalid_input() {
        let cli = parse(&["--background", "chartreuse", "a.pdf"]);
        let err = build_options(&cli, None).unwrap_err();
        assert_eq!(err.kind(), edgequake_pdfstitch::ErrorKind::InvalidInput);
    }
}
