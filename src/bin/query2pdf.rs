//! CLI binary for query2pdf.
//!
//! A thin shim over the library crate: `serve` runs the HTTP endpoint,
//! `generate` runs one request and writes the PDF to disk.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use query2pdf::server::{start_server, ENDPOINT_PATH};
use query2pdf::{
    GenerationProgressCallback, GenerationRequest, Generator, GeneratorConfig,
    GeneratorConfigBuilder, Orientation, ProgressCallback,
};
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
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

/// Terminal progress callback: one bar for the image loop plus a log line per
/// image.
struct CliProgressCallback {
    bar: ProgressBar,
    errors: AtomicUsize,
}

impl CliProgressCallback {
    /// Spinner until the search returns and the URL count is known.
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);

        bar.set_style(spinner_style);
        bar.set_prefix("Searching");
        bar.set_message("Querying image search…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            errors: AtomicUsize::new(0),
        })
    }

    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>2}/{len} images  \
             ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Fetching");
    }
}

impl GenerationProgressCallback for CliProgressCallback {
    fn on_generation_start(&self, total_urls: usize) {
        self.activate_bar(total_urls);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Found {total_urls} images"))
        ));
    }

    fn on_image_start(&self, index: usize, _total: usize) {
        self.bar.set_message(format!("image {index}"));
    }

    fn on_page_complete(&self, index: usize, total: usize, orientation: Orientation) {
        self.bar.println(format!(
            "  {} Image {:>2}/{:<2}  {}",
            green("✓"),
            index,
            total,
            dim(&orientation.to_string()),
        ));
        self.bar.inc(1);
    }

    fn on_image_error(&self, index: usize, total: usize, error: &str) {
        self.errors.fetch_add(1, Ordering::SeqCst);

        let msg = if error.chars().count() > 80 {
            let cut: String = error.chars().take(79).collect();
            format!("{cut}\u{2026}")
        } else {
            error.to_string()
        };

        self.bar.println(format!(
            "  {} Image {:>2}/{:<2}  {}",
            red("✗"),
            index,
            total,
            red(&msg),
        ));
        self.bar.inc(1);
    }

    fn on_generation_complete(&self, total_urls: usize, page_count: usize) {
        self.bar.finish_and_clear();
        let failed = self.errors.load(Ordering::SeqCst);
        if failed == 0 {
            eprintln!("{} {} pages laid out", green("✔"), bold(&page_count.to_string()));
        } else {
            eprintln!(
                "{} {}/{} images laid out  ({} skipped)",
                if page_count == 0 { red("✘") } else { cyan("⚠") },
                bold(&page_count.to_string()),
                total_urls,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Six images of red pandas, one per A4 page
  query2pdf generate "red panda" -o pandas.pdf

  # Twelve images, all landscape, wider margins
  query2pdf generate "bridges" -n 12 --orientation landscape --margin 0.08

  # Run the HTTP endpoint
  query2pdf serve --addr 127.0.0.1:8080

  # Call it
  curl -X POST http://127.0.0.1:8080/api/generate \
       -H 'Content-Type: application/json' \
       -d '{"querytext":"owls","num_images":4}' -o owls.pdf

ENVIRONMENT VARIABLES:
  SERPAPI_KEY       SerpApi key (required for searches)
  QUERY2PDF_ADDR    Bind address for `serve`
  RUST_LOG          Log filter, e.g. query2pdf=debug,tower_http=debug
"#;

/// Turn an image-search query into a printable A4 PDF.
#[derive(Parser, Debug)]
#[command(
    name = "query2pdf",
    version,
    about = "Turn an image-search query into a printable A4 PDF",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Args, Debug)]
struct CommonArgs {
    /// SerpApi key.
    #[arg(long, global = true, env = "SERPAPI_KEY", hide_env_values = true)]
    serpapi_key: Option<String>,

    /// Connect timeout for outbound calls, in seconds.
    #[arg(long, global = true, env = "QUERY2PDF_CONNECT_TIMEOUT", default_value_t = 5)]
    connect_timeout: u64,

    /// Total timeout for outbound calls, in seconds.
    #[arg(long, global = true, env = "QUERY2PDF_TIMEOUT", default_value_t = 20)]
    timeout: u64,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "QUERY2PDF_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "QUERY2PDF_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the generation endpoint over HTTP.
    Serve {
        /// Address to bind.
        #[arg(long, env = "QUERY2PDF_ADDR", default_value = "0.0.0.0:8080")]
        addr: String,
    },

    /// Run one query and write the PDF to a file.
    Generate {
        /// Search text.
        query: String,

        /// Number of images (1–20).
        #[arg(short = 'n', long, default_value_t = 6)]
        num_images: i64,

        /// auto, portrait or landscape.
        #[arg(long, default_value = "auto")]
        orientation: String,

        /// Margin as a fraction of page width (0.0–0.2).
        #[arg(long, default_value_t = 0.03)]
        margin: f64,

        /// Output file. Defaults to google_images.pdf.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Page resolution in DPI (72–600). Lower values make smaller drafts.
        #[arg(long, env = "QUERY2PDF_DPI", default_value_t = 300,
              value_parser = clap::value_parser!(u32).range(72..=600))]
        dpi: u32,

        /// Largest image download accepted, in MiB.
        #[arg(long, default_value_t = 25)]
        max_image_mib: u64,

        /// Disable progress bar.
        #[arg(long)]
        no_progress: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar already reports per-image results, so the library's
    // INFO lines are dropped while it is visible.
    let show_progress = matches!(
        cli.command,
        Command::Generate { no_progress: false, .. }
    ) && !cli.common.quiet;
    let filter = if cli.common.verbose {
        "debug"
    } else if cli.common.quiet || show_progress {
        "error"
    } else {
        "info,tower_http=debug"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Command::Serve { ref addr } => {
            let config = build_config(&cli.common, None)
                .build()
                .context("Invalid configuration")?;
            if config.serpapi_key.is_none() {
                tracing::warn!("SERPAPI_KEY is not set; POST requests will fail with 500");
            }
            let generator = Arc::new(Generator::new(config).context("Failed to build generator")?);
            tracing::info!("query2pdf endpoint at http://{addr}{ENDPOINT_PATH}");
            start_server(addr, generator)
                .await
                .with_context(|| format!("Server on {addr} stopped"))?;
        }
        Command::Generate {
            ref query,
            num_images,
            ref orientation,
            margin,
            ref output,
            dpi,
            max_image_mib,
            ..
        } => {
            let progress_cb: Option<ProgressCallback> = if show_progress {
                Some(CliProgressCallback::new_dynamic() as Arc<dyn GenerationProgressCallback>)
            } else {
                None
            };

            let config = build_config(&cli.common, progress_cb)
                .dpi(dpi)
                .max_image_bytes(max_image_mib.saturating_mul(1024 * 1024))
                .build()
                .context("Invalid configuration")?;
            let generator = Generator::new(config).context("Failed to build generator")?;

            let mut request = GenerationRequest::new(query.clone());
            request.num_images = num_images;
            request.orientation = orientation.clone();
            request.margin_ratio = margin;
            let path = output
                .clone()
                .unwrap_or_else(|| PathBuf::from(request.sanitized_filename()));

            let stats = generator
                .generate_to_file(&request, &path)
                .await
                .context("Generation failed")?;

            if !cli.common.quiet {
                eprintln!(
                    "{}  {}/{} pages  {}ms  →  {}",
                    if stats.images_skipped == 0 {
                        green("✔")
                    } else {
                        cyan("⚠")
                    },
                    stats.pages_produced,
                    stats.urls_found,
                    stats.total_duration_ms,
                    bold(&path.display().to_string()),
                );
                eprintln!(
                    "   {} search  /  {} fetch+fit  /  {} encode  /  {} bytes",
                    dim(&format!("{}ms", stats.search_duration_ms)),
                    dim(&format!("{}ms", stats.fetch_duration_ms)),
                    dim(&format!("{}ms", stats.encode_duration_ms)),
                    stats.pdf_bytes,
                );
            }
        }
    }

    Ok(())
}

/// Map the shared CLI args onto a `GeneratorConfig` builder.
fn build_config(
    args: &CommonArgs,
    progress: Option<ProgressCallback>,
) -> GeneratorConfigBuilder {
    let mut builder = GeneratorConfig::builder()
        .connect_timeout_secs(args.connect_timeout)
        .request_timeout_secs(args.timeout);

    if let Some(ref key) = args.serpapi_key {
        builder = builder.serpapi_key(key.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder
}
