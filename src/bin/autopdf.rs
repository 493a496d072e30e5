//! CLI binary for autopdf-upload.
//!
//! A thin shim over the library crate that maps CLI flags to `UploadConfig`,
//! runs one upload attempt and prints the result.

use anyhow::{Context, Result};
use autopdf_upload::{
    AttemptPolicy, AttemptState, ConsoleSurface, DisplaySurface, FileHandle, HtmlFileSurface,
    JsonFileStore, PresignStrategy, ResultStore, UploadConfig, UploadForm, UploadWorkflow,
    WorkflowObserver,
};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
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
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI observer using indicatif ─────────────────────────────────────────────

/// Terminal observer: a spinner whose message tracks the workflow status.
struct CliObserver {
    bar: ProgressBar,
}

impl CliObserver {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Preparing");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl WorkflowObserver for CliObserver {
    fn on_state_change(&self, _attempt_id: u64, _from: AttemptState, to: AttemptState) {
        match to {
            AttemptState::Presigning => self.bar.set_prefix("Presign"),
            AttemptState::Uploading => self.bar.set_prefix("Upload"),
            AttemptState::Polling => self.bar.set_prefix("Metadata"),
            s if s.is_terminal() => self.bar.finish_and_clear(),
            _ => {}
        }
    }

    fn on_status(&self, _attempt_id: u64, message: &str) {
        self.bar.set_message(message.to_string());
    }

    fn on_poll_attempt(&self, _attempt_id: u64, attempt: u32, max: u32, status: u16) {
        self.bar
            .set_message(format!("attempt {attempt}/{max} (HTTP {status})"));
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Upload with the PUT strategy (default) and print the metadata
  autopdf paper.pdf --presign-url https://api.example.com/prod/presign \
                    --metadata-url https://api.example.com/prod/metadata

  # Presigned POST backend, write the metadata page to an HTML file
  autopdf --strategy post --html metadata.html paper.pdf

  # Show the last stored result without uploading
  autopdf --show-last

  # Machine-readable attempt report
  autopdf --json paper.pdf > report.json

ENVIRONMENT VARIABLES:
  AUTOPDF_PRESIGN_URL     Presign endpoint
  AUTOPDF_METADATA_URL    Metadata endpoint
  AUTOPDF_STRATEGY        put | post
  AUTOPDF_ATTEMPT_POLICY  reject | allow
  AUTOPDF_STORE           Result store file
  RUST_LOG                Override log filter (e.g. autopdf_upload=debug)
"#;

/// Upload a PDF through a presigned URL and fetch its extracted metadata.
#[derive(Parser, Debug)]
#[command(
    name = "autopdf",
    version,
    about = "Upload a PDF through a presigned URL and fetch its extracted metadata",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// PDF file to upload (max 5 MiB).
    #[arg(required_unless_present = "show_last")]
    input: Option<PathBuf>,

    /// Presign endpoint URL.
    #[arg(long, env = "AUTOPDF_PRESIGN_URL", required_unless_present = "show_last")]
    presign_url: Option<String>,

    /// Metadata endpoint URL.
    #[arg(long, env = "AUTOPDF_METADATA_URL", required_unless_present = "show_last")]
    metadata_url: Option<String>,

    /// Presign protocol spoken by the backend.
    #[arg(long, env = "AUTOPDF_STRATEGY", value_enum, default_value = "put")]
    strategy: StrategyArg,

    /// What a second attempt does while one is running.
    #[arg(long, env = "AUTOPDF_ATTEMPT_POLICY", value_enum, default_value = "reject")]
    attempt_policy: PolicyArg,

    /// Metadata poll attempts.
    #[arg(long, env = "AUTOPDF_POLL_ATTEMPTS", default_value_t = 10,
          value_parser = clap::value_parser!(u32).range(1..))]
    poll_attempts: u32,

    /// Wait before each metadata poll, in milliseconds.
    #[arg(long, env = "AUTOPDF_POLL_INTERVAL_MS", default_value_t = 1000)]
    poll_interval_ms: u64,

    /// Per-request HTTP timeout in seconds.
    #[arg(long, env = "AUTOPDF_REQUEST_TIMEOUT", default_value_t = 60)]
    request_timeout: u64,

    /// Result store file. Default: <data-local-dir>/autopdf/last_result.json
    #[arg(long, env = "AUTOPDF_STORE")]
    store: Option<PathBuf>,

    /// Write the metadata page to this HTML file instead of printing it.
    #[arg(long, env = "AUTOPDF_HTML")]
    html: Option<PathBuf>,

    /// Display the last stored result and exit.
    #[arg(long)]
    show_last: bool,

    /// Print the attempt report as JSON.
    #[arg(long, env = "AUTOPDF_JSON")]
    json: bool,

    /// Disable the spinner.
    #[arg(long, env = "AUTOPDF_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "AUTOPDF_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "AUTOPDF_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum StrategyArg {
    Put,
    Post,
}

impl From<StrategyArg> for PresignStrategy {
    fn from(v: StrategyArg) -> Self {
        match v {
            StrategyArg::Put => PresignStrategy::Put,
            StrategyArg::Post => PresignStrategy::Post,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum PolicyArg {
    Reject,
    Allow,
}

impl From<PolicyArg> for AttemptPolicy {
    fn from(v: PolicyArg) -> Self {
        match v {
            PolicyArg::Reject => AttemptPolicy::Reject,
            PolicyArg::Allow => AttemptPolicy::Allow,
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner already shows every step; keep library logs quiet under it.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && !cli.show_last;
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

    // ── Store and display surface ────────────────────────────────────────
    let store: Arc<dyn ResultStore> = Arc::new(JsonFileStore::new(
        cli.store.clone().unwrap_or_else(JsonFileStore::default_path),
    ));
    let surface: Arc<dyn DisplaySurface> = match (&cli.html, cli.json) {
        (Some(path), _) => Arc::new(HtmlFileSurface::new(path)),
        (None, true) => Arc::new(ConsoleSurface::new(io::sink())),
        (None, false) => Arc::new(ConsoleSurface::stdout()),
    };

    if cli.show_last {
        surface
            .open(store.as_ref())
            .context("Failed to display stored result")?;
        return Ok(ExitCode::SUCCESS);
    }

    // ── Build config ─────────────────────────────────────────────────────
    let mut builder = UploadConfig::builder()
        .presign_url(cli.presign_url.clone().unwrap_or_default())
        .metadata_url(cli.metadata_url.clone().unwrap_or_default())
        .strategy(cli.strategy.into())
        .attempt_policy(cli.attempt_policy.into())
        .poll_attempts(cli.poll_attempts)
        .poll_interval_ms(cli.poll_interval_ms)
        .request_timeout_secs(cli.request_timeout);
    if show_progress {
        builder = builder.observer(CliObserver::new());
    }
    let config = builder.build().context("Invalid configuration")?;

    // ── Select file ──────────────────────────────────────────────────────
    let path = cli.input.clone().context("No input file given")?;
    let file = FileHandle::open(&path)
        .await
        .with_context(|| format!("Failed to open {}", path.display()))?;

    let mut form = UploadForm::from_config(&config);
    if let Err(e) = form.select(file) {
        eprintln!("{} {}", red("✘"), e);
        return Ok(ExitCode::FAILURE);
    }
    let file = form.selected().context("Upload is not enabled")?;

    // ── Run attempt ──────────────────────────────────────────────────────
    let workflow = UploadWorkflow::new(config, store, surface)?;

    // Ctrl-C abandons the attempt wherever it is; nothing is stored.
    let report = tokio::select! {
        r = workflow.run(file) => r.context("Upload attempt refused")?,
        _ = tokio::signal::ctrl_c() => {
            eprintln!("{} interrupted", red("✘"));
            return Ok(ExitCode::from(130));
        }
    };

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("Failed to serialise report")?
        );
    }

    match report.state {
        AttemptState::Displayed => {
            if !cli.quiet && !cli.json {
                eprintln!(
                    "{} {}  {}ms",
                    green("✔"),
                    report.status,
                    report.duration_ms
                );
            }
            Ok(ExitCode::SUCCESS)
        }
        AttemptState::PendingProcessing => {
            if !cli.quiet && !cli.json {
                eprintln!("{} {}", cyan("⚠"), report.status);
            }
            Ok(ExitCode::SUCCESS)
        }
        _ => {
            eprintln!("{} {}", red("✘"), report.status);
            Ok(ExitCode::FAILURE)
        }
    }
}
