use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use nettest::config::{LoggingConfig, RunConfig};
use nettest::engine::RunContext;
use nettest::hosts::{HostRegistry, LocalIdentity};
use nettest::probes::ShellRunner;
use nettest::report::{self, Status};

#[derive(Parser)]
#[command(
    name = "nettest",
    about = "Run scripted latency, throughput and jitter tests from a CSV test list",
    version,
    long_about = None
)]
struct Cli {
    /// Input CSV file (header row must start with '#')
    input_csv: PathBuf,

    /// Directory for the results JSON and the log file
    #[arg(default_value = ".")]
    output_directory: PathBuf,

    /// Host registry mapping source hostnames to ssh usernames
    #[arg(short = 'c', long, default_value = "host_config.toml")]
    hostconfig: PathBuf,

    /// Run configuration (probe paths, ping interval, ssh timeout, log levels)
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = RunConfig::resolve(cli.config.as_deref())?;
    report::check_output_dir(&cli.output_directory)?;
    let paths = report::output_paths(&cli.input_csv, &cli.output_directory, Local::now());
    init_tracing(&config.logging, &paths.log)?;

    tracing::info!("{0} Initial startup {0}", "*".repeat(20));
    tracing::info!(
        input = %cli.input_csv.display(),
        output = %paths.results.display(),
        config = ?RunConfig::source(cli.config.as_deref()),
        "run configured"
    );

    let identity = LocalIdentity::detect();
    let registry = HostRegistry::load(&cli.hostconfig)?;
    let ctx = RunContext::new(identity, registry, config, ShellRunner::default());

    let mut failed = 0usize;
    let results = nettest::run(&ctx, &cli.input_csv, &paths, |record| {
        if record.status() == Status::Failure {
            failed += 1;
        }
        println!("{}", report::format_summary(record));
    })
    .await?;

    println!();
    println!(
        "{} test(s) run, {} failed. Results written to {}",
        results.len(),
        failed,
        paths.results.display()
    );
    tracing::info!("{0} End of run {0}", "*".repeat(20));
    Ok(())
}

/// Console output goes to stderr at `console_level` (or `RUST_LOG`); the
/// run's log file gets everything at `level` and above, as text or JSON lines.
fn init_tracing(logging: &LoggingConfig, log_path: &Path) -> Result<()> {
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .with_context(|| format!("failed to open log file {}", log_path.display()))?;

    let console_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&logging.console_level));
    let file_filter = EnvFilter::new(&logging.level);

    let file_layer = if logging.json {
        fmt::layer()
            .json()
            .with_writer(Mutex::new(file))
            .with_filter(file_filter)
            .boxed()
    } else {
        fmt::layer()
            .with_writer(Mutex::new(file))
            .with_ansi(false)
            .with_filter(file_filter)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_filter(console_filter),
        )
        .with(file_layer)
        .init();
    Ok(())
}
