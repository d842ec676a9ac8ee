#![forbid(unsafe_code)]

mod output;

use std::env;
use std::io;
use std::path::PathBuf;

use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use condense_core::config::resolve_config;
use condense_core::format_count;
use condense_core::io::reader::ReadError;
use condense_core::pipeline::run_pipeline;
use condense_core::timing::{StageTimings, timing_enabled_from_env};
use output::{CliError, OutputFormat};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "condense: collapse clustered duplicate CSV rows into one record per cluster",
    long_about = None,
    after_help = "EXAMPLES:\n    # Condense to stdout\n    condense --csv-file providers.csv\n\n\
                  # Append to an existing export\n    condense --csv-file batch2.csv --output merged.csv --append\n\n\
                  # JSON output with stage timings\n    condense --csv-file providers.csv --format json --timing"
)]
struct Cli {
    /// CSV file to condense. Must have a header row.
    #[arg(long, value_name = "PATH")]
    csv_file: PathBuf,

    /// Write output here instead of stdout.
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Append to --output instead of replacing it.
    #[arg(long, requires = "output")]
    append: bool,

    /// Output encoding.
    #[arg(long, value_enum, default_value_t = OutputFormat::Csv)]
    format: OutputFormat,

    /// Field rules file (defaults to ./condense.toml when present).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,

    /// Emit per-stage timing report to stderr.
    #[arg(long)]
    timing: bool,
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("CONDENSE_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose || env::var("DEBUG").is_ok() {
            "condense=debug,condense_core=debug,info"
        } else {
            "condense=info,condense_core=info,warn"
        })
    });

    let format = env::var("CONDENSE_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(io::stderr))
                .init();
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let working_dir = env::current_dir()?;
    let config = resolve_config(cli.config.as_deref(), &working_dir)?;

    if !cli.csv_file.is_file() {
        return Err(ReadError::Open {
            path: cli.csv_file.clone(),
            source: io::Error::from(io::ErrorKind::NotFound),
        }
        .into());
    }

    let mut timings = StageTimings::new(cli.timing || timing_enabled_from_env());
    let result = run_pipeline(&cli.csv_file, &config.fields, &mut timings)?;

    info!(
        "condensed {} rows into {} clusters",
        format_count(result.rows_read),
        format_count(result.aggregates.len())
    );

    timings.time("write", || {
        output::write_aggregates(
            cli.format,
            cli.output.as_deref(),
            cli.append,
            &result.aggregates,
        )
    })?;

    if timings.is_enabled() {
        output::render_timings(cli.format, &timings)?;
    }

    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if cli.append && cli.format == OutputFormat::Json {
        Cli::command()
            .error(
                ErrorKind::ArgumentConflict,
                "--append is only supported with --format csv",
            )
            .exit();
    }

    if cli.verbose {
        info!("Verbose mode enabled");
    }

    if let Err(err) = run(&cli) {
        let cli_error = CliError::from_anyhow(&err);
        tracing::error!(code = %cli_error.error_code, "{err:#}");
        output::render_error(cli.format, &cli_error)?;
        std::process::exit(1);
    }

    Ok(())
}
