mod config;
mod extract;
mod render;
mod stats;
mod store;
mod summary;

use clap::Parser;
use config::{MalformedPolicy, OutputFormat, SummaryConfig};
use extract::{Column, ExtractorKind};
use std::io::Write;
use std::path::PathBuf;

/// Summarize repeated classification reports: pull accuracy, macro-average
/// and weighted-average scores out of every report in the inputs and print
/// their mean, standard deviation and max.
#[derive(Parser, Debug)]
#[command(name = "report-summary", version, about)]
pub struct Cli {
    /// Report files or glob patterns (default: from config, else results.txt)
    #[arg(value_name = "INPUT")]
    inputs: Vec<String>,

    /// Config file path
    #[arg(short, long, default_value = "summary.toml")]
    config: PathBuf,

    /// Column of the macro/weighted rows to summarize (overrides config)
    #[arg(long, value_enum)]
    column: Option<Column>,

    /// Row extraction strategy (overrides config)
    #[arg(long, value_enum)]
    extractor: Option<ExtractorKind>,

    /// Output format (overrides config)
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,

    /// Warn about unreadable rows instead of aborting
    #[arg(long)]
    skip_malformed: bool,

    /// Don't print the raw extracted values after the summary
    #[arg(long)]
    no_dump: bool,

    /// Extra logging (files read, rows matched per metric)
    #[arg(short, long)]
    verbose: bool,

    /// Only log errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose {
        "report_summary=debug"
    } else if cli.quiet {
        "report_summary=error"
    } else {
        "report_summary=warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .init();

    tracing::debug!(?cli, "parsed CLI arguments");

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    if let Err(e) = run(&cli, &mut out) {
        let _ = out.flush();
        tracing::error!(error = %e, "summary failed");
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

/// Load config, merge CLI overrides, then read, summarize and print.
fn run<W: Write>(cli: &Cli, out: &mut W) -> Result<(), Box<dyn std::error::Error>> {
    let mut cfg = SummaryConfig::load(&cli.config)?;
    apply_overrides(&mut cfg, cli);

    let paths = summary::resolve_inputs(&cfg.input.paths)?;
    tracing::info!(inputs = paths.len(), "summarizing reports");

    let store = summary::collect(&paths, &cfg.extract)?;
    render::write_summary(&store, &cfg.output, out)?;
    Ok(())
}

fn apply_overrides(cfg: &mut SummaryConfig, cli: &Cli) {
    if !cli.inputs.is_empty() {
        cfg.input.paths = cli.inputs.clone();
    }
    if let Some(column) = cli.column {
        cfg.extract.column = column;
    }
    if let Some(extractor) = cli.extractor {
        cfg.extract.extractor = extractor;
    }
    if cli.skip_malformed {
        cfg.extract.on_malformed = MalformedPolicy::Skip;
    }
    if let Some(format) = cli.format {
        cfg.output.format = format;
    }
    if cli.no_dump {
        cfg.output.dump_values = false;
    }
}
