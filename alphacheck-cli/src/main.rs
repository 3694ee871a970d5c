//! alphacheck CLI: rule checks, fill-rate views and data summaries over one run directory.
//!
//! Commands:
//! - `check` evaluates every built-in rule and exits 1 on any FAIL or ERROR
//! - `fill-rate` renders the overview, a time slice, a ticker timeline or one cell
//! - `summary` reports what was loaded from each stream

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use alphacheck_core::domain::{EventTime, Ticker};
use alphacheck_core::AnalysisConfig;
use alphacheck_runner::reporting::{to_json, write_json};
use alphacheck_runner::{AnalysisRun, CheckArtifact, ConsoleReporter};

#[derive(Parser)]
#[command(
    name = "alphacheck",
    about = "Event stream reconciliation and fill-rate analysis"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct RunArgs {
    /// Directory holding the pipe-delimited event files.
    data_dir: PathBuf,

    /// Path to a TOML analysis config. Defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print JSON instead of the console report.
    #[arg(long, default_value_t = false)]
    json: bool,

    /// Disable ANSI status colors.
    #[arg(long, default_value_t = false)]
    no_color: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate every reconciliation rule.
    Check {
        #[command(flatten)]
        run: RunArgs,

        /// Also write the check artifact (report + config + fingerprint) to this path.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Fill-rate analysis. `--time` and `--ticker` together select a single cell.
    FillRate {
        #[command(flatten)]
        run: RunArgs,

        /// Raw event time (e.g. 93000000) or `nil_last_alpha` for the previous day.
        #[arg(long)]
        time: Option<String>,

        #[arg(long)]
        ticker: Option<String>,
    },
    /// Per-stream record counts and the dataset fingerprint.
    Summary {
        #[command(flatten)]
        run: RunArgs,
    },
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Check { run, output } => run_check(&run, output.as_deref()),
        Commands::FillRate { run, time, ticker } => {
            run_fill_rate(&run, time.as_deref(), ticker.as_deref())
        }
        Commands::Summary { run } => run_summary(&run),
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("alphacheck=info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn load(args: &RunArgs) -> Result<AnalysisRun> {
    let config = match &args.config {
        Some(path) => AnalysisConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => AnalysisConfig::default(),
    };
    AnalysisRun::load(&args.data_dir, config)
        .with_context(|| format!("failed to load run directory {}", args.data_dir.display()))
}

fn reporter(args: &RunArgs) -> ConsoleReporter {
    ConsoleReporter::new(!args.no_color)
}

fn run_check(args: &RunArgs, output: Option<&Path>) -> Result<()> {
    let run = load(args)?;
    let report = run.check();
    info!(
        pass = report.counts.pass,
        warn = report.counts.warn,
        fail = report.counts.fail,
        error = report.counts.error,
        "check finished"
    );

    let artifact = CheckArtifact::new(run.store().fingerprint(), run.config().clone(), report);
    if args.json {
        println!("{}", to_json(&artifact)?);
    } else {
        print!("{}", reporter(args).render_report(&artifact.report));
    }
    if let Some(path) = output {
        write_json(path, &artifact)?;
        eprintln!("Artifact saved to: {}", path.display());
    }

    if artifact.report.has_critical() {
        std::process::exit(1);
    }
    Ok(())
}

/// Accepts a raw numeric time or one of the previous-day markers.
fn parse_time(token: &str) -> Result<EventTime> {
    let token = token.trim();
    if token.parse::<i64>().is_ok() || matches!(token, "nil_last_alpha" | "prev-day") {
        Ok(EventTime::parse_token(token))
    } else {
        bail!("invalid time '{token}': expected a raw event time such as 93000000 or nil_last_alpha")
    }
}

fn run_fill_rate(args: &RunArgs, time: Option<&str>, ticker: Option<&str>) -> Result<()> {
    let run = load(args)?;
    let time = time.map(parse_time).transpose()?;
    let ticker = ticker.map(Ticker::new);
    let console = reporter(args);

    let text = match (time, ticker) {
        (None, None) => {
            let view = run.overview();
            if args.json {
                to_json(&view)?
            } else {
                console.render_overview(&view)
            }
        }
        (Some(t), None) => {
            let view = run.time_slice(t);
            if args.json {
                to_json(&view)?
            } else {
                console.render_time_slice(&view)
            }
        }
        (None, Some(k)) => {
            let view = run.ticker_timeline(&k);
            if args.json {
                to_json(&view)?
            } else {
                console.render_timeline(&view)
            }
        }
        (Some(t), Some(k)) => {
            let view = run.cell_breakdown(t, &k);
            if args.json {
                to_json(&view)?
            } else {
                console.render_breakdown(&view)
            }
        }
    };
    println!("{text}");
    Ok(())
}

fn run_summary(args: &RunArgs) -> Result<()> {
    let run = load(args)?;
    let summary = run.summary();
    if args.json {
        println!("{}", to_json(&summary)?);
    } else {
        print!("{}", reporter(args).render_summary(&summary));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_time_accepts_raw_and_markers() {
        assert_eq!(parse_time("93000000").unwrap(), EventTime::new(93_000_000));
        assert_eq!(parse_time(" nil_last_alpha ").unwrap(), EventTime::PREVIOUS_DAY);
        assert_eq!(parse_time("-1").unwrap(), EventTime::PREVIOUS_DAY);
    }

    #[test]
    fn test_parse_time_rejects_garbage() {
        let err = parse_time("9:30").unwrap_err();
        assert!(err.to_string().contains("invalid time '9:30'"));
    }

    #[test]
    fn test_cli_parses_cell_selection() {
        let cli = Cli::try_parse_from([
            "alphacheck",
            "fill-rate",
            "data/run1",
            "--time",
            "93000000",
            "--ticker",
            "600000",
            "--no-color",
        ])
        .unwrap();
        match cli.command {
            Commands::FillRate { run, time, ticker } => {
                assert_eq!(run.data_dir, PathBuf::from("data/run1"));
                assert!(run.no_color);
                assert_eq!(time.as_deref(), Some("93000000"));
                assert_eq!(ticker.as_deref(), Some("600000"));
            }
            _ => panic!("expected fill-rate"),
        }
    }

    #[test]
    fn test_cli_verifies() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
