use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use timeline_common::observability::{LogConfig, LogFormat, init_logging};
use timeline_config::{TimelineConfig, TimelineConfigLoader};

mod commands;

#[derive(Debug, Parser)]
#[command(name = "timeline", version, about = "Harvest and tabulate a user's timeline")]
struct Cli {
    /// YAML config file; skipped when absent.
    #[arg(long, short, env = "TIMELINE_CONFIG", default_value = "timeline.yaml")]
    config: PathBuf,

    /// Mirror logs to stderr.
    #[arg(long, short)]
    verbose: bool,

    /// Emit JSON logs instead of text.
    #[arg(long)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Download every reachable post for a handle into a raw batch file.
    Fetch {
        handle: String,
        #[arg(long, short)]
        out: PathBuf,
        /// Posts per request (the API caps this at 200).
        #[arg(long)]
        page_size: Option<u32>,
        /// Abort the whole walk after this many seconds.
        #[arg(long)]
        deadline_secs: Option<u64>,
    },
    /// Per-day counts for one or more raw batch files.
    Summary {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// IANA time zone used to bucket days.
        #[arg(long)]
        tz: Option<String>,
        /// Also list the posts made on this weekday.
        #[arg(long)]
        weekday: Option<String>,
    },
    /// Print the flattened records of a raw batch file as JSON lines.
    Records {
        file: PathBuf,
        #[arg(long)]
        tz: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(LogConfig {
        emit_stderr: cli.verbose,
        format: if cli.log_json {
            LogFormat::Json
        } else {
            LogFormat::Text
        },
        ..LogConfig::default()
    })?;

    let cfg: TimelineConfig = TimelineConfigLoader::new()
        .with_optional_file(&cli.config)
        .load()?;

    match cli.command {
        Command::Fetch {
            handle,
            out,
            page_size,
            deadline_secs,
        } => commands::fetch(&cfg, &handle, &out, page_size, deadline_secs).await,
        Command::Summary { files, tz, weekday } => {
            let tz = tz.unwrap_or_else(|| cfg.timeline.timezone.clone());
            commands::summary(&files, &tz, weekday.as_deref(), &mut std::io::stdout().lock())
        }
        Command::Records { file, tz } => {
            let tz = tz.unwrap_or_else(|| cfg.timeline.timezone.clone());
            commands::records(&file, &tz, &mut std::io::stdout().lock())
        }
    }
}
