//! Process-wide `tracing` setup for the harvester binary and its tests.
//!
//! Events go to a daily rolling file and, when asked, to stderr as well. Both
//! sinks share one encoding ([`LogFormat`]) and one `RUST_LOG` filter.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::Context;
use chrono::Utc;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::fmt::{self, MakeWriter};
use tracing_subscriber::{EnvFilter, Layer, Registry, layer::SubscriberExt, util::SubscriberInitExt};

const LOG_DIR_ENV: &str = "TIMELINE_LOG_DIR";

/// Keeps the non-blocking writer flushing for the life of the process.
struct ActiveLog {
    path: PathBuf,
    _guard: WorkerGuard,
}

static ACTIVE: OnceLock<ActiveLog> = OnceLock::new();

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Names the log file and the default data directory.
    pub app_name: &'static str,
    /// Wins over `TIMELINE_LOG_DIR` and `~/.local/share/<app_name>`.
    pub log_dir: Option<PathBuf>,
    pub emit_stderr: bool,
    pub format: LogFormat,
    /// Used when `RUST_LOG` is unset or unparsable.
    pub default_filter: &'static str,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            app_name: "timeline",
            log_dir: None,
            emit_stderr: false,
            format: LogFormat::Text,
            default_filter: "info",
        }
    }
}

/// Install the global subscriber and return today's log file.
///
/// Only the first call configures anything; later calls get the same path back.
pub fn init_logging(config: LogConfig) -> anyhow::Result<PathBuf> {
    if let Some(active) = ACTIVE.get() {
        return Ok(active.path.clone());
    }

    let dir = resolve_log_dir(config.app_name, config.log_dir.as_deref());
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("cannot create log directory {}", dir.display()))?;

    let file_stem = format!("{}.log", config.app_name);
    // The daily appender suffixes files with the UTC date.
    let path = dir.join(format!("{file_stem}.{}", Utc::now().format("%Y-%m-%d")));
    let (writer, guard) = tracing_appender::non_blocking(rolling::daily(&dir, &file_stem));

    let mut sinks: Vec<BoxedLayer> = vec![sink(config.format, writer, false)];
    if config.emit_stderr {
        sinks.push(sink(config.format, std::io::stderr, true));
    }
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.default_filter));

    tracing_subscriber::registry()
        .with(sinks)
        .with(filter)
        .try_init()
        .context("failed to install tracing subscriber")?;

    let active = ACTIVE.get_or_init(|| ActiveLog {
        path,
        _guard: guard,
    });
    tracing::debug!(log_file = %active.path.display(), stderr = config.emit_stderr, "logging ready");
    Ok(active.path.clone())
}

fn sink<W>(format: LogFormat, writer: W, ansi: bool) -> BoxedLayer
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    match format {
        LogFormat::Text => fmt::layer().with_writer(writer).with_ansi(ansi).boxed(),
        LogFormat::Json => fmt::layer().json().with_writer(writer).boxed(),
    }
}

fn resolve_log_dir(app_name: &str, explicit: Option<&Path>) -> PathBuf {
    explicit
        .map(Path::to_path_buf)
        .or_else(|| {
            std::env::var(LOG_DIR_ENV)
                .ok()
                .filter(|dir| !dir.trim().is_empty())
                .map(PathBuf::from)
        })
        .map(|dir| expand_home(&dir))
        .unwrap_or_else(|| match std::env::var("HOME") {
            Ok(home) => Path::new(&home).join(".local/share").join(app_name),
            Err(_) => Path::new(".").join(app_name),
        })
}

fn expand_home(path: &Path) -> PathBuf {
    match (path.strip_prefix("~"), std::env::var("HOME")) {
        (Ok(rest), Ok(home)) => Path::new(&home).join(rest),
        _ => path.to_path_buf(),
    }
}
