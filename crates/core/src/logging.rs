use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Days of log files kept per component.
const KEPT_LOG_FILES: usize = 7;

/// Used when `RUST_LOG` is unset. The MCP transport is chatty at `info`.
const DEFAULT_DIRECTIVES: &str = "info,rmcp=warn";

/// Directory holding the rolling log files, `~/.gmscope/logs`.
pub fn log_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".gmscope")
        .join("logs")
}

fn default_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES))
}

// `gmscope-mcp.2026-10-19.log`, pruned to the last week. Falls back to the
// plain daily appender if the builder cannot open the first file.
fn file_writer(dir: &Path, component: &str) -> (NonBlocking, WorkerGuard) {
    let appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(format!("gmscope-{component}"))
        .filename_suffix("log")
        .max_log_files(KEPT_LOG_FILES)
        .build(dir)
        .unwrap_or_else(|_| tracing_appender::rolling::daily(dir, component));
    tracing_appender::non_blocking(appender)
}

/// Installs the global subscriber for one process and returns the guard
/// that flushes the file writer on drop.
///
/// The stderr layer is only for interactive commands: the MCP server owns
/// stdio and must never get log lines mixed in.
pub fn init_logging(component: &str, to_stderr: bool) -> WorkerGuard {
    let dir = log_dir();
    let _ = std::fs::create_dir_all(&dir);
    let (writer, guard) = file_writer(&dir, component);

    // Files keep targets so index and transport events can be told apart
    let file_layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true);
    let stderr_layer = to_stderr.then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
    });

    tracing_subscriber::registry()
        .with(default_filter())
        .with(file_layer)
        .with(stderr_layer)
        .init();

    guard
}
