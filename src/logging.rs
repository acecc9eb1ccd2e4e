use std::{fs, path::Path};
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt::writer::MakeWriterExt, EnvFilter};

/// Installs the global subscriber: everything to a daily `app.log`, warnings
/// and above also to stderr. Stdout stays reserved for tool output.
///
/// The returned guard flushes the file writer on drop, so hold it until exit.
pub fn init_tracing(logs_dir: &Path) -> WorkerGuard {
    fs::create_dir_all(logs_dir).ok();
    let file_appender = tracing_appender::rolling::daily(logs_dir, "app.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    let writer = non_blocking.and(std::io::stderr.with_max_level(Level::WARN));
    let installed = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(writer)
        .with_ansi(false)
        .try_init();
    if installed.is_err() {
        eprintln!("tracing subscriber already installed; keeping the existing one");
    }
    guard
}
