//! File logging. The terminal belongs to the UI, so nothing goes to stderr.

use std::fs;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

pub const LOG_FILE: &str = "allegro.log";
const FALLBACK_FILTER: &str = "info";

/// `RUST_LOG` if set and valid, else `configured`, else `info`.
fn resolve_filter(from_env: Option<&str>, configured: &str) -> EnvFilter {
    from_env
        .and_then(|v| EnvFilter::try_new(v).ok())
        .or_else(|| EnvFilter::try_new(configured).ok())
        .unwrap_or_else(|| EnvFilter::new(FALLBACK_FILTER))
}

/// Install a daily rolling file subscriber under `dir`.
///
/// Keep the guard alive until exit; dropping it flushes and stops the writer.
pub fn init(dir: &Path, configured_filter: &str) -> Result<WorkerGuard, Box<dyn std::error::Error>> {
    fs::create_dir_all(dir)?;

    let appender = tracing_appender::rolling::daily(dir, LOG_FILE);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let from_env = std::env::var("RUST_LOG").ok();
    let filter = resolve_filter(from_env.as_deref(), configured_filter);

    let subscriber = tracing_subscriber::fmt()
        .with_writer(writer)
        .with_target(true)
        .with_level(true)
        .with_ansi(false)
        .with_env_filter(filter)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    Ok(guard)
}
