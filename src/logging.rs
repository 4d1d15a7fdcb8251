//! Logging configuration with journald support on Linux.
//!
//! Logs go to systemd's journal when it is reachable and to a daily rolling
//! file otherwise. Running in the foreground also mirrors everything to
//! stderr.

use anyhow::Result;
use std::path::PathBuf;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Initialize the logging system.
///
/// Log level can be controlled via the `CLIPSORT_LOG` environment variable:
/// - `CLIPSORT_LOG=debug` for per-request detail
/// - `CLIPSORT_LOG=info` for standard output (default)
/// - `CLIPSORT_LOG=warn` for skipped images and failures only
/// - `CLIPSORT_LOG=clipsort=debug,tower_http=debug` to trace HTTP requests too
pub fn init(log_dir: Option<PathBuf>, foreground: bool) -> Result<()> {
    let env_filter = EnvFilter::try_from_env("CLIPSORT_LOG")
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let stderr_layer = foreground.then(|| fmt::layer().with_writer(std::io::stderr).boxed());

    #[cfg(target_os = "linux")]
    {
        if let Ok(journald_layer) = tracing_journald::layer() {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(stderr_layer)
                .with(journald_layer)
                .init();

            tracing::info!("Logging initialized with journald backend");
            return Ok(());
        }
    }

    // Fallback to file-based logging
    let log_dir = log_dir.unwrap_or_else(|| {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("clipsort")
            .join("logs")
    });

    std::fs::create_dir_all(&log_dir)?;

    let file_appender = tracing_appender::rolling::daily(&log_dir, "clipsort.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    // Keep the worker alive for the life of the process
    static GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
        std::sync::OnceLock::new();
    let _ = GUARD.set(guard);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    tracing::info!("Logging initialized with file backend at {:?}", log_dir);
    Ok(())
}
