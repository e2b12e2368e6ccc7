//! Logging for rclctl runs
//!
//! Each run writes a timestamped file under the configured log directory at
//! DEBUG, and mirrors INFO (or DEBUG with `--verbose`) to the console.
//! `RUST_LOG` overrides the console level.
//!
//! Nothing is installed globally: the caller scopes the returned subscriber
//! with `tracing::subscriber::with_default`.

use rcl_common::RclError;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::Subscriber;
use tracing_subscriber::filter::{EnvFilter, LevelFilter};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{fmt, Layer, Registry};

const STAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// Timestamp shared by the log file name and configuration backups
pub fn run_stamp() -> String {
    chrono::Local::now().format(STAMP_FORMAT).to_string()
}

pub fn log_file_path(log_dir: &Path, stamp: &str) -> PathBuf {
    log_dir.join(format!("RCL_{}.log", stamp))
}

/// Create the log directory and file and build the run subscriber.
///
/// Failure to create either is `RclError::OutputDir`.
pub fn build_subscriber(
    log_dir: &Path,
    stamp: &str,
    verbose: bool,
) -> Result<(impl Subscriber + Send + Sync + 'static, PathBuf), RclError> {
    fs::create_dir_all(log_dir).map_err(|source| RclError::OutputDir {
        path: log_dir.to_path_buf(),
        source,
    })?;

    let path = log_file_path(log_dir, stamp);
    let file = File::create(&path).map_err(|source| RclError::OutputDir {
        path: path.clone(),
        source,
    })?;

    let console_default = if verbose { "debug" } else { "info" };
    let console_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(console_default));

    let console = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(console_filter);

    let logfile = fmt::layer()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .with_filter(LevelFilter::DEBUG);

    Ok((Registry::default().with(console).with(logfile), path))
}
