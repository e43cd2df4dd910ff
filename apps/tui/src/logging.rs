use color_eyre::eyre::eyre;
use color_eyre::Result;
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// Installs the global subscriber writing to `log_file`. The TUI owns the
/// terminal, so nothing is logged to stdout or stderr.
pub fn init(log_file: &Path, debug: bool) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)
        .map_err(|e| eyre!("Failed to open log file {}: {e}", log_file.display()))?;

    let env_filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .try_init()
        .map_err(|e| eyre!("Failed to install logger: {e}"))
}
