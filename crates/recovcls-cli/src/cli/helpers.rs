use recovcls_core::domain::{CheckError, CheckResult};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Logs go to stderr so stdout carries only the prompt and the run summary.
pub(super) fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

pub(super) fn current_working_dir() -> CheckResult<PathBuf> {
    std::env::current_dir().map_err(|source| {
        CheckError::io_system(
            "IO.CLI_CURRENT_DIR",
            format!("failed to read current working directory: {}", source),
        )
    })
}

pub(super) fn resolve_cli_path(working_dir: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        working_dir.join(path)
    }
}
