use crate::domain::{CheckError, PipelineResult};
use std::fs;
use std::path::{Path, PathBuf};

pub const OUTPUT_FOLDER_PREFIX: &str = "Check_RecovCls-";

pub fn output_folder_name(config_path: &Path) -> String {
    let stem = config_path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("{}{}", OUTPUT_FOLDER_PREFIX, stem)
}

/// Picks the folder the artifacts go to.
///
/// Tries `Check_RecovCls-<config stem>` next to the config first and falls
/// back to the same name under `working_dir` when it cannot be created there.
/// Existing folders are reused as they are.
pub fn resolve_output_folder(config_path: &Path, working_dir: &Path) -> PipelineResult<PathBuf> {
    let name = output_folder_name(config_path);
    let config_dir = config_path.parent().unwrap_or_else(|| Path::new(""));
    let primary = if config_dir.as_os_str().is_empty() {
        working_dir.join(&name)
    } else {
        config_dir.join(&name)
    };

    if primary.is_dir() {
        tracing::info!(folder = %primary.display(), "output folder exists, reusing it");
        return Ok(primary);
    }

    match fs::create_dir(&primary) {
        Ok(()) => {
            tracing::info!(folder = %primary.display(), "created output folder");
            Ok(primary)
        }
        Err(source) => {
            let fallback = working_dir.join(&name);
            tracing::warn!(
                folder = %primary.display(),
                fallback = %fallback.display(),
                error = %source,
                "cannot create output folder next to the config, using the working directory"
            );
            if fallback.is_dir() {
                return Ok(fallback);
            }
            fs::create_dir(&fallback).map_err(|source| {
                CheckError::io_system(
                    "IO.OUTPUT_FOLDER",
                    format!(
                        "failed to create output folder '{}': {}",
                        fallback.display(),
                        source
                    ),
                )
            })?;
            Ok(fallback)
        }
    }
}
