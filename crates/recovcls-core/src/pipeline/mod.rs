pub mod compare;
pub mod output;
pub mod render;
pub mod router;
pub mod summary;

pub use compare::{ComparisonResult, compare_field};
pub use output::{OUTPUT_FOLDER_PREFIX, output_folder_name, resolve_output_folder};
pub use render::{FieldOutcome, artifact_file_name, render_comparison, render_field};
pub use router::{
    ConvergenceAnswer, ConvergenceSpectraResolver, InputMode, InputSpectra, PresetAnswer,
    TerminalPrompt, route_input_spectra,
};
pub use summary::{FieldSummary, RunSummary, render_human_summary, write_summary_json};

use crate::domain::{CheckError, PipelineResult};
use crate::modules::cl_table::load_cl_table;
use crate::modules::config::{APPLY_PIXWIN, ConfigFile, ConfigValue, NSIDE, RECOVCLS_OUT};
use crate::numerics::{PixelWindow, RemainderPolicy};
use std::path::PathBuf;

pub const DEFAULT_BIN_WIDTH: usize = 12;
pub const DEFAULT_RESIDUAL_BIN_WIDTH: usize = 20;

#[derive(Debug, Clone, PartialEq)]
pub struct CheckOptions {
    pub bin_width: usize,
    pub residual_bin_width: usize,
    pub remainder_policy: RemainderPolicy,
    /// Tabulated `W_ℓ` used instead of the computed window.
    pub pixwin_table: Option<PathBuf>,
    pub summary_path: Option<PathBuf>,
}

impl Default for CheckOptions {
    fn default() -> Self {
        Self {
            bin_width: DEFAULT_BIN_WIDTH,
            residual_bin_width: DEFAULT_RESIDUAL_BIN_WIDTH,
            remainder_policy: RemainderPolicy::Drop,
            pixwin_table: None,
            summary_path: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CheckRequest {
    pub config_path: PathBuf,
    pub working_dir: PathBuf,
    pub options: CheckOptions,
}

impl CheckRequest {
    pub fn new(config_path: impl Into<PathBuf>, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
            working_dir: working_dir.into(),
            options: CheckOptions::default(),
        }
    }

    pub fn with_options(mut self, options: CheckOptions) -> Self {
        self.options = options;
        self
    }
}

/// State shared by every per-field step of one run.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub config: ConfigFile,
    pub output_dir: PathBuf,
    pub pixel_window: PixelWindow,
    pub options: CheckOptions,
}

/// Runs the whole comparison: one artifact per recovered field with a
/// matching input spectrum.
pub fn run_check(
    request: &CheckRequest,
    resolver: &mut dyn ConvergenceSpectraResolver,
) -> PipelineResult<RunSummary> {
    validate_options(&request.options)?;

    let config = ConfigFile::load(&request.config_path)?;
    let output_dir = resolve_output_folder(&request.config_path, &request.working_dir)?;

    let recovered_path = config.required_path(RECOVCLS_OUT)?;
    tracing::info!(path = %recovered_path.display(), "reading recovered Cls");
    let recovered = load_cl_table(&recovered_path)?;

    let inputs = route_input_spectra(&config, &recovered, resolver, &request.working_dir)?;
    let pixel_window = pixel_window_for(&config, &request.options)?;

    let ctx = RunContext {
        config,
        output_dir,
        pixel_window,
        options: request.options.clone(),
    };

    let mut fields = Vec::new();
    let mut diagnostics = Vec::new();
    for field in recovered.field_keys() {
        match render_field(&ctx, field, &recovered, &inputs)? {
            FieldOutcome::Rendered {
                summary,
                diagnostics: field_diagnostics,
            } => {
                tracing::info!(field, artifact = %summary.artifact.display(), "wrote comparison");
                fields.push(summary);
                diagnostics.extend(field_diagnostics);
            }
            FieldOutcome::Skipped(diagnostic) => diagnostics.push(diagnostic),
        }
    }

    let summary = RunSummary {
        config: request.config_path.clone(),
        output_dir: ctx.output_dir.clone(),
        input: inputs.mode,
        pixel_window_applied: ctx.pixel_window.is_active(),
        fields,
        diagnostics,
    };

    if let Some(path) = &ctx.options.summary_path {
        write_summary_json(&summary, path)?;
        tracing::info!(path = %path.display(), "wrote run summary");
    }

    Ok(summary)
}

/// The window is deconvolved only when the config says `APPLY_PIXWIN: 1`.
pub fn pixel_window_for(config: &ConfigFile, options: &CheckOptions) -> PipelineResult<PixelWindow> {
    let applied = matches!(config.optional(APPLY_PIXWIN), Some(ConfigValue::Set(value)) if value == "1");
    if !applied {
        return Ok(PixelWindow::disabled());
    }

    if let Some(table) = &options.pixwin_table {
        tracing::info!(table = %table.display(), "using tabulated pixel window");
        return PixelWindow::from_table(table);
    }

    let nside = config.required_usize(NSIDE)?;
    tracing::info!(nside, "simulation used a pixel window, correcting recovered Cls");
    PixelWindow::healpix(nside).map_err(|error| {
        CheckError::input_validation(
            "INPUT.CONFIG_VALUE",
            format!("key '{}' in config '{}': {}", NSIDE, config.path().display(), error),
        )
    })
}

fn validate_options(options: &CheckOptions) -> PipelineResult<()> {
    for (name, width) in [
        ("bin width", options.bin_width),
        ("residual bin width", options.residual_bin_width),
    ] {
        if width == 0 {
            return Err(CheckError::input_validation(
                "INPUT.BIN_WIDTH",
                format!("{} must be at least 1", name),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{CheckOptions, pixel_window_for};
    use crate::domain::errors::CONFIG_KEY_NOT_FOUND;
    use crate::modules::config::ConfigFile;

    #[test]
    fn pixel_window_follows_apply_flag() {
        let options = CheckOptions::default();

        let off = ConfigFile::parse("c.config", "APPLY_PIXWIN: 0\nNSIDE: 64\n");
        assert!(!pixel_window_for(&off, &options).expect("window resolves").is_active());

        let absent = ConfigFile::parse("c.config", "NSIDE: 64\n");
        assert!(!pixel_window_for(&absent, &options).expect("window resolves").is_active());

        let on = ConfigFile::parse("c.config", "APPLY_PIXWIN: 1\nNSIDE: 64\n");
        assert!(pixel_window_for(&on, &options).expect("window resolves").is_active());
    }

    #[test]
    fn active_pixel_window_requires_nside() {
        let config = ConfigFile::parse("c.config", "APPLY_PIXWIN: 1\n");
        let error = pixel_window_for(&config, &CheckOptions::default()).expect_err("NSIDE missing");
        assert_eq!(error.code(), CONFIG_KEY_NOT_FOUND);
    }
}
