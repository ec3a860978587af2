use super::compare::ComparisonResult;
use super::router::InputMode;
use crate::domain::{CheckError, Diagnostic, PipelineResult};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldSummary {
    pub field: String,
    pub artifact: PathBuf,
    pub ell_min: f64,
    pub ell_max: f64,
    pub bins: usize,
    pub residual_bins: usize,
    pub mean_residual_percent: Option<f64>,
    pub max_abs_residual_percent: Option<f64>,
}

impl FieldSummary {
    pub fn from_result(result: &ComparisonResult, artifact: PathBuf) -> Self {
        Self {
            field: result.field.clone(),
            artifact,
            ell_min: result.range.min,
            ell_max: result.range.max,
            bins: result.recovered.len(),
            residual_bins: result.residual_percent.len(),
            mean_residual_percent: result.mean_residual_percent(),
            max_abs_residual_percent: result.max_abs_residual_percent(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub config: PathBuf,
    pub output_dir: PathBuf,
    pub input: InputMode,
    pub pixel_window_applied: bool,
    pub fields: Vec<FieldSummary>,
    pub diagnostics: Vec<Diagnostic>,
}

impl RunSummary {
    pub fn artifacts(&self) -> impl Iterator<Item = &Path> + '_ {
        self.fields.iter().map(|field| field.artifact.as_path())
    }

    pub fn skipped_fields(&self) -> impl Iterator<Item = &str> + '_ {
        self.diagnostics.iter().filter_map(|diagnostic| match diagnostic {
            Diagnostic::FieldNotMatched { field } => Some(field.as_str()),
            Diagnostic::EllRangeMismatch { .. } => None,
        })
    }
}

pub fn render_human_summary(summary: &RunSummary) -> String {
    let mut lines = vec![format!(
        "Checked {} field(s) from '{}' ({} input Cls)",
        summary.fields.len(),
        summary.config.display(),
        match summary.input {
            InputMode::Direct { .. } => "direct",
            InputMode::Converted { .. } => "converted",
        }
    )];

    for field in &summary.fields {
        let residual = field
            .max_abs_residual_percent
            .map_or_else(|| "n/a".to_string(), |value| format!("{:.2}%", value));
        lines.push(format!(
            "  {}: ell {}..{}, max |residual| {} -> {}",
            field.field,
            field.ell_min,
            field.ell_max,
            residual,
            field.artifact.display()
        ));
    }

    for diagnostic in &summary.diagnostics {
        lines.push(format!("  warning: {}", diagnostic));
    }

    lines.push(format!("Plots written to '{}'", summary.output_dir.display()));
    lines.join("\n")
}

pub fn write_summary_json(summary: &RunSummary, path: &Path) -> PipelineResult<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| {
            CheckError::io_system(
                "IO.SUMMARY_WRITE",
                format!("failed to create '{}': {}", parent.display(), source),
            )
        })?;
    }

    let json = serde_json::to_string_pretty(summary).map_err(|source| {
        CheckError::internal(
            "SYS.SUMMARY_SERIALIZE",
            format!("failed to serialize run summary: {}", source),
        )
    })?;
    fs::write(path, json).map_err(|source| {
        CheckError::io_system(
            "IO.SUMMARY_WRITE",
            format!("failed to write summary '{}': {}", path.display(), source),
        )
    })
}
