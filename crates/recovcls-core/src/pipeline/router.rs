//! Chooses where the input theory spectra are read from.
//!
//! Runs that converted density fields into lensing convergence must be
//! compared against convergence spectra produced by a separate tool. The
//! pipeline cannot compute those itself, so it asks a
//! [`ConvergenceSpectraResolver`] where they live.

use crate::domain::{CheckError, ClSeries, PipelineResult, errors::MISSING_INPUT_FILE};
use crate::modules::cl_table::load_two_column;
use crate::modules::config::{CL_PREFIX, ConfigFile, DENS2KAPPA, resolve_prefix};
use globset::{Glob, GlobMatcher};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

const SPECTRUM_FILE_GLOB: &str = "*.dat";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConvergenceAnswer {
    /// Spectra exist; the value is their path prefix (directory plus root name).
    Precomputed(String),
    NotComputed,
    Unrecognized(String),
}

pub trait ConvergenceSpectraResolver {
    fn resolve(&mut self) -> PipelineResult<ConvergenceAnswer>;
}

/// Resolver with a fixed answer, for headless runs.
#[derive(Debug, Clone)]
pub struct PresetAnswer(pub ConvergenceAnswer);

impl ConvergenceSpectraResolver for PresetAnswer {
    fn resolve(&mut self) -> PipelineResult<ConvergenceAnswer> {
        Ok(self.0.clone())
    }
}

/// Asks on a terminal-like stream: a `[Y/N]` question, then the path prefix.
pub struct TerminalPrompt<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> TerminalPrompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    fn ask(&mut self, question: &str) -> PipelineResult<String> {
        write!(self.output, "{}", question)
            .and_then(|_| self.output.flush())
            .map_err(prompt_io_error)?;
        let mut answer = String::new();
        self.input.read_line(&mut answer).map_err(prompt_io_error)?;
        Ok(answer.trim().to_string())
    }
}

impl<R: BufRead, W: Write> ConvergenceSpectraResolver for TerminalPrompt<R, W> {
    fn resolve(&mut self) -> PipelineResult<ConvergenceAnswer> {
        let answer = self.ask(
            "DENS2KAPPA is set: convergence Cls are needed for the comparison.\n\
             Have you previously calculated them with the external conversion tool? [Y/N] ",
        )?;

        match answer.to_ascii_uppercase().as_str() {
            "Y" => {
                let prefix = self.ask("Path to the convergence Cls and their root name: ")?;
                Ok(ConvergenceAnswer::Precomputed(prefix))
            }
            "N" => Ok(ConvergenceAnswer::NotComputed),
            _ => Ok(ConvergenceAnswer::Unrecognized(answer)),
        }
    }
}

fn prompt_io_error(source: std::io::Error) -> CheckError {
    CheckError::io_system("IO.PROMPT", format!("interactive prompt failed: {}", source))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum InputMode {
    Direct { prefix: String },
    Converted { prefix: String },
}

impl InputMode {
    pub fn prefix(&self) -> &str {
        match self {
            Self::Direct { prefix } | Self::Converted { prefix } => prefix,
        }
    }
}

/// Input theory spectra keyed by field.
#[derive(Debug, Clone)]
pub struct InputSpectra {
    pub mode: InputMode,
    pub series: BTreeMap<String, ClSeries>,
}

impl InputSpectra {
    pub fn get(&self, field: &str) -> Option<&ClSeries> {
        self.series.get(field)
    }
}

/// Loads the input spectra matching the recovered fields.
///
/// `working_dir` anchors a relative prefix returned by the resolver.
pub fn route_input_spectra(
    config: &ConfigFile,
    recovered: &ClSeries,
    resolver: &mut dyn ConvergenceSpectraResolver,
    working_dir: &Path,
) -> PipelineResult<InputSpectra> {
    if !config.is_enabled(DENS2KAPPA) {
        let prefix = config.required_prefix(CL_PREFIX)?;
        tracing::info!(prefix = %prefix, "reading input Cls");
        let series = load_matched_inputs(&prefix, recovered)?;
        return Ok(InputSpectra {
            mode: InputMode::Direct { prefix },
            series,
        });
    }

    tracing::info!("DENS2KAPPA used in the config, convergence Cls are needed");
    let prefix = match resolver.resolve()? {
        ConvergenceAnswer::Precomputed(prefix) => resolve_prefix(working_dir, &prefix),
        ConvergenceAnswer::NotComputed => {
            return Err(CheckError::user_aborted(
                "convergence Cls must be computed with the external conversion tool before this check",
            ));
        }
        ConvergenceAnswer::Unrecognized(answer) => {
            return Err(CheckError::user_aborted(format!(
                "option '{}' not recognised, expected Y or N",
                answer
            )));
        }
    };

    if prefixed_spectrum_files(&prefix)?.is_empty() {
        return Err(CheckError::io_system(
            MISSING_INPUT_FILE,
            format!("no convergence Cls found matching '{}{}'", prefix, SPECTRUM_FILE_GLOB),
        ));
    }

    let original_prefix = config.required_prefix(CL_PREFIX)?;
    copy_original_inputs(&original_prefix, &prefix)?;

    let series = load_matched_inputs(&prefix, recovered)?;
    Ok(InputSpectra {
        mode: InputMode::Converted { prefix },
        series,
    })
}

/// Loads `<prefix><field>.dat` for every recovered field that has one.
pub fn load_matched_inputs(
    prefix: &str,
    recovered: &ClSeries,
) -> PipelineResult<BTreeMap<String, ClSeries>> {
    let mut series = BTreeMap::new();
    for field in recovered.field_keys() {
        let path = PathBuf::from(format!("{}{}.dat", prefix, field));
        if !path.is_file() {
            tracing::debug!(field, path = %path.display(), "no input Cl file for field");
            continue;
        }
        tracing::info!(field, path = %path.display(), "reading input Cls");
        series.insert(field.to_string(), load_two_column(&path, field)?);
    }
    Ok(series)
}

/// Copies `<original_prefix>*.dat` to `<target_prefix>*.dat`, keeping the suffix.
/// Files already present under the target prefix are left alone.
pub fn copy_original_inputs(original_prefix: &str, target_prefix: &str) -> PipelineResult<Vec<PathBuf>> {
    let (_, stem) = split_prefix(original_prefix);
    let mut copied = Vec::new();

    for source in prefixed_spectrum_files(original_prefix)? {
        let file_name = source
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let suffix = file_name.strip_prefix(stem.as_str()).unwrap_or(&file_name);
        let destination = PathBuf::from(format!("{}{}", target_prefix, suffix));

        if destination.exists() {
            tracing::debug!(destination = %destination.display(), "already present, not copied");
            continue;
        }

        tracing::info!(
            source = %source.display(),
            destination = %destination.display(),
            "copying input Cls next to the convergence Cls"
        );
        fs::copy(&source, &destination).map_err(|error| {
            CheckError::io_system(
                "IO.COPY_INPUT_CLS",
                format!(
                    "failed to copy '{}' to '{}': {}",
                    source.display(),
                    destination.display(),
                    error
                ),
            )
        })?;
        copied.push(destination);
    }

    Ok(copied)
}

/// Lists `<prefix>*.dat`, sorted. A missing directory yields no files.
pub fn prefixed_spectrum_files(prefix: &str) -> PipelineResult<Vec<PathBuf>> {
    let (dir, stem) = split_prefix(prefix);
    let matcher = spectrum_file_matcher()?;

    let Ok(entries) = fs::read_dir(&dir) else {
        return Ok(Vec::new());
    };

    let mut files = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.starts_with(stem.as_str()) && matcher.is_match(name))
        })
        .collect::<Vec<_>>();
    files.sort();
    Ok(files)
}

fn spectrum_file_matcher() -> PipelineResult<GlobMatcher> {
    Glob::new(SPECTRUM_FILE_GLOB)
        .map(|glob| glob.compile_matcher())
        .map_err(|error| {
            CheckError::internal(
                "SYS.GLOB",
                format!("invalid spectrum file pattern '{}': {}", SPECTRUM_FILE_GLOB, error),
            )
        })
}

/// Splits `dir/root_` into (`dir`, `root_`); a trailing separator leaves an empty root.
fn split_prefix(prefix: &str) -> (PathBuf, String) {
    if prefix.ends_with('/') || prefix.ends_with(std::path::MAIN_SEPARATOR) {
        return (PathBuf::from(prefix), String::new());
    }

    let path = Path::new(prefix);
    let stem = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    (dir, stem)
}
