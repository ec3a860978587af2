//! Simulation config lookup.
//!
//! The config is line oriented: `#` opens a comment that runs to the end of the
//! line and data lines read `KEY: value`. Keys are matched exactly; when a key
//! is defined twice the first definition wins.

mod parser;

use crate::domain::{CheckError, CheckResult};
use parser::{ConfigEntry, parse_config_entries};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const RECOVCLS_OUT: &str = "RECOVCLS_OUT";
pub const CL_PREFIX: &str = "CL_PREFIX";
pub const NSIDE: &str = "NSIDE";
pub const APPLY_PIXWIN: &str = "APPLY_PIXWIN";
pub const DENS2KAPPA: &str = "DENS2KAPPA";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigValue {
    Set(String),
    /// The option was given but switched off (value starting with `0`).
    Disabled,
}

impl ConfigValue {
    fn from_raw(raw: &str) -> Self {
        if raw.is_empty() || raw.starts_with('0') {
            Self::Disabled
        } else {
            Self::Set(raw.to_string())
        }
    }

    pub fn as_set(&self) -> Option<&str> {
        match self {
            Self::Set(value) => Some(value),
            Self::Disabled => None,
        }
    }

    pub fn is_disabled(&self) -> bool {
        matches!(self, Self::Disabled)
    }
}

#[derive(Debug, Clone)]
pub struct ConfigFile {
    path: PathBuf,
    entries: HashMap<String, ConfigEntryRecord>,
}

#[derive(Debug, Clone)]
struct ConfigEntryRecord {
    value: String,
    source_line: usize,
}

impl ConfigFile {
    pub fn load(path: &Path) -> CheckResult<Self> {
        if !path.is_file() {
            return Err(CheckError::missing_input_file(path, "the config file"));
        }

        let source = fs::read_to_string(path).map_err(|source| {
            CheckError::io_system(
                "IO.CONFIG_READ",
                format!("failed to read config '{}': {}", path.display(), source),
            )
        })?;
        Ok(Self::parse(path, &source))
    }

    pub fn parse(path: impl Into<PathBuf>, source: &str) -> Self {
        let mut entries = HashMap::new();
        for ConfigEntry {
            key,
            value,
            source_line,
        } in parse_config_entries(source)
        {
            entries
                .entry(key)
                .or_insert(ConfigEntryRecord { value, source_line });
        }

        Self {
            path: path.into(),
            entries,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory relative paths in the config are resolved against.
    pub fn base_dir(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new(""))
    }

    pub fn lookup(&self, key: &str) -> CheckResult<ConfigValue> {
        self.optional(key)
            .ok_or_else(|| CheckError::config_key_not_found(key, &self.path))
    }

    pub fn optional(&self, key: &str) -> Option<ConfigValue> {
        let record = self.entries.get(key)?;
        tracing::debug!(key, line = record.source_line, value = %record.value, "config lookup");
        Some(ConfigValue::from_raw(&record.value))
    }

    /// Missing and disabled keys both read as `false`.
    pub fn is_enabled(&self, key: &str) -> bool {
        matches!(self.optional(key), Some(ConfigValue::Set(_)))
    }

    /// Value of a key that must be present and switched on.
    pub fn required_set(&self, key: &str) -> CheckResult<String> {
        match self.lookup(key)? {
            ConfigValue::Set(value) => Ok(value),
            ConfigValue::Disabled => Err(CheckError::input_validation(
                "INPUT.CONFIG_KEY_DISABLED",
                format!(
                    "key '{}' is disabled in config '{}' but is required here",
                    key,
                    self.path.display()
                ),
            )),
        }
    }

    /// Resolves a configured path; relative values are taken from the config's directory.
    pub fn required_path(&self, key: &str) -> CheckResult<PathBuf> {
        let value = self.required_set(key)?;
        Ok(resolve_relative(self.base_dir(), &value))
    }

    /// Path prefix such as `in/theory_`; returned as a string so file names can be appended.
    pub fn required_prefix(&self, key: &str) -> CheckResult<String> {
        let value = self.required_set(key)?;
        Ok(resolve_prefix(self.base_dir(), &value))
    }

    pub fn required_usize(&self, key: &str) -> CheckResult<usize> {
        let value = self.required_set(key)?;
        value.parse::<usize>().map_err(|_| {
            CheckError::input_validation(
                "INPUT.CONFIG_VALUE",
                format!(
                    "key '{}' in config '{}' must be a positive integer, got '{}'",
                    key,
                    self.path.display(),
                    value
                ),
            )
        })
    }
}

pub fn resolve_relative(base_dir: &Path, value: &str) -> PathBuf {
    let candidate = Path::new(value);
    if candidate.is_absolute() {
        candidate.to_path_buf()
    } else {
        base_dir.join(candidate)
    }
}

pub fn resolve_prefix(base_dir: &Path, value: &str) -> String {
    if Path::new(value).is_absolute() || base_dir.as_os_str().is_empty() {
        return value.to_string();
    }
    let mut prefix = base_dir.to_string_lossy().into_owned();
    if !prefix.ends_with(std::path::MAIN_SEPARATOR) && !prefix.ends_with('/') {
        prefix.push(std::path::MAIN_SEPARATOR);
    }
    prefix.push_str(value);
    prefix
}
