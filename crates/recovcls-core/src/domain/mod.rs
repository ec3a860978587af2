pub mod errors;

pub use errors::{
    CheckError, CheckErrorCategory, CheckResult, ExitStatusClass, ParserResult, PipelineResult,
};

use serde::Serialize;
use std::fmt::{Display, Formatter};

/// Reserved column holding the multipole index.
pub const ELL_KEY: &str = "l";

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SeriesError {
    #[error("series has no rows")]
    Empty,
    #[error("column '{key}' has {actual} values, expected {expected}")]
    LengthMismatch {
        key: String,
        expected: usize,
        actual: usize,
    },
    #[error("multipole column must be strictly increasing, row {index} has {current} after {previous}")]
    NonIncreasingEll {
        index: usize,
        previous: f64,
        current: f64,
    },
    #[error("column '{key}' appears more than once")]
    DuplicateKey { key: String },
}

/// Spectrum columns keyed by field, all sharing one multipole grid.
#[derive(Debug, Clone, PartialEq)]
pub struct ClSeries {
    ell: Vec<f64>,
    fields: Vec<(String, Vec<f64>)>,
}

impl ClSeries {
    pub fn new(ell: Vec<f64>, fields: Vec<(String, Vec<f64>)>) -> Result<Self, SeriesError> {
        if ell.is_empty() {
            return Err(SeriesError::Empty);
        }

        for (index, pair) in ell.windows(2).enumerate() {
            if !(pair[1] > pair[0]) {
                return Err(SeriesError::NonIncreasingEll {
                    index: index + 1,
                    previous: pair[0],
                    current: pair[1],
                });
            }
        }

        for (position, (key, values)) in fields.iter().enumerate() {
            if values.len() != ell.len() {
                return Err(SeriesError::LengthMismatch {
                    key: key.clone(),
                    expected: ell.len(),
                    actual: values.len(),
                });
            }
            if key == ELL_KEY || fields[..position].iter().any(|(seen, _)| seen == key) {
                return Err(SeriesError::DuplicateKey { key: key.clone() });
            }
        }

        Ok(Self { ell, fields })
    }

    pub fn ell(&self) -> &[f64] {
        &self.ell
    }

    pub fn field(&self, key: &str) -> Option<&[f64]> {
        self.fields
            .iter()
            .find(|(candidate, _)| candidate == key)
            .map(|(_, values)| values.as_slice())
    }

    /// Like [`ClSeries::field`] but also resolves the reserved `l` column.
    pub fn column(&self, key: &str) -> Option<&[f64]> {
        if key == ELL_KEY {
            return Some(&self.ell);
        }
        self.field(key)
    }

    /// Field keys in column order, excluding `l`.
    pub fn field_keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.fields.iter().map(|(key, _)| key.as_str())
    }

    pub fn len(&self) -> usize {
        self.ell.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ell.is_empty()
    }

    pub fn ell_min(&self) -> f64 {
        self.ell[0]
    }

    pub fn ell_max(&self) -> f64 {
        self.ell[self.ell.len() - 1]
    }
}

/// Non-fatal conditions that narrow or thin out the comparison.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    EllRangeMismatch {
        field: String,
        recovered: [f64; 2],
        input: [f64; 2],
        used: [f64; 2],
    },
    FieldNotMatched {
        field: String,
    },
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EllRangeMismatch {
                field,
                recovered,
                input,
                used,
            } => write!(
                f,
                "different ell ranges for '{}': recovered {}..{}, input {}..{}; using {}..{}",
                field, recovered[0], recovered[1], input[0], input[1], used[0], used[1]
            ),
            Self::FieldNotMatched { field } => {
                write!(f, "no input spectrum matches recovered field '{}'", field)
            }
        }
    }
}
