//! Pixel window deconvolution.
//!
//! Maps made on a pixelised sphere carry the signal smoothed by the pixel
//! shape, so recovered spectra are damped by `W_ℓ²`. Dividing by that factor
//! puts them back on the footing of the input theory spectra.

use crate::domain::{CheckError, CheckResult};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq)]
enum WindowSource {
    Disabled,
    /// Equal-area circular top-hat approximation of a HEALPix pixel.
    TopHat { nside: usize },
    /// `W_ℓ` tabulated from `ℓ = 0`.
    Table(Vec<f64>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PixelWindow {
    source: WindowSource,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PixelWindowError {
    #[error("nside must be at least 1")]
    InvalidNside,
    #[error("multipole range {ell_min}..{ell_max} is not a valid non-negative range")]
    InvalidRange { ell_min: f64, ell_max: f64 },
    #[error("pixel window covers {len} values for ell {ell_min}..{ell_max}, got {values} values")]
    LengthMismatch {
        ell_min: usize,
        ell_max: usize,
        len: usize,
        values: usize,
    },
    #[error("pixel window table stops at ell={table_max}, need ell={ell_max}")]
    TableTooShort { table_max: usize, ell_max: usize },
}

impl PixelWindow {
    pub fn disabled() -> Self {
        Self {
            source: WindowSource::Disabled,
        }
    }

    pub fn healpix(nside: usize) -> Result<Self, PixelWindowError> {
        if nside == 0 {
            return Err(PixelWindowError::InvalidNside);
        }
        Ok(Self {
            source: WindowSource::TopHat { nside },
        })
    }

    pub fn from_values(values: Vec<f64>) -> Self {
        Self {
            source: WindowSource::Table(values),
        }
    }

    /// Reads `ℓ W_ℓ` rows, or bare `W_ℓ` rows indexed from `ℓ = 0`.
    pub fn from_table(path: &Path) -> CheckResult<Self> {
        if !path.is_file() {
            return Err(CheckError::missing_input_file(path, "pixel window table"));
        }
        let source = fs::read_to_string(path).map_err(|source| {
            CheckError::io_system(
                "IO.PIXWIN_READ",
                format!("failed to read pixel window table '{}': {}", path.display(), source),
            )
        })?;
        parse_window_table(&source).map(Self::from_values).map_err(|message| {
            CheckError::input_validation(
                "INPUT.PIXWIN_TABLE",
                format!("{}: {}", path.display(), message),
            )
        })
    }

    pub fn is_active(&self) -> bool {
        !matches!(self.source, WindowSource::Disabled)
    }

    /// `W_ℓ²` for every integer multipole in `ell_min..=ell_max`.
    pub fn squared(&self, ell_min: usize, ell_max: usize) -> Result<Vec<f64>, PixelWindowError> {
        let len = ell_max + 1 - ell_min;
        match &self.source {
            WindowSource::Disabled => Ok(vec![1.0; len]),
            WindowSource::TopHat { nside } => Ok(top_hat_window(*nside, ell_max)[ell_min..]
                .iter()
                .map(|w| w * w)
                .collect()),
            WindowSource::Table(values) => {
                if values.len() <= ell_max {
                    return Err(PixelWindowError::TableTooShort {
                        table_max: values.len().saturating_sub(1),
                        ell_max,
                    });
                }
                Ok(values[ell_min..=ell_max].iter().map(|w| w * w).collect())
            }
        }
    }

    /// Divides `values`, sampled at `ell_min..=ell_max`, by `W_ℓ²`.
    pub fn apply(
        &self,
        values: &[f64],
        ell_min: f64,
        ell_max: f64,
    ) -> Result<Vec<f64>, PixelWindowError> {
        if !self.is_active() {
            return Ok(values.to_vec());
        }
        if !(ell_min >= 0.0 && ell_min <= ell_max) {
            return Err(PixelWindowError::InvalidRange { ell_min, ell_max });
        }

        let (lo, hi) = (ell_min as usize, ell_max as usize);
        let window = self.squared(lo, hi)?;
        if window.len() != values.len() {
            return Err(PixelWindowError::LengthMismatch {
                ell_min: lo,
                ell_max: hi,
                len: window.len(),
                values: values.len(),
            });
        }

        Ok(values.iter().zip(window).map(|(value, w2)| value / w2).collect())
    }
}

/// `W_ℓ = (P_{ℓ-1}(x) - P_{ℓ+1}(x)) / ((2ℓ+1)(1-x))` for a disc with
/// `1 - x = 1 / (6 nside²)`, the solid angle of one of `12 nside²` pixels.
fn top_hat_window(nside: usize, ell_max: usize) -> Vec<f64> {
    let one_minus_x = 1.0 / (6.0 * (nside as f64).powi(2));
    let x = 1.0 - one_minus_x;
    let legendre = legendre_series(x, ell_max + 1);

    let mut window = Vec::with_capacity(ell_max + 1);
    window.push(1.0);
    for ell in 1..=ell_max {
        let numerator = legendre[ell - 1] - legendre[ell + 1];
        window.push(numerator / ((2 * ell + 1) as f64 * one_minus_x));
    }
    window
}

fn legendre_series(x: f64, degree_max: usize) -> Vec<f64> {
    let mut values = Vec::with_capacity(degree_max + 1);
    values.push(1.0);
    if degree_max == 0 {
        return values;
    }
    values.push(x);
    for l in 2..=degree_max {
        let next = (((2 * l - 1) as f64) * x * values[l - 1] - ((l - 1) as f64) * values[l - 2])
            / l as f64;
        values.push(next);
    }
    values
}

fn parse_window_table(source: &str) -> Result<Vec<f64>, String> {
    let mut values = Vec::new();
    for (index, line) in source.lines().enumerate() {
        let data = line.split_once('#').map_or(line, |(data, _)| data).trim();
        if data.is_empty() {
            continue;
        }

        let numbers = data
            .split_whitespace()
            .map(|token| {
                token
                    .parse::<f64>()
                    .map_err(|_| format!("line {}: cannot parse '{}' as a number", index + 1, token))
            })
            .collect::<Result<Vec<_>, _>>()?;

        match numbers.as_slice() {
            [w] => values.push(*w),
            [ell, w] => {
                if *ell != values.len() as f64 {
                    return Err(format!(
                        "line {}: expected ell={}, found {}",
                        index + 1,
                        values.len(),
                        ell
                    ));
                }
                values.push(*w);
            }
            other => {
                return Err(format!(
                    "line {}: expected 1 or 2 columns, found {}",
                    index + 1,
                    other.len()
                ));
            }
        }
    }

    if values.is_empty() {
        return Err("table has no rows".to_string());
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::{PixelWindow, PixelWindowError, legendre_series, parse_window_table};
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn disabled_window_returns_input_unchanged() {
        let values = vec![1.0e-5, 2.0e-6, 3.0e-7];
        let corrected = PixelWindow::disabled()
            .apply(&values, 2.0, 4.0)
            .expect("identity correction should succeed");
        assert_eq!(corrected, values);
        assert_eq!(PixelWindow::disabled().squared(2, 4), Ok(vec![1.0; 3]));
    }

    #[test]
    fn legendre_recurrence_matches_closed_forms() {
        let x: f64 = 0.3;
        let values = legendre_series(x, 3);
        assert!((values[2] - 0.5 * (3.0 * x * x - 1.0)).abs() < 1.0e-15);
        assert!((values[3] - 0.5 * (5.0 * x.powi(3) - 3.0 * x)).abs() < 1.0e-15);
    }

    #[test]
    fn top_hat_window_is_unity_at_large_scales_and_decays() {
        let window = PixelWindow::healpix(64).expect("nside is valid");
        let w2 = window.squared(0, 200).expect("window should evaluate");

        assert_eq!(w2[0], 1.0);
        assert!((w2[2] - 1.0).abs() < 1.0e-3);
        assert!(w2.windows(2).skip(1).all(|pair| pair[1] <= pair[0] + 1.0e-12));
        // 2 J1(x) / x with x = 200 * 0.009 rad.
        assert!(w2[200] > 0.38 && w2[200] < 0.45, "W^2(200) = {}", w2[200]);
    }

    #[test]
    fn active_window_boosts_small_scales() {
        let window = PixelWindow::healpix(32).expect("nside is valid");
        let values = vec![1.0; 41];
        let corrected = window.apply(&values, 60.0, 100.0).expect("correction should succeed");
        assert!(corrected.iter().all(|value| *value > 1.0));
        assert!(corrected[40] > corrected[0]);
    }

    #[test]
    fn invalid_requests_are_rejected() {
        assert_eq!(PixelWindow::healpix(0), Err(PixelWindowError::InvalidNside));

        let window = PixelWindow::healpix(8).expect("nside is valid");
        assert!(matches!(
            window.apply(&[1.0, 1.0], 2.0, 4.0),
            Err(PixelWindowError::LengthMismatch { len: 3, values: 2, .. })
        ));

        let table = PixelWindow::from_values(vec![1.0, 0.99, 0.98]);
        assert_eq!(
            table.squared(0, 5),
            Err(PixelWindowError::TableTooShort {
                table_max: 2,
                ell_max: 5
            })
        );
    }

    #[test]
    fn window_tables_accept_one_or_two_columns() {
        assert_eq!(parse_window_table("1.0\n0.5\n"), Ok(vec![1.0, 0.5]));
        assert_eq!(
            parse_window_table("# l W\n0 1.0\n1 0.9 # comment\n"),
            Ok(vec![1.0, 0.9])
        );
        assert!(parse_window_table("0 1.0\n2 0.9\n").is_err());

        let temp = TempDir::new().expect("tempdir should be created");
        let path = temp.path().join("pixwin.dat");
        fs::write(&path, "0 1.0\n1 0.5\n2 0.25\n").expect("table should be written");
        let window = PixelWindow::from_table(&path).expect("table should load");
        let corrected = window.apply(&[1.0, 1.0], 1.0, 2.0).expect("correction should succeed");
        assert_eq!(corrected, vec![4.0, 16.0]);
    }
}
