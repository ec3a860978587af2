use super::RunContext;
use crate::domain::{CheckError, ClSeries, Diagnostic, PipelineResult};
use crate::numerics::{BinnedSpectrum, CubicSpline, EllRange, bin_spectrum, common_range};
use std::fmt::Display;

/// Everything drawn for one field.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonResult {
    pub field: String,
    pub range: EllRange,
    /// Unit-spaced multipoles covering `range`.
    pub ell: Vec<f64>,
    /// Input theory `Cl` interpolated onto `ell`.
    pub input_theory: Vec<f64>,
    /// Recovered `Cl`, pixel window removed, binned with the main width.
    pub recovered: BinnedSpectrum,
    /// `(input / recovered - 1) * 100`, binned with the residual width.
    pub residual_percent: BinnedSpectrum,
}

impl ComparisonResult {
    /// `ℓ(ℓ+1)Cl` of the input theory on the unit grid.
    pub fn theory_curve(&self) -> Vec<(f64, f64)> {
        self.ell
            .iter()
            .zip(&self.input_theory)
            .map(|(&ell, &cl)| (ell, ell * (ell + 1.0) * cl))
            .collect()
    }

    /// Binned recovered `ℓ(ℓ+1)Cl` as `(ell, value, error)`.
    pub fn recovered_points(&self) -> Vec<(f64, f64, f64)> {
        self.recovered
            .bins()
            .map(|bin| {
                let factor = bin.ell_center * (bin.ell_center + 1.0);
                (bin.ell_center, factor * bin.cl_value, factor * bin.error_estimate)
            })
            .collect()
    }

    pub fn mean_residual_percent(&self) -> Option<f64> {
        let values = &self.residual_percent.cl;
        (!values.is_empty()).then(|| values.iter().sum::<f64>() / values.len() as f64)
    }

    pub fn max_abs_residual_percent(&self) -> Option<f64> {
        self.residual_percent
            .cl
            .iter()
            .map(|value| value.abs())
            .reduce(f64::max)
    }
}

/// Builds the comparison of one matched field.
///
/// Returns the range diagnostic when the two series had to be narrowed to
/// their overlap.
pub fn compare_field(
    ctx: &RunContext,
    field: &str,
    recovered: &ClSeries,
    input: &ClSeries,
) -> PipelineResult<(ComparisonResult, Option<Diagnostic>)> {
    let range = common_range(recovered, input);
    if range.is_empty() {
        return Err(CheckError::input_validation(
            "INPUT.ELL_RANGE",
            format!(
                "field '{}': recovered ell {}..{} and input ell {}..{} do not overlap",
                field,
                recovered.ell_min(),
                recovered.ell_max(),
                input.ell_min(),
                input.ell_max()
            ),
        ));
    }

    let diagnostic = range.mismatch.then(|| Diagnostic::EllRangeMismatch {
        field: field.to_string(),
        recovered: [recovered.ell_min(), recovered.ell_max()],
        input: [input.ell_min(), input.ell_max()],
        used: [range.min, range.max],
    });
    if let Some(diagnostic) = &diagnostic {
        tracing::warn!(%diagnostic, "narrowing multipole range");
    }

    let ell = range.multipoles();
    let recovered_cl = spline_for(field, recovered)?.evaluate_many(&ell);
    let input_theory = spline_for(field, input)?.evaluate_many(&ell);

    let corrected = ctx
        .pixel_window
        .apply(&recovered_cl, range.min, range.max)
        .map_err(|error| computation_error("RUN.PIXEL_WINDOW", field, error))?;

    let options = &ctx.options;
    let recovered = bin_spectrum(&ell, &corrected, options.bin_width, options.remainder_policy)
        .map_err(|error| computation_error("RUN.BINNING", field, error))?;

    let residual = input_theory
        .iter()
        .zip(&corrected)
        .map(|(theory, recov)| (theory / recov - 1.0) * 100.0)
        .collect::<Vec<_>>();
    let residual_percent = bin_spectrum(
        &ell,
        &residual,
        options.residual_bin_width,
        options.remainder_policy,
    )
    .map_err(|error| computation_error("RUN.BINNING", field, error))?;

    Ok((
        ComparisonResult {
            field: field.to_string(),
            range,
            ell,
            input_theory,
            recovered,
            residual_percent,
        },
        diagnostic,
    ))
}

fn spline_for(field: &str, series: &ClSeries) -> PipelineResult<CubicSpline> {
    let values = series.field(field).ok_or_else(|| {
        CheckError::internal(
            "SYS.FIELD_COLUMN",
            format!("series has no column for field '{}'", field),
        )
    })?;
    CubicSpline::new(series.ell(), values)
        .map_err(|error| computation_error("RUN.SPLINE", field, error))
}

fn computation_error(code: &'static str, field: &str, error: impl Display) -> CheckError {
    CheckError::computation(code, format!("field '{}': {}", field, error))
}
