use super::RunContext;
use super::compare::{ComparisonResult, compare_field};
use super::router::InputSpectra;
use super::summary::FieldSummary;
use crate::domain::{CheckError, ClSeries, Diagnostic, PipelineResult};
use plotters::prelude::*;
use std::error::Error;
use std::ops::Range;
use std::path::{Path, PathBuf};

pub const ARTIFACT_PREFIX: &str = "recovError-";
pub const ARTIFACT_EXTENSION: &str = "svg";
/// Residual panel display limits, in percent.
pub const RESIDUAL_LIMIT_PERCENT: f64 = 15.0;

const FIGURE_SIZE: (u32, u32) = (900, 900);
const TOP_PANEL_HEIGHT: i32 = 675;

#[derive(Debug, Clone, PartialEq)]
pub enum FieldOutcome {
    Rendered {
        summary: FieldSummary,
        diagnostics: Vec<Diagnostic>,
    },
    Skipped(Diagnostic),
}

pub fn artifact_file_name(field: &str) -> String {
    format!("{}{}.{}", ARTIFACT_PREFIX, field, ARTIFACT_EXTENSION)
}

/// Compares and draws one recovered field, or skips it when no input matches.
pub fn render_field(
    ctx: &RunContext,
    field: &str,
    recovered: &ClSeries,
    inputs: &InputSpectra,
) -> PipelineResult<FieldOutcome> {
    let Some(input) = inputs.get(field) else {
        let diagnostic = Diagnostic::FieldNotMatched {
            field: field.to_string(),
        };
        tracing::warn!(%diagnostic, "skipping field");
        return Ok(FieldOutcome::Skipped(diagnostic));
    };

    tracing::info!(field, "plotting");
    let (result, range_diagnostic) = compare_field(ctx, field, recovered, input)?;
    let artifact = render_comparison(&result, &ctx.output_dir, ctx.options.bin_width)?;

    Ok(FieldOutcome::Rendered {
        summary: FieldSummary::from_result(&result, artifact),
        diagnostics: range_diagnostic.into_iter().collect(),
    })
}

/// Writes the two-panel figure for `result` and returns its path.
pub fn render_comparison(
    result: &ComparisonResult,
    output_dir: &Path,
    bin_width: usize,
) -> PipelineResult<PathBuf> {
    let path = output_dir.join(artifact_file_name(&result.field));
    draw_comparison(result, &path, bin_width).map_err(|error| {
        CheckError::computation(
            "RUN.RENDER",
            format!("failed to render '{}': {}", path.display(), error),
        )
    })?;
    Ok(path)
}

fn draw_comparison(
    result: &ComparisonResult,
    path: &Path,
    bin_width: usize,
) -> Result<(), Box<dyn Error>> {
    let theory = result
        .theory_curve()
        .into_iter()
        .filter(|(ell, value)| *ell > 0.0 && *value > 0.0)
        .collect::<Vec<_>>();
    let recovered = result
        .recovered_points()
        .into_iter()
        .filter(|(ell, value, _)| *ell > 0.0 && *value > 0.0)
        .collect::<Vec<_>>();

    let x_lo = result.range.min.max(1.0);
    let x_range = x_lo..result.range.max.max(x_lo + 1.0);
    let y_range = log_bounds(
        theory
            .iter()
            .map(|(_, value)| *value)
            .chain(recovered.iter().map(|(_, value, err)| value + err))
            .chain(recovered.iter().map(|(_, value, _)| *value)),
    );
    let y_floor = y_range.start;

    let root = SVGBackend::new(path, FIGURE_SIZE).into_drawing_area();
    root.fill(&WHITE)?;
    let (upper, lower) = root.split_vertically(TOP_PANEL_HEIGHT);

    let mut spectra = ChartBuilder::on(&upper)
        .caption(&result.field, ("sans-serif", 22))
        .margin(10)
        .x_label_area_size(35)
        .y_label_area_size(80)
        .build_cartesian_2d(x_range.clone().log_scale(), y_range.log_scale())?;

    spectra
        .configure_mesh()
        .x_desc("ℓ")
        .y_desc("ℓ(ℓ+1) Cℓ")
        .draw()?;

    spectra
        .draw_series(LineSeries::new(theory, &RED))?
        .label("Input")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], RED));

    spectra
        .draw_series(recovered.iter().map(|&(ell, value, err)| {
            ErrorBar::new_vertical(
                ell,
                (value - err).max(y_floor),
                value,
                value + err,
                BLUE.filled(),
                6,
            )
        }))?
        .label(format!("Recov (Δℓ = {})", bin_width))
        .legend(|(x, y)| Circle::new((x + 10, y), 3, BLUE.filled()));

    spectra
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    let limit = RESIDUAL_LIMIT_PERCENT;
    let mut residuals = ChartBuilder::on(&lower)
        .margin(10)
        .x_label_area_size(35)
        .y_label_area_size(80)
        .build_cartesian_2d(x_range.clone(), -limit..limit)?;

    residuals
        .configure_mesh()
        .x_desc("ℓ")
        .y_desc("Frac. Error %")
        .draw()?;

    residuals.draw_series(LineSeries::new(
        vec![(x_range.start, 0.0), (x_range.end, 0.0)],
        BLACK.stroke_width(2),
    ))?;

    residuals
        .draw_series(result.residual_percent.bins().map(|bin| {
            let clip = |value: f64| value.clamp(-limit, limit);
            ErrorBar::new_vertical(
                bin.ell_center,
                clip(bin.cl_value - bin.error_estimate),
                clip(bin.cl_value),
                clip(bin.cl_value + bin.error_estimate),
                BLUE.filled(),
                6,
            )
        }))?
        .label("frac error")
        .legend(|(x, y)| Circle::new((x + 10, y), 3, BLUE.filled()));

    residuals
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    root.present()?;
    Ok(())
}

/// Positive bounds for a log axis, padded by a quarter decade-ish on each side.
fn log_bounds(values: impl Iterator<Item = f64>) -> Range<f64> {
    let (min, max) = values
        .filter(|value| value.is_finite() && *value > 0.0)
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), value| {
            (min.min(value), max.max(value))
        });

    if !min.is_finite() || !max.is_finite() {
        return 1.0e-10..1.0;
    }
    if min == max {
        return min * 0.5..max * 2.0;
    }
    min * 0.8..max * 1.25
}

#[cfg(test)]
mod tests {
    use super::{FieldOutcome, artifact_file_name, log_bounds, render_field};
    use crate::domain::{ClSeries, Diagnostic};
    use crate::modules::config::ConfigFile;
    use crate::numerics::PixelWindow;
    use crate::pipeline::router::{InputMode, InputSpectra};
    use crate::pipeline::{CheckOptions, RunContext};
    use std::collections::BTreeMap;
    use std::fs;
    use tempfile::TempDir;

    fn series(field: &str, ell_min: usize, ell_max: usize) -> ClSeries {
        let ell = (ell_min..=ell_max).map(|l| l as f64).collect::<Vec<_>>();
        let cl = ell.iter().map(|l| 2.0e-5 / (l * (l + 1.0)).powf(0.9)).collect();
        ClSeries::new(ell, vec![(field.to_string(), cl)]).expect("series should validate")
    }

    fn context(temp: &TempDir) -> RunContext {
        RunContext {
            config: ConfigFile::parse(temp.path().join("run.config"), ""),
            output_dir: temp.path().to_path_buf(),
            pixel_window: PixelWindow::disabled(),
            options: CheckOptions::default(),
        }
    }

    fn inputs(entries: Vec<(&str, ClSeries)>) -> InputSpectra {
        InputSpectra {
            mode: InputMode::Direct {
                prefix: "in/theory_".to_string(),
            },
            series: entries
                .into_iter()
                .map(|(field, series)| (field.to_string(), series))
                .collect::<BTreeMap<_, _>>(),
        }
    }

    #[test]
    fn artifact_names_derive_from_field_key() {
        assert_eq!(artifact_file_name("f1z1f2z1"), "recovError-f1z1f2z1.svg");
    }

    #[test]
    fn log_bounds_pad_positive_values() {
        assert_eq!(log_bounds([0.0, -1.0, f64::NAN].into_iter()), 1.0e-10..1.0);
        assert_eq!(log_bounds([2.0].into_iter()), 1.0..4.0);
        let range = log_bounds([1.0, 10.0, -3.0].into_iter());
        assert_eq!(range, 0.8..12.5);
    }

    #[test]
    fn matched_field_writes_svg_artifact() {
        let temp = TempDir::new().expect("tempdir should be created");
        let ctx = context(&temp);
        let recovered = series("f1f1", 2, 100);

        let outcome = render_field(&ctx, "f1f1", &recovered, &inputs(vec![("f1f1", series("f1f1", 2, 300))]))
            .expect("rendering should succeed");

        let FieldOutcome::Rendered { summary, diagnostics } = outcome else {
            panic!("field should be rendered");
        };
        assert_eq!(summary.artifact, temp.path().join("recovError-f1f1.svg"));
        assert_eq!(diagnostics.len(), 1, "input range is wider than recovered");
        let svg = fs::read_to_string(&summary.artifact).expect("artifact should be readable");
        assert!(svg.contains("<svg"));
        assert!(svg.contains("f1f1"));
    }

    #[test]
    fn rerendering_overwrites_previous_artifact() {
        let temp = TempDir::new().expect("tempdir should be created");
        let ctx = context(&temp);
        let artifact = temp.path().join("recovError-f1f1.svg");
        fs::write(&artifact, "stale").expect("stale artifact should be written");

        let recovered = series("f1f1", 2, 60);
        render_field(&ctx, "f1f1", &recovered, &inputs(vec![("f1f1", series("f1f1", 2, 60))]))
            .expect("rendering should succeed");

        let svg = fs::read_to_string(&artifact).expect("artifact should be readable");
        assert_ne!(svg, "stale");
    }

    #[test]
    fn unmatched_field_is_skipped() {
        let temp = TempDir::new().expect("tempdir should be created");
        let ctx = context(&temp);
        let recovered = series("f2f2", 2, 60);

        let outcome = render_field(&ctx, "f2f2", &recovered, &inputs(Vec::new()))
            .expect("skipping is not an error");
        assert_eq!(
            outcome,
            FieldOutcome::Skipped(Diagnostic::FieldNotMatched {
                field: "f2f2".to_string()
            })
        );
        assert!(!temp.path().join("recovError-f2f2.svg").exists());
    }
}
