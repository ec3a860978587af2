/// Natural cubic spline through tabulated points.
///
/// Second derivatives vanish at both ends; queries outside the table follow
/// the cubic of the nearest end interval.
#[derive(Debug, Clone, PartialEq)]
pub struct CubicSpline {
    x: Vec<f64>,
    y: Vec<f64>,
    y2: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SplineError {
    #[error("spline requires at least 2 points, got {actual}")]
    InsufficientPoints { actual: usize },
    #[error("spline input length mismatch: x={x}, y={y}")]
    LengthMismatch { x: usize, y: usize },
    #[error("spline abscissa must be strictly increasing, index {index} has {current} after {previous}")]
    NonIncreasing {
        index: usize,
        previous: f64,
        current: f64,
    },
    #[error("spline ordinate must be finite at index {index}, got {value}")]
    NonFiniteValue { index: usize, value: f64 },
}

impl CubicSpline {
    pub fn new(x: &[f64], y: &[f64]) -> Result<Self, SplineError> {
        validate(x, y)?;

        let n = x.len();
        let mut y2 = vec![0.0; n];
        let mut u = vec![0.0; n];

        for i in 1..n - 1 {
            let sig = (x[i] - x[i - 1]) / (x[i + 1] - x[i - 1]);
            let p = sig * y2[i - 1] + 2.0;
            y2[i] = (sig - 1.0) / p;
            let slope_delta =
                (y[i + 1] - y[i]) / (x[i + 1] - x[i]) - (y[i] - y[i - 1]) / (x[i] - x[i - 1]);
            u[i] = (6.0 * slope_delta / (x[i + 1] - x[i - 1]) - sig * u[i - 1]) / p;
        }

        y2[n - 1] = 0.0;
        for k in (0..n - 1).rev() {
            y2[k] = y2[k] * y2[k + 1] + u[k];
        }

        Ok(Self {
            x: x.to_vec(),
            y: y.to_vec(),
            y2,
        })
    }

    pub fn evaluate(&self, at: f64) -> f64 {
        let n = self.x.len();
        let hi = self.x.partition_point(|&knot| knot <= at).clamp(1, n - 1);
        let lo = hi - 1;

        let h = self.x[hi] - self.x[lo];
        let a = (self.x[hi] - at) / h;
        let b = (at - self.x[lo]) / h;

        a * self.y[lo]
            + b * self.y[hi]
            + ((a * a * a - a) * self.y2[lo] + (b * b * b - b) * self.y2[hi]) * (h * h) / 6.0
    }

    pub fn evaluate_many(&self, at: &[f64]) -> Vec<f64> {
        at.iter().map(|&point| self.evaluate(point)).collect()
    }
}

fn validate(x: &[f64], y: &[f64]) -> Result<(), SplineError> {
    if x.len() != y.len() {
        return Err(SplineError::LengthMismatch {
            x: x.len(),
            y: y.len(),
        });
    }
    if x.len() < 2 {
        return Err(SplineError::InsufficientPoints { actual: x.len() });
    }
    for (index, pair) in x.windows(2).enumerate() {
        if !(pair[1] > pair[0]) {
            return Err(SplineError::NonIncreasing {
                index: index + 1,
                previous: pair[0],
                current: pair[1],
            });
        }
    }
    if let Some((index, &value)) = y.iter().enumerate().find(|(_, value)| !value.is_finite()) {
        return Err(SplineError::NonFiniteValue { index, value });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{CubicSpline, SplineError};

    #[test]
    fn spline_passes_through_knots() {
        let x = [2.0, 3.0, 5.0, 8.0, 13.0];
        let y = [1.0, -0.5, 4.0, 2.5, 0.0];
        let spline = CubicSpline::new(&x, &y).expect("spline should build");

        for (knot, value) in x.iter().zip(y) {
            assert!((spline.evaluate(*knot) - value).abs() < 1.0e-12, "knot {knot}");
        }
    }

    #[test]
    fn spline_reproduces_straight_lines() {
        let x = (0..10).map(f64::from).collect::<Vec<_>>();
        let y = x.iter().map(|v| 3.0 * v - 2.0).collect::<Vec<_>>();
        let spline = CubicSpline::new(&x, &y).expect("spline should build");

        for at in [0.25, 4.5, 8.75, 11.0, -1.0] {
            assert!((spline.evaluate(at) - (3.0 * at - 2.0)).abs() < 1.0e-12, "x={at}");
        }
    }

    #[test]
    fn spline_tracks_smooth_functions_between_knots() {
        let x = (0..=60).map(|i| f64::from(i) * 0.1).collect::<Vec<_>>();
        let y = x.iter().map(|v| v.sin()).collect::<Vec<_>>();
        let spline = CubicSpline::new(&x, &y).expect("spline should build");

        let values = spline.evaluate_many(&[1.05, 2.55, 4.05]);
        for (at, value) in [1.05_f64, 2.55, 4.05].iter().zip(values) {
            assert!((value - at.sin()).abs() < 1.0e-4, "x={at}");
        }
    }

    #[test]
    fn spline_rejects_bad_tables() {
        assert_eq!(
            CubicSpline::new(&[1.0], &[1.0]),
            Err(SplineError::InsufficientPoints { actual: 1 })
        );
        assert_eq!(
            CubicSpline::new(&[1.0, 2.0], &[1.0]),
            Err(SplineError::LengthMismatch { x: 2, y: 1 })
        );
        assert!(matches!(
            CubicSpline::new(&[1.0, 1.0], &[1.0, 2.0]),
            Err(SplineError::NonIncreasing { index: 1, .. })
        ));
        assert!(matches!(
            CubicSpline::new(&[1.0, 2.0], &[1.0, f64::NAN]),
            Err(SplineError::NonFiniteValue { index: 1, .. })
        ));
    }
}
