use crate::domain::ClSeries;

/// Inclusive multipole range shared by two series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EllRange {
    pub min: f64,
    pub max: f64,
    /// Set when the two series did not span the same range and were narrowed.
    pub mismatch: bool,
}

impl EllRange {
    pub fn is_empty(&self) -> bool {
        !(self.min <= self.max)
    }

    /// Unit-spaced multipoles `min, min + 1, ...` up to and including `max`.
    pub fn multipoles(&self) -> Vec<f64> {
        if self.is_empty() {
            return Vec::new();
        }
        let count = (self.max - self.min).floor() as usize + 1;
        (0..count).map(|offset| self.min + offset as f64).collect()
    }
}

pub fn common_range(a: &ClSeries, b: &ClSeries) -> EllRange {
    if a.ell_min() == b.ell_min() && a.ell_max() == b.ell_max() {
        return EllRange {
            min: a.ell_min(),
            max: a.ell_max(),
            mismatch: false,
        };
    }

    EllRange {
        min: a.ell_min().max(b.ell_min()),
        max: a.ell_max().min(b.ell_max()),
        mismatch: true,
    }
}

#[cfg(test)]
mod tests {
    use super::{EllRange, common_range};
    use crate::domain::ClSeries;

    fn series(ell_min: usize, ell_max: usize) -> ClSeries {
        let ell = (ell_min..=ell_max).map(|l| l as f64).collect::<Vec<_>>();
        let cl = ell.iter().map(|l| 1.0 / (l + 1.0)).collect();
        ClSeries::new(ell, vec![("f1f1".to_string(), cl)]).expect("series should validate")
    }

    #[test]
    fn identical_series_keep_their_own_range() {
        let s = series(2, 100);
        assert_eq!(
            common_range(&s, &s),
            EllRange {
                min: 2.0,
                max: 100.0,
                mismatch: false
            }
        );
    }

    #[test]
    fn partial_overlap_is_narrowed_to_intersection() {
        let range = common_range(&series(2, 100), &series(10, 200));
        assert_eq!((range.min, range.max), (10.0, 100.0));
        assert!(range.mismatch);
        assert_eq!(range.multipoles().len(), 91);
        assert_eq!(range.multipoles().first(), Some(&10.0));
        assert_eq!(range.multipoles().last(), Some(&100.0));
    }

    #[test]
    fn disjoint_series_produce_empty_range() {
        let range = common_range(&series(2, 10), &series(20, 30));
        assert!(range.is_empty());
        assert!(range.multipoles().is_empty());
    }
}
