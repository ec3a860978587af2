use serde::Serialize;

/// What to do with the trailing samples that do not fill a whole bin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RemainderPolicy {
    /// Discard them; the bin count is `len / delta_ell`.
    #[default]
    Drop,
    /// Widen the last full bin to absorb them.
    FoldIntoLast,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bin {
    pub ell_center: f64,
    pub cl_value: f64,
    pub error_estimate: f64,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct BinnedSpectrum {
    pub ell: Vec<f64>,
    pub cl: Vec<f64>,
    pub err: Vec<f64>,
}

impl BinnedSpectrum {
    pub fn len(&self) -> usize {
        self.ell.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ell.is_empty()
    }

    pub fn bins(&self) -> impl Iterator<Item = Bin> + '_ {
        self.ell
            .iter()
            .zip(&self.cl)
            .zip(&self.err)
            .map(|((&ell_center, &cl_value), &error_estimate)| Bin {
                ell_center,
                cl_value,
                error_estimate,
            })
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BinningError {
    #[error("bin width must be at least 1")]
    ZeroWidth,
    #[error("binning input length mismatch: ell={ell}, cl={cl}")]
    LengthMismatch { ell: usize, cl: usize },
}

/// Bins `cl` over consecutive runs of `delta_ell` samples.
///
/// Each bin reports the plain mean of its multipoles, the mode-count weighted
/// mean `Σ(2ℓ+1)Cl / Σ(2ℓ+1)`, and the population standard deviation of the
/// raw `Cl` values as a spread estimate.
pub fn bin_spectrum(
    ell: &[f64],
    cl: &[f64],
    delta_ell: usize,
    policy: RemainderPolicy,
) -> Result<BinnedSpectrum, BinningError> {
    if delta_ell == 0 {
        return Err(BinningError::ZeroWidth);
    }
    if ell.len() != cl.len() {
        return Err(BinningError::LengthMismatch {
            ell: ell.len(),
            cl: cl.len(),
        });
    }

    let bin_count = ell.len() / delta_ell;
    let mut binned = BinnedSpectrum {
        ell: Vec::with_capacity(bin_count),
        cl: Vec::with_capacity(bin_count),
        err: Vec::with_capacity(bin_count),
    };

    for j in 0..bin_count {
        let start = j * delta_ell;
        let end = if policy == RemainderPolicy::FoldIntoLast && j + 1 == bin_count {
            ell.len()
        } else {
            start + delta_ell
        };
        let bin = bin_range(&ell[start..end], &cl[start..end]);
        binned.ell.push(bin.ell_center);
        binned.cl.push(bin.cl_value);
        binned.err.push(bin.error_estimate);
    }

    Ok(binned)
}

fn bin_range(ell: &[f64], cl: &[f64]) -> Bin {
    let count = ell.len() as f64;
    let ell_center = ell.iter().sum::<f64>() / count;

    let (weighted, weights) = ell
        .iter()
        .zip(cl)
        .fold((0.0, 0.0), |(weighted, weights), (&l, &c)| {
            let modes = 2.0 * l + 1.0;
            (weighted + modes * c, weights + modes)
        });

    let mean = cl.iter().sum::<f64>() / count;
    let variance = cl.iter().map(|c| (c - mean).powi(2)).sum::<f64>() / count;

    Bin {
        ell_center,
        cl_value: weighted / weights,
        error_estimate: variance.sqrt(),
    }
}
