pub mod binning;
pub mod pixwin;
pub mod range;
pub mod spline;

pub use binning::{Bin, BinnedSpectrum, BinningError, RemainderPolicy, bin_spectrum};
pub use pixwin::{PixelWindow, PixelWindowError};
pub use range::{EllRange, common_range};
pub use spline::{CubicSpline, SplineError};
