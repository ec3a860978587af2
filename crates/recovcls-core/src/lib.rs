//! Checks recovered angular power spectra from a lognormal simulation run
//! against the theory spectra that drove it.

pub mod domain;
pub mod modules;
pub mod numerics;
pub mod pipeline;

pub use domain::{CheckError, CheckErrorCategory, CheckResult, ClSeries, Diagnostic};
pub use pipeline::{CheckOptions, CheckRequest, RunSummary, run_check};
