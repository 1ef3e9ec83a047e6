//! Errors raised while configuring and running a size-distribution fit.
//!
//! [`SizeDistError`] covers configuration checks performed by the driver
//! and its helpers (bin grid, weights, background fit, replicates) and wraps
//! the lower layers unchanged: [`DataError`], [`KernelError`], and
//! [`MaxEntError`].
use crate::{data::errors::DataError, kernel::errors::KernelError, maxent::errors::MaxEntError};
#[cfg(feature = "python-bindings")]
use pyo3::{exceptions::PyValueError, prelude::*};

/// Result alias for driver operations.
pub type SizeDistResult<T> = Result<T, SizeDistError>;

#[derive(Debug, Clone, PartialEq)]
pub enum SizeDistError {
    // ---- Bin grid ----
    /// Diameters must be finite with `0 < min < max`.
    InvalidDiamRange { min: f64, max: f64 },

    /// At least one bin is required.
    InvalidBinCount { value: usize },

    // ---- Scalars ----
    /// A scalar setting is non-finite or out of range.
    InvalidSetting { name: &'static str, value: f64, reason: &'static str },

    // ---- Per-point vectors ----
    /// Per-point vector does not match the data length.
    LengthMismatch { what: &'static str, expected: usize, found: usize },

    /// Per-point value is non-finite or out of range.
    InvalidPointValue { what: &'static str, index: usize, value: f64 },

    // ---- Q range ----
    /// Fit limits must satisfy `qmin < qmax`.
    InvalidQLimits { qmin: f64, qmax: f64 },

    /// No data point falls inside the fit limits.
    EmptyQRange { qmin: f64, qmax: f64 },

    /// Too few points for the requested fit.
    TooFewPoints { needed: usize, found: usize },

    // ---- Background fit ----
    /// Weighted normal equations are singular.
    SingularBackgroundFit,

    // ---- Statistics ----
    /// Integrated density is zero or non-finite.
    EmptyDistribution { volume: f64 },

    // ---- Replicates ----
    /// At least one replicate must be requested.
    NoReplicates,

    /// Every replicate solve failed; carries the last failure.
    AllReplicatesFailed { runs: usize, last: Box<SizeDistError> },

    // ---- Wrapped layers ----
    Data(DataError),
    Kernel(KernelError),
    MaxEnt(MaxEntError),
}

impl std::error::Error for SizeDistError {}

impl std::fmt::Display for SizeDistError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Bin grid ----
            SizeDistError::InvalidDiamRange { min, max } => {
                write!(f, "Invalid diameter range [{min}, {max}]: need 0 < min < max")
            }
            SizeDistError::InvalidBinCount { value } => {
                write!(f, "Invalid number of bins {value}: must be >= 1")
            }

            // ---- Scalars ----
            SizeDistError::InvalidSetting { name, value, reason } => {
                write!(f, "Invalid {name} = {value}: {reason}")
            }

            // ---- Per-point vectors ----
            SizeDistError::LengthMismatch { what, expected, found } => {
                write!(f, "Length mismatch for {what}: expected {expected}, found {found}")
            }
            SizeDistError::InvalidPointValue { what, index, value } => {
                write!(f, "Invalid {what} at index {index}: {value}")
            }

            // ---- Q range ----
            SizeDistError::InvalidQLimits { qmin, qmax } => {
                write!(f, "Fit range Qmin ({qmin}) must be smaller than Qmax ({qmax})")
            }
            SizeDistError::EmptyQRange { qmin, qmax } => {
                write!(f, "No data points in Q range [{qmin}, {qmax}]")
            }
            SizeDistError::TooFewPoints { needed, found } => {
                write!(f, "Need more data points than fitting parameters: {found} < {needed}")
            }

            // ---- Background fit ----
            SizeDistError::SingularBackgroundFit => {
                write!(f, "Power-law background fit is singular")
            }

            // ---- Statistics ----
            SizeDistError::EmptyDistribution { volume } => {
                write!(f, "Distribution has no usable total volume: {volume}")
            }

            // ---- Replicates ----
            SizeDistError::NoReplicates => write!(f, "At least one replicate is required"),
            SizeDistError::AllReplicatesFailed { runs, last } => {
                write!(
                    f,
                    "Maximum Entropy fitting failed in all {runs} replicates. \
                     Try different input values. Last error: {last}"
                )
            }

            // ---- Wrapped layers ----
            SizeDistError::Data(err) => write!(f, "{err}"),
            SizeDistError::Kernel(err) => write!(f, "{err}"),
            SizeDistError::MaxEnt(err) => write!(f, "{err}"),
        }
    }
}

impl From<DataError> for SizeDistError {
    fn from(err: DataError) -> Self {
        SizeDistError::Data(err)
    }
}

impl From<KernelError> for SizeDistError {
    fn from(err: KernelError) -> Self {
        SizeDistError::Kernel(err)
    }
}

impl From<MaxEntError> for SizeDistError {
    fn from(err: MaxEntError) -> Self {
        SizeDistError::MaxEnt(err)
    }
}

#[cfg(feature = "python-bindings")]
impl std::convert::From<SizeDistError> for PyErr {
    fn from(err: SizeDistError) -> PyErr {
        PyValueError::new_err(err.to_string())
    }
}
