//! Errors for scattering-curve containers and the three-column text reader.
//!
//! [`DataError`] covers everything that can go wrong before a curve reaches
//! the kernel builder: empty input, mismatched column lengths, non-finite
//! values, negative uncertainties, unsorted Q, and I/O failures.
//!
//! ## Conventions
//! - **Indices are 0-based** (match Rust/NumPy).
//! - Line numbers reported by the reader are **1-based** (match editors).
#[cfg(feature = "python-bindings")]
use pyo3::{exceptions::PyValueError, prelude::*};

/// Result alias for data-layer operations.
pub type DataResult<T> = Result<T, DataError>;

/// Unified error type for scattering-curve input.
#[derive(Debug, Clone, PartialEq)]
pub enum DataError {
    // ---- Shape ----
    /// The curve has no points.
    EmptySeries,

    /// Two columns that must be paired have different lengths.
    LengthMismatch { column: &'static str, expected: usize, found: usize },

    // ---- Values ----
    /// A value is NaN/±inf.
    NonFiniteValue { column: &'static str, index: usize, value: f64 },

    /// An uncertainty is negative.
    NegativeUncertainty { index: usize, value: f64 },

    /// A scattering vector is negative.
    NegativeQ { index: usize, value: f64 },

    /// Q must be sorted in ascending order for range slicing.
    UnsortedQ { index: usize, previous: f64, value: f64 },

    // ---- Reader ----
    /// No parsable `Q I dI` row was found.
    NoNumericRows,

    /// File could not be read.
    Io { path: String, reason: String },
}

impl std::error::Error for DataError {}

impl std::fmt::Display for DataError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataError::EmptySeries => write!(f, "Scattering curve is empty."),
            DataError::LengthMismatch { column, expected, found } => {
                write!(f, "Column '{column}' has length {found}, expected {expected}.")
            }
            DataError::NonFiniteValue { column, index, value } => {
                write!(f, "Column '{column}' is non-finite at index {index}: {value}")
            }
            DataError::NegativeUncertainty { index, value } => {
                write!(f, "Uncertainty at index {index} is negative: {value}")
            }
            DataError::NegativeQ { index, value } => {
                write!(f, "Q at index {index} is negative: {value}")
            }
            DataError::UnsortedQ { index, previous, value } => {
                write!(
                    f,
                    "Q must be ascending; Q[{index}] = {value} follows Q[{}] = {previous}",
                    index - 1
                )
            }
            DataError::NoNumericRows => {
                write!(f, "No numeric 'Q I dI' rows were found in the input.")
            }
            DataError::Io { path, reason } => write!(f, "Could not read '{path}': {reason}"),
        }
    }
}

#[cfg(feature = "python-bindings")]
impl std::convert::From<DataError> for PyErr {
    fn from(err: DataError) -> PyErr {
        PyValueError::new_err(err.to_string())
    }
}
