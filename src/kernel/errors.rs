//! Errors raised while building the kernel matrix or applying transforms.
//!
//! Every variant fires before the MaxEnt loop starts, so a malformed kernel
//! never reaches the solver.
#[cfg(feature = "python-bindings")]
use pyo3::{exceptions::PyValueError, prelude::*};

/// Result alias for kernel-layer operations.
pub type KernelResult<T> = Result<T, KernelError>;

#[derive(Debug, Clone, PartialEq)]
pub enum KernelError {
    // ---- Shape ----
    /// Shape tag is not one of the supported form factors.
    InvalidShape { name: String },

    /// Shape parameter is missing, non-finite, or out of range.
    InvalidShapeParameter { name: &'static str, value: f64, reason: &'static str },

    /// A parameterised shape tag was given without its parameter.
    MissingShapeParameter { name: &'static str },

    // ---- Inputs ----
    /// Q must be finite and non-negative.
    InvalidQ { index: usize, value: f64 },

    /// Radii must be finite and strictly positive.
    InvalidRadius { index: usize, value: f64 },

    /// Contrast must be finite.
    InvalidContrast { index: usize, value: f64 },

    /// Per-bin contrast length differs from the number of bins.
    ContrastLengthMismatch { expected: usize, found: usize },

    /// Kernel has no rows or no columns.
    EmptyKernel { rows: usize, cols: usize },

    /// A kernel entry is NaN/±inf.
    NonFiniteKernel { row: usize, col: usize, value: f64 },

    // ---- Transforms ----
    /// Vector length is incompatible with the kernel for the named operator.
    DimensionMismatch { operator: &'static str, expected: usize, found: usize },

    // ---- Resolution ----
    /// Slit smearing needs at least two distinct Q values.
    InvalidSmearingGrid { len: usize, reason: &'static str },

    /// Slit length must be finite and strictly positive.
    InvalidSlitLength { value: f64 },
}

impl std::error::Error for KernelError {}

impl std::fmt::Display for KernelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Shape ----
            KernelError::InvalidShape { name } => {
                write!(
                    f,
                    "Invalid shape '{name}': expected 'Sphere', 'Spherical shell', 'Spheroid', \
                     or 'Unified sphere'"
                )
            }
            KernelError::InvalidShapeParameter { name, value, reason } => {
                write!(f, "Invalid {name} parameter {value}: {reason}")
            }
            KernelError::MissingShapeParameter { name } => {
                write!(f, "Shape '{name}' needs a parameter, e.g. '{name}:0.8'")
            }

            // ---- Inputs ----
            KernelError::InvalidQ { index, value } => {
                write!(f, "Invalid Q at index {index}: {value}, must be finite and >= 0")
            }
            KernelError::InvalidRadius { index, value } => {
                write!(f, "Invalid bin radius at index {index}: {value}, must be finite and > 0")
            }
            KernelError::InvalidContrast { index, value } => {
                write!(f, "Invalid contrast at index {index}: {value}, must be finite")
            }
            KernelError::ContrastLengthMismatch { expected, found } => {
                write!(f, "Contrast length mismatch: expected {expected} bins, found {found}")
            }
            KernelError::EmptyKernel { rows, cols } => {
                write!(f, "Kernel must be non-empty, got shape ({rows}, {cols})")
            }
            KernelError::NonFiniteKernel { row, col, value } => {
                write!(f, "Kernel entry at ({row}, {col}) is non-finite: {value}")
            }

            // ---- Transforms ----
            KernelError::DimensionMismatch { operator, expected, found } => {
                write!(f, "{operator}: dimension mismatch, expected length {expected}, found {found}")
            }

            // ---- Resolution ----
            KernelError::InvalidSmearingGrid { len, reason } => {
                write!(f, "Invalid slit-smearing grid of length {len}: {reason}")
            }
            KernelError::InvalidSlitLength { value } => {
                write!(f, "Invalid slit length {value}, must be finite and > 0")
            }
        }
    }
}

#[cfg(feature = "python-bindings")]
impl std::convert::From<KernelError> for PyErr {
    fn from(err: KernelError) -> PyErr {
        PyValueError::new_err(err.to_string())
    }
}
