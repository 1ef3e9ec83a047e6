//! Errors raised by the Skilling–Bryan MaxEnt solver.
//!
//! [`MaxEntError`] separates the two numerical breakdowns of the algorithm
//! ([`MaxEntError::NonPositiveCurvature`] from the 3×3 Cholesky solve and
//! [`MaxEntError::MoveNotConverged`] from the bisection in the move engine)
//! from input validation and from `argmin` backend failures. Running out of
//! iterations is *not* an error; see
//! [`MaxEntOutcome::converged`](crate::maxent::MaxEntOutcome).
//!
//! Errors raised inside the `argmin` solver travel through
//! `argmin::core::Error` and are recovered unchanged by the
//! `From<argmin::core::Error>` conversion, which tries a `MaxEntError`
//! downcast before falling back to the generic `argmin` variants.
use crate::kernel::errors::KernelError;
use argmin::core::{ArgminError, Error};
#[cfg(feature = "python-bindings")]
use pyo3::{exceptions::PyValueError, prelude::*};

/// Result alias for solver operations.
pub type MaxEntResult<T> = Result<T, MaxEntError>;

#[derive(Debug, Clone, PartialEq)]
pub enum MaxEntError {
    // ---- Numerical breakdown ----
    /// Leading entry of the subspace curvature matrix is not positive.
    NonPositiveCurvature { value: f64 },

    /// Bisection over the blend parameter did not reach its target.
    MoveNotConverged { loops: usize, residual: f64 },

    /// A gradient or direction norm vanished, so the search directions
    /// cannot be normalised.
    DegenerateDirection { quantity: &'static str, value: f64 },

    // ---- Inputs ----
    /// No observations.
    EmptyData,

    /// Vector length does not match the kernel.
    LengthMismatch { what: &'static str, expected: usize, found: usize },

    /// A value is NaN/±inf.
    NonFiniteInput { what: &'static str, index: usize, value: f64 },

    /// Uncertainties must be strictly positive.
    NonPositiveSigma { index: usize, value: f64 },

    /// Initial image entries must be strictly positive.
    NonPositiveFirstBins { index: usize, value: f64 },

    /// Iteration cap must be at least one.
    InvalidIterMax { value: usize },

    // ---- Kernel ----
    /// Forward/adjoint transform failure.
    Kernel(KernelError),

    // ---- Argmin ----
    /// Wrapper for argmin::InvalidParameter
    InvalidParameter { text: String },
    /// Wrapper for argmin::NotImplemented
    NotImplemented { text: String },
    /// Wrapper for argmin::NotInitialized
    NotInitialized { text: String },
    /// Wrapper for argmin::ConditionViolated
    ConditionViolated { text: String },
    /// Wrapper for argmin::CheckPointNotFound
    CheckPointNotFound { text: String },
    /// Wrapper for argmin::PotentialBug
    PotentialBug { text: String },
    /// Wrapper for argmin::ImpossibleError
    ImpossibleError { text: String },
    /// Wrapper for other argmin::Error types
    BackendError { text: String },

    // ---- Fallback ----
    UnknownError,
}

impl std::error::Error for MaxEntError {}

impl std::fmt::Display for MaxEntError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Numerical breakdown ----
            MaxEntError::NonPositiveCurvature { value } => {
                write!(f, "ChoSol: a[0][0] = {value}; value must be positive")
            }
            MaxEntError::MoveNotConverged { loops, residual } => {
                write!(
                    f,
                    "MaxEntMove: no convergence in alpha chop after {loops} loops \
                     (residual {residual})"
                )
            }
            MaxEntError::DegenerateDirection { quantity, value } => {
                write!(f, "Degenerate search direction: {quantity} = {value}")
            }

            // ---- Inputs ----
            MaxEntError::EmptyData => write!(f, "No observations to fit"),
            MaxEntError::LengthMismatch { what, expected, found } => {
                write!(f, "Length mismatch for {what}: expected {expected}, found {found}")
            }
            MaxEntError::NonFiniteInput { what, index, value } => {
                write!(f, "Non-finite {what} at index {index}: {value}")
            }
            MaxEntError::NonPositiveSigma { index, value } => {
                write!(f, "Uncertainty at index {index} must be > 0, got {value}")
            }
            MaxEntError::NonPositiveFirstBins { index, value } => {
                write!(f, "Initial bin value at index {index} must be > 0, got {value}")
            }
            MaxEntError::InvalidIterMax { value } => {
                write!(f, "Invalid maximum iterations {value}: must be >= 1")
            }

            // ---- Kernel ----
            MaxEntError::Kernel(err) => write!(f, "{err}"),

            // ---- Argmin ----
            MaxEntError::InvalidParameter { text } => write!(f, "Invalid parameter: {text}"),
            MaxEntError::NotImplemented { text } => write!(f, "Not implemented: {text}"),
            MaxEntError::NotInitialized { text } => write!(f, "Not initialized: {text}"),
            MaxEntError::ConditionViolated { text } => write!(f, "Condition violated: {text}"),
            MaxEntError::CheckPointNotFound { text } => write!(f, "Checkpoint not found: {text}"),
            MaxEntError::PotentialBug { text } => write!(f, "Potential bug: {text}"),
            MaxEntError::ImpossibleError { text } => write!(f, "Impossible error: {text}"),
            MaxEntError::BackendError { text } => write!(f, "Backend error: {text}"),

            // ---- Fallback ----
            MaxEntError::UnknownError => write!(f, "Unknown error"),
        }
    }
}

impl From<KernelError> for MaxEntError {
    fn from(err: KernelError) -> Self {
        MaxEntError::Kernel(err)
    }
}

impl From<Error> for MaxEntError {
    fn from(original_err: Error) -> Self {
        let original_err = match original_err.downcast::<MaxEntError>() {
            Ok(err) => return err,
            Err(err) => err,
        };
        let original_err = match original_err.downcast::<KernelError>() {
            Ok(err) => return MaxEntError::Kernel(err),
            Err(err) => err,
        };
        match original_err.downcast() {
            Ok(argmin_err) => match argmin_err {
                ArgminError::InvalidParameter { text } => MaxEntError::InvalidParameter { text },
                ArgminError::NotImplemented { text } => MaxEntError::NotImplemented { text },
                ArgminError::NotInitialized { text } => MaxEntError::NotInitialized { text },
                ArgminError::ConditionViolated { text } => MaxEntError::ConditionViolated { text },
                ArgminError::CheckpointNotFound { text } => {
                    MaxEntError::CheckPointNotFound { text }
                }
                ArgminError::PotentialBug { text } => MaxEntError::PotentialBug { text },
                ArgminError::ImpossibleError { text } => MaxEntError::ImpossibleError { text },
                _ => MaxEntError::UnknownError,
            },
            Err(err) => MaxEntError::BackendError { text: err.to_string() },
        }
    }
}

#[cfg(feature = "python-bindings")]
impl std::convert::From<MaxEntError> for PyErr {
    fn from(err: MaxEntError) -> PyErr {
        PyValueError::new_err(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    // Purpose
    // -------
    // Solver errors survive the round trip through `argmin::core::Error`.
    //
    // Given
    // -----
    // - `MoveNotConverged` and a kernel `DimensionMismatch`, both boxed into
    //   `argmin::core::Error`.
    //
    // Expect
    // ------
    // - The same variants after conversion back.
    fn from_argmin_error_recovers_domain_errors() {
        let moved = MaxEntError::MoveNotConverged { loops: 5000, residual: 0.2 };
        let kernel =
            KernelError::DimensionMismatch { operator: "update_gqr", expected: 3, found: 2 };

        let back: MaxEntError = Error::from(moved.clone()).into();
        let back_kernel: MaxEntError = Error::from(kernel.clone()).into();

        assert_eq!(back, moved);
        assert_eq!(back_kernel, MaxEntError::Kernel(kernel));
    }

    #[test]
    // Purpose
    // -------
    // Native argmin errors map onto the wrapper variants.
    //
    // Given
    // -----
    // - `ArgminError::NotInitialized` boxed into `argmin::core::Error`.
    //
    // Expect
    // ------
    // - `MaxEntError::NotInitialized` carrying the same text.
    fn from_argmin_error_maps_backend_variants() {
        let err = Error::from(ArgminError::NotInitialized { text: "no param".to_string() });

        let mapped: MaxEntError = err.into();

        assert_eq!(mapped, MaxEntError::NotInitialized { text: "no param".to_string() });
    }
}
