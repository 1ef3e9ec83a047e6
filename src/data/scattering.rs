//! Validated 1D scattering curves.
//!
//! Purpose
//! -------
//! Hold a measured small-angle scattering curve `I(Q) ± dI` in a container
//! whose invariants the kernel builder and the size-distribution driver can
//! rely on without re-checking.
//!
//! Key behaviors
//! -------------
//! - [`ScatteringData::new`] enforces equal column lengths, finiteness,
//!   non-negative Q and uncertainties, and ascending Q.
//! - [`ScatteringData::q_range_indices`] turns an inclusive `[qmin, qmax]`
//!   window into a half-open index range used to slice every column.
//!
//! Invariants & assumptions
//! ------------------------
//! - `q`, `intensity`, and `uncertainty` share the same non-zero length.
//! - Q is non-decreasing. Intensities may be negative (background-subtracted
//!   data frequently are); uncertainties may be zero.
//!
//! Testing notes
//! -------------
//! - Unit tests cover the happy path and each rejected input.
use crate::data::errors::{DataError, DataResult};
use ndarray::{Array1, ArrayView1, s};
use std::ops::Range;

/// `ScatteringData` — measured intensity, uncertainty, and scattering vector.
///
/// Fields
/// ------
/// - `q`: `Array1<f64>`
///   Scattering vector magnitudes (usually Å⁻¹), ascending, finite, ≥ 0.
/// - `intensity`: `Array1<f64>`
///   Measured intensity at each Q (finite).
/// - `uncertainty`: `Array1<f64>`
///   One-sigma uncertainty of each intensity (finite, ≥ 0).
#[derive(Debug, Clone, PartialEq)]
pub struct ScatteringData {
    pub q: Array1<f64>,
    pub intensity: Array1<f64>,
    pub uncertainty: Array1<f64>,
}

impl ScatteringData {
    /// Construct a validated curve.
    ///
    /// Errors
    /// ------
    /// - `DataError::EmptySeries` when `q` is empty.
    /// - `DataError::LengthMismatch` when `intensity` or `uncertainty` do not
    ///   match `q.len()`.
    /// - `DataError::NonFiniteValue` on the first NaN/±inf in any column.
    /// - `DataError::NegativeQ` / `DataError::NegativeUncertainty`.
    /// - `DataError::UnsortedQ` when Q decreases.
    pub fn new(
        q: Array1<f64>, intensity: Array1<f64>, uncertainty: Array1<f64>,
    ) -> DataResult<Self> {
        if q.is_empty() {
            return Err(DataError::EmptySeries);
        }
        check_length("intensity", q.len(), intensity.len())?;
        check_length("uncertainty", q.len(), uncertainty.len())?;
        check_finite("q", q.view())?;
        check_finite("intensity", intensity.view())?;
        check_finite("uncertainty", uncertainty.view())?;

        for (index, &value) in q.iter().enumerate() {
            if value < 0.0 {
                return Err(DataError::NegativeQ { index, value });
            }
            if index > 0 && value < q[index - 1] {
                return Err(DataError::UnsortedQ { index, previous: q[index - 1], value });
            }
        }
        for (index, &value) in uncertainty.iter().enumerate() {
            if value < 0.0 {
                return Err(DataError::NegativeUncertainty { index, value });
            }
        }

        Ok(ScatteringData { q, intensity, uncertainty })
    }

    /// Number of points in the curve.
    pub fn len(&self) -> usize {
        self.q.len()
    }

    /// Always `false` for a constructed curve; kept for clippy's `len` pairing.
    pub fn is_empty(&self) -> bool {
        self.q.is_empty()
    }

    /// Half-open index range of the points with `qmin <= Q <= qmax`.
    ///
    /// The range is empty when no point falls inside the window.
    pub fn q_range_indices(&self, qmin: f64, qmax: f64) -> Range<usize> {
        let start = self.q.iter().position(|&q| q >= qmin).unwrap_or(self.len());
        let end = self.q.iter().rposition(|&q| q <= qmax).map_or(0, |i| i + 1);
        if end <= start { start..start } else { start..end }
    }

    /// Copy of the points inside `range`.
    ///
    /// Slicing keeps every invariant, so no re-validation is needed.
    pub fn slice(&self, range: Range<usize>) -> ScatteringData {
        let window = s![range.start..range.end];
        ScatteringData {
            q: self.q.slice(window).to_owned(),
            intensity: self.intensity.slice(window).to_owned(),
            uncertainty: self.uncertainty.slice(window).to_owned(),
        }
    }
}

fn check_length(column: &'static str, expected: usize, found: usize) -> DataResult<()> {
    if expected != found {
        return Err(DataError::LengthMismatch { column, expected, found });
    }
    Ok(())
}

fn check_finite(column: &'static str, values: ArrayView1<f64>) -> DataResult<()> {
    for (index, &value) in values.iter().enumerate() {
        if !value.is_finite() {
            return Err(DataError::NonFiniteValue { column, index, value });
        }
    }
    Ok(())
}
