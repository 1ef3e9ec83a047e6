//! Size-bin grid: radii, widths, and edges derived from a diameter range.
//!
//! Purpose
//! -------
//! Turn a user-facing diameter range into the radius grid the kernel is
//! built on. Edges are spaced linearly or logarithmically in diameter and
//! halved to radii; each bin is represented by its center and width.
//!
//! Invariants & assumptions
//! ------------------------
//! - `0 < min < max`, both finite, `n_bins >= 1`; enforced by
//!   [`DiamRange::new`].
//! - Centers are strictly increasing and strictly positive; widths are
//!   strictly positive.
use crate::size_distribution::errors::{SizeDistError, SizeDistResult};
use ndarray::{Array1, s};

/// `DiamRange` — diameter interval and bin count.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiamRange {
    pub min: f64,
    pub max: f64,
    pub n_bins: usize,
}

impl DiamRange {
    /// Errors
    /// ------
    /// - `SizeDistError::InvalidDiamRange` unless `0 < min < max` (finite).
    /// - `SizeDistError::InvalidBinCount` when `n_bins == 0`.
    pub fn new(min: f64, max: f64, n_bins: usize) -> SizeDistResult<Self> {
        let range = DiamRange { min, max, n_bins };
        range.validate()?;
        Ok(range)
    }

    pub(crate) fn validate(&self) -> SizeDistResult<()> {
        let (min, max) = (self.min, self.max);
        if !min.is_finite() || !max.is_finite() || min <= 0.0 || max <= min {
            return Err(SizeDistError::InvalidDiamRange { min, max });
        }
        if self.n_bins == 0 {
            return Err(SizeDistError::InvalidBinCount { value: self.n_bins });
        }
        Ok(())
    }
}

impl Default for DiamRange {
    fn default() -> Self {
        DiamRange { min: 10.0, max: 100_000.0, n_bins: 100 }
    }
}

/// `BinGrid` — radius bins of one run.
///
/// Fields
/// ------
/// - `edges`: `n_bins + 1` radius edges.
/// - `centers`: bin-center radii `edges[i] + widths[i] / 2`.
/// - `widths`: `edges[i + 1] − edges[i]`.
#[derive(Debug, Clone, PartialEq)]
pub struct BinGrid {
    pub edges: Array1<f64>,
    pub centers: Array1<f64>,
    pub widths: Array1<f64>,
}

impl BinGrid {
    /// Build the grid; `log_bins` selects logarithmic spacing in diameter.
    ///
    /// Errors
    /// ------
    /// - Any error from [`DiamRange::validate`].
    pub fn new(range: &DiamRange, log_bins: bool) -> SizeDistResult<Self> {
        range.validate()?;
        let n_edges = range.n_bins + 1;
        let diameters = if log_bins {
            Array1::logspace(10.0, range.min.log10(), range.max.log10(), n_edges)
        } else {
            Array1::linspace(range.min, range.max, n_edges)
        };
        let edges = diameters / 2.0;
        let widths = &edges.slice(s![1..]) - &edges.slice(s![..-1]);
        let centers = &edges.slice(s![..-1]) + &(&widths / 2.0);
        Ok(BinGrid { edges, centers, widths })
    }

    pub fn len(&self) -> usize {
        self.centers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.centers.is_empty()
    }

    /// Bin-center diameters `2 · centers`.
    pub fn diameters(&self) -> Array1<f64> {
        &self.centers * 2.0
    }
}
