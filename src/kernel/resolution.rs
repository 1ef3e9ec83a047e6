//! Instrument resolution applied to ideal model intensities.
//!
//! [`Resolution`] is the seam through which a smearing model enters
//! [`update_iq_fit`](crate::kernel::update_iq_fit). Two operators ship with
//! the crate:
//! - [`Perfect`]: identity, the default.
//! - [`SlitSmear`]: infinite-slit smearing for a Kratky-type camera with a
//!   rectangular slit profile of half-length `slit_length`.
//!
//! The slit integral is evaluated on a grid `Q_sm` that follows the spacing
//! of the data (two samples per data interval), scaled to `[0, 2 ℓ]`. The
//! model curve is extended beyond the last measured Q on the grid
//! `Q_last + 20 Q` by a linear decay of slope `−I_last / (20 Q_last)`, and
//! off-grid values come from clamped linear interpolation.
use crate::kernel::errors::{KernelError, KernelResult};
use ndarray::{Array1, ArrayView1};

/// Linear operator applied in data space after `G · image`.
pub trait Resolution {
    /// Smear an ideal intensity curve sampled on the data Q grid.
    fn apply(&self, intensity: ArrayView1<f64>) -> KernelResult<Array1<f64>>;
}

/// Identity resolution.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Perfect;

impl Resolution for Perfect {
    fn apply(&self, intensity: ArrayView1<f64>) -> KernelResult<Array1<f64>> {
        Ok(intensity.to_owned())
    }
}

/// `SlitSmear` — rectangular infinite-slit smearing on a fixed Q grid.
///
/// Fields
/// ------
/// - `q`: `Array1<f64>`
///   Data Q grid the intensities are sampled on (ascending, ≥ 2 points,
///   `q[last] > q[0]`).
/// - `slit_length`: `f64`
///   Slit half-length in Q units (finite, > 0).
#[derive(Debug, Clone, PartialEq)]
pub struct SlitSmear {
    q: Array1<f64>,
    slit_length: f64,
    q_slit: Array1<f64>,
    q_extended: Array1<f64>,
    n_steps: usize,
}

impl SlitSmear {
    /// Precompute the slit grid for `q`.
    ///
    /// Errors
    /// ------
    /// - `KernelError::InvalidSlitLength` when `slit_length` is not finite
    ///   and positive.
    /// - `KernelError::InvalidSmearingGrid` when `q` has fewer than two
    ///   points or spans zero width.
    pub fn new(q: Array1<f64>, slit_length: f64) -> KernelResult<Self> {
        if !slit_length.is_finite() || slit_length <= 0.0 {
            return Err(KernelError::InvalidSlitLength { value: slit_length });
        }
        let np = q.len();
        if np < 2 {
            return Err(KernelError::InvalidSmearingGrid { len: np, reason: "need >= 2 points" });
        }
        let (q_first, q_last) = (q[0], q[np - 1]);
        if q_last <= q_first {
            return Err(KernelError::InvalidSmearingGrid {
                len: np,
                reason: "Q range must have positive width",
            });
        }

        let index_grid = Array1::from_iter((0..np).map(|i| i as f64));
        let q_slit = Array1::from_iter((0..2 * np).map(|k| {
            let q_at = interp(k as f64 / 2.0, index_grid.view(), q.view());
            2.0 * slit_length * (q_at - q_first) / (q_last - q_first)
        }));
        let q_extended =
            Array1::from_iter(q.iter().copied().chain(q.iter().map(|&v| q_last + 20.0 * v)));

        // Integrate up to the first grid point at or beyond the slit length.
        let cutoff = q_slit.iter().position(|&v| v >= slit_length).unwrap_or(q_slit.len());
        let n_steps = cutoff.min(q_slit.len() - 1);

        Ok(SlitSmear { q, slit_length, q_slit, q_extended, n_steps })
    }

    pub fn slit_length(&self) -> f64 {
        self.slit_length
    }
}

impl Resolution for SlitSmear {
    fn apply(&self, intensity: ArrayView1<f64>) -> KernelResult<Array1<f64>> {
        let np = self.q.len();
        if intensity.len() != np {
            return Err(KernelError::DimensionMismatch {
                operator: "SlitSmear::apply",
                expected: np,
                found: intensity.len(),
            });
        }

        let i_last = intensity[np - 1];
        let tail_start = self.q_extended[np];
        let tail_width = 20.0 * self.q_extended[np - 1];
        let i_extended = Array1::from_iter(intensity.iter().copied().chain(
            self.q_extended.iter().skip(np).map(|&qe| i_last * (1.0 - (qe - tail_start) / tail_width)),
        ));

        let smeared = Array1::from_iter(self.q.iter().map(|&qi| {
            let total: f64 = (0..self.n_steps)
                .map(|k| {
                    let q_eff = (qi * qi + self.q_slit[k] * self.q_slit[k]).sqrt();
                    let dq = self.q_slit[k + 1] - self.q_slit[k];
                    interp(q_eff, self.q_extended.view(), i_extended.view()) * dq
                })
                .sum();
            total / self.slit_length
        }));
        Ok(smeared)
    }
}

/// Piecewise-linear interpolation with constant extrapolation at both ends.
///
/// `xp` must be non-decreasing and non-empty.
pub(crate) fn interp(x: f64, xp: ArrayView1<f64>, fp: ArrayView1<f64>) -> f64 {
    let n = xp.len();
    if x <= xp[0] {
        return fp[0];
    }
    if x >= xp[n - 1] {
        return fp[n - 1];
    }
    // First index with xp[idx] > x; 1 <= idx <= n - 1 here.
    let idx = xp.as_slice().map_or_else(
        || xp.iter().position(|&v| v > x).unwrap_or(n - 1),
        |s| s.partition_point(|&v| v <= x),
    );
    let (x0, x1) = (xp[idx - 1], xp[idx]);
    let (f0, f1) = (fp[idx - 1], fp[idx]);
    if x1 == x0 {
        return f1;
    }
    f0 + (f1 - f0) * (x - x0) / (x1 - x0)
}
