//! Algorithm constants and run options for the MaxEnt solver.
use crate::maxent::errors::{MaxEntError, MaxEntResult};

/// Convergence threshold on the entropy/χ² gradient mismatch `test`.
pub const TEST_LIMIT: f64 = 0.05;

/// Convergence threshold on `|χ²/χ²₀ − 1|`.
pub const CHI_SQR_LIMIT: f64 = 0.01;

/// Dimension of the search subspace (χ² gradient, blended gradient, and a
/// curvature-corrected direction).
pub const SEARCH_DIRECTIONS: usize = 3;

/// Stray non-positive bins are reset to `RESET_STRAYS · first_bins[i]`.
pub const RESET_STRAYS: f64 = 1.0;

/// Steps longer than `DISTANCE_LIMIT_FACTOR · Σf / blank` are shrunk.
pub const DISTANCE_LIMIT_FACTOR: f64 = 0.1;

/// Bisection cap in the move engine.
pub const MAX_MOVE_LOOPS: usize = 5000;

/// Bisection tolerance on the χ² target in the move engine.
pub const MOVE_PASSES: f64 = 1e-3;

/// Default outer iteration cap.
pub const DEFAULT_ITER_MAX: usize = 5000;

/// `MaxEntOptions` — caller-controlled knobs of one solve.
///
/// Fields
/// ------
/// - `iter_max`: `usize`
///   Maximum number of outer Skilling–Bryan iterations (≥ 1).
/// - `report`: `bool`
///   Log every iteration at `info` level (instead of `debug`) and, with the
///   `obs_slog` feature, attach a terminal observer to the executor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaxEntOptions {
    pub iter_max: usize,
    pub report: bool,
}

impl MaxEntOptions {
    /// Errors
    /// ------
    /// - `MaxEntError::InvalidIterMax` when `iter_max == 0`.
    pub fn new(iter_max: usize, report: bool) -> MaxEntResult<Self> {
        if iter_max == 0 {
            return Err(MaxEntError::InvalidIterMax { value: iter_max });
        }
        Ok(MaxEntOptions { iter_max, report })
    }
}

impl Default for MaxEntOptions {
    fn default() -> Self {
        MaxEntOptions { iter_max: DEFAULT_ITER_MAX, report: false }
    }
}
