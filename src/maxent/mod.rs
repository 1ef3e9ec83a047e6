//! maxent — Skilling–Bryan maximum-entropy inversion.
//!
//! Purpose
//! -------
//! Recover a strictly positive image `f` (one weight per size bin) from
//! observations `b ≈ resolution(G · f)` by maximising the entropy of `f`
//! relative to a flat default image subject to `χ² = M`.
//!
//! Key behaviors
//! -------------
//! - [`max_ent_sb`] validates inputs, runs [`SkillingBryan`] under an
//!   `argmin` executor, and returns a [`MaxEntOutcome`].
//! - Each outer iteration builds three search directions, a local quadratic
//!   model of χ² and entropy ([`SubspaceModel`]), and picks the step with
//!   [`max_ent_move`].
//! - Exhausting the iteration cap is reported through
//!   [`MaxEntOutcome::converged`] and a `warn!` line, never as an error.
//!
//! Invariants & assumptions
//! ------------------------
//! - `σ > 0` and `first_bins > 0` elementwise; checked once up front.
//! - The returned image is strictly positive (strays are reset).
//! - Numerical breakdown is fatal for the solve:
//!   [`MaxEntError::NonPositiveCurvature`], [`MaxEntError::MoveNotConverged`],
//!   [`MaxEntError::DegenerateDirection`].
//!
//! Conventions
//! -----------
//! - Per-iteration progress is logged through the `log` facade at `debug`
//!   (or `info` when [`MaxEntOptions::report`] is set).
pub mod errors;
pub mod linalg;
pub mod move_search;
pub mod options;
pub mod run;
pub mod solver;
pub mod validation;

pub use self::errors::{MaxEntError, MaxEntResult};
pub use self::linalg::{SubspaceMatrix, SubspaceVec, cho_sol, dist};
pub use self::move_search::{MoveOutcome, SubspaceModel, chi_now, max_ent_move};
pub use self::options::{
    CHI_SQR_LIMIT, DEFAULT_ITER_MAX, DISTANCE_LIMIT_FACTOR, MAX_MOVE_LOOPS, MOVE_PASSES,
    MaxEntOptions, RESET_STRAYS, SEARCH_DIRECTIONS, TEST_LIMIT,
};
pub use self::run::{MaxEntOutcome, max_ent_sb};
pub use self::solver::{MaxEntProblem, MaxEntState, SkillingBryan};
pub use self::validation::{check_observations, validate_inputs};
