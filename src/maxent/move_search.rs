//! Move engine: pick the step inside the three-direction subspace.
//!
//! Purpose
//! -------
//! Given the local quadratic models of χ² and entropy in the search
//! subspace, find the blend `a ∈ [0, 1]` between a pure χ² step (`a = 0`)
//! and a pure entropy step (`a = 1`) whose predicted χ² hits the current
//! target, then cap the step length.
//!
//! Key behaviors
//! -------------
//! - [`chi_now`] solves `(bx c₂ − a s₂) β = −(bx c₁ − a s₁)`, `bx = 1 − a`,
//!   and predicts `w = 1 + Σₖ βₖ (c₁ₖ + ½ Σⱼ c₂ₖⱼ βⱼ)`, the new χ² as a
//!   fraction of the current one.
//! - [`max_ent_move`] sets the target ratio `ctarg`, bisects on `a` until
//!   `|w(a) − ctarg| < MOVE_PASSES`, and rescales `β` when the entropy
//!   metric of the step exceeds `DISTANCE_LIMIT_FACTOR · Σf / blank`.
//!
//! Invariants & assumptions
//! ------------------------
//! - The quadratic model is rebuilt every outer iteration and never cached.
//! - Bisection failure is fatal for the whole solve; the caller must not
//!   retry.
use crate::maxent::{
    errors::{MaxEntError, MaxEntResult},
    linalg::{SubspaceMatrix, SubspaceVec, cho_sol, dist},
    options::{DISTANCE_LIMIT_FACTOR, MAX_MOVE_LOOPS, MOVE_PASSES, SEARCH_DIRECTIONS},
};

/// `SubspaceModel` — gradients and curvatures of χ² and entropy in the
/// search subspace.
///
/// Fields
/// ------
/// - `c1`, `c2`: χ² gradient (scaled by `1/χ²`) and curvature.
/// - `s1`, `s2`: entropy gradient and (negative definite) curvature.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SubspaceModel {
    pub c1: SubspaceVec,
    pub c2: SubspaceMatrix,
    pub s1: SubspaceVec,
    pub s2: SubspaceMatrix,
}

/// `MoveOutcome` — result of one call to [`max_ent_move`].
///
/// Fields
/// ------
/// - `w`: step metric `−βᵀ s₂ β` before any rescaling.
/// - `chtarg`: absolute χ² target, `ctarg · χ²`.
/// - `loops`: bisection counter at exit (starts at 1).
/// - `a`: final blend parameter.
/// - `residual`: `w(a) − ctarg` at exit.
/// - `beta`: step coefficients along the search directions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoveOutcome {
    pub w: f64,
    pub chtarg: f64,
    pub loops: usize,
    pub a: f64,
    pub residual: f64,
    pub beta: SubspaceVec,
}

/// Predicted χ² ratio and step for blend `a`.
///
/// Errors
/// ------
/// - `MaxEntError::NonPositiveCurvature` from [`cho_sol`].
pub fn chi_now(a: f64, model: &SubspaceModel) -> MaxEntResult<(f64, SubspaceVec)> {
    let bx = 1.0 - a;
    let mut lhs = [[0.0; SEARCH_DIRECTIONS]; SEARCH_DIRECTIONS];
    let mut rhs = [0.0; SEARCH_DIRECTIONS];
    for k in 0..SEARCH_DIRECTIONS {
        for j in 0..SEARCH_DIRECTIONS {
            lhs[k][j] = bx * model.c2[k][j] - a * model.s2[k][j];
        }
        rhs[k] = -(bx * model.c1[k] - a * model.s1[k]);
    }

    let beta = cho_sol(&lhs, &rhs)?;
    let mut w = 1.0;
    for k in 0..SEARCH_DIRECTIONS {
        let curvature: f64 = (0..SEARCH_DIRECTIONS).map(|j| model.c2[k][j] * beta[j]).sum();
        w += beta[k] * (model.c1[k] + 0.5 * curvature);
    }
    Ok((w, beta))
}

/// Bisect on the blend parameter and return a length-limited step.
///
/// Parameters
/// ----------
/// - `f_sum`: `f64`
///   Total image weight `Σf` from the previous iteration.
/// - `blank`: `f64`
///   Mean of the initial image (entropy reference level).
/// - `chisq`: `f64`
///   Current χ².
/// - `chizer`: `f64`
///   Final χ² target (the number of observations).
/// - `model`: `&SubspaceModel`
///   Local quadratic models.
///
/// Returns
/// -------
/// - [`MoveOutcome`] with the (possibly rescaled) step.
///
/// Errors
/// ------
/// - `MaxEntError::NonPositiveCurvature` from any [`chi_now`] evaluation.
/// - `MaxEntError::MoveNotConverged` when `MAX_MOVE_LOOPS` bisections do
///   not bring the residual below `MOVE_PASSES`.
///
/// Notes
/// -----
/// - When χ² is still above its final target the intermediate target is
///   halfway between the unconstrained minimum and the current value;
///   otherwise the ratio `chizer / chisq` is aimed for directly.
pub fn max_ent_move(
    f_sum: f64, blank: f64, chisq: f64, chizer: f64, model: &SubspaceModel,
) -> MaxEntResult<MoveOutcome> {
    let (mut a_lower, mut a_upper) = (0.0, 1.0);
    let (cmin, _) = chi_now(a_lower, model)?;
    let ctarg = if cmin * chisq > chizer { 0.5 * (1.0 + cmin) } else { chizer / chisq };
    let mut f_lower = cmin - ctarg;
    let (c_upper, _) = chi_now(a_upper, model)?;
    let mut f_upper = c_upper - ctarg;

    let mut fx = 2.0 * MOVE_PASSES;
    let mut loops = 1;
    let mut a_new = a_lower;
    let mut beta = [0.0; SEARCH_DIRECTIONS];
    while fx.abs() >= MOVE_PASSES && loops <= MAX_MOVE_LOOPS {
        a_new = 0.5 * (a_lower + a_upper);
        let (c_new, beta_new) = chi_now(a_new, model)?;
        beta = beta_new;
        fx = c_new - ctarg;
        if f_lower * fx > 0.0 {
            a_lower = a_new;
            f_lower = fx;
        }
        if f_upper * fx > 0.0 {
            a_upper = a_new;
            f_upper = fx;
        }
        loops += 1;
    }

    if fx.abs() >= MOVE_PASSES || fx.is_nan() {
        return Err(MaxEntError::MoveNotConverged { loops: loops - 1, residual: fx });
    }

    let w = dist(&model.s2, &beta);
    if w > DISTANCE_LIMIT_FACTOR * f_sum / blank {
        let shrink = (f_sum / (blank * w)).sqrt();
        for b in beta.iter_mut() {
            *b *= shrink;
        }
    }

    Ok(MoveOutcome { w, chtarg: ctarg * chisq, loops, a: a_new, residual: fx, beta })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // `chi_now` on hand-checkable diagonal models and the three exits of
    // `max_ent_move`: converged, distance-limited, and failed bisection.
    // -------------------------------------------------------------------------

    fn diagonal_model(c1: SubspaceVec, c2: f64, s1: SubspaceVec, s2: f64) -> SubspaceModel {
        let diag = |v: f64| [[v, 0.0, 0.0], [0.0, v, 0.0], [0.0, 0.0, v]];
        SubspaceModel { c1, c2: diag(c2), s1, s2: diag(s2) }
    }

    #[test]
    // Purpose
    // -------
    // At `a = 0` the step minimises the χ² quadratic exactly.
    //
    // Given
    // -----
    // - `c1 = (−1, 0, 0)`, `c2 = 2 I`.
    //
    // Expect
    // ------
    // - `β = (0.5, 0, 0)` and `w = 1 − 0.25 = 0.75`.
    fn chi_now_pure_chi_step() {
        let model = diagonal_model([-1.0, 0.0, 0.0], 2.0, [0.0; 3], -1.0);

        let (w, beta) = chi_now(0.0, &model).unwrap();

        assert_abs_diff_eq!(beta[0], 0.5, epsilon = 1e-14);
        assert_abs_diff_eq!(beta[1], 0.0);
        assert_abs_diff_eq!(w, 0.75, epsilon = 1e-14);
    }

    #[test]
    // Purpose
    // -------
    // Bisection lands on the requested χ² ratio.
    //
    // Given
    // -----
    // - The model above plus an entropy gradient `s1 = (−0.5, 0, 0)`,
    //   `s2 = −I`, so `w(a)` rises from 0.75 at `a = 0` to 1.75 at `a = 1`;
    //   χ² = 100, χ²₀ = 90 so that `cmin · χ² < χ²₀` and the target ratio
    //   is 0.9.
    //
    // Expect
    // ------
    // - `|residual| < MOVE_PASSES`, `chtarg = 90`, and `a ∈ (0, 1)`.
    fn max_ent_move_hits_target() {
        let model = diagonal_model([-1.0, 0.0, 0.0], 2.0, [-0.5, 0.0, 0.0], -1.0);

        let out = max_ent_move(100.0, 1.0, 100.0, 90.0, &model).unwrap();

        assert!(out.residual.abs() < MOVE_PASSES);
        assert_relative_eq!(out.chtarg, 90.0, max_relative = 1e-12);
        assert!(out.a > 0.0 && out.a < 1.0);
        assert!(out.loops >= 2);
    }

    #[test]
    // Purpose
    // -------
    // Long steps are shrunk by `sqrt(Σf / (blank · w))`.
    //
    // Given
    // -----
    // - Same model as above but `Σf = 0.01`, so the distance limit
    //   `0.1 · Σf / blank = 1e-3` is far below the step metric.
    //
    // Expect
    // ------
    // - Returned β equals the unscaled β times the shrink factor.
    fn max_ent_move_limits_distance() {
        let model = diagonal_model([-1.0, 0.0, 0.0], 2.0, [-0.5, 0.0, 0.0], -1.0);
        let free = max_ent_move(1e6, 1.0, 100.0, 90.0, &model).unwrap();

        let limited = max_ent_move(0.01, 1.0, 100.0, 90.0, &model).unwrap();

        let shrink = (0.01 / limited.w).sqrt();
        assert_relative_eq!(limited.w, free.w, max_relative = 1e-12);
        assert_relative_eq!(limited.beta[0], free.beta[0] * shrink, max_relative = 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // An unreachable target makes the bisection fail with a move error.
    //
    // Given
    // -----
    // - `c1 = 0`, `s1 = 0`: every blend predicts `w = 1` while the target
    //   ratio is `χ²₀ / χ² = 1.5`.
    //
    // Expect
    // ------
    // - `MaxEntError::MoveNotConverged { loops: MAX_MOVE_LOOPS, .. }`.
    fn max_ent_move_reports_failed_bisection() {
        let model = diagonal_model([0.0; 3], 2.0, [0.0; 3], -1.0);

        let err = max_ent_move(1.0, 1.0, 100.0, 150.0, &model).unwrap_err();

        assert!(matches!(err, MaxEntError::MoveNotConverged { loops: MAX_MOVE_LOOPS, .. }));
    }

    #[test]
    // Purpose
    // -------
    // A direction with no curvature in either χ² or entropy is reported as
    // a curvature failure rather than a failed bisection.
    //
    // Given
    // -----
    // - `c2 = diag(2, 2, 0)`, `s2 = diag(−1, −1, 0)`: the third direction is
    //   flat for every blend.
    //
    // Expect
    // ------
    // - `MaxEntError::NonPositiveCurvature { value: 0.0 }`.
    fn max_ent_move_reports_flat_direction() {
        let mut model = diagonal_model([-1.0, 0.0, 0.0], 2.0, [-0.5, 0.0, 0.0], -1.0);
        model.c2[2][2] = 0.0;
        model.s2[2][2] = 0.0;

        let err = max_ent_move(100.0, 1.0, 100.0, 90.0, &model).unwrap_err();

        assert_eq!(err, MaxEntError::NonPositiveCurvature { value: 0.0 });
    }
}
