//! Fixed-size linear algebra for the three-direction search subspace.
//!
//! Purpose
//! -------
//! Solve the local quadratic model of the Skilling–Bryan step, which lives
//! in a subspace of exactly [`SEARCH_DIRECTIONS`] dimensions, without
//! pulling in a general dense solver.
//!
//! Key behaviors
//! -------------
//! - [`cho_sol`] solves `a · β = b` through an explicit lower Cholesky
//!   factor, forward substitution, then back substitution.
//! - [`dist`] evaluates the step-length metric `−βᵀ s₂ β`.
//! - [`symmetric_from_lower`] builds a symmetric matrix from a generator
//!   evaluated on the lower triangle only.
//!
//! Invariants & assumptions
//! ------------------------
//! - `a` is symmetric positive semi-definite by construction in the caller.
//!   Any pivot `<= 0` (or NaN) is rejected, so a singular block surfaces as
//!   an error instead of non-finite components.
//!
//! Testing notes
//! -------------
//! - Unit tests check `a · β ≈ b` for SPD systems, the failure path, the
//!   distance metric, and symmetry of the generated matrices.
use crate::maxent::{
    errors::{MaxEntError, MaxEntResult},
    options::SEARCH_DIRECTIONS,
};

/// Vector in the search subspace.
pub type SubspaceVec = [f64; SEARCH_DIRECTIONS];

/// Matrix in the search subspace.
pub type SubspaceMatrix = [[f64; SEARCH_DIRECTIONS]; SEARCH_DIRECTIONS];

/// Step-length metric `−βᵀ s₂ β`.
pub fn dist(s2: &SubspaceMatrix, beta: &SubspaceVec) -> f64 {
    let mut w = 0.0;
    for k in 0..SEARCH_DIRECTIONS {
        let z: f64 = -(0..SEARCH_DIRECTIONS).map(|j| s2[k][j] * beta[j]).sum::<f64>();
        w += beta[k] * z;
    }
    w
}

/// Solve `a · β = b` by explicit Cholesky factorisation.
///
/// Parameters
/// ----------
/// - `a`: `&SubspaceMatrix`
///   Symmetric positive (semi-)definite system matrix.
/// - `b`: `&SubspaceVec`
///   Right-hand side.
///
/// Returns
/// -------
/// - `β` with `a · β ≈ b`.
///
/// Errors
/// ------
/// - `MaxEntError::NonPositiveCurvature` when a pivot is `<= 0` or NaN,
///   carrying the pivot before its square root.
///
/// Notes
/// -----
/// - The factor `L` is filled row by row; off-diagonal entries divide by the
///   column pivot, diagonal entries take `sqrt(z)`. Forward
///   substitution yields `y = L⁻¹ b`, back substitution `β = L⁻ᵀ y`.
pub fn cho_sol(a: &SubspaceMatrix, b: &SubspaceVec) -> MaxEntResult<SubspaceVec> {
    const N: usize = SEARCH_DIRECTIONS;
    if a[0][0] <= 0.0 || a[0][0].is_nan() {
        return Err(MaxEntError::NonPositiveCurvature { value: a[0][0] });
    }

    let mut fl = [[0.0; N]; N];
    fl[0][0] = a[0][0].sqrt();
    for i in 1..N {
        fl[i][0] = a[i][0] / fl[0][0];
        for j in 1..=i {
            let mut z = 0.0;
            for k in 0..j {
                z += fl[i][k] * fl[j][k];
            }
            z = a[i][j] - z;
            if j == i {
                if z <= 0.0 || z.is_nan() {
                    return Err(MaxEntError::NonPositiveCurvature { value: z });
                }
                fl[i][j] = z.sqrt();
            } else {
                fl[i][j] = z / fl[j][j];
            }
        }
    }

    let mut bl = [0.0; N];
    bl[0] = b[0] / fl[0][0];
    for i in 1..N {
        let mut z = 0.0;
        for k in 0..i {
            z += fl[i][k] * bl[k];
        }
        bl[i] = (b[i] - z) / fl[i][i];
    }

    let mut beta = [0.0; N];
    beta[N - 1] = bl[N - 1] / fl[N - 1][N - 1];
    for i in (0..N - 1).rev() {
        let mut z = 0.0;
        for k in i + 1..N {
            z += fl[k][i] * beta[k];
        }
        beta[i] = (bl[i] - z) / fl[i][i];
    }
    Ok(beta)
}

/// Symmetric matrix whose lower triangle (`l <= k`) comes from `entry(k, l)`.
pub fn symmetric_from_lower<F>(mut entry: F) -> SubspaceMatrix
where
    F: FnMut(usize, usize) -> f64,
{
    let mut m = [[0.0; SEARCH_DIRECTIONS]; SEARCH_DIRECTIONS];
    for k in 0..SEARCH_DIRECTIONS {
        for l in 0..=k {
            m[k][l] = entry(k, l);
            m[l][k] = m[k][l];
        }
    }
    m
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // Subspace primitives: Cholesky solve, distance, and symmetric fill.
    // -------------------------------------------------------------------------

    fn mat_vec(a: &SubspaceMatrix, x: &SubspaceVec) -> SubspaceVec {
        let mut out = [0.0; SEARCH_DIRECTIONS];
        for i in 0..SEARCH_DIRECTIONS {
            out[i] = (0..SEARCH_DIRECTIONS).map(|j| a[i][j] * x[j]).sum();
        }
        out
    }

    #[test]
    // Purpose
    // -------
    // `cho_sol` solves SPD systems to floating-point accuracy.
    //
    // Given
    // -----
    // - Several SPD matrices `a = Lᵀ L + δ I` built from deterministic `L`,
    //   with assorted right-hand sides.
    //
    // Expect
    // ------
    // - `a · β` equals `b` within 1e-10.
    fn cho_sol_solves_spd_systems() {
        let seeds: [f64; 5] = [0.3, 1.7, -2.2, 4.1, 0.05];
        for (case, &s) in seeds.iter().enumerate() {
            let l = [
                [1.0 + s.abs(), 0.2 * s, -0.4],
                [0.5, 2.0, 0.3 * s],
                [-0.1 * s, 0.7, 1.5 + 0.1 * s * s],
            ];
            let a = symmetric_from_lower(|k, j| {
                let dot: f64 = (0..3).map(|m| l[m][k] * l[m][j]).sum();
                if k == j { dot + 0.1 } else { dot }
            });
            let b = [s, 1.0 - s, 0.5 * (case as f64) - 1.0];

            let beta = cho_sol(&a, &b).expect("SPD system");
            let back = mat_vec(&a, &beta);

            for i in 0..3 {
                assert_abs_diff_eq!(back[i], b[i], epsilon = 1e-10);
            }
        }
    }

    #[test]
    // Purpose
    // -------
    // A non-positive leading entry is a curvature failure.
    //
    // Given
    // -----
    // - `a[0][0] = 0` and `a[0][0] = −1`.
    //
    // Expect
    // ------
    // - `MaxEntError::NonPositiveCurvature` carrying the offending value.
    fn cho_sol_rejects_non_positive_pivot() {
        let mut a = [[0.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];
        let b = [1.0, 1.0, 1.0];

        assert_eq!(cho_sol(&a, &b).unwrap_err(), MaxEntError::NonPositiveCurvature { value: 0.0 });
        a[0][0] = -1.0;
        assert_eq!(
            cho_sol(&a, &b).unwrap_err(),
            MaxEntError::NonPositiveCurvature { value: -1.0 }
        );
    }

    #[test]
    // Purpose
    // -------
    // A singular trailing block is a curvature failure, not a NaN step.
    //
    // Given
    // -----
    // - `a = diag(1, 1, 0)`, and a rank-one `a = v vᵀ` with `v = (1, 2, 3)`.
    //
    // Expect
    // ------
    // - `MaxEntError::NonPositiveCurvature` with a pivot `<= 0`.
    fn cho_sol_rejects_singular_trailing_block() {
        let b = [1.0, 1.0, 1.0];
        let diagonal = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 0.0]];
        let v = [1.0, 2.0, 3.0];
        let rank_one = symmetric_from_lower(|k, j| v[k] * v[j]);

        assert_eq!(
            cho_sol(&diagonal, &b).unwrap_err(),
            MaxEntError::NonPositiveCurvature { value: 0.0 }
        );
        let err = cho_sol(&rank_one, &b).unwrap_err();
        assert!(matches!(err, MaxEntError::NonPositiveCurvature { value } if value <= 0.0));
    }

    #[test]
    // Purpose
    // -------
    // `dist` is the negative quadratic form of `s2`.
    //
    // Given
    // -----
    // - `s2 = −diag(1, 2, 3)` and `β = (1, 1, 2)`.
    //
    // Expect
    // ------
    // - `dist = 1 + 2 + 12 = 15`.
    fn dist_is_negative_quadratic_form() {
        let s2 = [[-1.0, 0.0, 0.0], [0.0, -2.0, 0.0], [0.0, 0.0, -3.0]];

        assert_abs_diff_eq!(dist(&s2, &[1.0, 1.0, 2.0]), 15.0);
    }

    #[test]
    // Purpose
    // -------
    // The generator is only called on the lower triangle and the result is
    // symmetric.
    //
    // Given
    // -----
    // - A generator that records its calls and returns `10 k + l`.
    //
    // Expect
    // ------
    // - Six calls, all with `l <= k`; `m[l][k] == m[k][l]`.
    fn symmetric_from_lower_mirrors() {
        let mut calls = Vec::new();
        let m = symmetric_from_lower(|k, l| {
            calls.push((k, l));
            (10 * k + l) as f64
        });

        assert_eq!(calls.len(), 6);
        assert!(calls.iter().all(|&(k, l)| l <= k));
        assert_eq!(m[0][2], 20.0);
        assert_eq!(m[1][2], 21.0);
        assert_eq!(m[2][1], 21.0);
    }
}
