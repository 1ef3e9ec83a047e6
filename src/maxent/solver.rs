//! Skilling–Bryan outer loop as an `argmin` solver.
//!
//! Purpose
//! -------
//! Drive the image `f` (one weight per size bin) towards the maximum-entropy
//! solution that fits the data at `χ² ≈ M`, one quadratic-subspace step per
//! `argmin` iteration.
//!
//! Key behaviors
//! -------------
//! - [`MaxEntProblem`] borrows the observations, uncertainties, kernel,
//!   initial image, and resolution for the lifetime of one solve.
//! - [`SkillingBryan::init`] evaluates the residuals of the starting image;
//!   [`SkillingBryan::next_iter`] performs one full step:
//!   1. χ² and entropy gradients in image space.
//!   2. Three search directions (χ² gradient, a blend that removes the
//!      parallel component, and a curvature-corrected third direction).
//!   3. Quadratic models `c1, c2, s1, s2` in the subspace.
//!   4. A step from [`max_ent_move`] (or a pure χ² step on the first pass).
//!   5. Reset of non-positive bins to `RESET_STRAYS · first_bins`.
//! - Termination is reported as `SolverConverged` once
//!   `|χ²/M − 1| < CHI_SQR_LIMIT` and `test < TEST_LIMIT`; the executor's
//!   `max_iters` handles exhaustion.
//!
//! Invariants & assumptions
//! ------------------------
//! - Inputs are validated once in [`MaxEntProblem::new`].
//! - The image handed back to `argmin` is strictly positive after every
//!   step.
//! - A vanishing direction norm or χ² raises
//!   [`MaxEntError::DegenerateDirection`] instead of producing NaNs.
use crate::{
    kernel::{Kernel, Resolution, update_gqr, update_iq_fit},
    maxent::{
        errors::{MaxEntError, MaxEntResult},
        linalg::{SubspaceVec, symmetric_from_lower},
        move_search::{SubspaceModel, max_ent_move},
        options::{CHI_SQR_LIMIT, MaxEntOptions, RESET_STRAYS, SEARCH_DIRECTIONS, TEST_LIMIT},
        validation::validate_inputs,
    },
};
use argmin::core::{
    ArgminError, Error, IterState, KV, Problem, Solver, State, TerminationReason,
    TerminationStatus,
};
use argmin_math::ArgminL2Norm;
use log::{Level, info, log, log_enabled};
use ndarray::{Array1, Array2, ArrayView1, Zip};
use std::f64::consts::E;

/// `argmin` state used by the solver: image vector, χ² as cost.
pub type MaxEntState = IterState<Array1<f64>, (), (), (), (), f64>;

/// `MaxEntProblem` — borrowed inputs of one solve.
///
/// Fields
/// ------
/// - `data`: observations `b` (length `M`).
/// - `sigma`: strictly positive uncertainties (length `M`).
/// - `kernel`: `M × N` response matrix.
/// - `first_bins`: strictly positive starting image and entropy reference
///   (length `N`).
/// - `resolution`: smearing applied after `G · f`.
pub struct MaxEntProblem<'a> {
    pub data: ArrayView1<'a, f64>,
    pub sigma: ArrayView1<'a, f64>,
    pub kernel: &'a Kernel,
    pub first_bins: ArrayView1<'a, f64>,
    pub resolution: &'a dyn Resolution,
}

impl<'a> MaxEntProblem<'a> {
    /// Errors
    /// ------
    /// - Any error from [`validate_inputs`].
    pub fn new(
        data: ArrayView1<'a, f64>, sigma: ArrayView1<'a, f64>, kernel: &'a Kernel,
        first_bins: ArrayView1<'a, f64>, resolution: &'a dyn Resolution,
    ) -> MaxEntResult<Self> {
        validate_inputs(data, sigma, kernel, first_bins)?;
        Ok(MaxEntProblem { data, sigma, kernel, first_bins, resolution })
    }

    /// Predicted intensities for `image`.
    pub fn fit(&self, image: ArrayView1<f64>) -> MaxEntResult<Array1<f64>> {
        Ok(update_iq_fit(image, self.kernel, self.resolution)?)
    }

    /// Normalised residuals `(b − fit(image)) / σ`.
    pub fn residuals(&self, image: ArrayView1<f64>) -> MaxEntResult<Array1<f64>> {
        let fit = self.fit(image)?;
        Ok((&self.data - &fit) / &self.sigma)
    }

    /// Number of observations `M`.
    pub fn n_obs(&self) -> usize {
        self.data.len()
    }
}

/// `SkillingBryan` — iteration state of the MaxEnt solver.
///
/// Fields
/// ------
/// - `blank`: mean of the initial image.
/// - `chizer`: final χ² target (`M`).
/// - `chtarg`: χ² target of the most recent move.
/// - `f_sum`: `Σf` of the current image.
/// - `chisq`: χ² of the current image.
/// - `residuals`: `(b − fit) / σ` of the current image.
/// - `test`: gradient-mismatch statistic of the last step.
/// - `entropy`: normalised entropy of the current image.
/// - `converged`: both convergence criteria met on the last step.
#[derive(Debug, Clone)]
pub struct SkillingBryan {
    iter_max: usize,
    report: bool,
    blank: f64,
    chizer: f64,
    chtarg: f64,
    f_sum: f64,
    chisq: f64,
    residuals: Array1<f64>,
    test: f64,
    entropy: f64,
    converged: bool,
}

impl SkillingBryan {
    pub fn new(opts: &MaxEntOptions) -> Self {
        SkillingBryan {
            iter_max: opts.iter_max,
            report: opts.report,
            blank: 0.0,
            chizer: 0.0,
            chtarg: 0.0,
            f_sum: 0.0,
            chisq: 0.0,
            residuals: Array1::zeros(0),
            test: 0.0,
            entropy: 0.0,
            converged: false,
        }
    }

    pub fn chisq(&self) -> f64 {
        self.chisq
    }

    pub fn chtarg(&self) -> f64 {
        self.chtarg
    }

    pub fn test(&self) -> f64 {
        self.test
    }

    pub fn entropy(&self) -> f64 {
        self.entropy
    }

    pub fn converged(&self) -> bool {
        self.converged
    }

    fn reset(&mut self, problem: &MaxEntProblem<'_>, image: &Array1<f64>) -> MaxEntResult<()> {
        let residuals = problem.residuals(image.view())?;
        self.blank = problem.first_bins.mean().unwrap_or(0.0);
        self.chizer = problem.n_obs() as f64;
        self.chtarg = self.chizer;
        self.f_sum = image.sum();
        self.chisq = residuals.dot(&residuals);
        self.residuals = residuals;
        self.test = 0.0;
        self.entropy = 0.0;
        self.converged = false;
        Ok(())
    }

    /// One Skilling–Bryan step from image `f`; returns the new image.
    fn step(
        &mut self, problem: &MaxEntProblem<'_>, f: Array1<f64>, iteration: u64,
    ) -> MaxEntResult<Array1<f64>> {
        let first = problem.first_bins;
        let sigma = problem.sigma;
        let blank = self.blank;
        let n = f.len();

        // ---- Gradients ----
        let ox = -2.0 * &self.residuals / &sigma;
        let cgrad = update_gqr(ox.view(), problem.kernel)?;
        let sgrad = Zip::from(&f).and(&first).map_collect(|&fi, &fb| -(fi / fb).ln() / (blank * E));

        let snorm = weighted_sum(&f, &sgrad, &sgrad).sqrt();
        let cnorm = weighted_sum(&f, &cgrad, &cgrad).sqrt();
        let tnorm = weighted_sum(&f, &sgrad, &cgrad);
        nonzero("cnorm", cnorm)?;

        let mut a = 1.0;
        let mut b = 1.0 / cnorm;
        let test = if iteration == 0 {
            0.0
        } else {
            let test = (0.5 * (1.0 - tnorm / (snorm * cnorm))).max(0.0).sqrt();
            nonzero("snorm * test", snorm * test)?;
            a = 0.5 / (snorm * test);
            b *= 0.5 / test;
            test
        };

        // ---- Search directions ----
        let mut xi = Array2::<f64>::zeros((SEARCH_DIRECTIONS, n));
        let mut eta = Array2::<f64>::zeros((SEARCH_DIRECTIONS, problem.n_obs()));
        for i in 0..n {
            xi[[0, i]] = f[i] * cgrad[i] / cnorm;
            xi[[1, i]] = f[i] * (a * sgrad[i] - b * cgrad[i]);
        }
        for k in 0..2 {
            let fit = problem.fit(xi.row(k))?;
            eta.row_mut(k).assign(&fit);
        }
        let curvature = &eta.row(1) / &sigma.mapv(|s| s * s);
        let t = update_gqr(curvature.view(), problem.kernel)?;
        let t_norm = weighted_sum(&f, &t, &t).sqrt();
        nonzero("third direction norm", t_norm)?;
        for i in 0..n {
            xi[[2, i]] = f[i] * t[i] / t_norm;
        }
        let fit = problem.fit(xi.row(2))?;
        eta.row_mut(2).assign(&fit);

        // ---- Quadratic models ----
        let chisq = self.chisq;
        nonzero("chisq", chisq)?;
        let mut c1: SubspaceVec = [0.0; SEARCH_DIRECTIONS];
        let mut s1: SubspaceVec = [0.0; SEARCH_DIRECTIONS];
        for k in 0..SEARCH_DIRECTIONS {
            c1[k] = xi.row(k).dot(&cgrad) / chisq;
            s1[k] = xi.row(k).dot(&sgrad);
        }
        let c2 = symmetric_from_lower(|k, l| {
            let sum: f64 = Zip::from(eta.row(k))
                .and(eta.row(l))
                .and(&sigma)
                .fold(0.0, |acc, &ek, &el, &s| acc + ek * el / (s * s));
            2.0 * sum / chisq
        });
        let s2 = symmetric_from_lower(|k, l| {
            let sum: f64 = Zip::from(xi.row(k))
                .and(xi.row(l))
                .and(&f)
                .fold(0.0, |acc, &xk, &xl, &fi| acc + xk * xl / fi);
            -sum / blank
        });
        let model = SubspaceModel { c1, c2, s1, s2 };

        // ---- Step ----
        let beta = if iteration == 0 {
            if c2[0][0] <= 0.0 || c2[0][0].is_nan() {
                return Err(MaxEntError::NonPositiveCurvature { value: c2[0][0] });
            }
            [-0.5 * c1[0] / c2[0][0], 0.0, 0.0]
        } else {
            let outcome = max_ent_move(self.f_sum, blank, chisq, self.chizer, &model)?;
            self.chtarg = outcome.chtarg;
            outcome.beta
        };

        let mut f_new = f.clone();
        for (k, &bk) in beta.iter().enumerate() {
            f_new.scaled_add(bk, &xi.row(k));
        }
        Zip::from(&mut f_new).and(&first).for_each(|fi, &fb| {
            if *fi <= 0.0 {
                *fi = RESET_STRAYS * fb;
            }
        });

        let df = &f_new - &f;
        let change = df.sum();
        self.f_sum = f_new.sum();
        let f_sum = self.f_sum;
        self.entropy = f_new
            .iter()
            .map(|&fi| {
                let p = fi / f_sum;
                p * p.ln()
            })
            .sum();

        self.residuals = problem.residuals(f_new.view())?;
        self.chisq = self.residuals.dot(&self.residuals);
        self.test = test;

        let level = if self.report { Level::Info } else { Level::Debug };
        if log_enabled!(level) {
            let step_norm: f64 = df.l2_norm();
            log!(
                level,
                "MaxEnt trial/max: {:3}/{:3}; residual: {:5.2}%; entropy: {:.6e}; \
                 function sum: {:.5e}; change: {:.4}%; step norm: {:.3e}",
                iteration + 1,
                self.iter_max,
                100.0 * test,
                self.entropy,
                f_sum,
                100.0 * change / f_sum,
                step_norm,
            );
        }

        if (self.chisq / self.chizer - 1.0).abs() < CHI_SQR_LIMIT && test < TEST_LIMIT {
            self.converged = true;
            info!(
                "Convergence achieved after {} iterations (chi^2/M = {:.4}).",
                iteration + 1,
                self.chisq / self.chizer
            );
        }
        Ok(f_new)
    }
}

impl<'a> Solver<MaxEntProblem<'a>, MaxEntState> for SkillingBryan {
    const NAME: &'static str = "Skilling-Bryan MaxEnt";

    fn init(
        &mut self, problem: &mut Problem<MaxEntProblem<'a>>, mut state: MaxEntState,
    ) -> Result<(MaxEntState, Option<KV>), Error> {
        let image = match state.take_param() {
            Some(image) => image,
            None => problem.problem("first_bins_count", |p| Ok(p.first_bins.to_owned()))?,
        };
        problem.problem("fit_count", |p| Ok(self.reset(p, &image)?))?;
        Ok((state.param(image).cost(self.chisq), None))
    }

    fn next_iter(
        &mut self, problem: &mut Problem<MaxEntProblem<'a>>, mut state: MaxEntState,
    ) -> Result<(MaxEntState, Option<KV>), Error> {
        let image = state.take_param().ok_or_else(|| {
            Error::from(ArgminError::NotInitialized {
                text: "Skilling-Bryan: image missing from state".to_string(),
            })
        })?;
        let iteration = state.get_iter();
        let image = problem.problem("fit_count", |p| Ok(self.step(p, image, iteration)?))?;
        Ok((state.param(image).cost(self.chisq), None))
    }

    fn terminate(&mut self, _state: &MaxEntState) -> TerminationStatus {
        if self.converged {
            TerminationStatus::Terminated(TerminationReason::SolverConverged)
        } else {
            TerminationStatus::NotTerminated
        }
    }
}

// ---- Helper Methods ----

/// `Σ wᵢ xᵢ yᵢ`.
fn weighted_sum(w: &Array1<f64>, x: &Array1<f64>, y: &Array1<f64>) -> f64 {
    Zip::from(w).and(x).and(y).fold(0.0, |acc, &wi, &xi, &yi| acc + wi * xi * yi)
}

fn nonzero(quantity: &'static str, value: f64) -> MaxEntResult<()> {
    if value == 0.0 || !value.is_finite() {
        return Err(MaxEntError::DegenerateDirection { quantity, value });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::Perfect;
    use approx::assert_relative_eq;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // Single steps of the solver on a tiny diagonal problem, outside the
    // executor.
    // -------------------------------------------------------------------------

    fn diagonal_kernel() -> Kernel {
        Kernel::from_matrix(array![[1.0, 0.0], [0.0, 1.0], [0.5, 0.5]]).unwrap()
    }

    #[test]
    // Purpose
    // -------
    // `reset` seeds the χ² bookkeeping from the starting image.
    //
    // Given
    // -----
    // - Identity-like kernel, data `(2, 3, 2.5)`, σ = 1, image `(1, 1)`.
    //
    // Expect
    // ------
    // - Residuals `(1, 2, 1.5)`, χ² = 7.25, χ²₀ = 3, blank = 1, Σf = 2.
    fn reset_seeds_chi_square() {
        let kernel = diagonal_kernel();
        let data = array![2.0, 3.0, 2.5];
        let sigma = array![1.0, 1.0, 1.0];
        let first = array![1.0, 1.0];
        let problem =
            MaxEntProblem::new(data.view(), sigma.view(), &kernel, first.view(), &Perfect)
                .unwrap();
        let mut solver = SkillingBryan::new(&MaxEntOptions::default());

        solver.reset(&problem, &first).unwrap();

        assert_relative_eq!(solver.chisq(), 7.25, max_relative = 1e-14);
        assert_relative_eq!(solver.chizer, 3.0);
        assert_relative_eq!(solver.blank, 1.0);
        assert_relative_eq!(solver.f_sum, 2.0);
    }

    #[test]
    // Purpose
    // -------
    // The first step is a pure χ² step that lowers χ² and keeps the image
    // positive.
    //
    // Given
    // -----
    // - The problem above.
    //
    // Expect
    // ------
    // - New χ² below the starting 7.25, every bin > 0, `test = 0`.
    fn first_step_reduces_chi_square() {
        let kernel = diagonal_kernel();
        let data = array![2.0, 3.0, 2.5];
        let sigma = array![1.0, 1.0, 1.0];
        let first = array![1.0, 1.0];
        let problem =
            MaxEntProblem::new(data.view(), sigma.view(), &kernel, first.view(), &Perfect)
                .unwrap();
        let mut solver = SkillingBryan::new(&MaxEntOptions::default());
        solver.reset(&problem, &first).unwrap();

        let f_new = solver.step(&problem, first.clone(), 0).unwrap();

        assert!(solver.chisq() < 7.25);
        assert!(f_new.iter().all(|&v| v > 0.0));
        assert_eq!(solver.test(), 0.0);
    }

    #[test]
    // Purpose
    // -------
    // Bins driven non-positive are reset to the starting image.
    //
    // Given
    // -----
    // - Data far below the starting prediction in the first channel so the
    //   pure χ² step pushes bin 0 negative: data `(−50, 1, 0.5)`.
    //
    // Expect
    // ------
    // - `f_new[0] == RESET_STRAYS · first[0]`.
    fn step_resets_strays() {
        let kernel = diagonal_kernel();
        let data = array![-50.0, 1.0, 0.5];
        let sigma = array![1.0, 1.0, 1.0];
        let first = array![1.0, 1.0];
        let problem =
            MaxEntProblem::new(data.view(), sigma.view(), &kernel, first.view(), &Perfect)
                .unwrap();
        let mut solver = SkillingBryan::new(&MaxEntOptions::default());
        solver.reset(&problem, &first).unwrap();

        let f_new = solver.step(&problem, first.clone(), 0).unwrap();

        assert_eq!(f_new[0], RESET_STRAYS * first[0]);
    }

    #[test]
    // Purpose
    // -------
    // A data set the starting image already fits exactly has no χ²
    // gradient and is reported as degenerate.
    //
    // Given
    // -----
    // - Data equal to `G · first`.
    //
    // Expect
    // ------
    // - `MaxEntError::DegenerateDirection { quantity: "cnorm", .. }`.
    fn step_rejects_vanishing_gradient() {
        let kernel = diagonal_kernel();
        let data = array![1.0, 1.0, 1.0];
        let sigma = array![1.0, 1.0, 1.0];
        let first = array![1.0, 1.0];
        let problem =
            MaxEntProblem::new(data.view(), sigma.view(), &kernel, first.view(), &Perfect)
                .unwrap();
        let mut solver = SkillingBryan::new(&MaxEntOptions::default());
        solver.reset(&problem, &first).unwrap();

        let err = solver.step(&problem, first.clone(), 0).unwrap_err();

        assert!(matches!(err, MaxEntError::DegenerateDirection { quantity: "cnorm", .. }));
    }
}
