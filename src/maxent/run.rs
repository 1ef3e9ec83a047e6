//! Entry point that runs the Skilling–Bryan solver under an `argmin`
//! executor and returns a crate-friendly [`MaxEntOutcome`].
use crate::{
    kernel::{Kernel, Resolution, update_iq_fit},
    maxent::{
        errors::MaxEntResult,
        options::MaxEntOptions,
        solver::{MaxEntProblem, SkillingBryan},
    },
};
use argmin::core::{Executor, State};
use log::warn;
use ndarray::{Array1, ArrayView1};

/// `MaxEntOutcome` — final state of one MaxEnt solve.
///
/// Fields
/// ------
/// - `chisq`: χ² of the returned image.
/// - `image`: bin weights `f` (strictly positive).
/// - `fit`: predicted intensities `resolution(G · f)`.
/// - `converged`: both convergence criteria were met before the cap.
/// - `iterations`: outer iterations performed.
/// - `test`: gradient-mismatch statistic of the last step.
/// - `entropy`: normalised entropy of the returned image.
#[derive(Debug, Clone, PartialEq)]
pub struct MaxEntOutcome {
    pub chisq: f64,
    pub image: Array1<f64>,
    pub fit: Array1<f64>,
    pub converged: bool,
    pub iterations: u64,
    pub test: f64,
    pub entropy: f64,
}

impl MaxEntOutcome {
    /// `χ² / M`.
    pub fn reduced_chisq(&self) -> f64 {
        self.chisq / self.fit.len() as f64
    }
}

/// Solve for the maximum-entropy image that fits `data` at `χ² ≈ M`.
///
/// Parameters
/// ----------
/// - `data`: `ArrayView1<f64>`
///   Observations `b` (length `M`).
/// - `sigma`: `ArrayView1<f64>`
///   Strictly positive uncertainties (length `M`).
/// - `kernel`: `&Kernel`
///   `M × N` response matrix.
/// - `first_bins`: `ArrayView1<f64>`
///   Strictly positive starting image and entropy reference (length `N`).
/// - `resolution`: `&dyn Resolution`
///   Smearing applied after `G · f`.
/// - `opts`: `&MaxEntOptions`
///   Iteration cap and reporting.
///
/// Returns
/// -------
/// - [`MaxEntOutcome`]; `converged == false` when the cap was hit, which is
///   logged as a warning and is *not* an error.
///
/// Errors
/// ------
/// - Input validation errors from [`MaxEntProblem::new`].
/// - `MaxEntError::NonPositiveCurvature`, `MaxEntError::MoveNotConverged`,
///   and `MaxEntError::DegenerateDirection` from the iterations, recovered
///   from `argmin` through `From<argmin::core::Error>`.
///
/// Feature flags
/// -------------
/// With `obs_slog` and `opts.report`, a terminal slog observer is attached
/// with `ObserverMode::Always`.
pub fn max_ent_sb<'a>(
    data: ArrayView1<'a, f64>, sigma: ArrayView1<'a, f64>, kernel: &'a Kernel,
    first_bins: ArrayView1<'a, f64>, resolution: &'a dyn Resolution, opts: &MaxEntOptions,
) -> MaxEntResult<MaxEntOutcome> {
    let problem = MaxEntProblem::new(data, sigma, kernel, first_bins, resolution)?;
    let first = first_bins.to_owned();
    let iter_max = opts.iter_max as u64;

    let mut executor = Executor::new(problem, SkillingBryan::new(opts));
    executor = executor.configure(|state| state.param(first).max_iters(iter_max));
    #[cfg(feature = "obs_slog")]
    if opts.report {
        let observer = argmin_observer_slog::SlogLogger::term_noblock();
        executor = executor.add_observer(observer, argmin::core::observers::ObserverMode::Always);
    }

    let result = executor.run()?;
    let solver = result.solver();
    let mut state = result.state().clone();
    let iterations = state.get_iter();
    let image = state.take_param().unwrap_or_else(|| first_bins.to_owned());

    let fit = update_iq_fit(image.view(), kernel, resolution)?;
    let outcome = MaxEntOutcome {
        chisq: solver.chisq(),
        image,
        fit,
        converged: solver.converged(),
        iterations,
        test: solver.test(),
        entropy: solver.entropy(),
    };

    if !outcome.converged {
        warn!(
            "No convergence after {} iterations! Try increasing Error multiplier \
             (chi^2/M = {:.4}).",
            iterations,
            outcome.reduced_chisq()
        );
    }
    Ok(outcome)
}
