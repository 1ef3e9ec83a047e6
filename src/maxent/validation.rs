//! Input checks run once before the MaxEnt loop starts.
use crate::{
    kernel::Kernel,
    maxent::errors::{MaxEntError, MaxEntResult},
};
use ndarray::ArrayView1;

/// Validate observations, uncertainties, and the initial image against the
/// kernel.
///
/// Errors
/// ------
/// - `MaxEntError::EmptyData` when `data` is empty.
/// - `MaxEntError::LengthMismatch` when `data`/`sigma` do not have `M`
///   entries or `first_bins` does not have `N`.
/// - `MaxEntError::NonFiniteInput` for NaN/±inf values.
/// - `MaxEntError::NonPositiveSigma` / `MaxEntError::NonPositiveFirstBins`.
pub fn validate_inputs(
    data: ArrayView1<f64>, sigma: ArrayView1<f64>, kernel: &Kernel, first_bins: ArrayView1<f64>,
) -> MaxEntResult<()> {
    check_observations(data, sigma, kernel)?;
    check_len("first_bins", kernel.n_bins(), first_bins.len())?;
    check_finite("first_bins", first_bins)?;
    if let Some((index, &value)) = first_bins.iter().enumerate().find(|(_, v)| **v <= 0.0) {
        return Err(MaxEntError::NonPositiveFirstBins { index, value });
    }
    Ok(())
}

/// Observation half of [`validate_inputs`], shared with solvers that do not
/// take an initial image.
pub fn check_observations(
    data: ArrayView1<f64>, sigma: ArrayView1<f64>, kernel: &Kernel,
) -> MaxEntResult<()> {
    if data.is_empty() {
        return Err(MaxEntError::EmptyData);
    }
    check_len("data", kernel.n_q(), data.len())?;
    check_len("sigma", kernel.n_q(), sigma.len())?;
    check_finite("data", data)?;
    check_finite("sigma", sigma)?;
    if let Some((index, &value)) = sigma.iter().enumerate().find(|(_, v)| **v <= 0.0) {
        return Err(MaxEntError::NonPositiveSigma { index, value });
    }
    Ok(())
}

fn check_len(what: &'static str, expected: usize, found: usize) -> MaxEntResult<()> {
    if expected != found {
        return Err(MaxEntError::LengthMismatch { what, expected, found });
    }
    Ok(())
}

fn check_finite(what: &'static str, values: ArrayView1<f64>) -> MaxEntResult<()> {
    match values.iter().enumerate().find(|(_, v)| !v.is_finite()) {
        Some((index, &value)) => Err(MaxEntError::NonFiniteInput { what, index, value }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array2, array};

    fn kernel() -> Kernel {
        Kernel::from_matrix(Array2::from_elem((3, 2), 1.0)).unwrap()
    }

    #[test]
    // Purpose
    // -------
    // Each malformed input maps to its own error.
    //
    // Given
    // -----
    // - A 3 × 2 kernel and inputs that break one rule at a time.
    //
    // Expect
    // ------
    // - `LengthMismatch`, `NonPositiveSigma`, `NonFiniteInput`,
    //   `NonPositiveFirstBins`; the well-formed case passes.
    fn validate_inputs_flags_each_rule() {
        let k = kernel();
        let data = array![1.0, 2.0, 3.0];
        let sigma = array![0.1, 0.1, 0.1];
        let first = array![1e-3, 1e-3];

        assert!(validate_inputs(data.view(), sigma.view(), &k, first.view()).is_ok());
        assert_eq!(
            validate_inputs(data.view(), array![0.1, 0.1].view(), &k, first.view()).unwrap_err(),
            MaxEntError::LengthMismatch { what: "sigma", expected: 3, found: 2 }
        );
        assert_eq!(
            validate_inputs(data.view(), array![0.1, 0.0, 0.1].view(), &k, first.view())
                .unwrap_err(),
            MaxEntError::NonPositiveSigma { index: 1, value: 0.0 }
        );
        assert!(matches!(
            validate_inputs(array![1.0, f64::INFINITY, 3.0].view(), sigma.view(), &k, first.view())
                .unwrap_err(),
            MaxEntError::NonFiniteInput { what: "data", index: 1, .. }
        ));
        assert_eq!(
            validate_inputs(data.view(), sigma.view(), &k, array![1e-3, -1.0].view()).unwrap_err(),
            MaxEntError::NonPositiveFirstBins { index: 1, value: -1.0 }
        );
    }
}
