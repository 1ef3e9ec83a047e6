//! sas_maxent — maximum-entropy size distributions from small-angle scattering.
//!
//! Purpose
//! -------
//! Serve as the crate root for Rust callers and as the PyO3 bridge that exposes
//! the size-distribution workflow to Python via the `_sas_maxent` extension
//! module. Given a 1D scattering curve `I(Q) ± dI(Q)`, the crate recovers a
//! non-negative volume-fraction distribution over particle sizes with the
//! Skilling–Bryan maximum-entropy method (or an interior-point non-negative
//! least-squares alternative).
//!
//! Key behaviors
//! -------------
//! - Re-export the core Rust modules: `data` (validated curves and text
//!   input), `kernel` (form factors, kernel matrix, resolution), `maxent`
//!   (the Skilling–Bryan solver), and `size_distribution` (driver,
//!   configuration, statistics, replicates, background fit).
//! - Define the `SizeDistribution` `#[pyclass]` and the `#[pymodule]`
//!   initializer for the `_sas_maxent` Python extension.
//!
//! Invariants & assumptions
//! ------------------------
//! - All numerical work lives in the inner modules; this file performs only
//!   FFI glue, argument parsing, and error mapping.
//! - Every error type converts to `PyValueError` at the PyO3 boundary.
//!
//! Conventions
//! -----------
//! - Q and radii must use reciprocal units (Å⁻¹ and Å, or nm⁻¹ and nm).
//! - Bins are reported in radius; densities are per unit diameter.
//!
//! Downstream usage
//! ----------------
//! - Rust callers build a [`size_distribution::SizeDistConfig`] and call
//!   [`size_distribution::size_distribution`].
//! - Lower-level users may drive [`maxent::max_ent_sb`] directly with their
//!   own kernel.

pub mod data;
pub mod kernel;
pub mod maxent;
pub mod size_distribution;
pub mod utils;

#[cfg(feature = "python-bindings")]
use pyo3::{prelude::*, types::PyAny};

#[cfg(feature = "python-bindings")]
use crate::{
    kernel::Contrast,
    maxent::MaxEntOptions,
    size_distribution::{
        Background, DiamRange, SizeDistConfig, SizeDistOutcome, background_fit,
        run_replicates, size_distribution,
    },
    utils::{
        extract_array1, extract_method, extract_resolution, extract_scattering_data,
        extract_shape, extract_weight_factors, extract_weight_type,
    },
};

/// SizeDistribution — Python-facing wrapper for the size-distribution driver.
///
/// Purpose
/// -------
/// Hold a validated [`SizeDistConfig`] built from keyword arguments, run it
/// against curves passed from Python, and cache the last outcome for
/// inspection through properties.
///
/// Parameters
/// ----------
/// Constructed from Python via
/// `SizeDistribution(qmin=None, qmax=None, scale=1.0, diam_min=10.0, ...)`;
/// see the `text_signature` for the full list. `model` accepts shape names
/// such as `"sphere"` or `"spheroid:2.0"`.
///
/// Fields
/// ------
/// - `config`: [`SizeDistConfig`]
/// - `results`: last [`SizeDistOutcome`], `None` before `fit`.
#[cfg(feature = "python-bindings")]
#[pyclass(module = "sas_maxent.size_distribution")]
pub struct SizeDistribution {
    config: SizeDistConfig,
    results: Option<SizeDistOutcome>,
}

#[cfg(feature = "python-bindings")]
#[pymethods]
impl SizeDistribution {
    #[new]
    #[pyo3(
        signature = (
            qmin = None,
            qmax = None,
            scale = 1.0,
            diam_min = 10.0,
            diam_max = 100000.0,
            n_bins = 100,
            log_bins = true,
            weight_factor = None,
            contrast = 1.0,
            sky = 1e-6,
            weight_type = None,
            percent = None,
            background = 0.0,
            model = None,
            iter_max = 5000,
            report = false,
            method = None,
            ipg_approach = None,
            ipg_power = None,
            slit_length = None,
        ),
        text_signature = "(qmin=None, qmax=None, scale=1.0, diam_min=10.0, diam_max=100000.0, \
                          n_bins=100, log_bins=True, weight_factor=None, contrast=1.0, sky=1e-6, \
                          weight_type='dI', percent=None, background=0.0, model='sphere', \
                          iter_max=5000, report=False, method='maxent', ipg_approach=0.8, \
                          ipg_power=None, slit_length=None)"
    )]
    #[allow(clippy::too_many_arguments)]
    pub fn new<'py>(
        qmin: Option<f64>, qmax: Option<f64>, scale: f64, diam_min: f64, diam_max: f64,
        n_bins: usize, log_bins: bool, weight_factor: Option<&Bound<'py, PyAny>>, contrast: f64,
        sky: f64, weight_type: Option<&str>, percent: Option<f64>, background: f64,
        model: Option<&str>, iter_max: usize, report: bool, method: Option<&str>,
        ipg_approach: Option<f64>, ipg_power: Option<i32>, slit_length: Option<f64>,
    ) -> PyResult<Self> {
        let limits = match (qmin, qmax) {
            (Some(lo), Some(hi)) => Some((lo, hi)),
            (None, None) => None,
            (lo, hi) => Some((lo.unwrap_or(0.0), hi.unwrap_or(f64::MAX))),
        };
        let config = SizeDistConfig {
            limits,
            scale,
            diam_range: DiamRange::new(diam_min, diam_max, n_bins)?,
            log_bins,
            weight_factors: extract_weight_factors(weight_factor)?,
            contrast: Contrast::Uniform(contrast),
            sky,
            weights: None,
            weight_type: extract_weight_type(weight_type, percent)?,
            background: Background::Constant(background),
            model: extract_shape(model)?,
            initial_bins: None,
            resolution: extract_resolution(slit_length),
            method: extract_method(method, ipg_approach, ipg_power)?,
            max_ent: MaxEntOptions::new(iter_max, report)?,
        };
        Ok(SizeDistribution { config, results: None })
    }

    /// Run the driver on `(q, intensity, uncertainty)` and cache the outcome.
    #[pyo3(signature = (q, intensity, uncertainty), text_signature = "(self, q, intensity, uncertainty)")]
    pub fn fit<'py>(
        &mut self, q: &Bound<'py, PyAny>, intensity: &Bound<'py, PyAny>,
        uncertainty: &Bound<'py, PyAny>,
    ) -> PyResult<()> {
        let data = extract_scattering_data(q, intensity, uncertainty)?;
        self.results = Some(size_distribution(&data, &self.config)?);
        Ok(())
    }

    /// Mean and standard deviation of the density over `n` noise replicates.
    #[pyo3(
        signature = (q, intensity, uncertainty, n, seed = 0),
        text_signature = "(self, q, intensity, uncertainty, n, /, seed=0)"
    )]
    pub fn replicates<'py>(
        &self, q: &Bound<'py, PyAny>, intensity: &Bound<'py, PyAny>,
        uncertainty: &Bound<'py, PyAny>, n: usize, seed: u64,
    ) -> PyResult<(Vec<f64>, Vec<f64>)> {
        let data = extract_scattering_data(q, intensity, uncertainty)?;
        let summary = run_replicates(&data, &self.config, n, seed)?;
        Ok((summary.density_mean.to_vec(), summary.density_std.to_vec()))
    }

    /// `(volume, mean, median, mode)` of the fitted distribution.
    pub fn statistics(&self) -> PyResult<(f64, f64, f64, f64)> {
        let stats = self.outcome()?.statistics(&self.config.model)?;
        Ok((stats.volume, stats.mean_diameter, stats.median_diameter, stats.mode_diameter))
    }

    #[getter]
    pub fn chisq(&self) -> PyResult<f64> {
        Ok(self.outcome()?.chisq)
    }

    #[getter]
    pub fn reduced_chisq(&self) -> PyResult<f64> {
        Ok(self.outcome()?.reduced_chisq())
    }

    #[getter]
    pub fn converged(&self) -> PyResult<bool> {
        Ok(self.outcome()?.converged)
    }

    #[getter]
    pub fn iterations(&self) -> PyResult<u64> {
        Ok(self.outcome()?.iterations)
    }

    #[getter]
    pub fn bin_centers(&self) -> PyResult<Vec<f64>> {
        Ok(self.outcome()?.bin_centers.to_vec())
    }

    #[getter]
    pub fn bin_widths(&self) -> PyResult<Vec<f64>> {
        Ok(self.outcome()?.bin_widths.to_vec())
    }

    #[getter]
    pub fn bin_density(&self) -> PyResult<Vec<f64>> {
        Ok(self.outcome()?.bin_density.to_vec())
    }

    #[getter]
    pub fn q_used(&self) -> PyResult<Vec<f64>> {
        Ok(self.outcome()?.q_used.to_vec())
    }

    #[getter]
    pub fn fitted_intensity(&self) -> PyResult<Vec<f64>> {
        Ok(self.outcome()?.fitted_intensity.to_vec())
    }
}

#[cfg(feature = "python-bindings")]
impl SizeDistribution {
    fn outcome(&self) -> PyResult<&SizeDistOutcome> {
        self.results.as_ref().ok_or_else(|| {
            pyo3::exceptions::PyRuntimeError::new_err("SizeDistribution has not been fitted")
        })
    }
}

/// Power-law background `I ≈ scale · Q^power`; returns
/// `(scale, scale_err, power, power_err)`.
#[cfg(feature = "python-bindings")]
#[pyfunction]
#[pyo3(
    signature = (q, intensity, uncertainty, power = None, qmin = None, qmax = None),
    text_signature = "(q, intensity, uncertainty, /, power=None, qmin=None, qmax=None)"
)]
fn power_law_background<'py>(
    q: &Bound<'py, PyAny>, intensity: &Bound<'py, PyAny>, uncertainty: &Bound<'py, PyAny>,
    power: Option<f64>, qmin: Option<f64>, qmax: Option<f64>,
) -> PyResult<(f64, f64, f64, Option<f64>)> {
    let data = extract_scattering_data(q, intensity, uncertainty)?;
    let fit = background_fit(&data, power, qmin, qmax)?;
    Ok((fit.scale, fit.scale_err, fit.power, fit.power_err))
}

/// Cumulative trapezoid of `y` over `x`, starting at 0.
#[cfg(feature = "python-bindings")]
#[pyfunction]
#[pyo3(signature = (y, x), text_signature = "(y, x)")]
fn cumulative_trapezoid<'py>(y: &Bound<'py, PyAny>, x: &Bound<'py, PyAny>) -> PyResult<Vec<f64>> {
    let y = extract_array1(y, "y")?;
    let x = extract_array1(x, "x")?;
    Ok(size_distribution::cumulative_trapezoid(y.view(), x.view())?.to_vec())
}

/// _sas_maxent — PyO3 module initializer for the Python extension.
///
/// Creates the `size_distribution` submodule, attaches it to the parent,
/// and registers it in `sys.modules` so dotted imports work.
#[cfg(feature = "python-bindings")]
#[pymodule]
fn _sas_maxent<'py>(_py: Python<'py>, m: &Bound<'py, PyModule>) -> PyResult<()> {
    let size_distribution_mod = PyModule::new(_py, "size_distribution")?;
    size_distribution_module(_py, m, &size_distribution_mod)?;

    _py.import("sys")?
        .getattr("modules")?
        .set_item("sas_maxent.size_distribution", size_distribution_mod)?;
    Ok(())
}

#[cfg(feature = "python-bindings")]
fn size_distribution_module<'py>(
    _py: Python, sas_maxent: &Bound<'py, PyModule>, m: &Bound<'py, PyModule>,
) -> PyResult<()> {
    m.add_class::<SizeDistribution>()?;
    m.add_function(wrap_pyfunction!(power_law_background, m)?)?;
    m.add_function(wrap_pyfunction!(cumulative_trapezoid, m)?)?;
    sas_maxent.add_submodule(m)?;
    Ok(())
}
