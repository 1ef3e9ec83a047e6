//! Size-distribution driver: data + configuration → density per size bin.
//!
//! Purpose
//! -------
//! Wire a measured curve, the bin grid, the kernel, weights, background, and
//! the chosen solver into one call, and convert the solved image ("total
//! weight per bin") into a density per unit diameter.
//!
//! Key behaviors
//! -------------
//! - The Q window is inclusive at both ends; per-point settings are sliced
//!   together with the data.
//! - The solver sees `scale · I − background` with
//!   `σ = scale / sqrt(factor · w)`.
//! - The returned fit has the background added back, so it is directly
//!   comparable with `scale · I`.
//!
//! Invariants & assumptions
//! ------------------------
//! - Configuration is validated against the full data length before any
//!   kernel is built.
//! - Exhausting the iteration cap is reported through
//!   [`SizeDistOutcome::converged`], never as an error.
use crate::{
    data::ScatteringData,
    kernel::{Kernel, Shape},
    maxent::max_ent_sb,
    size_distribution::{
        bins::BinGrid,
        config::{SizeDistConfig, SizeMethod},
        errors::{SizeDistError, SizeDistResult},
        ipg::ipg,
        statistics::{DistributionStatistics, distribution_statistics},
    },
};
use log::info;
use ndarray::{Array1, Zip, s};

/// `SizeDistOutcome` — result of one driver run.
///
/// Fields
/// ------
/// - `chisq`: χ² of the final image.
/// - `bin_centers`, `bin_widths`, `bin_edges`: radius grid.
/// - `bin_density`: `image / (2 · width)`, density per unit diameter.
/// - `image`: raw solver weights per bin.
/// - `q_used`: Q values inside the fit window.
/// - `fitted_intensity`: model intensity plus background on `q_used`.
/// - `converged`: the solver met its stopping rule before the cap.
/// - `iterations`: solver iterations performed.
#[derive(Debug, Clone, PartialEq)]
pub struct SizeDistOutcome {
    pub chisq: f64,
    pub bin_centers: Array1<f64>,
    pub bin_widths: Array1<f64>,
    pub bin_edges: Array1<f64>,
    pub bin_density: Array1<f64>,
    pub image: Array1<f64>,
    pub q_used: Array1<f64>,
    pub fitted_intensity: Array1<f64>,
    pub converged: bool,
    pub iterations: u64,
}

impl SizeDistOutcome {
    /// `χ² / M` over the fitted window.
    pub fn reduced_chisq(&self) -> f64 {
        self.chisq / self.q_used.len() as f64
    }

    /// Volume, mean, median, and mode of the recovered density.
    ///
    /// Errors
    /// ------
    /// - Any error from [`distribution_statistics`].
    pub fn statistics(&self, shape: &Shape) -> SizeDistResult<DistributionStatistics> {
        distribution_statistics(
            self.bin_centers.view(),
            self.bin_edges.view(),
            self.bin_density.view(),
            shape,
        )
    }
}

/// Recover the size distribution of `data` under `config`.
///
/// Parameters
/// ----------
/// - `data`: `&ScatteringData`
///   Validated curve (full Q range).
/// - `config`: `&SizeDistConfig`
///   Run settings; validated here.
///
/// Returns
/// -------
/// - [`SizeDistOutcome`] with the bin grid, density, and fit.
///
/// Errors
/// ------
/// - `SizeDistError` configuration variants from
///   [`SizeDistConfig::validate`].
/// - `SizeDistError::EmptyQRange` when no point lies in the window.
/// - `SizeDistError::Kernel` from the kernel or resolution builders.
/// - `SizeDistError::MaxEnt` from the solver (numerical breakdown or
///   invalid derived inputs such as a non-positive initial image).
///
/// Notes
/// -----
/// - With `weights = None`, weights are `1/u²` from `config.weight_type`
///   evaluated on the windowed data.
pub fn size_distribution(
    data: &ScatteringData, config: &SizeDistConfig,
) -> SizeDistResult<SizeDistOutcome> {
    config.validate(data.len())?;
    let grid = BinGrid::new(&config.diam_range, config.log_bins)?;

    let range = match config.limits {
        Some((qmin, qmax)) => {
            let range = data.q_range_indices(qmin, qmax);
            if range.is_empty() {
                return Err(SizeDistError::EmptyQRange { qmin, qmax });
            }
            range
        }
        None => 0..data.len(),
    };
    let used = data.slice(range.clone());
    let kernel = Kernel::build(used.q.view(), grid.centers.view(), &config.contrast, &config.model)?;

    let weights = match &config.weights {
        Some(weights) => weights.slice(s![range.start..range.end]).to_owned(),
        None => config.weight_type.weights(used.intensity.view(), used.uncertainty.view())?,
    };
    let factors = config.factors_in(&range);
    let sigma = Zip::from(&factors)
        .and(&weights)
        .map_collect(|&factor, &w| config.scale / (factor * w).sqrt());
    let background = config.background_in(&range);
    let target = &used.intensity * config.scale - &background;
    let first = config.first_bins(grid.len());
    let resolution = config.resolution.build(&used.q)?;

    let (chisq, image, fit, converged, iterations) = match config.method {
        SizeMethod::MaxEnt => {
            let out = max_ent_sb(
                target.view(),
                sigma.view(),
                &kernel,
                first.view(),
                resolution.as_ref(),
                &config.max_ent,
            )?;
            (out.chisq, out.image, out.fit, out.converged, out.iterations)
        }
        SizeMethod::Ipg { approach, power } => {
            let out = ipg(
                target.view(),
                sigma.view(),
                &kernel,
                resolution.as_ref(),
                used.q.view(),
                approach,
                power,
                config.max_ent.iter_max,
            )?;
            (out.chisq, out.image, out.fit, out.converged, out.iterations)
        }
    };
    info!("Final chi^2: {chisq:.3} ({} points, {iterations} iterations)", used.len());

    let bin_density = &image / &(&grid.widths * 2.0);
    Ok(SizeDistOutcome {
        chisq,
        bin_centers: grid.centers,
        bin_widths: grid.widths,
        bin_edges: grid.edges,
        bin_density,
        image,
        q_used: used.q,
        fitted_intensity: fit + &background,
        converged,
        iterations,
    })
}
