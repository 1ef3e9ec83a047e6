//! Summary statistics of a recovered size distribution.
//!
//! Purpose
//! -------
//! Reduce a volume-fraction density per radius bin to the numbers usually
//! quoted for a size distribution: total volume fraction, volume-weighted
//! mean and median diameters, number-weighted mode, plus the cumulative
//! curves they come from.
//!
//! Key behaviors
//! -------------
//! - Integrals are cumulative trapezoids over bin-center *diameters*,
//!   starting from 0 at the first bin.
//! - The number distribution is the volume density divided by the particle
//!   volume of each bin for the chosen shape.
//! - The mean treats the density as a histogram over the diameter edges.
use crate::{
    kernel::Shape,
    size_distribution::errors::{SizeDistError, SizeDistResult},
};
use ndarray::{Array1, ArrayView1};

/// `DistributionStatistics` — scalar summaries and cumulative curves.
///
/// Fields
/// ------
/// - `volume`: total volume fraction `∫ density d(2r)`.
/// - `volume_err`: spread of `volume` across noise replicates, when known.
/// - `mean_diameter`: volume-weighted histogram mean.
/// - `median_diameter`: first diameter where the volume CDF reaches 0.5.
/// - `mode_diameter`: diameter at the peak of the number distribution.
/// - `number_distribution`: `density / V(r)`.
/// - `volume_cdf`, `number_cdf`: normalised cumulative curves (end at 1).
#[derive(Debug, Clone, PartialEq)]
pub struct DistributionStatistics {
    pub volume: f64,
    pub volume_err: Option<f64>,
    pub mean_diameter: f64,
    pub median_diameter: f64,
    pub mode_diameter: f64,
    pub number_distribution: Array1<f64>,
    pub volume_cdf: Array1<f64>,
    pub number_cdf: Array1<f64>,
}

/// Compute [`DistributionStatistics`] for a density on a radius grid.
///
/// Parameters
/// ----------
/// - `centers`: bin-center radii (length `N`).
/// - `edges`: radius edges (length `N + 1`).
/// - `density`: volume-fraction density per radius (length `N`).
/// - `shape`: particle shape used for the number distribution.
///
/// Errors
/// ------
/// - `SizeDistError::LengthMismatch` for inconsistent lengths.
/// - `SizeDistError::EmptyDistribution` for an empty grid, or when the
///   integrated volume or number is not finite and > 0 (e.g. a single bin).
pub fn distribution_statistics(
    centers: ArrayView1<f64>, edges: ArrayView1<f64>, density: ArrayView1<f64>, shape: &Shape,
) -> SizeDistResult<DistributionStatistics> {
    let n = centers.len();
    if density.len() != n {
        return Err(SizeDistError::LengthMismatch {
            what: "density",
            expected: n,
            found: density.len(),
        });
    }
    if edges.len() != n + 1 {
        return Err(SizeDistError::LengthMismatch {
            what: "edges",
            expected: n + 1,
            found: edges.len(),
        });
    }

    if n == 0 {
        return Err(SizeDistError::EmptyDistribution { volume: 0.0 });
    }

    let diameters = &centers * 2.0;
    let volume_cum = cumulative_trapezoid(density, diameters.view())?;
    let volume = volume_cum[n - 1];
    usable(volume)?;

    let number_distribution = Array1::from_shape_fn(n, |i| density[i] / shape.volume(centers[i]));
    let number_cum = cumulative_trapezoid(number_distribution.view(), diameters.view())?;
    usable(number_cum[n - 1])?;
    let number_cdf = &number_cum / number_cum[n - 1];
    let volume_cdf = &volume_cum / volume;

    let median_index = volume_cdf.iter().position(|&c| c >= 0.5).unwrap_or(n - 1);
    let mode_index = argmax(number_distribution.view());

    let mut weight_sum = 0.0;
    let mut moment = 0.0;
    for i in 0..n {
        let mass = density[i] * 2.0 * (edges[i + 1] - edges[i]);
        weight_sum += mass;
        moment += mass * (edges[i] + edges[i + 1]);
    }

    Ok(DistributionStatistics {
        volume,
        volume_err: None,
        mean_diameter: moment / weight_sum,
        median_diameter: diameters[median_index],
        mode_diameter: diameters[mode_index],
        number_distribution,
        volume_cdf,
        number_cdf,
    })
}

/// Cumulative trapezoid of `y` over `x`, starting at 0.
///
/// Errors
/// ------
/// - `SizeDistError::LengthMismatch` when `x` and `y` differ in length.
pub fn cumulative_trapezoid(
    y: ArrayView1<f64>, x: ArrayView1<f64>,
) -> SizeDistResult<Array1<f64>> {
    if x.len() != y.len() {
        return Err(SizeDistError::LengthMismatch { what: "x", expected: y.len(), found: x.len() });
    }
    let mut out = Array1::zeros(y.len());
    for i in 1..y.len() {
        out[i] = out[i - 1] + 0.5 * (y[i] + y[i - 1]) * (x[i] - x[i - 1]);
    }
    Ok(out)
}

fn argmax(values: ArrayView1<f64>) -> usize {
    values
        .iter()
        .enumerate()
        .fold((0, f64::NEG_INFINITY), |best, (i, &v)| if v > best.1 { (i, v) } else { best })
        .0
}

fn usable(volume: f64) -> SizeDistResult<()> {
    if !volume.is_finite() || volume <= 0.0 {
        return Err(SizeDistError::EmptyDistribution { volume });
    }
    Ok(())
}
