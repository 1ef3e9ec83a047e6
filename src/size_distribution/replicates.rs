//! Noise replicates: spread of the recovered distribution under data noise.
//!
//! Each replicate perturbs every intensity with `N(0, dI)` drawn from a
//! seeded `StdRng`, runs [`size_distribution`] with the same configuration,
//! and the successful runs are reduced to a per-bin mean and population
//! standard deviation.
use crate::{
    data::ScatteringData,
    kernel::Shape,
    size_distribution::{
        driver::{SizeDistOutcome, size_distribution},
        config::SizeDistConfig,
        errors::{SizeDistError, SizeDistResult},
        statistics::{DistributionStatistics, cumulative_trapezoid, distribution_statistics},
    },
};
use log::{debug, warn};
use ndarray::{Array1, Array2, Axis};
use rand::{SeedableRng, distributions::Distribution, rngs::StdRng};
use statrs::{distribution::Normal, statistics::Statistics};

/// `ReplicateSummary` — reduction of a set of noisy driver runs.
///
/// Fields
/// ------
/// - `runs`: replicates attempted.
/// - `bin_centers`, `bin_widths`, `bin_edges`: radius grid (shared).
/// - `q_used`: fitted Q window (shared).
/// - `density_mean`, `density_std`: per-bin mean and population std of
///   `bin_density` over the successful runs.
/// - `fit_mean`, `fit_std`: same for `fitted_intensity`.
/// - `chisq_mean`: mean χ² over the successful runs.
/// - `volumes`: total volume fraction of each successful run.
/// - `convergence`: per replicate, `Some((converged, iterations))` or
///   `None` when that run failed.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplicateSummary {
    pub runs: usize,
    pub bin_centers: Array1<f64>,
    pub bin_widths: Array1<f64>,
    pub bin_edges: Array1<f64>,
    pub q_used: Array1<f64>,
    pub density_mean: Array1<f64>,
    pub density_std: Array1<f64>,
    pub fit_mean: Array1<f64>,
    pub fit_std: Array1<f64>,
    pub chisq_mean: f64,
    pub volumes: Vec<f64>,
    pub convergence: Vec<Option<(bool, u64)>>,
}

impl ReplicateSummary {
    /// Number of replicates that produced a result.
    pub fn succeeded(&self) -> usize {
        self.convergence.iter().filter(|c| c.is_some()).count()
    }

    /// Statistics of the mean density, with `volume_err` set to the
    /// population spread of the per-run volumes.
    pub fn statistics(&self, shape: &Shape) -> SizeDistResult<DistributionStatistics> {
        let mut stats = distribution_statistics(
            self.bin_centers.view(),
            self.bin_edges.view(),
            self.density_mean.view(),
            shape,
        )?;
        stats.volume_err = Some(self.volumes.iter().population_std_dev());
        Ok(stats)
    }
}

/// Run `n` noise replicates of [`size_distribution`].
///
/// Parameters
/// ----------
/// - `data`: measured curve; `dI` is the noise scale of each point.
/// - `config`: configuration shared by every replicate.
/// - `n`: number of replicates (≥ 1).
/// - `seed`: RNG seed; equal seeds give identical summaries.
///
/// Errors
/// ------
/// - `SizeDistError::NoReplicates` when `n == 0`.
/// - `SizeDistError::InvalidPointValue` when some `dI` is not > 0.
/// - `SizeDistError::AllReplicatesFailed` carrying the last failure when no
///   replicate succeeded. Individual failures are logged and skipped.
pub fn run_replicates(
    data: &ScatteringData, config: &SizeDistConfig, n: usize, seed: u64,
) -> SizeDistResult<ReplicateSummary> {
    if n == 0 {
        return Err(SizeDistError::NoReplicates);
    }
    let noise = data
        .intensity
        .iter()
        .zip(data.uncertainty.iter())
        .enumerate()
        .map(|(index, (&y, &dy))| {
            Normal::new(y, dy).map_err(|_| SizeDistError::InvalidPointValue {
                what: "uncertainty",
                index,
                value: dy,
            })
        })
        .collect::<SizeDistResult<Vec<Normal>>>()?;

    let mut rng = StdRng::seed_from_u64(seed);
    let mut outcomes: Vec<SizeDistOutcome> = Vec::with_capacity(n);
    let mut convergence = Vec::with_capacity(n);
    let mut last_error = None;
    for run in 0..n {
        let intensity: Array1<f64> = noise.iter().map(|dist| dist.sample(&mut rng)).collect();
        let noisy = ScatteringData {
            q: data.q.clone(),
            intensity,
            uncertainty: data.uncertainty.clone(),
        };
        match size_distribution(&noisy, config) {
            Ok(outcome) => {
                debug!("Replicate {}/{}: chi^2 {:.3}", run + 1, n, outcome.chisq);
                convergence.push(Some((outcome.converged, outcome.iterations)));
                outcomes.push(outcome);
            }
            Err(err) => {
                warn!("Replicate {}/{} failed: {err}", run + 1, n);
                convergence.push(None);
                last_error = Some(err);
            }
        }
    }

    let Some(template) = outcomes.first() else {
        let last = last_error.unwrap_or(SizeDistError::NoReplicates);
        return Err(SizeDistError::AllReplicatesFailed { runs: n, last: Box::new(last) });
    };

    let densities = stack(outcomes.iter().map(|o| &o.bin_density));
    let fits = stack(outcomes.iter().map(|o| &o.fitted_intensity));
    let (density_mean, density_std) = column_moments(&densities);
    let (fit_mean, fit_std) = column_moments(&fits);
    let volumes = outcomes
        .iter()
        .map(|o| {
            let diameters = &o.bin_centers * 2.0;
            let cum = cumulative_trapezoid(o.bin_density.view(), diameters.view())?;
            Ok(cum.last().copied().unwrap_or(0.0))
        })
        .collect::<SizeDistResult<Vec<f64>>>()?;

    Ok(ReplicateSummary {
        runs: n,
        bin_centers: template.bin_centers.clone(),
        bin_widths: template.bin_widths.clone(),
        bin_edges: template.bin_edges.clone(),
        q_used: template.q_used.clone(),
        density_mean,
        density_std,
        fit_mean,
        fit_std,
        chisq_mean: outcomes.iter().map(|o| o.chisq).mean(),
        volumes,
        convergence,
    })
}

/// One row per run.
fn stack<'a, I>(rows: I) -> Array2<f64>
where
    I: ExactSizeIterator<Item = &'a Array1<f64>>,
{
    let n_rows = rows.len();
    let mut out: Option<Array2<f64>> = None;
    for (r, row) in rows.enumerate() {
        let target = out.get_or_insert_with(|| Array2::zeros((n_rows, row.len())));
        target.row_mut(r).assign(row);
    }
    out.unwrap_or_else(|| Array2::zeros((0, 0)))
}

fn column_moments(rows: &Array2<f64>) -> (Array1<f64>, Array1<f64>) {
    let mean = rows.axis_iter(Axis(1)).map(|col| col.iter().mean()).collect();
    let std = rows.axis_iter(Axis(1)).map(|col| col.iter().population_std_dev()).collect();
    (mean, std)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        kernel::Contrast,
        maxent::MaxEntOptions,
        size_distribution::bins::DiamRange,
    };
    use approx::assert_relative_eq;

    fn curve() -> ScatteringData {
        let q = Array1::linspace(0.01, 0.2, 15);
        let intensity = q.mapv(|qq: f64| 1.0 / (1.0 + 1e4 * qq * qq));
        let uncertainty = &intensity * 0.05;
        ScatteringData::new(q, intensity, uncertainty).unwrap()
    }

    fn config() -> SizeDistConfig {
        SizeDistConfig {
            diam_range: DiamRange::new(20.0, 160.0, 8).unwrap(),
            log_bins: false,
            contrast: Contrast::Uniform(5.0),
            sky: 1e-4,
            max_ent: MaxEntOptions::new(3, false).unwrap(),
            ..Default::default()
        }
    }

    #[test]
    // Purpose
    // -------
    // Replicates are reproducible for a fixed seed and shaped like the grid.
    //
    // Given
    // -----
    // - 4 replicates with seed 7, twice; once with seed 8.
    //
    // Expect
    // ------
    // - Equal summaries for equal seeds, different means for a new seed,
    //   non-negative spreads, 4 convergence entries, one volume per success.
    fn replicates_are_seeded() {
        let data = curve();

        let first = run_replicates(&data, &config(), 4, 7).unwrap();
        let again = run_replicates(&data, &config(), 4, 7).unwrap();
        let other = run_replicates(&data, &config(), 4, 8).unwrap();

        assert_eq!(first, again);
        assert_ne!(first.density_mean, other.density_mean);
        assert_eq!(first.runs, 4);
        assert_eq!(first.convergence.len(), 4);
        assert_eq!(first.volumes.len(), first.succeeded());
        assert_eq!(first.density_mean.len(), 8);
        assert_eq!(first.fit_std.len(), 15);
        assert!(first.density_std.iter().all(|&s| s >= 0.0));
    }

    #[test]
    // Purpose
    // -------
    // A single replicate has zero spread and its mean is that run.
    //
    // Given
    // -----
    // - n = 1.
    //
    // Expect
    // ------
    // - `density_std` all zero; `chisq_mean` equals the single χ²;
    //   `volume_err` of the statistics is 0.
    fn single_replicate_has_no_spread() {
        let summary = run_replicates(&curve(), &config(), 1, 3).unwrap();

        assert!(summary.density_std.iter().all(|&s| s == 0.0));
        let stats = summary.statistics(&Shape::Sphere).unwrap();
        assert_eq!(stats.volume_err, Some(0.0));
        assert_relative_eq!(stats.volume, summary.volumes[0], max_relative = 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // Degenerate requests are rejected.
    //
    // Given
    // -----
    // - n = 0; a zero uncertainty; a configuration every run rejects.
    //
    // Expect
    // ------
    // - `NoReplicates`; `InvalidPointValue` on the zero `dI`;
    //   `AllReplicatesFailed` carrying the driver error.
    fn replicates_reject_degenerate_requests() {
        let data = curve();
        let mut zero_dy = data.uncertainty.clone();
        zero_dy[2] = 0.0;
        let flat = ScatteringData::new(data.q.clone(), data.intensity.clone(), zero_dy).unwrap();
        let empty_window = SizeDistConfig { limits: Some((0.5, 0.6)), ..config() };

        assert_eq!(
            run_replicates(&data, &config(), 0, 1).unwrap_err(),
            SizeDistError::NoReplicates
        );
        assert!(matches!(
            run_replicates(&flat, &config(), 2, 1),
            Err(SizeDistError::InvalidPointValue { what: "uncertainty", index: 2, .. })
        ));
        assert_eq!(
            run_replicates(&data, &empty_window, 2, 1).unwrap_err(),
            SizeDistError::AllReplicatesFailed {
                runs: 2,
                last: Box::new(SizeDistError::EmptyQRange { qmin: 0.5, qmax: 0.6 }),
            }
        );
    }
}
