//! Size-distribution configuration — typed settings for one driver run.
//!
//! Purpose
//! -------
//! Replace a loosely keyed settings table with one validated struct, so a
//! misspelled option cannot exist and every numeric knob is checked before
//! any kernel is built.
//!
//! Key behaviors
//! -------------
//! - [`SizeDistConfig`] bundles the Q window, intensity scale, bin grid,
//!   weighting, contrast, sky level, background, particle shape, optional
//!   initial image, resolution, solution method, and solver options.
//! - [`SizeDistConfig::validate`] checks scalars and per-point vector
//!   lengths against the full data set.
//! - Per-point settings ([`WeightFactors::PerPoint`], explicit `weights`,
//!   [`Background::PerPoint`]) are given on the *full* Q grid and sliced
//!   together with the data.
//!
//! Conventions
//! -----------
//! - `weights` are statistical weights `w = 1 / u²`; the solver sees
//!   `σ = scale / sqrt(factor · w)`.
//! - The default initial image is flat at `sky · scale / contrast[n]`.
use crate::{
    kernel::{Contrast, KernelResult, Perfect, Resolution, Shape, SlitSmear},
    maxent::MaxEntOptions,
    size_distribution::{
        bins::DiamRange,
        errors::{SizeDistError, SizeDistResult},
        weights::WeightType,
    },
};
use ndarray::{Array1, s};
use std::ops::Range;

/// Default step-length fraction of the interior-point gradient method.
pub const DEFAULT_IPG_APPROACH: f64 = 0.8;

/// Multiplier applied to the statistical weights, uniformly or per point.
#[derive(Debug, Clone, PartialEq)]
pub enum WeightFactors {
    Uniform(f64),
    PerPoint(Array1<f64>),
}

impl Default for WeightFactors {
    fn default() -> Self {
        WeightFactors::Uniform(1.0)
    }
}

/// Background subtracted from `scale · I` before solving.
#[derive(Debug, Clone, PartialEq)]
pub enum Background {
    Constant(f64),
    PerPoint(Array1<f64>),
}

impl Default for Background {
    fn default() -> Self {
        Background::Constant(0.0)
    }
}

/// Instrument resolution applied to predicted intensities.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ResolutionModel {
    #[default]
    Perfect,
    Slit {
        slit_length: f64,
    },
}

impl ResolutionModel {
    /// Operator for the Q grid actually fitted.
    pub fn build(&self, q: &Array1<f64>) -> KernelResult<Box<dyn Resolution>> {
        let operator: Box<dyn Resolution> = match *self {
            ResolutionModel::Perfect => Box::new(Perfect),
            ResolutionModel::Slit { slit_length } => Box::new(SlitSmear::new(q.clone(), slit_length)?),
        };
        Ok(operator)
    }
}

/// Solution method.
///
/// Variants
/// --------
/// - `MaxEnt`: Skilling–Bryan maximum entropy.
/// - `Ipg { approach, power }`: interior-point gradient non-negative least
///   squares; `power = None` weights residuals by `1/σ`, `Some(p)` by `Q^p`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum SizeMethod {
    #[default]
    MaxEnt,
    Ipg {
        approach: f64,
        power: Option<i32>,
    },
}

impl SizeMethod {
    /// IPG with the default approach and σ weighting.
    pub fn ipg() -> Self {
        SizeMethod::Ipg { approach: DEFAULT_IPG_APPROACH, power: None }
    }
}

/// `SizeDistConfig` — every setting of one size-distribution run.
///
/// Fields
/// ------
/// - `limits`: `Option<(f64, f64)>`
///   Inclusive Q window `(qmin, qmax)`; `None` uses the full curve.
/// - `scale`: `f64`
///   Intensity rescale factor (> 0).
/// - `diam_range`: [`DiamRange`]
///   Diameter interval and bin count.
/// - `log_bins`: `bool`
///   Logarithmic bin spacing.
/// - `weight_factors`: [`WeightFactors`]
///   Multiplier on the statistical weights (> 0).
/// - `contrast`: [`Contrast`]
///   Scattering contrast, uniform or per bin.
/// - `sky`: `f64`
///   Flat initial image level before scaling (> 0).
/// - `weights`: `Option<Array1<f64>>`
///   Explicit statistical weights on the full Q grid; `None` derives them
///   with `weight_type`.
/// - `weight_type`: [`WeightType`]
///   Uncertainty model when `weights` is `None`.
/// - `background`: [`Background`]
///   Background subtracted from the scaled data and added back to the fit.
/// - `model`: [`Shape`]
///   Particle shape of the kernel.
/// - `initial_bins`: `Option<Array1<f64>>`
///   Explicit initial image (length `n_bins`, > 0); overrides `sky`.
/// - `resolution`: [`ResolutionModel`]
/// - `method`: [`SizeMethod`]
/// - `max_ent`: [`MaxEntOptions`]
///   Iteration cap (shared by both methods) and reporting.
#[derive(Debug, Clone, PartialEq)]
pub struct SizeDistConfig {
    pub limits: Option<(f64, f64)>,
    pub scale: f64,
    pub diam_range: DiamRange,
    pub log_bins: bool,
    pub weight_factors: WeightFactors,
    pub contrast: Contrast,
    pub sky: f64,
    pub weights: Option<Array1<f64>>,
    pub weight_type: WeightType,
    pub background: Background,
    pub model: Shape,
    pub initial_bins: Option<Array1<f64>>,
    pub resolution: ResolutionModel,
    pub method: SizeMethod,
    pub max_ent: MaxEntOptions,
}

impl Default for SizeDistConfig {
    fn default() -> Self {
        SizeDistConfig {
            limits: None,
            scale: 1.0,
            diam_range: DiamRange::default(),
            log_bins: true,
            weight_factors: WeightFactors::default(),
            contrast: Contrast::default(),
            sky: 1e-6,
            weights: None,
            weight_type: WeightType::default(),
            background: Background::default(),
            model: Shape::default(),
            initial_bins: None,
            resolution: ResolutionModel::default(),
            method: SizeMethod::default(),
            max_ent: MaxEntOptions::default(),
        }
    }
}

impl SizeDistConfig {
    /// Check every setting against a data set of `n_points` points.
    ///
    /// Errors
    /// ------
    /// - `SizeDistError::InvalidSetting` for non-finite or out-of-range
    ///   scalars (`scale`, `sky`, uniform factor, constant background, IPG
    ///   `approach`/`power`, `max_ent.iter_max`).
    /// - `SizeDistError::InvalidQLimits` unless `qmin < qmax`.
    /// - `SizeDistError::LengthMismatch` / `SizeDistError::InvalidPointValue`
    ///   for per-point vectors and `initial_bins`.
    /// - `SizeDistError::InvalidDiamRange` / `SizeDistError::InvalidBinCount`.
    pub fn validate(&self, n_points: usize) -> SizeDistResult<()> {
        self.diam_range.validate()?;
        positive("scale", self.scale)?;
        positive("sky", self.sky)?;
        if self.max_ent.iter_max == 0 {
            return Err(SizeDistError::InvalidSetting {
                name: "iter_max",
                value: 0.0,
                reason: "must be >= 1",
            });
        }
        if let Some((qmin, qmax)) = self.limits {
            if !qmin.is_finite() || !qmax.is_finite() || qmax <= qmin {
                return Err(SizeDistError::InvalidQLimits { qmin, qmax });
            }
        }

        match &self.weight_factors {
            WeightFactors::Uniform(value) => positive("weight factor", *value)?,
            WeightFactors::PerPoint(values) => {
                check_per_point("weight factors", values, n_points, |v| v > 0.0)?
            }
        }
        if let Some(weights) = &self.weights {
            check_per_point("weights", weights, n_points, |v| v > 0.0)?;
        }
        match &self.background {
            Background::Constant(value) => {
                if !value.is_finite() {
                    return Err(SizeDistError::InvalidSetting {
                        name: "background",
                        value: *value,
                        reason: "must be finite",
                    });
                }
            }
            Background::PerPoint(values) => {
                check_per_point("background", values, n_points, |_| true)?
            }
        }
        if let Some(first) = &self.initial_bins {
            check_per_point("initial bins", first, self.diam_range.n_bins, |v| v > 0.0)?;
        }
        if let SizeMethod::Ipg { approach, power } = self.method {
            if !approach.is_finite() || approach <= 0.0 || approach > 1.0 {
                return Err(SizeDistError::InvalidSetting {
                    name: "IPG approach",
                    value: approach,
                    reason: "must lie in (0, 1]",
                });
            }
            if let Some(p) = power {
                if p < 0 {
                    return Err(SizeDistError::InvalidSetting {
                        name: "IPG power",
                        value: p as f64,
                        reason: "must be >= 0; use None for sigma weighting",
                    });
                }
            }
        }
        Ok(())
    }

    /// Weight factors on the fitted window.
    pub(crate) fn factors_in(&self, range: &Range<usize>) -> Array1<f64> {
        match &self.weight_factors {
            WeightFactors::Uniform(value) => Array1::from_elem(range.len(), *value),
            WeightFactors::PerPoint(values) => values.slice(s![range.start..range.end]).to_owned(),
        }
    }

    /// Background on the fitted window.
    pub(crate) fn background_in(&self, range: &Range<usize>) -> Array1<f64> {
        match &self.background {
            Background::Constant(value) => Array1::from_elem(range.len(), *value),
            Background::PerPoint(values) => values.slice(s![range.start..range.end]).to_owned(),
        }
    }

    /// Initial image: explicit bins or flat `sky · scale / contrast[n]`.
    pub(crate) fn first_bins(&self, n_bins: usize) -> Array1<f64> {
        match &self.initial_bins {
            Some(first) => first.clone(),
            None => Array1::from_shape_fn(n_bins, |n| self.sky * self.scale / self.contrast.at(n)),
        }
    }
}

fn positive(name: &'static str, value: f64) -> SizeDistResult<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(SizeDistError::InvalidSetting { name, value, reason: "must be finite and > 0" });
    }
    Ok(())
}

fn check_per_point<F>(
    what: &'static str, values: &Array1<f64>, expected: usize, accept: F,
) -> SizeDistResult<()>
where
    F: Fn(f64) -> bool,
{
    if values.len() != expected {
        return Err(SizeDistError::LengthMismatch { what, expected, found: values.len() });
    }
    match values.iter().enumerate().find(|(_, v)| !v.is_finite() || !accept(**v)) {
        Some((index, &value)) => Err(SizeDistError::InvalidPointValue { what, index, value }),
        None => Ok(()),
    }
}
