//! Power-law background estimate `I(Q) ≈ A · Q^m`.
//!
//! The fit is a weighted straight line `ln I = ln A + m ln Q` through the
//! points of a Q window, with `σ_ln = u / I` where `u` is the measured
//! uncertainty (or 1 when any uncertainty is not positive). Standard errors
//! come from the covariance scaled by the reduced residual, so they reflect
//! the actual scatter about the line; with as many points as parameters
//! they are infinite.
use crate::{
    data::ScatteringData,
    size_distribution::errors::{SizeDistError, SizeDistResult},
};
use log::debug;

/// `PowerLawFit` — fitted amplitude and exponent with standard errors.
///
/// Fields
/// ------
/// - `scale`, `scale_err`: amplitude `A` and its error.
/// - `power`: exponent `m` (fitted or fixed).
/// - `power_err`: error of `m`; `None` when `m` was fixed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PowerLawFit {
    pub scale: f64,
    pub scale_err: f64,
    pub power: f64,
    pub power_err: Option<f64>,
}

/// Fit `I = A · Q^m` on `qmin ≤ Q ≤ qmax`.
///
/// Parameters
/// ----------
/// - `data`: curve to fit.
/// - `power`: fixed exponent, or `None` to fit it.
/// - `qmin`, `qmax`: window; default to the ends of the curve.
///
/// Errors
/// ------
/// - `SizeDistError::InvalidQLimits` unless `qmin < qmax`.
/// - `SizeDistError::TooFewPoints` with fewer points than parameters.
/// - `SizeDistError::InvalidPointValue` for `Q <= 0` or `I <= 0` inside the
///   window (the logarithm is undefined).
/// - `SizeDistError::SingularBackgroundFit` when all `ln Q` coincide.
pub fn background_fit(
    data: &ScatteringData, power: Option<f64>, qmin: Option<f64>, qmax: Option<f64>,
) -> SizeDistResult<PowerLawFit> {
    let qmin = qmin.unwrap_or_else(|| data.q.iter().copied().fold(f64::INFINITY, f64::min));
    let qmax = qmax.unwrap_or_else(|| data.q.iter().copied().fold(f64::NEG_INFINITY, f64::max));
    if qmin.is_nan() || qmax.is_nan() || qmin >= qmax {
        return Err(SizeDistError::InvalidQLimits { qmin, qmax });
    }

    let use_uncertainty = data.uncertainty.iter().all(|&u| u > 0.0);
    let mut points = Vec::new();
    for i in 0..data.len() {
        let (q, y) = (data.q[i], data.intensity[i]);
        if q < qmin || q > qmax {
            continue;
        }
        if q <= 0.0 {
            return Err(SizeDistError::InvalidPointValue { what: "q", index: i, value: q });
        }
        if y <= 0.0 {
            return Err(SizeDistError::InvalidPointValue { what: "intensity", index: i, value: y });
        }
        let u = if use_uncertainty { data.uncertainty[i] } else { 1.0 };
        let sigma = u / y;
        points.push((q.ln(), y.ln(), 1.0 / (sigma * sigma)));
    }

    let needed = if power.is_some() { 1 } else { 2 };
    if points.len() < needed {
        return Err(SizeDistError::TooFewPoints { needed, found: points.len() });
    }
    let dof = (points.len() - needed) as f64;

    let fit = match power {
        Some(m) => {
            let s: f64 = points.iter().map(|p| p.2).sum();
            let b = points.iter().map(|&(x, y, w)| w * (y - m * x)).sum::<f64>() / s;
            let chisq: f64 = points.iter().map(|&(x, y, w)| w * (y - b - m * x).powi(2)).sum();
            let err_b = (residual_variance(chisq, dof) / s).sqrt();
            PowerLawFit { scale: b.exp(), scale_err: b.exp() * err_b, power: m, power_err: None }
        }
        None => {
            let (mut s, mut sx, mut sy, mut sxx, mut sxy) = (0.0, 0.0, 0.0, 0.0, 0.0);
            for &(x, y, w) in &points {
                s += w;
                sx += w * x;
                sy += w * y;
                sxx += w * x * x;
                sxy += w * x * y;
            }
            let det = s * sxx - sx * sx;
            if !(det.is_finite() && det > f64::EPSILON * s * sxx) {
                return Err(SizeDistError::SingularBackgroundFit);
            }
            let b = (sxx * sy - sx * sxy) / det;
            let m = (s * sxy - sx * sy) / det;
            let chisq: f64 = points.iter().map(|&(x, y, w)| w * (y - b - m * x).powi(2)).sum();
            let var = residual_variance(chisq, dof);
            let err_b = (sxx / det * var).sqrt();
            let err_m = (s / det * var).sqrt();
            PowerLawFit {
                scale: b.exp(),
                scale_err: b.exp() * err_b,
                power: m,
                power_err: Some(err_m),
            }
        }
    };
    debug!(
        "Power-law background on [{qmin}, {qmax}] ({} points): scale {:.4e}, power {:.4}",
        points.len(),
        fit.scale,
        fit.power
    );
    Ok(fit)
}

fn residual_variance(chisq: f64, dof: f64) -> f64 {
    if dof > 0.0 { chisq / dof } else { f64::INFINITY }
}
