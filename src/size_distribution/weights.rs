//! Per-point uncertainty models used when no explicit weights are given.
use crate::size_distribution::errors::{SizeDistError, SizeDistResult};
use ndarray::{Array1, ArrayView1};

/// `WeightType` — how per-point uncertainties `u` are derived from a curve.
///
/// Variants
/// --------
/// - `None`: `u = 1`.
/// - `Uncertainty`: `u = dI` (measured uncertainty).
/// - `SqrtIntensity`: `u = sqrt(I)`.
/// - `PercentIntensity(p)`: `u = |p / 100 · I|`.
///
/// Statistical weights are `w = 1 / u²`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum WeightType {
    None,
    #[default]
    Uncertainty,
    SqrtIntensity,
    PercentIntensity(f64),
}

impl WeightType {
    /// Per-point uncertainties for `intensity` / `uncertainty`.
    ///
    /// Errors
    /// ------
    /// - `SizeDistError::InvalidSetting` for a non-finite or non-positive
    ///   percentage.
    /// - `SizeDistError::InvalidPointValue` when a derived uncertainty is not
    ///   finite and strictly positive (e.g. zero `dI` or negative `I` under
    ///   `SqrtIntensity`).
    pub fn uncertainties(
        &self, intensity: ArrayView1<f64>, uncertainty: ArrayView1<f64>,
    ) -> SizeDistResult<Array1<f64>> {
        let u = match *self {
            WeightType::None => Array1::ones(intensity.len()),
            WeightType::Uncertainty => uncertainty.to_owned(),
            WeightType::SqrtIntensity => intensity.mapv(f64::sqrt),
            WeightType::PercentIntensity(p) => {
                if !p.is_finite() || p <= 0.0 {
                    return Err(SizeDistError::InvalidSetting {
                        name: "weight percent",
                        value: p,
                        reason: "must be finite and > 0",
                    });
                }
                intensity.mapv(|v| (p / 100.0 * v).abs())
            }
        };
        if let Some((index, &value)) =
            u.iter().enumerate().find(|(_, v)| !v.is_finite() || **v <= 0.0)
        {
            return Err(SizeDistError::InvalidPointValue { what: "uncertainty", index, value });
        }
        Ok(u)
    }

    /// Statistical weights `1 / u²`.
    pub fn weights(
        &self, intensity: ArrayView1<f64>, uncertainty: ArrayView1<f64>,
    ) -> SizeDistResult<Array1<f64>> {
        Ok(self.uncertainties(intensity, uncertainty)?.mapv(|u| 1.0 / (u * u)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    // Purpose
    // -------
    // Each weight type produces the documented uncertainty.
    //
    // Given
    // -----
    // - I = (4, 9), dI = (0.5, 2).
    //
    // Expect
    // ------
    // - None → 1, Uncertainty → dI, SqrtIntensity → (2, 3),
    //   PercentIntensity(10) → (0.4, 0.9); weights are 1/u².
    fn weight_types_follow_definitions() {
        let i = array![4.0, 9.0];
        let di = array![0.5, 2.0];

        assert_eq!(WeightType::None.uncertainties(i.view(), di.view()).unwrap(), array![1.0, 1.0]);
        assert_eq!(WeightType::Uncertainty.uncertainties(i.view(), di.view()).unwrap(), di);
        assert_eq!(
            WeightType::SqrtIntensity.uncertainties(i.view(), di.view()).unwrap(),
            array![2.0, 3.0]
        );
        let pct = WeightType::PercentIntensity(10.0).uncertainties(i.view(), di.view()).unwrap();
        assert_relative_eq!(pct[0], 0.4, max_relative = 1e-12);
        assert_relative_eq!(pct[1], 0.9, max_relative = 1e-12);
        let w = WeightType::Uncertainty.weights(i.view(), di.view()).unwrap();
        assert_relative_eq!(w[0], 4.0);
        assert_relative_eq!(w[1], 0.25);
    }

    #[test]
    // Purpose
    // -------
    // Zero uncertainties cannot become infinite weights.
    //
    // Given
    // -----
    // - dI with a zero entry; a zero percentage.
    //
    // Expect
    // ------
    // - `InvalidPointValue` at the zero; `InvalidSetting` for the percent.
    fn weight_types_reject_zero_uncertainty() {
        let i = array![4.0, 9.0];
        let di = array![0.5, 0.0];

        assert_eq!(
            WeightType::Uncertainty.uncertainties(i.view(), di.view()).unwrap_err(),
            SizeDistError::InvalidPointValue { what: "uncertainty", index: 1, value: 0.0 }
        );
        assert!(matches!(
            WeightType::PercentIntensity(0.0).uncertainties(i.view(), di.view()),
            Err(SizeDistError::InvalidSetting { .. })
        ));
    }
}
