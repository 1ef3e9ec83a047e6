//! Particle shapes: scattering amplitude and volume per size bin.
//!
//! Purpose
//! -------
//! Provide the form-factor amplitude `F(Q, r)` and particle volume `V(r)`
//! used to fill the kernel matrix `G[q][n] = 1e-4 · Δρ² · V(r_n) · F(Q_q, r_n)²`.
//!
//! Key behaviors
//! -------------
//! - [`Shape::Sphere`]: `F = 3 (sin x − x cos x) / x³` with `x = Q r`.
//! - [`Shape::SphericalShell`]: difference of two sphere amplitudes; the
//!   ratio selects the inner (`< 1`) or outer (`≥ 1`) radius.
//! - [`Shape::Spheroid`]: orientation average of sphere amplitudes over 50
//!   equally spaced `cos θ` samples; collapses to a sphere for
//!   `0.99 < AR < 1.01`.
//! - [`Shape::UnifiedSphere`]: Guinier term joined to a Porod tail through
//!   the `erf`-scaled `Q*` of the unified model.
//!
//! Invariants & assumptions
//! ------------------------
//! - `Q ≥ 0` and `r > 0` are checked by the kernel builder, not here.
//! - `x = 0` returns the exact limit 1.0. For `x < 1e-4` the sphere
//!   amplitude uses `1 − x²/10`, which avoids the catastrophic cancellation
//!   of `sin x − x cos x` at tiny arguments.
//!
//! Conventions
//! -----------
//! - Radii and `1/Q` share the same length unit (Å is customary).
//! - Tags parse case-insensitively; parameterised shapes take their
//!   parameter after a colon, e.g. `"spheroid:2.5"` or `"Spherical shell:0.8"`.
use crate::kernel::errors::{KernelError, KernelResult};
use statrs::function::erf::erf;
use std::f64::consts::PI;
use std::str::FromStr;

/// Below this `Q r` the sphere amplitude switches to its Taylor expansion.
pub const SMALL_QR: f64 = 1e-4;

/// Number of `cos θ` samples in the spheroid orientation average.
pub const SPHEROID_ORIENTATIONS: usize = 50;

/// Shape model used to fill the kernel.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Shape {
    #[default]
    Sphere,
    SphericalShell { ratio: f64 },
    Spheroid { aspect_ratio: f64 },
    UnifiedSphere,
}

impl Shape {
    /// Spherical shell whose second radius is `ratio · r`. Negative ratios
    /// are clamped to 0.
    ///
    /// Errors
    /// ------
    /// - `KernelError::InvalidShapeParameter` when `ratio` is not finite.
    pub fn spherical_shell(ratio: f64) -> KernelResult<Self> {
        if !ratio.is_finite() {
            return Err(KernelError::InvalidShapeParameter {
                name: "spherical shell ratio",
                value: ratio,
                reason: "must be finite",
            });
        }
        Ok(Shape::SphericalShell { ratio: ratio.max(0.0) })
    }

    /// Spheroid with polar radius `aspect_ratio · r`.
    ///
    /// Errors
    /// ------
    /// - `KernelError::InvalidShapeParameter` when the aspect ratio is not
    ///   finite and strictly positive.
    pub fn spheroid(aspect_ratio: f64) -> KernelResult<Self> {
        if !aspect_ratio.is_finite() || aspect_ratio <= 0.0 {
            return Err(KernelError::InvalidShapeParameter {
                name: "spheroid aspect ratio",
                value: aspect_ratio,
                reason: "must be finite and > 0",
            });
        }
        Ok(Shape::Spheroid { aspect_ratio })
    }

    /// Canonical tag, as accepted by [`FromStr`].
    pub fn name(&self) -> &'static str {
        match self {
            Shape::Sphere => "Sphere",
            Shape::SphericalShell { .. } => "Spherical shell",
            Shape::Spheroid { .. } => "Spheroid",
            Shape::UnifiedSphere => "Unified sphere",
        }
    }

    /// Scattering amplitude `F(Q, r)`, normalised to 1 at `Q = 0`.
    pub fn form_factor(&self, q: f64, r: f64) -> f64 {
        match *self {
            Shape::Sphere => sphere_amplitude(q * r),
            Shape::SphericalShell { ratio } => {
                if ratio < 1.0 {
                    sphere_amplitude(q * r) - sphere_amplitude(q * r * ratio)
                } else {
                    sphere_amplitude(q * r * ratio) - sphere_amplitude(q * r)
                }
            }
            Shape::Spheroid { aspect_ratio } => spheroid_amplitude(q, r, aspect_ratio),
            Shape::UnifiedSphere => unified_sphere_amplitude(q, r),
        }
    }

    /// Particle volume `V(r)`.
    pub fn volume(&self, r: f64) -> f64 {
        match *self {
            Shape::Sphere | Shape::UnifiedSphere => sphere_volume(r),
            Shape::SphericalShell { ratio } => {
                if ratio < 1.0 {
                    sphere_volume(r) - sphere_volume(r * ratio)
                } else {
                    sphere_volume(r * ratio) - sphere_volume(r)
                }
            }
            Shape::Spheroid { aspect_ratio } => aspect_ratio * sphere_volume(r),
        }
    }
}

impl FromStr for Shape {
    type Err = KernelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (tag, param) = match s.split_once(':') {
            Some((tag, param)) => (tag, Some(param.trim())),
            None => (s, None),
        };
        let tag = tag.trim().to_lowercase();

        let parse_param = |name: &'static str| -> KernelResult<f64> {
            let raw = param.ok_or(KernelError::MissingShapeParameter { name })?;
            raw.parse::<f64>().map_err(|_| KernelError::InvalidShapeParameter {
                name,
                value: f64::NAN,
                reason: "not a number",
            })
        };

        match tag.as_str() {
            "sphere" => Ok(Shape::Sphere),
            "unified sphere" => Ok(Shape::UnifiedSphere),
            "spherical shell" => Shape::spherical_shell(parse_param("Spherical shell")?),
            "spheroid" => match param {
                // Without an aspect ratio the spheroid is the sphere-like default.
                None => Shape::spheroid(1.0),
                Some(_) => Shape::spheroid(parse_param("Spheroid")?),
            },
            _ => Err(KernelError::InvalidShape { name: s.to_string() }),
        }
    }
}

/// Sphere amplitude `3 (sin x − x cos x) / x³`.
pub fn sphere_amplitude(qr: f64) -> f64 {
    if qr == 0.0 {
        return 1.0;
    }
    if qr.abs() < SMALL_QR {
        return 1.0 - qr * qr / 10.0;
    }
    3.0 * (qr.sin() - qr * qr.cos()) / qr.powi(3)
}

/// Sphere volume `4/3 π r³`.
pub fn sphere_volume(r: f64) -> f64 {
    4.0 / 3.0 * PI * r.powi(3)
}

fn spheroid_amplitude(q: f64, r: f64, aspect_ratio: f64) -> f64 {
    if aspect_ratio > 0.99 && aspect_ratio < 1.01 {
        return sphere_amplitude(q * r);
    }
    let n = SPHEROID_ORIENTATIONS;
    let step = 1.0 / (n - 1) as f64;
    let sum_sq: f64 = (0..n)
        .map(|i| {
            let c = i as f64 * step;
            let r_eff = r * (1.0 + (aspect_ratio * aspect_ratio - 1.0) * c * c).sqrt();
            sphere_amplitude(q * r_eff).powi(2)
        })
        .sum();
    (sum_sq / n as f64).sqrt()
}

fn unified_sphere_amplitude(q: f64, r: f64) -> f64 {
    if q == 0.0 {
        return 1.0;
    }
    let rg = (3.0_f64 / 5.0).sqrt() * r;
    let b = PI * 1.62 / rg.powi(4);
    let q_star = q / erf(q * rg / 6.0_f64.sqrt()).powi(3);
    ((-q * q * rg * rg / 3.0).exp() + b / q_star.powi(4)).sqrt()
}
