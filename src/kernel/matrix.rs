//! Kernel matrix and the image/data transform pair.
//!
//! Purpose
//! -------
//! Assemble the dense response matrix `G` that maps size-bin weights
//! ("image space") to predicted scattering intensities ("data space"), and
//! expose the two linear operators the MaxEnt loop is built on.
//!
//! Key behaviors
//! -------------
//! - [`Kernel::build`] validates Q, radii, and contrast, then fills
//!   `G[q][n] = 1e-4 · contrast[n] · V(r_n) · F(Q_q, r_n)²`.
//! - [`update_iq_fit`] maps an image to data space (`G · image`) and passes
//!   the result through a [`Resolution`] operator.
//! - [`update_gqr`] maps a data-space vector back to image space
//!   (`Gᵀ · data`).
//!
//! Invariants & assumptions
//! ------------------------
//! - `G` is stored row-major as `M × N` (rows = Q points, columns = bins)
//!   and is never mutated after construction.
//! - Every entry of `G` is finite; [`Kernel::from_matrix`] re-checks this
//!   for caller-supplied matrices.
//! - With non-negative contrast every entry of `G` is non-negative.
//!
//! Conventions
//! -----------
//! - The `1e-4` factor converts `Δρ²` in 10¹⁰ cm⁻² units and volumes in Å³
//!   into intensities in cm⁻¹.
//!
//! Testing notes
//! -------------
//! - Unit tests check non-negativity, the Q → 0 column values, the adjoint
//!   identity `⟨G x, y⟩ = ⟨x, Gᵀ y⟩`, and dimension errors.
use crate::kernel::{
    errors::{KernelError, KernelResult},
    resolution::Resolution,
    shapes::Shape,
};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

/// Unit-conversion factor between `Δρ² · V` and intensity in cm⁻¹.
pub const KERNEL_UNIT_SCALE: f64 = 1e-4;

/// Scattering contrast `|Δρ|²`, shared by all bins or given per bin.
#[derive(Debug, Clone, PartialEq)]
pub enum Contrast {
    Uniform(f64),
    PerBin(Array1<f64>),
}

impl Contrast {
    /// Contrast of bin `n`.
    pub fn at(&self, n: usize) -> f64 {
        match self {
            Contrast::Uniform(value) => *value,
            Contrast::PerBin(values) => values[n],
        }
    }

    /// Check finiteness and, for per-bin contrast, the length.
    pub fn validate(&self, n_bins: usize) -> KernelResult<()> {
        match self {
            Contrast::Uniform(value) => {
                if !value.is_finite() {
                    return Err(KernelError::InvalidContrast { index: 0, value: *value });
                }
            }
            Contrast::PerBin(values) => {
                if values.len() != n_bins {
                    return Err(KernelError::ContrastLengthMismatch {
                        expected: n_bins,
                        found: values.len(),
                    });
                }
                if let Some((index, &value)) =
                    values.iter().enumerate().find(|(_, v)| !v.is_finite())
                {
                    return Err(KernelError::InvalidContrast { index, value });
                }
            }
        }
        Ok(())
    }
}

impl Default for Contrast {
    fn default() -> Self {
        Contrast::Uniform(1.0)
    }
}

/// `Kernel` — validated `M × N` response matrix.
///
/// Fields
/// ------
/// - `matrix`: `Array2<f64>`
///   `G[q][n]`, intensity at `Q[q]` produced by unit weight in bin `n`.
#[derive(Debug, Clone, PartialEq)]
pub struct Kernel {
    matrix: Array2<f64>,
}

impl Kernel {
    /// Build `G` for the given Q grid, bin radii, contrast, and shape.
    ///
    /// Parameters
    /// ----------
    /// - `q`: `ArrayView1<f64>`
    ///   Scattering vectors, finite and ≥ 0 (length `M`).
    /// - `radii`: `ArrayView1<f64>`
    ///   Bin-centre radii, finite and > 0 (length `N`).
    /// - `contrast`: `&Contrast`
    ///   Uniform or per-bin `|Δρ|²`.
    /// - `shape`: `&Shape`
    ///   Form factor and volume model.
    ///
    /// Errors
    /// ------
    /// - `KernelError::EmptyKernel` when `M == 0` or `N == 0`.
    /// - `KernelError::InvalidQ`, `KernelError::InvalidRadius`.
    /// - `KernelError::ContrastLengthMismatch`, `KernelError::InvalidContrast`.
    /// - `KernelError::NonFiniteKernel` if a form factor overflows.
    pub fn build(
        q: ArrayView1<f64>, radii: ArrayView1<f64>, contrast: &Contrast, shape: &Shape,
    ) -> KernelResult<Self> {
        if q.is_empty() || radii.is_empty() {
            return Err(KernelError::EmptyKernel { rows: q.len(), cols: radii.len() });
        }
        for (index, &value) in q.iter().enumerate() {
            if !value.is_finite() || value < 0.0 {
                return Err(KernelError::InvalidQ { index, value });
            }
        }
        for (index, &value) in radii.iter().enumerate() {
            if !value.is_finite() || value <= 0.0 {
                return Err(KernelError::InvalidRadius { index, value });
            }
        }
        contrast.validate(radii.len())?;

        let volumes: Array1<f64> = radii.mapv(|r| shape.volume(r));
        let matrix = Array2::from_shape_fn((q.len(), radii.len()), |(i, n)| {
            let amplitude = shape.form_factor(q[i], radii[n]);
            KERNEL_UNIT_SCALE * contrast.at(n) * volumes[n] * amplitude * amplitude
        });
        Kernel::from_matrix(matrix)
    }

    /// Wrap a precomputed `M × N` matrix.
    ///
    /// Errors
    /// ------
    /// - `KernelError::EmptyKernel` or `KernelError::NonFiniteKernel`.
    pub fn from_matrix(matrix: Array2<f64>) -> KernelResult<Self> {
        let (rows, cols) = matrix.dim();
        if rows == 0 || cols == 0 {
            return Err(KernelError::EmptyKernel { rows, cols });
        }
        if let Some(((row, col), &value)) = matrix.indexed_iter().find(|(_, v)| !v.is_finite()) {
            return Err(KernelError::NonFiniteKernel { row, col, value });
        }
        Ok(Kernel { matrix })
    }

    /// Number of Q points `M`.
    pub fn n_q(&self) -> usize {
        self.matrix.nrows()
    }

    /// Number of size bins `N`.
    pub fn n_bins(&self) -> usize {
        self.matrix.ncols()
    }

    pub fn matrix(&self) -> ArrayView2<'_, f64> {
        self.matrix.view()
    }
}

/// Data space → image space: `Gᵀ · data`.
///
/// Errors
/// ------
/// - `KernelError::DimensionMismatch` when `data.len() != M`.
pub fn update_gqr(data: ArrayView1<f64>, kernel: &Kernel) -> KernelResult<Array1<f64>> {
    if data.len() != kernel.n_q() {
        return Err(KernelError::DimensionMismatch {
            operator: "update_gqr",
            expected: kernel.n_q(),
            found: data.len(),
        });
    }
    Ok(kernel.matrix.t().dot(&data))
}

/// Image space → data space: `resolution(G · image)`.
///
/// Errors
/// ------
/// - `KernelError::DimensionMismatch` when `image.len() != N`.
/// - Whatever the resolution operator returns.
pub fn update_iq_fit<R: Resolution + ?Sized>(
    image: ArrayView1<f64>, kernel: &Kernel, resolution: &R,
) -> KernelResult<Array1<f64>> {
    if image.len() != kernel.n_bins() {
        return Err(KernelError::DimensionMismatch {
            operator: "update_iq_fit",
            expected: kernel.n_bins(),
            found: image.len(),
        });
    }
    let ideal = kernel.matrix.dot(&image);
    resolution.apply(ideal.view())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::{resolution::Perfect, shapes::sphere_volume};
    use approx::assert_relative_eq;
    use ndarray::{Array1, array};

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // Kernel assembly and the forward/adjoint transform pair.
    // -------------------------------------------------------------------------

    fn q_grid() -> Array1<f64> {
        Array1::linspace(0.01, 0.2, 20)
    }

    fn radii() -> Array1<f64> {
        Array1::linspace(10.0, 80.0, 15)
    }

    #[test]
    // Purpose
    // -------
    // With non-negative contrast every kernel entry is non-negative.
    //
    // Given
    // -----
    // - 20 Q points, 15 radii, uniform contrast 5 and a per-bin contrast
    //   with a zero entry, for every shape.
    //
    // Expect
    // ------
    // - All `G[q][n] >= 0` and the shape is (20, 15).
    fn build_is_non_negative() {
        let per_bin = Contrast::PerBin(Array1::from_shape_fn(15, |i| (i % 3) as f64));
        let shapes = [
            Shape::Sphere,
            Shape::spherical_shell(0.7).unwrap(),
            Shape::spheroid(3.0).unwrap(),
            Shape::UnifiedSphere,
        ];

        for shape in shapes.iter() {
            for contrast in [Contrast::Uniform(5.0), per_bin.clone()].iter() {
                let kernel = Kernel::build(q_grid().view(), radii().view(), contrast, shape)
                    .expect("valid kernel");
                assert_eq!(kernel.matrix().dim(), (20, 15));
                assert!(kernel.matrix().iter().all(|&g| g >= 0.0), "{}", shape.name());
            }
        }
    }

    #[test]
    // Purpose
    // -------
    // At Q = 0 the sphere kernel equals `1e-4 · contrast · V(r)`.
    //
    // Given
    // -----
    // - Q = [0, 0.05], radii [10, 20], contrast 2.
    //
    // Expect
    // ------
    // - Row 0 is exactly the volume term; row 1 is strictly smaller.
    fn build_q_zero_row_is_volume_term() {
        let kernel = Kernel::build(
            array![0.0, 0.05].view(),
            array![10.0, 20.0].view(),
            &Contrast::Uniform(2.0),
            &Shape::Sphere,
        )
        .unwrap();

        for (n, &r) in [10.0, 20.0].iter().enumerate() {
            assert_relative_eq!(kernel.matrix()[[0, n]], 2e-4 * sphere_volume(r));
            assert!(kernel.matrix()[[1, n]] < kernel.matrix()[[0, n]]);
        }
    }

    #[test]
    // Purpose
    // -------
    // Malformed inputs fail before any matrix is returned.
    //
    // Given
    // -----
    // - A negative Q, a zero radius, and a per-bin contrast of wrong length.
    //
    // Expect
    // ------
    // - `InvalidQ`, `InvalidRadius`, `ContrastLengthMismatch`.
    fn build_rejects_bad_inputs() {
        let c = Contrast::Uniform(1.0);

        assert_eq!(
            Kernel::build(array![0.1, -0.1].view(), radii().view(), &c, &Shape::Sphere)
                .unwrap_err(),
            KernelError::InvalidQ { index: 1, value: -0.1 }
        );
        assert_eq!(
            Kernel::build(q_grid().view(), array![5.0, 0.0].view(), &c, &Shape::Sphere)
                .unwrap_err(),
            KernelError::InvalidRadius { index: 1, value: 0.0 }
        );
        assert_eq!(
            Kernel::build(
                q_grid().view(),
                radii().view(),
                &Contrast::PerBin(array![1.0, 2.0]),
                &Shape::Sphere
            )
            .unwrap_err(),
            KernelError::ContrastLengthMismatch { expected: 15, found: 2 }
        );
    }

    #[test]
    // Purpose
    // -------
    // The transforms are adjoint: ⟨G x, y⟩ = ⟨x, Gᵀ y⟩.
    //
    // Given
    // -----
    // - The sphere kernel and deterministic, sign-varying x (N) and y (M).
    //
    // Expect
    // ------
    // - Both inner products agree to 1e-12 relative.
    fn transforms_are_adjoint() {
        let kernel =
            Kernel::build(q_grid().view(), radii().view(), &Contrast::Uniform(5.0), &Shape::Sphere)
                .unwrap();
        let x = Array1::from_shape_fn(15, |i| ((i as f64) * 0.7).sin() + 0.3);
        let y = Array1::from_shape_fn(20, |i| ((i as f64) * 1.3).cos());

        let gx = update_iq_fit(x.view(), &kernel, &Perfect).unwrap();
        let gty = update_gqr(y.view(), &kernel).unwrap();

        assert_relative_eq!(gx.dot(&y), x.dot(&gty), max_relative = 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // Zero vectors are fine; wrong lengths are not.
    //
    // Given
    // -----
    // - A zero image of length N, and vectors of length N + 1 / M − 1.
    //
    // Expect
    // ------
    // - A zero fit; `DimensionMismatch` naming the operator otherwise.
    fn transforms_check_dimensions() {
        let kernel =
            Kernel::build(q_grid().view(), radii().view(), &Contrast::Uniform(1.0), &Shape::Sphere)
                .unwrap();

        let zero_fit = update_iq_fit(Array1::zeros(15).view(), &kernel, &Perfect).unwrap();
        assert!(zero_fit.iter().all(|&v| v == 0.0));

        assert_eq!(
            update_iq_fit(Array1::zeros(16).view(), &kernel, &Perfect).unwrap_err(),
            KernelError::DimensionMismatch { operator: "update_iq_fit", expected: 15, found: 16 }
        );
        assert_eq!(
            update_gqr(Array1::zeros(19).view(), &kernel).unwrap_err(),
            KernelError::DimensionMismatch { operator: "update_gqr", expected: 20, found: 19 }
        );
    }
}
