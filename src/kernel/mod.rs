//! kernel — response matrix, particle shapes, and resolution operators.
//!
//! Purpose
//! -------
//! Own everything that links the size-bin "image" to predicted scattering
//! intensities: the shape library, the validated kernel matrix, the
//! forward/adjoint transform pair, and instrument resolution.
//!
//! Key behaviors
//! -------------
//! - [`Shape`] supplies `F(Q, r)` and `V(r)` for spheres, spherical shells,
//!   spheroids, and unified spheres; unknown tags fail with
//!   [`KernelError::InvalidShape`].
//! - [`Kernel::build`] fills `G[q][n] = 1e-4 · contrast · V · F²` after
//!   validating every input, so the solver never sees a malformed matrix.
//! - [`update_iq_fit`] / [`update_gqr`] are the image → data and
//!   data → image operators; both are linear and adjoint to each other.
//! - [`Resolution`] is the pluggable smearing step; [`Perfect`] and
//!   [`SlitSmear`] are provided.
//!
//! Invariants & assumptions
//! ------------------------
//! - Kernels are immutable after construction and cheap to share by
//!   reference across one solve.
//! - All operators are pure: no caching between calls, no global state.
pub mod errors;
pub mod matrix;
pub mod resolution;
pub mod shapes;

pub use self::errors::{KernelError, KernelResult};
pub use self::matrix::{Contrast, KERNEL_UNIT_SCALE, Kernel, update_gqr, update_iq_fit};
pub use self::resolution::{Perfect, Resolution, SlitSmear};
pub use self::shapes::{Shape, sphere_amplitude, sphere_volume};
