//! data — validated scattering curves and their text input.
//!
//! Purpose
//! -------
//! Give the rest of the crate a single, already-validated representation of
//! a measured 1D small-angle scattering curve so that the kernel builder,
//! the MaxEnt solver, and the driver never re-check raw input.
//!
//! Key behaviors
//! -------------
//! - [`ScatteringData`] owns `Q`, `I(Q)`, and `dI(Q)` and enforces shape,
//!   finiteness, sign, and ordering invariants on construction.
//! - [`read_three_column`] / [`ScatteringData::from_text`] parse the plain
//!   `Q I dI` table format, skipping non-numeric rows.
//!
//! Conventions
//! -----------
//! - Q is in inverse length units consistent with the radii of the size
//!   bins (Å⁻¹ with Å radii is the usual pairing).
//! - This module performs file I/O only in [`read_three_column`]; nothing
//!   else touches the filesystem.
pub mod errors;
pub mod io;
pub mod scattering;

pub use self::errors::{DataError, DataResult};
pub use self::io::read_three_column;
pub use self::scattering::ScatteringData;
