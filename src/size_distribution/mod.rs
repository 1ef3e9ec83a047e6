//! size_distribution — from a scattering curve to a particle size distribution.
//!
//! Purpose
//! -------
//! Provide the user-facing workflow around the MaxEnt solver: build the size
//! bins and kernel from a typed configuration, derive the uncertainties the
//! solver sees, run MaxEnt (or the IPG alternative), and report the density
//! per size bin together with the fit and summary statistics.
//!
//! Key behaviors
//! -------------
//! - [`size_distribution`] is the single-run driver returning a
//!   [`SizeDistOutcome`].
//! - [`run_replicates`] repeats the driver on noise-perturbed copies of the
//!   data and reduces the runs to a mean and spread.
//! - [`distribution_statistics`] and [`background_fit`] are standalone
//!   helpers for post- and pre-processing.
//!
//! Conventions
//! -----------
//! - Bin grids are in radius; bin edges and widths are half the diameter
//!   grid.
//! - Densities are per unit *diameter*: `image / (2 · width)`.
//! - Per-point settings are specified on the full Q grid of the data.
pub mod background;
pub mod bins;
pub mod config;
pub mod driver;
pub mod errors;
pub mod ipg;
pub mod replicates;
pub mod statistics;
pub mod weights;

pub use self::background::{PowerLawFit, background_fit};
pub use self::bins::{BinGrid, DiamRange};
pub use self::config::{
    Background, DEFAULT_IPG_APPROACH, ResolutionModel, SizeDistConfig, SizeMethod, WeightFactors,
};
pub use self::driver::{SizeDistOutcome, size_distribution};
pub use self::errors::{SizeDistError, SizeDistResult};
pub use self::ipg::{IpgOutcome, ipg};
pub use self::replicates::{ReplicateSummary, run_replicates};
pub use self::statistics::{DistributionStatistics, cumulative_trapezoid, distribution_statistics};
pub use self::weights::WeightType;
