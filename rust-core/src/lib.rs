//! Tight-binding electronic structure library
//!
//! This library turns a periodic lattice of sites, states and hopping amplitudes into
//! physical results: lattice reduction, Brillouin zones, band structures, densities of
//! states and supercells.

pub mod config;
pub mod errors;
pub mod interfaces;
pub mod lattice;
pub mod model;
pub mod spectrum;
pub mod symmetries;

pub use errors::{Result, TbError};
pub use interfaces::{Dimension, MeshKind};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
