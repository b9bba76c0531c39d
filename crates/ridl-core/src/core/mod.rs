//! # Core Module
//!
//! Foundation layer for the damage-series pipeline: the stateless data
//! models, the classification and statistics utilities, and the readers for
//! the on-disk artifacts the pipeline consumes.
//!
//! ## Architecture
//!
//! - **Molecular identity and records** ([`models`]) - Atom identity keys,
//!   per-dataset metric records, combined dose-series records
//! - **File I/O** ([`io`]) - Coordinate file and per-dataset metric table readers
//! - **Utilities** ([`utils`]) - Residue/atom classification tables,
//!   ligand-proximity analysis, regression and summary statistics
//!
//! Everything here is free of pipeline state; the [`crate::engine`] layer
//! composes these pieces into the combine and ranking stages.

pub mod io;
pub mod models;
pub mod utils;
