//! Stateless data models for the damage-series pipeline: atom identity,
//! per-dataset metric records, and the combined dose-indexed atom records the
//! engine produces and the ranking consumes.

pub mod atom;
pub mod dataset;
pub mod metrics;
