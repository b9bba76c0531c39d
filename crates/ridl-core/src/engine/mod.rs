//! # Engine Module
//!
//! The damage-series engine: configuration for a dose series, the
//! cross-dataset combine stage that builds [`combine::DoseSeries`], the
//! grouping-and-regression ranking in [`ranking`], and the progress/error
//! plumbing shared by the workflow layer.
//!
//! Stages hand each other explicit value objects: the combine stage consumes
//! the initial atom list plus per-dataset tables and produces a series; the
//! ranking consumes a series and produces an ordered ranking. Nothing here
//! performs I/O.

pub mod combine;
pub mod config;
pub mod error;
pub mod progress;
pub mod ranking;
