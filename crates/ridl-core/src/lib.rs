//! # RIDL++ Core Library
//!
//! A library for quantifying site-specific radiation damage in macromolecular
//! crystal structures from a series of datasets collected at increasing dose.
//!
//! Given per-atom density-change metrics computed independently for each
//! dataset, the library merges them into a single dose-indexed series per
//! atom, fits linear damage trends, derives Calpha-normalised variants, and
//! ranks residue/atom types by damage susceptibility.
//!
//! ## Architectural Philosophy
//!
//! The library is organized in three layers with a strict dependency
//! direction, keeping the numerical core testable in isolation:
//!
//! - **[`core`]: The Foundation.** Stateless data models (atom identity,
//!   per-dataset records, combined series records), classification tables,
//!   regression statistics, and readers for the external artifacts the
//!   pipeline consumes.
//!
//! - **[`engine`]: The Logic Core.** The cross-dataset combine stage, the
//!   derived/normalised metric computations, and the grouping-and-ranking
//!   algorithm, each exchanging explicit value objects.
//!
//! - **[`workflows`]: The Public API.** Complete procedures built from the
//!   engine stages, with progress reporting for interactive front-ends.

pub mod core;
pub mod engine;
pub mod workflows;
