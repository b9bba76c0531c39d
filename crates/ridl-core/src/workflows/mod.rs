//! # Workflows Module
//!
//! The public, highest-level entry points of the library. A workflow ties
//! the [`crate::core`] models and [`crate::engine`] stages together into one
//! complete scientific procedure, reporting progress along the way.

pub mod series;
