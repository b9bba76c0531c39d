//! Readers for the external artifacts the pipeline consumes: the initial
//! coordinate file and the per-dataset metric tables produced by map
//! processing.

pub mod pdb;
pub mod table;
