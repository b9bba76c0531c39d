pub mod identifiers;
pub mod proximity;
pub mod stats;
