//! Modelos neutrales (ParameterSet, Entry).

pub mod entry;
pub mod params;

pub use entry::{alias_stem, Entry};
pub use params::ParameterSet;
