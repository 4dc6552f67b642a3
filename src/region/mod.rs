//! Spatial and temporal region values and their composition rules.

pub(crate) mod spatial;
pub(crate) mod temporal;
