//! Minimal N-dimensional image collaborator used by the pipeline stages.

pub(crate) mod buffer;
pub(crate) mod document;
pub(crate) mod pixel;
pub(crate) mod slice;
