//! Temporal frame sequences.

pub(crate) mod frame_sequence;
