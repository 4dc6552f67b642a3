//! Pipeline stages built on the negotiation protocol.

pub(crate) mod average;
pub(crate) mod reference_normalize;
pub(crate) mod scanline;
pub(crate) mod support_window;
pub(crate) mod volume_to_frames;
