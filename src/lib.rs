//! Voxframe converts N-dimensional volumes into frame sequences with demand-driven region
//! negotiation.
//!
//! Every stage implements the same three-pass protocol before it touches pixels:
//!
//! - Describe the largest output it could produce ([`Stage::compute_output_information`])
//! - Resolve the downstream request ([`Stage::compute_output_requested_region`])
//! - Push that request back onto its inputs ([`Stage::compute_input_requested_region`])
//!
//! [`PipelineRunner`] sequences the passes and then calls [`Stage::execute`] with a shared
//! [`ExecutionContext`].
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation;

pub(crate) mod image;
pub(crate) mod pipeline;
pub(crate) mod region;
pub(crate) mod stages;
pub(crate) mod video;

pub use crate::foundation::error::{VoxframeError, VoxframeResult};
pub use crate::image::buffer::Image;
pub use crate::image::document::ImageDocument;
pub use crate::image::pixel::{Average, DivideByReference, Scalar};
pub use crate::image::slice::{extract_slice, paste_collapsed};
pub use crate::pipeline::context::{ExecutionContext, ExecutionOpts};
pub use crate::pipeline::progress::{CancellationToken, Progress, ProgressReporter};
pub use crate::pipeline::runner::PipelineRunner;
pub use crate::pipeline::stage::Stage;
pub use crate::region::spatial::{Index, Size, SpatialRegion};
pub use crate::region::temporal::TemporalRegion;
pub use crate::stages::average::AverageImages;
pub use crate::stages::reference_normalize::ReferenceNormalize;
pub use crate::stages::support_window::SupportWindow;
pub use crate::stages::volume_to_frames::{InputRequestPolicy, VolumeToFrameSequence};
pub use crate::video::frame_sequence::{FrameSequence, stack_frames};
