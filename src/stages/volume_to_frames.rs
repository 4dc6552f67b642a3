//! Image-to-video conversion: every position along one axis of an N-dimensional volume
//! becomes one (N-1)-dimensional frame.

use std::collections::BTreeSet;

use crate::foundation::error::{VoxframeError, VoxframeResult};
use crate::image::buffer::Image;
use crate::image::slice::paste_collapsed;
use crate::pipeline::context::ExecutionContext;
use crate::pipeline::stage::Stage;
use crate::region::spatial::SpatialRegion;
use crate::region::temporal::TemporalRegion;
use crate::video::frame_sequence::FrameSequence;

/// How the frame request is back-propagated onto the input volume.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum InputRequestPolicy {
    /// Request the whole input volume regardless of which frames are needed.
    #[default]
    LargestPossible,
    /// Request only the bounding box of the slices behind the requested frames.
    AxisRangeUnion,
}

/// Converts one input volume into a [`FrameSequence`] along a configurable frame axis.
///
/// The stage borrows its input mutably only to record the back-propagated request; pixels
/// are read, never written.
#[derive(Debug)]
pub struct VolumeToFrameSequence<'a, P> {
    input: Option<&'a mut Image<P>>,
    frame_axis: usize,
    policy: InputRequestPolicy,
    output: FrameSequence<P>,
    // Requests filled in by the output-request pass rather than by a consumer. They are
    // re-derived on every cycle so a changed input never sees stale defaults.
    defaulted_temporal: bool,
    defaulted_frames: BTreeSet<i64>,
}

impl<P> Default for VolumeToFrameSequence<'_, P> {
    fn default() -> Self {
        Self {
            input: None,
            frame_axis: 0,
            policy: InputRequestPolicy::default(),
            output: FrameSequence::new(),
            defaulted_temporal: false,
            defaulted_frames: BTreeSet::new(),
        }
    }
}

impl<'a, P> VolumeToFrameSequence<'a, P> {
    /// Stage with frame axis 0 and no input.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`VolumeToFrameSequence::set_input`].
    pub fn with_input(mut self, input: &'a mut Image<P>) -> Self {
        self.set_input(input);
        self
    }

    /// Builder-style [`VolumeToFrameSequence::set_frame_axis`].
    pub fn with_frame_axis(mut self, axis: usize) -> Self {
        self.set_frame_axis(axis);
        self
    }

    /// Builder-style [`VolumeToFrameSequence::set_input_request_policy`].
    pub fn with_input_request_policy(mut self, policy: InputRequestPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Connect the input volume.
    pub fn set_input(&mut self, input: &'a mut Image<P>) {
        self.input = Some(input);
    }

    /// Connected input volume.
    pub fn input(&self) -> Option<&Image<P>> {
        self.input.as_deref()
    }

    /// Input dimension collapsed into time.
    pub fn frame_axis(&self) -> usize {
        self.frame_axis
    }

    /// Select the input dimension collapsed into time. Validated by the information pass.
    pub fn set_frame_axis(&mut self, axis: usize) {
        self.frame_axis = axis;
    }

    /// Current back-propagation policy.
    pub fn input_request_policy(&self) -> InputRequestPolicy {
        self.policy
    }

    /// Change the back-propagation policy.
    pub fn set_input_request_policy(&mut self, policy: InputRequestPolicy) {
        self.policy = policy;
    }

    /// Temporal region requested from the output, if any.
    pub fn requested_temporal_region(&self) -> Option<TemporalRegion> {
        self.output.requested_temporal_region()
    }

    /// Request a range of frames. Zero duration is a valid, empty request.
    pub fn set_requested_temporal_region(&mut self, region: TemporalRegion) {
        self.output.set_requested_temporal_region(region);
        self.defaulted_temporal = false;
    }

    /// Request part of one frame.
    pub fn set_frame_requested_spatial_region(&mut self, frame: i64, region: SpatialRegion) {
        self.output.set_frame_requested_spatial_region(frame, region);
        self.defaulted_frames.remove(&frame);
    }

    /// Produced frame sequence.
    pub fn output(&self) -> &FrameSequence<P> {
        &self.output
    }

    /// Take the produced frame sequence.
    pub fn into_output(self) -> FrameSequence<P> {
        self.output
    }

    fn missing_input() -> VoxframeError {
        VoxframeError::configuration("volume-to-frames requires an input volume")
    }

    fn streaming_request(&self, largest: &SpatialRegion) -> VoxframeResult<SpatialRegion> {
        let axis = self.frame_axis;
        let requested = self.output.requested_temporal_region().ok_or_else(|| {
            VoxframeError::invariant("input request computed before the output request")
        })?;

        let mut union: Option<SpatialRegion> = None;
        for f in requested.frames() {
            let frame_request = self.output.frame_requested_spatial_region(f).ok_or_else(|| {
                VoxframeError::invariant(format!("frame {f} has no resolved spatial request"))
            })?;
            if frame_request.is_empty() {
                continue;
            }
            let source = frame_request.insert_dimension(axis, f, 1)?;
            union = Some(match union {
                None => source,
                Some(u) => u.bounding_union(&source)?,
            });
        }

        match union {
            Some(u) => u.intersect(largest),
            None => {
                let lo = largest.index_along(axis)?;
                let hi = lo + largest.size_along(axis)? as i64;
                largest
                    .collapse_dimension(axis)?
                    .insert_dimension(axis, requested.frame_start.clamp(lo, hi), 0)
            }
        }
    }
}

impl<P> Stage for VolumeToFrameSequence<'_, P>
where
    P: Clone + Default + Send + Sync,
{
    fn name(&self) -> &'static str {
        "volume-to-frames"
    }

    #[tracing::instrument(skip_all, fields(axis = self.frame_axis))]
    fn compute_output_information(&mut self) -> VoxframeResult<()> {
        let input = self.input.as_deref().ok_or_else(Self::missing_input)?;
        let region = input.largest_possible_region().clone();
        let axis = self.frame_axis;
        if axis >= region.dimension() {
            return Err(VoxframeError::configuration(format!(
                "frame axis {axis} is outside [0, {}) for the input volume",
                region.dimension()
            )));
        }

        let temporal = TemporalRegion::new(region.index()[axis], region.size()[axis] as u64);
        let frame_region = region.collapse_dimension(axis)?;

        if self.defaulted_temporal {
            self.output.clear_requested_temporal_region();
            self.defaulted_temporal = false;
        }
        for f in std::mem::take(&mut self.defaulted_frames) {
            self.output.clear_frame_requested_spatial_region(f);
        }

        self.output.set_largest_possible_temporal_region(temporal);
        self.output.set_all_largest_possible_spatial_regions(&frame_region);
        self.output.release_frames();
        tracing::debug!(%temporal, %frame_region, "output information");
        Ok(())
    }

    #[tracing::instrument(skip_all)]
    fn compute_output_requested_region(&mut self) -> VoxframeResult<()> {
        let largest = self.output.largest_possible_temporal_region();
        let requested = match self.output.requested_temporal_region() {
            Some(r) => r,
            None => {
                self.output.set_requested_temporal_region(largest);
                self.defaulted_temporal = true;
                largest
            }
        };
        if !requested.is_empty() && !largest.contains_region(requested) {
            return Err(VoxframeError::validation(format!(
                "requested frames {requested} are outside the available frames {largest}"
            )));
        }

        for f in requested.frames() {
            let frame_largest = self
                .output
                .frame_largest_possible_spatial_region(f)
                .cloned()
                .ok_or_else(|| {
                    VoxframeError::invariant(format!("frame {f} has no largest spatial region"))
                })?;
            match self.output.frame_requested_spatial_region(f) {
                Some(r) if !r.is_empty() && !frame_largest.contains_region(r) => {
                    return Err(VoxframeError::validation(format!(
                        "frame {f} request {r} is outside its largest region {frame_largest}"
                    )));
                }
                Some(_) => {}
                None => {
                    self.output.set_frame_requested_spatial_region(f, frame_largest);
                    self.defaulted_frames.insert(f);
                }
            }
        }
        tracing::debug!(%requested, defaulted = self.defaulted_temporal, "output request");
        Ok(())
    }

    #[tracing::instrument(skip_all, fields(policy = ?self.policy))]
    fn compute_input_requested_region(&mut self) -> VoxframeResult<()> {
        let largest = self
            .input
            .as_deref()
            .ok_or_else(Self::missing_input)?
            .largest_possible_region()
            .clone();
        let request = match self.policy {
            InputRequestPolicy::LargestPossible => largest,
            InputRequestPolicy::AxisRangeUnion => self.streaming_request(&largest)?,
        };
        tracing::debug!(%request, "input request");
        self.input
            .as_deref_mut()
            .ok_or_else(Self::missing_input)?
            .set_requested_region(request);
        Ok(())
    }

    #[tracing::instrument(skip_all, fields(axis = self.frame_axis))]
    fn execute(&mut self, ctx: &ExecutionContext) -> VoxframeResult<()> {
        let axis = self.frame_axis;
        let input = self.input.as_deref().ok_or_else(Self::missing_input)?;
        let input_request = input.requested_region().ok_or_else(|| {
            VoxframeError::invariant("input volume has no requested region at execution")
        })?;
        if !input.buffers(input_request) {
            return Err(VoxframeError::invariant(format!(
                "input volume does not buffer its requested region {input_request}"
            )));
        }

        self.output.allocate_requested_frames()?;
        let frames = self.output.requested_frames_mut();
        let total: usize = frames.iter().map(|f| f.requested.number_of_pixels()).sum();
        ctx.progress().reset(total as u64);
        tracing::debug!(frames = frames.len(), workers = ctx.worker_threads(), "extracting");

        ctx.run_units(frames, |frame| {
            if frame.requested.is_empty() {
                return Ok(());
            }
            let source = frame
                .requested
                .insert_dimension(axis, frame.index, 1)
                .map_err(|e| VoxframeError::invariant(e.to_string()))?;
            paste_collapsed(input, &source, axis, frame.buffer, frame.requested.index())?;
            ctx.progress()
                .completed(frame.requested.number_of_pixels() as u64);
            tracing::trace!(frame = frame.index, "frame extracted");
            Ok(())
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/stages/volume_to_frames.rs"]
mod tests;
