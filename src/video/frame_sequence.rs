use std::collections::BTreeMap;

use crate::foundation::error::{VoxframeError, VoxframeResult};
use crate::image::buffer::Image;
use crate::region::spatial::SpatialRegion;
use crate::region::temporal::TemporalRegion;

/// Per-frame spatial regions plus the frame buffer, if allocated.
///
/// Frames keep their own regions because a derived stage may give frames different valid
/// extents; the default policy sets them all alike.
#[derive(Clone, Debug)]
struct FrameSlot<P> {
    largest: Option<SpatialRegion>,
    requested: Option<SpatialRegion>,
    buffer: Option<Image<P>>,
}

impl<P> Default for FrameSlot<P> {
    fn default() -> Self {
        Self {
            largest: None,
            requested: None,
            buffer: None,
        }
    }
}

/// Mutable view of one requested frame, handed to execution workers.
#[derive(Debug)]
pub(crate) struct RequestedFrame<'a, P> {
    pub(crate) index: i64,
    pub(crate) requested: &'a SpatialRegion,
    pub(crate) buffer: &'a mut Image<P>,
}

/// Ordered collection of (N-1)-dimensional frames with temporal regions.
#[derive(Clone, Debug)]
pub struct FrameSequence<P> {
    largest: TemporalRegion,
    requested: Option<TemporalRegion>,
    buffered: TemporalRegion,
    frames: BTreeMap<i64, FrameSlot<P>>,
}

impl<P> Default for FrameSequence<P> {
    fn default() -> Self {
        Self {
            largest: TemporalRegion::default(),
            requested: None,
            buffered: TemporalRegion::default(),
            frames: BTreeMap::new(),
        }
    }
}

impl<P> FrameSequence<P> {
    /// Create an empty sequence.
    pub fn new() -> Self {
        Self::default()
    }

    /// Largest temporal region the producer can provide.
    pub fn largest_possible_temporal_region(&self) -> TemporalRegion {
        self.largest
    }

    /// Replace the largest temporal region. Frames outside it are forgotten.
    pub fn set_largest_possible_temporal_region(&mut self, region: TemporalRegion) {
        self.largest = region;
        self.frames.retain(|f, _| region.contains_frame(*f));
    }

    /// Temporal region a consumer needs, if set.
    pub fn requested_temporal_region(&self) -> Option<TemporalRegion> {
        self.requested
    }

    /// Record the temporal region a consumer needs. An empty region is a valid request.
    pub fn set_requested_temporal_region(&mut self, region: TemporalRegion) {
        self.requested = Some(region);
    }

    /// Forget the temporal request.
    pub fn clear_requested_temporal_region(&mut self) {
        self.requested = None;
    }

    /// Temporal region whose frames are currently allocated.
    pub fn buffered_temporal_region(&self) -> TemporalRegion {
        self.buffered
    }

    /// Give every frame of the largest temporal region the same largest spatial region.
    pub fn set_all_largest_possible_spatial_regions(&mut self, region: &SpatialRegion) {
        for f in self.largest.frames() {
            self.frames.entry(f).or_default().largest = Some(region.clone());
        }
    }

    /// Set one frame's largest spatial region.
    pub fn set_frame_largest_possible_spatial_region(&mut self, frame: i64, region: SpatialRegion) {
        self.frames.entry(frame).or_default().largest = Some(region);
    }

    /// Largest spatial region of `frame`.
    pub fn frame_largest_possible_spatial_region(&self, frame: i64) -> Option<&SpatialRegion> {
        self.frames.get(&frame)?.largest.as_ref()
    }

    /// Requested spatial region of `frame`, if set.
    pub fn frame_requested_spatial_region(&self, frame: i64) -> Option<&SpatialRegion> {
        self.frames.get(&frame)?.requested.as_ref()
    }

    /// Record the spatial region a consumer needs from `frame`.
    pub fn set_frame_requested_spatial_region(&mut self, frame: i64, region: SpatialRegion) {
        self.frames.entry(frame).or_default().requested = Some(region);
    }

    /// Forget the spatial request of `frame`.
    pub fn clear_frame_requested_spatial_region(&mut self, frame: i64) {
        if let Some(slot) = self.frames.get_mut(&frame) {
            slot.requested = None;
        }
    }

    /// Spatial region resident for `frame`, if allocated.
    pub fn frame_buffered_spatial_region(&self, frame: i64) -> Option<&SpatialRegion> {
        self.frames.get(&frame)?.buffer.as_ref()?.buffered_region()
    }

    /// Buffer of `frame`, if allocated.
    pub fn frame(&self, frame: i64) -> Option<&Image<P>> {
        self.frames.get(&frame)?.buffer.as_ref()
    }

    /// Allocated frames in temporal order.
    pub fn frames(&self) -> impl Iterator<Item = (i64, &Image<P>)> {
        self.frames
            .iter()
            .filter_map(|(f, slot)| slot.buffer.as_ref().map(|b| (*f, b)))
    }

    /// Number of allocated frames.
    pub fn number_of_buffered_frames(&self) -> usize {
        self.frames.values().filter(|s| s.buffer.is_some()).count()
    }

    /// Take ownership of the allocated frames in temporal order.
    pub fn into_frames(self) -> Vec<(i64, Image<P>)> {
        self.frames
            .into_iter()
            .filter_map(|(f, slot)| slot.buffer.map(|b| (f, b)))
            .collect()
    }

    /// Drop every frame buffer. Region metadata is kept.
    pub fn release_frames(&mut self) {
        for slot in self.frames.values_mut() {
            slot.buffer = None;
        }
        self.buffered = TemporalRegion::new(self.largest.frame_start, 0);
    }

    pub(crate) fn requested_frames_mut(&mut self) -> Vec<RequestedFrame<'_, P>> {
        let Some(requested) = self.requested else {
            return Vec::new();
        };
        self.frames
            .range_mut(requested.frames())
            .filter_map(|(f, slot)| match (&slot.requested, slot.buffer.as_mut()) {
                (Some(r), Some(b)) => Some(RequestedFrame {
                    index: *f,
                    requested: r,
                    buffer: b,
                }),
                _ => None,
            })
            .collect()
    }
}

impl<P: Clone + Default> FrameSequence<P> {
    /// Allocate a default-filled buffer over each requested frame's requested region.
    ///
    /// Frames outside the requested temporal region lose their buffers.
    pub fn allocate_requested_frames(&mut self) -> VoxframeResult<()> {
        let requested = self.requested.ok_or_else(|| {
            VoxframeError::invariant("frames allocated before a temporal request was resolved")
        })?;
        for (f, slot) in self.frames.iter_mut() {
            if !requested.contains_frame(*f) {
                slot.buffer = None;
            }
        }
        for f in requested.frames() {
            let slot = self.frames.entry(f).or_default();
            let (Some(largest), Some(req)) = (&slot.largest, &slot.requested) else {
                return Err(VoxframeError::invariant(format!(
                    "frame {f} has no resolved spatial regions at allocation"
                )));
            };
            let mut buffer = Image::new(largest.clone());
            buffer.set_requested_region(req.clone());
            buffer.allocate();
            slot.buffer = Some(buffer);
        }
        self.buffered = requested;
        Ok(())
    }
}

/// Re-stack allocated frames along `axis` into one N-dimensional image.
///
/// Inverse of slicing a volume into frames: every buffered frame must share one buffered
/// region, and the frame index becomes the coordinate along `axis`.
pub fn stack_frames<P: Clone>(seq: &FrameSequence<P>, axis: usize) -> VoxframeResult<Image<P>> {
    let buffered = seq.buffered_temporal_region();
    let Some((_, first)) = seq.frames().next() else {
        return Err(VoxframeError::validation("no buffered frames to stack"));
    };
    let frame_region = first
        .buffered_region()
        .ok_or_else(|| VoxframeError::validation("frame has no buffer"))?
        .clone();
    for (f, frame) in seq.frames() {
        if frame.buffered_region() != Some(&frame_region) {
            return Err(VoxframeError::validation(format!(
                "frame {f} is buffered over a different region than frame {}",
                buffered.frame_start
            )));
        }
    }
    if seq.number_of_buffered_frames() as u64 != buffered.frame_duration {
        return Err(VoxframeError::validation(
            "buffered temporal region has missing frames",
        ));
    }

    let out_region =
        frame_region.insert_dimension(axis, buffered.frame_start, buffered.frame_duration as usize)?;
    let mut data = Vec::with_capacity(out_region.number_of_pixels());
    let len = out_region.line_length();
    for line in 0..out_region.number_of_lines() {
        let start = out_region.line_start(line);
        for k in 0..len {
            let mut idx = start.clone();
            if let Some(x) = idx.first_mut() {
                *x += k as i64;
            }
            let f = idx.remove(axis);
            let px = seq
                .frame(f)
                .and_then(|frame| frame.pixel(&idx))
                .ok_or_else(|| VoxframeError::invariant(format!("frame {f} lost pixel {idx:?}")))?;
            data.push(px.clone());
        }
    }
    Image::from_vec(out_region, data)
}

#[cfg(test)]
#[path = "../../tests/unit/video/frame_sequence.rs"]
mod tests;
