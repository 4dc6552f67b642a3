use std::fmt;
use std::ops::Range;

/// Half-open frame range `[frame_start, frame_start + frame_duration)`.
///
/// Ordering is by `frame_start`, then by duration.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    serde::Serialize,
    serde::Deserialize,
)]
pub struct TemporalRegion {
    /// First frame index.
    pub frame_start: i64,
    /// Number of frames.
    pub frame_duration: u64,
}

impl TemporalRegion {
    /// Create a region covering `frame_duration` frames starting at `frame_start`.
    pub fn new(frame_start: i64, frame_duration: u64) -> Self {
        Self {
            frame_start,
            frame_duration,
        }
    }

    /// Exclusive end frame, saturating at `i64::MAX`.
    pub fn frame_end(self) -> i64 {
        i64::try_from(self.frame_duration)
            .map_or(i64::MAX, |d| self.frame_start.saturating_add(d))
    }

    /// Return `true` when the region has no frames.
    pub fn is_empty(self) -> bool {
        self.frame_duration == 0
    }

    /// Return `true` when frame `f` is inside the region.
    pub fn contains_frame(self, f: i64) -> bool {
        self.frame_start <= f && f < self.frame_end()
    }

    /// Return `true` when `other` lies inside this region.
    ///
    /// Empty regions are contained when their start lies within `[start, end]`.
    pub fn contains_region(self, other: Self) -> bool {
        other.frame_start >= self.frame_start && other.frame_end() <= self.frame_end()
    }

    /// Frame indices in order.
    pub fn frames(self) -> Range<i64> {
        self.frame_start..self.frame_end()
    }

    /// Overlap of two regions; disjoint regions yield an empty region.
    pub fn intersect(self, other: Self) -> Self {
        let start = self.frame_start.max(other.frame_start);
        let end = self.frame_end().min(other.frame_end());
        Self::new(start, if end > start { end.abs_diff(start) } else { 0 })
    }

    /// Smallest contiguous region covering both inputs. Empty inputs do not widen it.
    pub fn bounding_union(self, other: Self) -> Self {
        if other.is_empty() {
            return self;
        }
        if self.is_empty() {
            return other;
        }
        let start = self.frame_start.min(other.frame_start);
        let end = self.frame_end().max(other.frame_end());
        Self::new(start, end.abs_diff(start))
    }
}

impl fmt::Display for TemporalRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.frame_start, self.frame_end())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/region/temporal.rs"]
mod tests;
