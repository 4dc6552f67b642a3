use std::fmt;

use smallvec::SmallVec;

use crate::foundation::error::{VoxframeError, VoxframeResult};

/// Per-dimension start indices. Axis 0 is the fastest-varying axis in every buffer.
pub type Index = SmallVec<[i64; 4]>;

/// Per-dimension extents.
pub type Size = SmallVec<[usize; 4]>;

/// An N-dimensional box made of one `(index, size)` pair per dimension.
///
/// A region with any zero size is empty. Emptiness is a legitimate value here, never an
/// "unset" marker: requests that may be absent are carried as `Option<SpatialRegion>`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct SpatialRegion {
    index: Index,
    size: Size,
}

impl SpatialRegion {
    /// Create a region from matching index and size slices.
    pub fn new(index: &[i64], size: &[usize]) -> VoxframeResult<Self> {
        if index.len() != size.len() {
            return Err(VoxframeError::validation(format!(
                "region index has {} dimensions but size has {}",
                index.len(),
                size.len()
            )));
        }
        Ok(Self {
            index: Index::from_slice(index),
            size: Size::from_slice(size),
        })
    }

    /// Create a region anchored at the origin.
    pub fn from_size(size: &[usize]) -> Self {
        Self {
            index: SmallVec::from_elem(0, size.len()),
            size: Size::from_slice(size),
        }
    }

    /// Number of dimensions.
    pub fn dimension(&self) -> usize {
        self.size.len()
    }

    /// Start index of every dimension.
    pub fn index(&self) -> &[i64] {
        &self.index
    }

    /// Extent of every dimension.
    pub fn size(&self) -> &[usize] {
        &self.size
    }

    /// Start index along `axis`.
    pub fn index_along(&self, axis: usize) -> VoxframeResult<i64> {
        self.check_axis(axis)?;
        Ok(self.index[axis])
    }

    /// Extent along `axis`.
    pub fn size_along(&self, axis: usize) -> VoxframeResult<usize> {
        self.check_axis(axis)?;
        Ok(self.size[axis])
    }

    /// Exclusive end index along `axis`.
    fn end(&self, axis: usize) -> i64 {
        self.index[axis] + self.size[axis] as i64
    }

    /// `true` iff any dimension has zero size.
    pub fn is_empty(&self) -> bool {
        self.size.contains(&0)
    }

    /// Total number of pixels covered.
    ///
    /// A zero-dimensional region covers exactly one pixel.
    pub fn number_of_pixels(&self) -> usize {
        self.size.iter().product()
    }

    /// Dimension-wise overlap of two regions. Disjoint dimensions get size 0.
    pub fn intersect(&self, other: &Self) -> VoxframeResult<Self> {
        self.check_same_dimension(other)?;
        let mut out = self.clone();
        for d in 0..self.dimension() {
            let start = self.index[d].max(other.index[d]);
            let end = self.end(d).min(other.end(d));
            out.index[d] = start;
            out.size[d] = (end - start).max(0) as usize;
        }
        Ok(out)
    }

    /// Smallest region covering both inputs. Empty inputs do not widen the result.
    pub fn bounding_union(&self, other: &Self) -> VoxframeResult<Self> {
        self.check_same_dimension(other)?;
        if other.is_empty() {
            return Ok(self.clone());
        }
        if self.is_empty() {
            return Ok(other.clone());
        }
        let mut out = self.clone();
        for d in 0..self.dimension() {
            let start = self.index[d].min(other.index[d]);
            let end = self.end(d).max(other.end(d));
            out.index[d] = start;
            out.size[d] = (end - start) as usize;
        }
        Ok(out)
    }

    /// Remove `axis`, keeping the remaining dimensions in order.
    pub fn collapse_dimension(&self, axis: usize) -> VoxframeResult<Self> {
        self.check_axis(axis)?;
        let mut out = self.clone();
        out.index.remove(axis);
        out.size.remove(axis);
        Ok(out)
    }

    /// Insert a new dimension at `axis` with the given index and size.
    ///
    /// Inverse of [`SpatialRegion::collapse_dimension`].
    pub fn insert_dimension(&self, axis: usize, index: i64, size: usize) -> VoxframeResult<Self> {
        if axis > self.dimension() {
            return Err(VoxframeError::validation(format!(
                "cannot insert axis {axis} into a {}-dimensional region",
                self.dimension()
            )));
        }
        let mut out = self.clone();
        out.index.insert(axis, index);
        out.size.insert(axis, size);
        Ok(out)
    }

    /// Same region with the extent along `axis` reduced to the single position `position`.
    pub fn slice_at(&self, axis: usize, position: i64) -> VoxframeResult<Self> {
        self.check_axis(axis)?;
        let mut out = self.clone();
        out.index[axis] = position;
        out.size[axis] = 1;
        Ok(out)
    }

    /// `true` when `idx` lies inside the region.
    pub fn contains_index(&self, idx: &[i64]) -> bool {
        idx.len() == self.dimension()
            && (0..self.dimension()).all(|d| idx[d] >= self.index[d] && idx[d] < self.end(d))
    }

    /// `true` when `other` is fully inside this region.
    ///
    /// An empty `other` is contained when its start lies within this region's bounds.
    pub fn contains_region(&self, other: &Self) -> bool {
        other.dimension() == self.dimension()
            && (0..self.dimension())
                .all(|d| other.index[d] >= self.index[d] && other.end(d) <= self.end(d))
    }

    /// Linear element strides with axis 0 fastest.
    pub fn strides(&self) -> Size {
        let mut strides = Size::with_capacity(self.dimension());
        let mut acc = 1usize;
        for &s in &self.size {
            strides.push(acc);
            acc = acc.saturating_mul(s);
        }
        strides
    }

    /// Linear offset of `idx` in a buffer laid out over this region.
    pub fn offset_of(&self, idx: &[i64]) -> Option<usize> {
        if !self.contains_index(idx) {
            return None;
        }
        let mut offset = 0usize;
        let mut stride = 1usize;
        for d in 0..self.dimension() {
            offset += (idx[d] - self.index[d]) as usize * stride;
            stride *= self.size[d];
        }
        Some(offset)
    }

    /// Length of one scanline (a run along axis 0).
    pub fn line_length(&self) -> usize {
        self.size.first().copied().unwrap_or(1)
    }

    /// Number of scanlines in the region.
    pub fn number_of_lines(&self) -> usize {
        match self.line_length() {
            0 => 0,
            len => self.number_of_pixels() / len,
        }
    }

    /// Index of the first pixel of scanline `line` (lines ordered like buffer memory).
    pub fn line_start(&self, line: usize) -> Index {
        let mut idx = self.index.clone();
        let mut rem = line;
        for d in 1..self.dimension() {
            let s = self.size[d].max(1);
            idx[d] += (rem % s) as i64;
            rem /= s;
        }
        idx
    }

    fn check_axis(&self, axis: usize) -> VoxframeResult<()> {
        if axis >= self.dimension() {
            return Err(VoxframeError::validation(format!(
                "axis {axis} is outside a {}-dimensional region",
                self.dimension()
            )));
        }
        Ok(())
    }

    fn check_same_dimension(&self, other: &Self) -> VoxframeResult<()> {
        if self.dimension() != other.dimension() {
            return Err(VoxframeError::validation(format!(
                "region dimensions differ: {} vs {}",
                self.dimension(),
                other.dimension()
            )));
        }
        Ok(())
    }
}

impl fmt::Display for SpatialRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[index={:?}, size={:?}]", self.index.as_slice(), self.size.as_slice())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/region/spatial.rs"]
mod tests;
