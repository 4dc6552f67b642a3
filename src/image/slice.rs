//! Slice extraction: copy one position along an axis of an N-D image into an (N-1)-D image.

use crate::foundation::error::{VoxframeError, VoxframeResult};
use crate::image::buffer::Image;
use crate::region::spatial::SpatialRegion;

/// Copy `source_region` of `src`, collapsing `axis`, into `dst` with its first pixel placed
/// at `dst_index`.
///
/// Every bound is checked before the first write, so a failed paste leaves `dst` untouched.
/// Failures are [`VoxframeError::Invariant`]: callers compute these regions themselves.
pub fn paste_collapsed<P: Clone>(
    src: &Image<P>,
    source_region: &SpatialRegion,
    axis: usize,
    dst: &mut Image<P>,
    dst_index: &[i64],
) -> VoxframeResult<()> {
    let collapsed_size = source_region
        .size_along(axis)
        .map_err(|e| VoxframeError::invariant(format!("slice axis: {e}")))?;
    if collapsed_size != 1 {
        return Err(VoxframeError::invariant(format!(
            "collapsed axis {axis} has size {collapsed_size} in {source_region}, expected 1"
        )));
    }
    let src_buffered = src
        .buffered_region()
        .filter(|b| b.contains_region(source_region))
        .ok_or_else(|| {
            VoxframeError::invariant(format!(
                "source region {source_region} is not buffered by the input"
            ))
        })?
        .clone();

    let collapsed = source_region
        .collapse_dimension(axis)
        .map_err(|e| VoxframeError::invariant(e.to_string()))?;
    let placement = SpatialRegion::new(dst_index, collapsed.size())
        .map_err(|e| VoxframeError::invariant(format!("paste placement: {e}")))?;
    let dst_buffered = dst
        .buffered_region()
        .filter(|b| b.contains_region(&placement))
        .ok_or_else(|| {
            VoxframeError::invariant(format!(
                "paste region {placement} does not fit the destination buffer"
            ))
        })?
        .clone();

    if placement.is_empty() {
        return Ok(());
    }

    // Destination axis 0 maps to source axis 0, or to source axis 1 when axis 0 is collapsed.
    let src_run_axis = usize::from(axis == 0);
    let src_step = src_buffered
        .strides()
        .get(src_run_axis)
        .copied()
        .unwrap_or(1);
    let len = placement.line_length();

    let src_data = src.data();
    let dst_data = dst.data_mut();
    for line in 0..placement.number_of_lines() {
        let dst_start = placement.line_start(line);
        let mut src_start = source_region.index().to_vec();
        let mut src_d = 0;
        for (d, slot) in src_start.iter_mut().enumerate() {
            if d == axis {
                continue;
            }
            *slot += dst_start[src_d] - placement.index()[src_d];
            src_d += 1;
        }
        let (Some(src_off), Some(dst_off)) = (
            src_buffered.offset_of(&src_start),
            dst_buffered.offset_of(&dst_start),
        ) else {
            return Err(VoxframeError::invariant(format!(
                "scanline {line} escaped its buffer during paste"
            )));
        };
        for k in 0..len {
            dst_data[dst_off + k] = src_data[src_off + k * src_step].clone();
        }
    }
    Ok(())
}

/// Extract the slice of `src` at `position` along `axis` as a new (N-1)-D image.
///
/// The result's regions are the collapsed buffered region of `src`.
pub fn extract_slice<P: Clone + Default>(
    src: &Image<P>,
    axis: usize,
    position: i64,
) -> VoxframeResult<Image<P>> {
    let buffered = src.buffered_region().ok_or_else(|| {
        VoxframeError::validation("cannot extract a slice from an unbuffered image")
    })?;
    let source_region = buffered.slice_at(axis, position)?;
    if !buffered.contains_region(&source_region) {
        return Err(VoxframeError::validation(format!(
            "slice position {position} along axis {axis} is outside {buffered}"
        )));
    }
    let out_region = buffered.collapse_dimension(axis)?;
    let mut out = Image::new(out_region.clone());
    out.allocate();
    paste_collapsed(src, &source_region, axis, &mut out, out_region.index())?;
    Ok(out)
}

#[cfg(test)]
#[path = "../../tests/unit/image/slice.rs"]
mod tests;
