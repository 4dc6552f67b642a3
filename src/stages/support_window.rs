//! Per-pixel support windows for one-dimensional spectral estimation.
//!
//! Each output pixel lists the start indices of the lines that make up its window: one
//! entry per side line, each pointing at the first sample of an `fft_size`-long run along
//! the FFT direction.

use crate::foundation::error::{VoxframeError, VoxframeResult};
use crate::image::buffer::Image;
use crate::image::pixel::Scalar;
use crate::pipeline::context::ExecutionContext;
use crate::pipeline::stage::Stage;
use crate::region::spatial::{Index, SpatialRegion};
use crate::stages::scanline::for_each_scanline_batch;

/// Builds the support window of every pixel from a side-line count image.
///
/// The input value at a pixel is the nominal number of lines taken on either side of the
/// pixel's own line along the side-line direction; it is rounded and clamped at zero. Lines
/// outside the image are dropped. Along the FFT direction the window is centred on the pixel
/// and shifted inward at the image edges, so it is truncated only when the image is shorter
/// than `fft_size`. Only every `step`-th pixel along the FFT direction (counted from the
/// image start) gets a window; the others get an empty list.
#[derive(Debug)]
pub struct SupportWindow<'a, P> {
    input: Option<&'a mut Image<P>>,
    fft_size: usize,
    step: usize,
    fft_direction: usize,
    side_line_direction: usize,
    output: Image<Vec<Index>>,
    defaulted_request: bool,
}

impl<P> Default for SupportWindow<'_, P> {
    fn default() -> Self {
        Self {
            input: None,
            fft_size: 32,
            step: 1,
            fft_direction: 0,
            side_line_direction: 1,
            output: Image::new(SpatialRegion::from_size(&[])),
            defaulted_request: false,
        }
    }
}

impl<'a, P> SupportWindow<'a, P> {
    /// Stage with default parameters and no input.
    pub fn new() -> Self {
        Self::default()
    }

    /// Connect the side-line count image.
    pub fn set_input(&mut self, input: &'a mut Image<P>) {
        self.input = Some(input);
    }

    /// Builder-style [`SupportWindow::set_input`].
    pub fn with_input(mut self, input: &'a mut Image<P>) -> Self {
        self.set_input(input);
        self
    }

    /// Nominal window length along the FFT direction.
    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    /// Set the nominal window length.
    pub fn set_fft_size(&mut self, fft_size: usize) {
        self.fft_size = fft_size;
    }

    /// Builder-style [`SupportWindow::set_fft_size`].
    pub fn with_fft_size(mut self, fft_size: usize) -> Self {
        self.set_fft_size(fft_size);
        self
    }

    /// Spacing between pixels that receive a window.
    pub fn step(&self) -> usize {
        self.step
    }

    /// Set the window spacing.
    pub fn set_step(&mut self, step: usize) {
        self.step = step;
    }

    /// Builder-style [`SupportWindow::set_step`].
    pub fn with_step(mut self, step: usize) -> Self {
        self.set_step(step);
        self
    }

    /// Axis the windows run along.
    pub fn fft_direction(&self) -> usize {
        self.fft_direction
    }

    /// Builder-style setter for the FFT direction.
    pub fn with_fft_direction(mut self, axis: usize) -> Self {
        self.fft_direction = axis;
        self
    }

    /// Axis the side lines are taken along.
    pub fn side_line_direction(&self) -> usize {
        self.side_line_direction
    }

    /// Builder-style setter for the side-line direction.
    pub fn with_side_line_direction(mut self, axis: usize) -> Self {
        self.side_line_direction = axis;
        self
    }

    /// Restrict the output to `region`.
    pub fn set_requested_region(&mut self, region: SpatialRegion) {
        self.output.set_requested_region(region);
        self.defaulted_request = false;
    }

    /// Window lists.
    pub fn output(&self) -> &Image<Vec<Index>> {
        &self.output
    }

    /// Take the window lists.
    pub fn into_output(self) -> Image<Vec<Index>> {
        self.output
    }

    fn geometry(&self) -> VoxframeResult<WindowGeometry> {
        let largest = self.output.largest_possible_region();
        Ok(WindowGeometry {
            fft_axis: self.fft_direction,
            side_axis: self.side_line_direction,
            fft_size: self.fft_size,
            step: self.step,
            fft_lo: largest.index_along(self.fft_direction)?,
            fft_len: largest.size_along(self.fft_direction)?,
            side_lo: largest.index_along(self.side_line_direction)?,
            side_len: largest.size_along(self.side_line_direction)?,
        })
    }
}

#[derive(Clone, Copy, Debug)]
struct WindowGeometry {
    fft_axis: usize,
    side_axis: usize,
    fft_size: usize,
    step: usize,
    fft_lo: i64,
    fft_len: usize,
    side_lo: i64,
    side_len: usize,
}

impl WindowGeometry {
    fn window(&self, idx: &[i64], side_lines: f64) -> Vec<Index> {
        let center = idx[self.fft_axis];
        if (center - self.fft_lo) % self.step as i64 != 0 {
            return Vec::new();
        }
        let last = self.fft_lo + self.fft_len.saturating_sub(self.fft_size) as i64;
        let start = center
            .saturating_sub((self.fft_size / 2) as i64)
            .clamp(self.fft_lo, last);

        // NaN and negative counts keep only the central line.
        let reach = side_lines.round().max(0.0) as i64;
        let line = idx[self.side_axis];
        let first = line.saturating_sub(reach).max(self.side_lo);
        let end = line
            .saturating_add(reach)
            .saturating_add(1)
            .min(self.side_lo + self.side_len as i64);

        (first..end)
            .map(|side| {
                let mut entry = Index::from_slice(idx);
                entry[self.fft_axis] = start;
                entry[self.side_axis] = side;
                entry
            })
            .collect()
    }
}

impl<P> Stage for SupportWindow<'_, P>
where
    P: Scalar,
{
    fn name(&self) -> &'static str {
        "support-window"
    }

    #[tracing::instrument(skip_all, fields(fft_size = self.fft_size, step = self.step))]
    fn compute_output_information(&mut self) -> VoxframeResult<()> {
        let input = self.input.as_deref().ok_or_else(|| {
            VoxframeError::configuration("support window requires a side-line count input")
        })?;
        let largest = input.largest_possible_region().clone();
        let n = largest.dimension();
        if n < 2 {
            return Err(VoxframeError::configuration(format!(
                "support window needs at least two dimensions, got {n}"
            )));
        }
        for (name, axis) in [
            ("fft direction", self.fft_direction),
            ("side-line direction", self.side_line_direction),
        ] {
            if axis >= n {
                return Err(VoxframeError::configuration(format!(
                    "{name} {axis} is outside [0, {n})"
                )));
            }
        }
        if self.fft_direction == self.side_line_direction {
            return Err(VoxframeError::configuration(format!(
                "fft and side-line directions must differ, both are {}",
                self.fft_direction
            )));
        }
        if self.fft_size == 0 {
            return Err(VoxframeError::configuration("fft size must be positive"));
        }
        if self.step == 0 {
            return Err(VoxframeError::configuration("step must be positive"));
        }

        if self.defaulted_request {
            self.output.clear_requested_region();
            self.defaulted_request = false;
        }
        self.output.release_data();
        self.output.set_largest_possible_region(largest);
        tracing::debug!(
            fft_direction = self.fft_direction,
            side_line_direction = self.side_line_direction,
            "output information"
        );
        Ok(())
    }

    #[tracing::instrument(skip_all)]
    fn compute_output_requested_region(&mut self) -> VoxframeResult<()> {
        let largest = self.output.largest_possible_region();
        match self.output.requested_region() {
            Some(r) if !r.is_empty() && !largest.contains_region(r) => {
                Err(VoxframeError::validation(format!(
                    "requested region {r} is outside the largest region {largest}"
                )))
            }
            Some(_) => Ok(()),
            None => {
                self.output.set_requested_region_to_largest_possible_region();
                self.defaulted_request = true;
                Ok(())
            }
        }
    }

    #[tracing::instrument(skip_all)]
    fn compute_input_requested_region(&mut self) -> VoxframeResult<()> {
        let request = self
            .output
            .requested_region()
            .cloned()
            .ok_or_else(|| VoxframeError::invariant("input request before output request"))?;
        if let Some(input) = self.input.as_deref_mut() {
            input.set_requested_region(request);
        }
        Ok(())
    }

    #[tracing::instrument(skip_all)]
    fn execute(&mut self, ctx: &ExecutionContext) -> VoxframeResult<()> {
        let geometry = self.geometry()?;
        let input = self
            .input
            .as_deref()
            .ok_or_else(|| VoxframeError::configuration("missing side-line count input"))?;
        self.output.allocate();
        let region = self
            .output
            .buffered_region()
            .cloned()
            .ok_or_else(|| VoxframeError::invariant("output was not allocated"))?;
        if region.is_empty() {
            ctx.progress().reset(0);
            tracing::debug!(%region, "empty request");
            return Ok(());
        }
        if !input.buffers(&region) {
            return Err(VoxframeError::invariant(format!(
                "side-line counts do not buffer the output region {region}"
            )));
        }

        for_each_scanline_batch(ctx, &region, self.output.data_mut(), |line, row| {
            let start = region.line_start(line);
            let len = row.len();
            let counts = input.scanline(&start, len).ok_or_else(|| {
                VoxframeError::invariant(format!("side-line scanline {line} is not buffered"))
            })?;
            let mut idx = start;
            for (out, count) in row.iter_mut().zip(counts) {
                *out = geometry.window(&idx, count.to_f64());
                idx[0] += 1;
            }
            Ok(())
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/stages/support_window.rs"]
mod tests;
