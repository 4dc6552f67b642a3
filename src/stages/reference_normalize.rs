//! Division of an image by a one-dimensional reference profile indexed along axis 0.

use crate::foundation::error::{VoxframeError, VoxframeResult};
use crate::image::buffer::Image;
use crate::image::pixel::DivideByReference;
use crate::pipeline::context::ExecutionContext;
use crate::pipeline::stage::Stage;
use crate::region::spatial::SpatialRegion;
use crate::stages::scanline::for_each_scanline_batch;

/// Divides every pixel of a primary image by `reference[index[0]]`.
///
/// The reference is broadcast across all other dimensions. A zero reference component
/// produces a zero output component instead of an infinity.
#[derive(Debug)]
pub struct ReferenceNormalize<'a, P, R> {
    input: Option<&'a mut Image<P>>,
    reference: Option<&'a mut Image<R>>,
    output: Image<P>,
    defaulted_request: bool,
}

impl<P, R> Default for ReferenceNormalize<'_, P, R> {
    fn default() -> Self {
        Self {
            input: None,
            reference: None,
            output: Image::new(SpatialRegion::from_size(&[])),
            defaulted_request: false,
        }
    }
}

impl<'a, P, R> ReferenceNormalize<'a, P, R> {
    /// Stage with no inputs connected.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`ReferenceNormalize::set_input`].
    pub fn with_input(mut self, input: &'a mut Image<P>) -> Self {
        self.set_input(input);
        self
    }

    /// Builder-style [`ReferenceNormalize::set_reference`].
    pub fn with_reference(mut self, reference: &'a mut Image<R>) -> Self {
        self.set_reference(reference);
        self
    }

    /// Connect the primary image.
    pub fn set_input(&mut self, input: &'a mut Image<P>) {
        self.input = Some(input);
    }

    /// Connect the one-dimensional reference profile.
    pub fn set_reference(&mut self, reference: &'a mut Image<R>) {
        self.reference = Some(reference);
    }

    /// Restrict the output to `region`. Unset requests default to the whole image.
    pub fn set_requested_region(&mut self, region: SpatialRegion) {
        self.output.set_requested_region(region);
        self.defaulted_request = false;
    }

    /// Normalized image.
    pub fn output(&self) -> &Image<P> {
        &self.output
    }

    /// Take the normalized image.
    pub fn into_output(self) -> Image<P> {
        self.output
    }
}

impl<P, R> Stage for ReferenceNormalize<'_, P, R>
where
    P: DivideByReference<R> + Clone + Default + Send + Sync,
    R: Send + Sync,
{
    fn name(&self) -> &'static str {
        "reference-normalize"
    }

    #[tracing::instrument(skip_all)]
    fn compute_output_information(&mut self) -> VoxframeResult<()> {
        let input = self.input.as_deref().ok_or_else(|| {
            VoxframeError::configuration("reference normalization requires a primary input")
        })?;
        let reference = self.reference.as_deref().ok_or_else(|| {
            VoxframeError::configuration("reference normalization requires a reference input")
        })?;

        let primary = input.largest_possible_region().clone();
        let profile = reference.largest_possible_region();
        if profile.dimension() != 1 {
            return Err(VoxframeError::configuration(format!(
                "reference must be one-dimensional, got {} dimensions",
                profile.dimension()
            )));
        }
        if primary.dimension() == 0 {
            return Err(VoxframeError::configuration(
                "primary input needs at least one dimension",
            ));
        }
        let axis0 = SpatialRegion::new(&primary.index()[..1], &primary.size()[..1])?;
        if !primary.is_empty() && !profile.contains_region(&axis0) {
            return Err(VoxframeError::configuration(format!(
                "reference {profile} does not cover axis 0 of the primary input {primary}"
            )));
        }

        if self.defaulted_request {
            self.output.clear_requested_region();
            self.defaulted_request = false;
        }
        self.output.release_data();
        self.output.set_largest_possible_region(primary.clone());
        tracing::debug!(%primary, "output information");
        Ok(())
    }

    #[tracing::instrument(skip_all)]
    fn compute_output_requested_region(&mut self) -> VoxframeResult<()> {
        let largest = self.output.largest_possible_region().clone();
        match self.output.requested_region() {
            Some(r) if !r.is_empty() && !largest.contains_region(r) => {
                return Err(VoxframeError::validation(format!(
                    "requested region {r} is outside the largest region {largest}"
                )));
            }
            Some(_) => {}
            None => {
                self.output.set_requested_region_to_largest_possible_region();
                self.defaulted_request = true;
            }
        }
        Ok(())
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
        // The profile is always consumed whole.
        if let Some(reference) = self.reference.as_deref_mut() {
            reference.set_requested_region_to_largest_possible_region();
        }
        Ok(())
    }

    #[tracing::instrument(skip_all)]
    fn execute(&mut self, ctx: &ExecutionContext) -> VoxframeResult<()> {
        let input = self
            .input
            .as_deref()
            .ok_or_else(|| VoxframeError::configuration("missing primary input"))?;
        let reference = self
            .reference
            .as_deref()
            .ok_or_else(|| VoxframeError::configuration("missing reference input"))?;
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
        if !reference.buffers(reference.largest_possible_region()) {
            return Err(VoxframeError::invariant(
                "reference profile is not fully buffered",
            ));
        }
        if !input.buffers(&region) {
            return Err(VoxframeError::invariant(format!(
                "primary input does not buffer the output region {region}"
            )));
        }

        for_each_scanline_batch(ctx, &region, self.output.data_mut(), |line, row| {
            let start = region.line_start(line);
            let len = row.len();
            let src = input.scanline(&start, len).ok_or_else(|| {
                VoxframeError::invariant(format!("primary scanline {line} is not buffered"))
            })?;
            let refs = reference.scanline(&start[..1], len).ok_or_else(|| {
                VoxframeError::invariant(format!("reference entries for scanline {line} missing"))
            })?;
            for ((out, px), r) in row.iter_mut().zip(src).zip(refs) {
                *out = px.divide_by_reference(r);
            }
            Ok(())
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/stages/reference_normalize.rs"]
mod tests;
