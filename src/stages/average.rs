//! Pixelwise mean of several images sharing one extent.

use crate::foundation::error::{VoxframeError, VoxframeResult};
use crate::image::buffer::Image;
use crate::image::pixel::Average;
use crate::pipeline::context::ExecutionContext;
use crate::pipeline::stage::Stage;
use crate::region::spatial::SpatialRegion;
use crate::stages::scanline::for_each_scanline_batch;

/// Averages any number of same-extent inputs, componentwise for vector pixels.
#[derive(Debug)]
pub struct AverageImages<'a, P> {
    inputs: Vec<&'a mut Image<P>>,
    output: Image<P>,
    defaulted_request: bool,
}

impl<P> Default for AverageImages<'_, P> {
    fn default() -> Self {
        Self {
            inputs: Vec::new(),
            output: Image::new(SpatialRegion::from_size(&[])),
            defaulted_request: false,
        }
    }
}

impl<'a, P> AverageImages<'a, P> {
    /// Stage with no inputs.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an input image.
    pub fn add_input(&mut self, input: &'a mut Image<P>) {
        self.inputs.push(input);
    }

    /// Builder-style [`AverageImages::add_input`].
    pub fn with_input(mut self, input: &'a mut Image<P>) -> Self {
        self.add_input(input);
        self
    }

    /// Connected input count.
    pub fn number_of_inputs(&self) -> usize {
        self.inputs.len()
    }

    /// Restrict the output to `region`.
    pub fn set_requested_region(&mut self, region: SpatialRegion) {
        self.output.set_requested_region(region);
        self.defaulted_request = false;
    }

    /// Averaged image.
    pub fn output(&self) -> &Image<P> {
        &self.output
    }

    /// Take the averaged image.
    pub fn into_output(self) -> Image<P> {
        self.output
    }
}

impl<P> Stage for AverageImages<'_, P>
where
    P: Average + Clone + Default + Send + Sync,
{
    fn name(&self) -> &'static str {
        "average"
    }

    #[tracing::instrument(skip_all, fields(inputs = self.inputs.len()))]
    fn compute_output_information(&mut self) -> VoxframeResult<()> {
        let (first, rest) = self
            .inputs
            .split_first()
            .ok_or_else(|| VoxframeError::configuration("averaging requires at least one input"))?;
        let largest = first.largest_possible_region().clone();
        if let Some(other) = rest
            .iter()
            .map(|i| i.largest_possible_region())
            .find(|r| **r != largest)
        {
            return Err(VoxframeError::configuration(format!(
                "input extents differ: {largest} and {other}"
            )));
        }

        if self.defaulted_request {
            self.output.clear_requested_region();
            self.defaulted_request = false;
        }
        self.output.release_data();
        self.output.set_largest_possible_region(largest);
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
        for input in &mut self.inputs {
            input.set_requested_region(request.clone());
        }
        Ok(())
    }

    #[tracing::instrument(skip_all)]
    fn execute(&mut self, ctx: &ExecutionContext) -> VoxframeResult<()> {
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
        let inputs: Vec<&Image<P>> = self.inputs.iter().map(|i| &**i).collect();
        if let Some(pos) = inputs.iter().position(|i| !i.buffers(&region)) {
            return Err(VoxframeError::invariant(format!(
                "input {pos} does not buffer the output region {region}"
            )));
        }

        for_each_scanline_batch(ctx, &region, self.output.data_mut(), |line, row| {
            let start = region.line_start(line);
            let lines = inputs
                .iter()
                .map(|i| i.scanline(&start, row.len()))
                .collect::<Option<Vec<_>>>()
                .ok_or_else(|| {
                    VoxframeError::invariant(format!("input scanline {line} is not buffered"))
                })?;
            let mut samples = Vec::with_capacity(lines.len());
            for (k, out) in row.iter_mut().enumerate() {
                samples.clear();
                samples.extend(lines.iter().map(|l| &l[k]));
                *out = P::average(&samples).ok_or_else(|| {
                    VoxframeError::validation(format!(
                        "pixel {k} of scanline {line} has inputs with differing component counts"
                    ))
                })?;
            }
            Ok(())
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/stages/average.rs"]
mod tests;
