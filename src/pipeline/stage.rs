use crate::foundation::error::VoxframeResult;
use crate::pipeline::context::ExecutionContext;

/// The demand-driven negotiation protocol every stage implements.
///
/// Passes run in declaration order once per update cycle, each single-threaded, and may be
/// re-entered on later cycles. Only [`Stage::execute`] touches pixel data.
pub trait Stage {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Describe the largest output the stage could ever produce from its current inputs.
    fn compute_output_information(&mut self) -> VoxframeResult<()>;

    /// Resolve the downstream request, defaulting unset parts to the largest extent.
    fn compute_output_requested_region(&mut self) -> VoxframeResult<()>;

    /// Back-propagate the resolved output request onto the inputs.
    fn compute_input_requested_region(&mut self) -> VoxframeResult<()>;

    /// Produce pixels for exactly the requested output region.
    fn execute(&mut self, ctx: &ExecutionContext) -> VoxframeResult<()>;
}
