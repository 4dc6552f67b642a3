use crate::foundation::error::VoxframeResult;
use crate::pipeline::context::{ExecutionContext, ExecutionOpts};
use crate::pipeline::stage::Stage;

/// Owns the calling order of the protocol passes.
///
/// Pipeline state lives in the stages themselves; the runner only sequences them and lends
/// its [`ExecutionContext`] to the execution pass.
#[derive(Debug)]
pub struct PipelineRunner {
    ctx: ExecutionContext,
}

impl PipelineRunner {
    /// Runner with a context built from `opts`.
    pub fn new(opts: &ExecutionOpts) -> VoxframeResult<Self> {
        Ok(Self {
            ctx: ExecutionContext::new(opts)?,
        })
    }

    /// Runner around an existing context.
    pub fn with_context(ctx: ExecutionContext) -> Self {
        Self { ctx }
    }

    /// Execution context lent to stages.
    pub fn context(&self) -> &ExecutionContext {
        &self.ctx
    }

    /// Run the three propagation passes without executing.
    ///
    /// Errors abort before any later pass runs.
    #[tracing::instrument(skip_all, fields(stage = stage.name()))]
    pub fn propagate<S: Stage + ?Sized>(&self, stage: &mut S) -> VoxframeResult<()> {
        stage.compute_output_information()?;
        stage.compute_output_requested_region()?;
        stage.compute_input_requested_region()?;
        tracing::debug!("regions negotiated");
        Ok(())
    }

    /// Run a full update cycle: propagation, then execution.
    #[tracing::instrument(skip_all, fields(stage = stage.name()))]
    pub fn update<S: Stage + ?Sized>(&self, stage: &mut S) -> VoxframeResult<()> {
        self.propagate(stage)?;
        stage.execute(&self.ctx)?;
        tracing::debug!("execution complete");
        Ok(())
    }
}

impl Default for PipelineRunner {
    fn default() -> Self {
        Self::with_context(ExecutionContext::sequential())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/runner.rs"]
mod tests;
