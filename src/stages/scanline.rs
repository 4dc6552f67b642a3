use crate::foundation::error::VoxframeResult;
use crate::pipeline::context::ExecutionContext;
use crate::region::spatial::SpatialRegion;

/// Partition `data`, buffered over `region`, into batches of `ctx.rows_per_batch()` scanlines
/// and run `line_fn(line, row)` for every scanline.
///
/// Each batch owns a disjoint strip of `data`, so workers never share output rows. Progress is
/// reported once per finished batch, in pixels.
pub(crate) fn for_each_scanline_batch<P, F>(
    ctx: &ExecutionContext,
    region: &SpatialRegion,
    data: &mut [P],
    line_fn: F,
) -> VoxframeResult<()>
where
    P: Send,
    F: Fn(usize, &mut [P]) -> VoxframeResult<()> + Send + Sync,
{
    let total = region.number_of_pixels();
    ctx.progress().reset(total as u64);
    if total == 0 {
        return Ok(());
    }

    let line_len = region.line_length();
    let rows = ctx.rows_per_batch();
    let batches: Vec<(usize, &mut [P])> = data.chunks_mut(line_len * rows).enumerate().collect();
    tracing::debug!(
        batches = batches.len(),
        rows_per_batch = rows,
        line_len,
        "scanline partition"
    );

    ctx.run_units(batches, |(batch, strip)| {
        let first_line = batch * rows;
        let mut pixels = 0u64;
        for (local, row) in strip.chunks_mut(line_len).enumerate() {
            pixels += row.len() as u64;
            line_fn(first_line + local, row)?;
        }
        ctx.progress().completed(pixels);
        Ok(())
    })
}

#[cfg(test)]
#[path = "../../tests/unit/stages/scanline.rs"]
mod tests;
