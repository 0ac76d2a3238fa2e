//! Splitting resolved scripts into ordered batches.

use scriptcast_core::models::{GenerationBatch, ScriptLine};
use std::num::NonZeroUsize;

/// Split `scripts` into consecutive batches of at most `batch_size`, numbered from `first_id`.
///
/// With no batch size every script goes into a single batch. An empty input yields no batches.
pub fn plan_batches(
    product_name: &str,
    scripts: Vec<ScriptLine>,
    batch_size: Option<NonZeroUsize>,
    first_id: u32,
) -> Vec<GenerationBatch> {
    if scripts.is_empty() {
        return Vec::new();
    }
    let size = batch_size.map(NonZeroUsize::get).unwrap_or(scripts.len());

    scripts
        .chunks(size)
        .zip(first_id..)
        .map(|(chunk, batch_id)| GenerationBatch::new(batch_id, product_name, chunk.to_vec(), size))
        .collect()
}
