use log::debug;

/// Runs the inputs in sequential batches and concatenates the outputs in input order.
///
/// The batch size must be greater than zero. Empty inputs are never run.
pub(crate) fn run_batched<I, O, E>(
    inputs: &[I],
    batch_size: usize,
    mut run: impl FnMut(&[I]) -> Result<Vec<O>, E>,
) -> Result<Vec<O>, E> {
    debug_assert!(batch_size > 0);
    let mut outputs = Vec::with_capacity(inputs.len());
    for (idx, batch) in inputs.chunks(batch_size.max(1)).enumerate() {
        debug!("running batch {} of size {}", idx, batch.len());
        outputs.extend(run(batch)?);
    }

    Ok(outputs)
}
