//! Parallel scene analysis.
//!
//! Splits the analysis pass into contiguous chunks of sample indices and
//! decodes them on [`rayon`] workers. Each worker opens its own source, so
//! no decode state is shared. Results are stitched back together in
//! frame-index order and cut at the first chunk that ended early, which
//! yields exactly the samples a sequential pass would have produced.

use std::{
    path::Path,
    sync::{Arc, Mutex},
};

use rayon::iter::{IntoParallelIterator, ParallelIterator};

use crate::error::SamplingError;
use crate::histogram::ColorHistogram;
use crate::progress::{OperationType, ProgressCallback, ProgressTracker};
use crate::source::{FrameSource, SourceOpener};

/// Samples from one worker, and whether the worker reached the end of its chunk.
struct ChunkResult {
    samples: Vec<(u64, ColorHistogram)>,
    complete: bool,
}

/// Compute histograms for `frame_indices` across rayon threads.
pub(crate) fn parallel_histograms<O: SourceOpener>(
    opener: &O,
    path: &Path,
    frame_indices: &[u64],
    progress: &Arc<dyn ProgressCallback>,
) -> Result<Vec<(u64, ColorHistogram)>, SamplingError> {
    if frame_indices.is_empty() {
        return Ok(Vec::new());
    }

    let workers = rayon::current_num_threads().max(1);
    let chunk_size = frame_indices.len().div_ceil(workers);
    let tracker = Mutex::new(ProgressTracker::new(
        Arc::clone(progress),
        OperationType::SceneAnalysis,
        Some(frame_indices.len() as u64),
    ));

    log::debug!(
        "Analysing {} sample(s) on {} worker(s)",
        frame_indices.len(),
        workers
    );

    let chunks: Vec<&[u64]> = frame_indices.chunks(chunk_size).collect();
    let results: Result<Vec<ChunkResult>, SamplingError> = chunks
        .into_par_iter()
        .map(|chunk| analyse_chunk(opener, path, chunk, &tracker))
        .collect();

    let mut samples = Vec::with_capacity(frame_indices.len());
    for chunk in results? {
        samples.extend(chunk.samples);
        if !chunk.complete {
            break;
        }
    }
    Ok(samples)
}

fn analyse_chunk<O: SourceOpener>(
    opener: &O,
    path: &Path,
    chunk: &[u64],
    tracker: &Mutex<ProgressTracker>,
) -> Result<ChunkResult, SamplingError> {
    let mut source = opener.open(path)?;
    let mut samples = Vec::with_capacity(chunk.len());
    source.scan(chunk, &mut |frame_index, image| {
        samples.push((frame_index, ColorHistogram::from_image(&image)));
        if let Ok(mut tracker) = tracker.lock() {
            tracker.advance(Some(frame_index));
        }
    })?;

    // A chunk counts as complete once its last target was reached.
    let complete = samples.last().map(|(frame_index, _)| *frame_index) == chunk.last().copied();
    Ok(ChunkResult { samples, complete })
}
