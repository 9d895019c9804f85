//! Async extraction.
//!
//! [`ExtractionFuture`] runs a whole extraction on tokio's blocking pool so
//! the CPU-heavy decode and encode work never stalls the async runtime.
//!
//! # Example
//!
//! ```no_run
//! use framesnap::{ExtractionError, ExtractionRequest, ExtractorConfig, FrameExtractor};
//!
//! # async fn example() -> Result<(), ExtractionError> {
//! let extractor = FrameExtractor::new(ExtractorConfig::new("frames"))?;
//! let report = extractor
//!     .extract_async("talk.mp4", ExtractionRequest::default())
//!     .await?;
//! println!("{} frame(s)", report.frames_extracted());
//! # Ok(())
//! # }
//! ```

use std::{
    future::Future,
    path::PathBuf,
    pin::Pin,
    task::{Context, Poll},
};

use tokio::task::JoinHandle;

use crate::configuration::ExtractionRequest;
use crate::error::ExtractionError;
use crate::extractor::{ExtractionResult, FrameExtractor};
use crate::source::SourceOpener;

/// An extraction running on a blocking thread.
///
/// Dropping the future detaches the worker; the extraction still runs to
/// completion and its files stay on disk.
pub struct ExtractionFuture {
    handle: JoinHandle<ExtractionResult>,
}

impl Future for ExtractionFuture {
    type Output = ExtractionResult;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.handle).poll(cx).map(|joined| {
            joined.unwrap_or_else(|error| {
                Err(ExtractionError::NoFramesExtracted {
                    reason: format!("extraction worker failed: {error}"),
                })
            })
        })
    }
}

impl<O> FrameExtractor<O>
where
    O: SourceOpener + Clone + 'static,
{
    /// Run [`extract`](FrameExtractor::extract) on tokio's blocking pool.
    ///
    /// Must be called from within a tokio runtime.
    pub fn extract_async(
        &self,
        video_path: impl Into<PathBuf>,
        request: ExtractionRequest,
    ) -> ExtractionFuture {
        let extractor = self.clone();
        let video_path = video_path.into();
        let handle =
            tokio::task::spawn_blocking(move || extractor.extract(&video_path, &request));
        ExtractionFuture { handle }
    }
}
