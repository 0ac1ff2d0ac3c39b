//! Batch rendering of multiple stories.

use std::path::PathBuf;

use log::info;
use rayon::prelude::*;

use crate::config::StorySyncConfig;
use crate::error::Result;
use crate::transcript::read_timed_words;
use crate::{RenderOutcome, StorySync};

/// One story render: input tracks, transcript and output path.
#[derive(Debug, Clone)]
pub struct RenderJob {
    /// Base video track
    pub video: PathBuf,
    /// Narration audio track
    pub narration: PathBuf,
    /// Background music track
    pub music: PathBuf,
    /// Word-timing JSON dump for the narration
    pub transcript: PathBuf,
    /// Where the finished video is published
    pub output: PathBuf,
}

impl RenderJob {
    /// Create a job from its input, transcript and output paths.
    pub fn new(
        video: impl Into<PathBuf>,
        narration: impl Into<PathBuf>,
        music: impl Into<PathBuf>,
        transcript: impl Into<PathBuf>,
        output: impl Into<PathBuf>,
    ) -> Self {
        Self {
            video: video.into(),
            narration: narration.into(),
            music: music.into(),
            transcript: transcript.into(),
            output: output.into(),
        }
    }
}

/// Render a batch of stories in parallel.
///
/// Jobs run on the rayon thread pool and each gets its own pipeline
/// instance. The returned vector has one result per job, in input order;
/// a failed job does not stop the others.
pub fn render_batch(jobs: &[RenderJob], config: &StorySyncConfig) -> Vec<Result<RenderOutcome>> {
    info!("Rendering batch of {} stories", jobs.len());
    jobs.par_iter()
        .map(|job| {
            let words = read_timed_words(&job.transcript)?;
            StorySync::new(config.clone()).render(
                &job.video,
                &job.narration,
                &job.music,
                &words,
                &job.output,
            )
        })
        .collect()
}
