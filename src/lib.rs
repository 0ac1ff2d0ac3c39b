//! # Story Sync
//!
//! A library for turning narrated stories into captioned, music-backed
//! videos, with progress tracking and notifications.
//!
//! ## Features
//!
//! - Read word-level transcripts with per-word timings
//! - Group timed words into short caption chunks
//! - Mix narration over background music at a reduced volume
//! - Trim the base video to the narrated duration
//! - Burn caption overlays into the final video
//! - Track progress across the pipeline with pluggable observers
//!
//! ## Example
//!
//! ```no_run
//! use story_sync::{render_story, Result};
//!
//! fn main() -> Result<()> {
//!     let outcome = render_story(
//!         "story.mp4",
//!         "narration.mp3",
//!         "music.mp3",
//!         "words.json",
//!         "story_final.mp4",
//!     )?;
//!     println!("Rendered {}", outcome.final_video.display());
//!     Ok(())
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use log::{info, warn};

pub mod batch;
pub mod config;
pub mod encode;
pub mod error;
pub mod media;
pub mod notification;
pub mod progress;
pub mod transcript;
pub mod utils;

pub use batch::{render_batch, RenderJob};
pub use config::{
    CaptionPosition, CaptionStyle, EncodeSettings, MixerConfig, MusicFillPolicy, SegmenterConfig,
    StorySyncConfig,
};
pub use encode::{FfmpegEncoder, PlanEncoder};
pub use error::{Result, StorySyncError};
pub use media::{
    build_overlay_schedule, plan_mix, CaptionOverlay, CompositeAudio, FfprobeProber, MediaTrack,
    MixPlan, PlanInputs, PlanOp, RenderPlan, TrackKind, TrackProber,
};
pub use notification::{
    CallbackProgressObserver, CompositeProgressObserver, ConsoleProgressObserver,
    LogProgressObserver, MemoryProgressObserver, ProgressBarObserver,
};
pub use progress::{
    DefaultProgressReporter, ProcessStep, ProgressInfo, ProgressObserver, ProgressReporter,
    ProgressTracker,
};
pub use transcript::{read_timed_words, segment_words, validate_words, CaptionChunk, TimedWord};

/// Result of a full render: where the outputs landed and what captions
/// were burned in.
#[derive(Debug, Clone)]
pub struct RenderOutcome {
    /// The final captioned video.
    pub final_video: PathBuf,
    /// The intermediate mixed video (trimmed, music bed, no captions).
    /// `None` when the file was removed after a successful render.
    pub mixed_video: Option<PathBuf>,
    /// The caption chunks that were scheduled.
    pub captions: Vec<CaptionChunk>,
}

/// Main entry point for rendering story videos.
pub struct StorySync {
    config: StorySyncConfig,
    progress_tracker: Option<ProgressTracker>,
    prober: Box<dyn TrackProber>,
    encoder: Box<dyn PlanEncoder>,
}

impl StorySync {
    /// Create a new instance with the given configuration.
    pub fn new(config: StorySyncConfig) -> Self {
        let encoder = FfmpegEncoder::new(config.encode.clone(), config.cleanup_temp_files);
        Self {
            config,
            progress_tracker: None,
            prober: Box::new(FfprobeProber),
            encoder: Box::new(encoder),
        }
    }

    /// Create a new instance with a custom progress reporter.
    pub fn with_progress_reporter(
        config: StorySyncConfig,
        reporter: Box<dyn ProgressReporter>,
    ) -> Self {
        let mut sync = Self::new(config);
        sync.progress_tracker = Some(ProgressTracker::with_reporter(reporter));
        sync
    }

    /// Replace the track prober. Mainly useful for tests.
    pub fn with_prober(mut self, prober: Box<dyn TrackProber>) -> Self {
        self.prober = prober;
        self
    }

    /// Replace the plan encoder. Mainly useful for tests.
    pub fn with_encoder(mut self, encoder: Box<dyn PlanEncoder>) -> Self {
        self.encoder = encoder;
        self
    }

    /// Set or replace the progress reporter.
    pub fn set_progress_reporter(&mut self, reporter: Box<dyn ProgressReporter>) {
        match &mut self.progress_tracker {
            Some(tracker) => tracker.set_reporter(reporter),
            None => self.progress_tracker = Some(ProgressTracker::with_reporter(reporter)),
        }
    }

    /// Add a progress observer. Returns the observer id, or `None` when no
    /// progress reporter has been configured.
    pub fn add_observer(&mut self, observer: Box<dyn ProgressObserver>) -> Option<usize> {
        self.progress_tracker
            .as_mut()
            .and_then(|t| t.add_observer(observer))
    }

    /// Group timed words into caption chunks using this instance's
    /// segmenter settings.
    pub fn segment(&self, words: &[TimedWord]) -> Result<Vec<CaptionChunk>> {
        segment_words(words, &self.config.segmenter)
    }

    /// Build a render plan from already-probed tracks, without touching
    /// ffmpeg. Useful for previewing what a render would do.
    pub fn plan(
        &self,
        video: &MediaTrack,
        narration: &MediaTrack,
        music: &MediaTrack,
        words: &[TimedWord],
    ) -> Result<RenderPlan> {
        self.config.validate()?;
        let (plan, _) = self.build_plan(video, narration, music, words)?;
        Ok(plan)
    }

    /// Mix narration and music over the video without captions, writing
    /// the result to `output`.
    pub fn mix(
        &self,
        video: impl AsRef<Path>,
        narration: impl AsRef<Path>,
        music: impl AsRef<Path>,
        output: impl AsRef<Path>,
    ) -> Result<PathBuf> {
        self.config.validate()?;
        let tracker = self.progress_tracker.as_ref();

        let (video_track, narration_track, music_track) =
            self.probe_tracks(video.as_ref(), narration.as_ref(), music.as_ref(), tracker)?;

        if let Some(t) = tracker {
            t.set_step(ProcessStep::PlanAssembly);
        }
        let mix = plan_mix(
            &video_track,
            &narration_track,
            &music_track,
            &self.config.mixer,
        )?;
        let inputs = PlanInputs {
            video: video_track.path.clone(),
            narration: narration_track.path.clone(),
            music: music_track.path.clone(),
        };
        let plan = RenderPlan::assemble(inputs, &mix, &[], self.config.style.clone());

        let output = output.as_ref();
        self.encoder.encode_mix(&plan, output, tracker)?;
        if let Some(t) = tracker {
            t.complete();
        }
        Ok(output.to_path_buf())
    }

    /// Run the full pipeline: probe, segment, plan, mix and burn captions.
    ///
    /// The mixed intermediate is written next to `output` with a `_mixed`
    /// suffix. If caption burn-in fails the mixed video is left in place so
    /// the completed stage is not lost.
    pub fn render(
        &self,
        video: impl AsRef<Path>,
        narration: impl AsRef<Path>,
        music: impl AsRef<Path>,
        words: &[TimedWord],
        output: impl AsRef<Path>,
    ) -> Result<RenderOutcome> {
        self.config.validate()?;
        let tracker = self.progress_tracker.as_ref();

        let (video_track, narration_track, music_track) =
            self.probe_tracks(video.as_ref(), narration.as_ref(), music.as_ref(), tracker)?;

        if let Some(t) = tracker {
            t.set_step(ProcessStep::TranscriptSegmentation);
        }
        let (plan, captions) =
            self.build_plan(&video_track, &narration_track, &music_track, words)?;
        info!(
            "Planned render: {} captions, output duration {:.3}s",
            captions.len(),
            plan.output_duration
        );

        let output = output.as_ref();
        let mixed_path = mixed_sibling(output);
        self.encoder.encode_mix(&plan, &mixed_path, tracker)?;

        if let Err(e) = self.encoder.encode_captions(&plan, &mixed_path, output, tracker) {
            warn!(
                "Caption burn-in failed, mixed video kept at {}: {}",
                mixed_path.display(),
                e
            );
            return Err(e);
        }

        let mixed_video = if self.config.cleanup_temp_files {
            if mixed_path.exists() {
                let _ = fs::remove_file(&mixed_path);
            }
            None
        } else {
            Some(mixed_path)
        };

        if let Some(t) = tracker {
            t.complete();
        }
        info!("Story video rendered to {}", output.display());

        Ok(RenderOutcome {
            final_video: output.to_path_buf(),
            mixed_video,
            captions,
        })
    }

    fn probe_tracks(
        &self,
        video: &Path,
        narration: &Path,
        music: &Path,
        tracker: Option<&ProgressTracker>,
    ) -> Result<(MediaTrack, MediaTrack, MediaTrack)> {
        if let Some(t) = tracker {
            t.set_step(ProcessStep::TrackProbing);
        }
        info!("Probing input tracks");
        let video_track = self.prober.open_track(video, TrackKind::Video)?;
        let narration_track = self.prober.open_track(narration, TrackKind::Audio)?;
        let music_track = self.prober.open_track(music, TrackKind::Audio)?;
        if let Some(t) = tracker {
            t.update_step_progress(100.0, Some("Tracks probed".to_string()));
        }
        Ok((video_track, narration_track, music_track))
    }

    fn build_plan(
        &self,
        video: &MediaTrack,
        narration: &MediaTrack,
        music: &MediaTrack,
        words: &[TimedWord],
    ) -> Result<(RenderPlan, Vec<CaptionChunk>)> {
        let captions = segment_words(words, &self.config.segmenter)?;
        let overlays = build_overlay_schedule(&captions, &self.config.style)?;

        let tracker = self.progress_tracker.as_ref();
        if let Some(t) = tracker {
            t.set_step(ProcessStep::PlanAssembly);
        }
        let mix = plan_mix(video, narration, music, &self.config.mixer)?;
        let inputs = PlanInputs {
            video: video.path.clone(),
            narration: narration.path.clone(),
            music: music.path.clone(),
        };
        let plan = RenderPlan::assemble(inputs, &mix, &overlays, self.config.style.clone());
        if let Some(t) = tracker {
            t.update_step_progress(100.0, Some("Render plan assembled".to_string()));
        }
        Ok((plan, captions))
    }
}

impl Default for StorySync {
    fn default() -> Self {
        Self::new(StorySyncConfig::default())
    }
}

// The mixed intermediate lands next to the final output: story.mp4 ->
// story_mixed.mp4.
fn mixed_sibling(output: &Path) -> PathBuf {
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "output".to_string());
    let name = match output.extension() {
        Some(ext) => format!("{}_mixed.{}", stem, ext.to_string_lossy()),
        None => format!("{}_mixed", stem),
    };
    output.with_file_name(name)
}

/// Render a story video with default settings, reading the word-level
/// transcript from a JSON file.
pub fn render_story(
    video: impl AsRef<Path>,
    narration: impl AsRef<Path>,
    music: impl AsRef<Path>,
    transcript: impl AsRef<Path>,
    output: impl AsRef<Path>,
) -> Result<RenderOutcome> {
    render_story_with_config(
        video,
        narration,
        music,
        transcript,
        output,
        StorySyncConfig::default(),
    )
}

/// Render a story video with custom settings.
pub fn render_story_with_config(
    video: impl AsRef<Path>,
    narration: impl AsRef<Path>,
    music: impl AsRef<Path>,
    transcript: impl AsRef<Path>,
    output: impl AsRef<Path>,
    config: StorySyncConfig,
) -> Result<RenderOutcome> {
    let words = read_timed_words(transcript)?;
    StorySync::new(config).render(video, narration, music, &words, output)
}

/// Render a story video with custom settings and progress reporting.
pub fn render_story_with_progress(
    video: impl AsRef<Path>,
    narration: impl AsRef<Path>,
    music: impl AsRef<Path>,
    transcript: impl AsRef<Path>,
    output: impl AsRef<Path>,
    config: StorySyncConfig,
    reporter: Box<dyn ProgressReporter>,
) -> Result<RenderOutcome> {
    let words = read_timed_words(transcript)?;
    StorySync::with_progress_reporter(config, reporter)
        .render(video, narration, music, &words, output)
}
