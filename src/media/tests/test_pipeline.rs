//! Pipeline tests that drive the facade with fake probing and encoding,
//! so no ffmpeg binary is needed.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tempfile::TempDir;

use crate::config::{CaptionStyle, SegmenterConfig, StorySyncConfig};
use crate::encode::PlanEncoder;
use crate::error::{Result, StorySyncError};
use crate::media::plan::{PlanOp, RenderPlan};
use crate::media::probe::{MediaTrack, TrackKind, TrackProber};
use crate::notification::MemoryProgressObserver;
use crate::progress::{DefaultProgressReporter, ProcessStep, ProgressReporter, ProgressTracker};
use crate::transcript::TimedWord;
use crate::StorySync;

/// Prober that hands out fixed durations instead of calling ffprobe.
/// Paths containing "absent" report a missing track; audio paths
/// containing "music" get the music duration.
struct FixedProber {
    video: f64,
    narration: f64,
    music: f64,
}

impl TrackProber for FixedProber {
    fn open_track(&self, path: &Path, kind: TrackKind) -> Result<MediaTrack> {
        let name = path.to_string_lossy();
        if name.contains("absent") {
            return Err(StorySyncError::MissingTrack(format!(
                "no {} track at {}",
                kind.as_str(),
                name
            )));
        }
        let duration = match kind {
            TrackKind::Video => self.video,
            TrackKind::Audio if name.contains("music") => self.music,
            TrackKind::Audio => self.narration,
        };
        Ok(MediaTrack::new(path, duration, kind))
    }
}

/// Encoder that records the plans it receives and writes stub files.
#[derive(Clone)]
struct RecordingEncoder {
    plans: Arc<Mutex<Vec<RenderPlan>>>,
    fail_captions: bool,
}

impl RecordingEncoder {
    fn new() -> Self {
        Self {
            plans: Arc::new(Mutex::new(Vec::new())),
            fail_captions: false,
        }
    }

    fn failing_captions() -> Self {
        Self {
            fail_captions: true,
            ..Self::new()
        }
    }

    fn recorded_plans(&self) -> Vec<RenderPlan> {
        self.plans.lock().unwrap().clone()
    }
}

impl PlanEncoder for RecordingEncoder {
    fn encode_mix(
        &self,
        plan: &RenderPlan,
        output: &Path,
        _tracker: Option<&ProgressTracker>,
    ) -> Result<PathBuf> {
        self.plans.lock().unwrap().push(plan.clone());
        fs::write(output, b"mixed")?;
        Ok(output.to_path_buf())
    }

    fn encode_captions(
        &self,
        _plan: &RenderPlan,
        mixed: &Path,
        output: &Path,
        _tracker: Option<&ProgressTracker>,
    ) -> Result<PathBuf> {
        if self.fail_captions {
            return Err(StorySyncError::EncodeFailed(
                "drawtext filter rejected".to_string(),
            ));
        }
        fs::copy(mixed, output)?;
        Ok(output.to_path_buf())
    }
}

fn make_sync(config: StorySyncConfig, prober: FixedProber, encoder: RecordingEncoder) -> StorySync {
    StorySync::new(config)
        .with_prober(Box::new(prober))
        .with_encoder(Box::new(encoder))
}

fn story_words() -> Vec<TimedWord> {
    vec![
        TimedWord::new("Once", 0.0, 0.3),
        TimedWord::new("upon", 0.3, 0.6),
        TimedWord::new("a", 0.6, 0.8),
        TimedWord::new("time", 0.8, 1.1),
        TimedWord::new("there", 3.0, 3.3),
    ]
}

#[test]
fn test_render_produces_final_video_and_cleans_mixed() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("story.mp4");
    let encoder = RecordingEncoder::new();
    let sync = make_sync(
        StorySyncConfig::default(),
        FixedProber {
            video: 10.0,
            narration: 8.0,
            music: 20.0,
        },
        encoder.clone(),
    );

    let outcome = sync
        .render("story.mp4", "narration.mp3", "music.mp3", &story_words(), &output)
        .unwrap();

    assert!(output.exists());
    assert!(outcome.mixed_video.is_none());
    assert!(!dir.path().join("story_mixed.mp4").exists());

    assert_eq!(outcome.captions.len(), 2);
    assert_eq!(outcome.captions[0].text, "Once upon a time");
    assert_eq!(outcome.captions[0].start, 0.0);
    assert_eq!(outcome.captions[0].end, 1.1);
    assert_eq!(outcome.captions[0].word_count, 4);
    assert_eq!(outcome.captions[1].text, "there");
    assert_eq!(outcome.captions[1].word_count, 1);

    let plans = encoder.recorded_plans();
    assert_eq!(plans.len(), 1);
    let plan = &plans[0];
    // Narration of 8s plus the 2s tail fits the 10s video exactly
    assert_eq!(plan.output_duration, 10.0);
    assert!(plan.ops.iter().any(
        |op| matches!(op, PlanOp::TrimVideo { start, end } if *start == 0.0 && *end == 10.0)
    ));
    assert!(plan
        .ops
        .iter()
        .any(|op| matches!(op, PlanOp::MixAudio { duration } if *duration == 8.0)));
    assert_eq!(plan.caption_count(), 2);
}

#[test]
fn test_render_trims_to_short_video() {
    let dir = TempDir::new().unwrap();
    let encoder = RecordingEncoder::new();
    let sync = make_sync(
        StorySyncConfig::default(),
        FixedProber {
            video: 5.0,
            narration: 8.0,
            music: 8.0,
        },
        encoder.clone(),
    );

    sync.render(
        "story.mp4",
        "narration.mp3",
        "music.mp3",
        &story_words(),
        dir.path().join("story.mp4"),
    )
    .unwrap();

    let plans = encoder.recorded_plans();
    assert_eq!(plans[0].output_duration, 5.0);
    assert!(plans[0]
        .ops
        .iter()
        .any(|op| matches!(op, PlanOp::TrimVideo { end, .. } if *end == 5.0)));
}

#[test]
fn test_failed_caption_pass_keeps_mixed_video() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("story.mp4");
    let sync = make_sync(
        StorySyncConfig::default(),
        FixedProber {
            video: 10.0,
            narration: 8.0,
            music: 20.0,
        },
        RecordingEncoder::failing_captions(),
    );

    let err = sync
        .render("story.mp4", "narration.mp3", "music.mp3", &story_words(), &output)
        .unwrap_err();

    assert!(matches!(err, StorySyncError::EncodeFailed(_)));
    // The completed mix stage survives the caption failure
    assert!(dir.path().join("story_mixed.mp4").exists());
    assert!(!output.exists());
}

#[test]
fn test_missing_track_aborts_before_encoding() {
    let dir = TempDir::new().unwrap();
    let encoder = RecordingEncoder::new();
    let sync = make_sync(
        StorySyncConfig::default(),
        FixedProber {
            video: 10.0,
            narration: 8.0,
            music: 20.0,
        },
        encoder.clone(),
    );

    let err = sync
        .render(
            "absent.mp4",
            "narration.mp3",
            "music.mp3",
            &story_words(),
            dir.path().join("story.mp4"),
        )
        .unwrap_err();

    assert!(matches!(err, StorySyncError::MissingTrack(_)));
    assert!(encoder.recorded_plans().is_empty());
}

#[test]
fn test_invalid_style_stops_before_encoding() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("story.mp4");
    let config = StorySyncConfig {
        style: CaptionStyle {
            font_file: Some("no/such/font.otf".into()),
            ..CaptionStyle::default()
        },
        ..StorySyncConfig::default()
    };
    let encoder = RecordingEncoder::new();
    let sync = make_sync(
        config,
        FixedProber {
            video: 10.0,
            narration: 8.0,
            music: 20.0,
        },
        encoder.clone(),
    );

    let err = sync
        .render("story.mp4", "narration.mp3", "music.mp3", &story_words(), &output)
        .unwrap_err();

    assert!(matches!(err, StorySyncError::InvalidStyle(_)));
    assert!(encoder.recorded_plans().is_empty());
    assert!(!output.exists());
}

#[test]
fn test_empty_transcript_renders_uncaptioned_video() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("story.mp4");
    let encoder = RecordingEncoder::new();
    let sync = make_sync(
        StorySyncConfig::default(),
        FixedProber {
            video: 10.0,
            narration: 8.0,
            music: 20.0,
        },
        encoder.clone(),
    );

    let outcome = sync
        .render("story.mp4", "narration.mp3", "music.mp3", &[], &output)
        .unwrap();

    assert!(output.exists());
    assert!(outcome.captions.is_empty());
    assert_eq!(encoder.recorded_plans()[0].caption_count(), 0);
}

#[test]
fn test_required_captions_reject_empty_transcript() {
    let dir = TempDir::new().unwrap();
    let config = StorySyncConfig {
        segmenter: SegmenterConfig {
            require_captions: true,
            ..SegmenterConfig::default()
        },
        ..StorySyncConfig::default()
    };
    let encoder = RecordingEncoder::new();
    let sync = make_sync(
        config,
        FixedProber {
            video: 10.0,
            narration: 8.0,
            music: 20.0,
        },
        encoder.clone(),
    );

    let err = sync
        .render(
            "story.mp4",
            "narration.mp3",
            "music.mp3",
            &[],
            dir.path().join("story.mp4"),
        )
        .unwrap_err();

    assert!(matches!(err, StorySyncError::EmptyTranscript(_)));
    assert!(encoder.recorded_plans().is_empty());
}

#[test]
fn test_mixed_video_kept_when_cleanup_disabled() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("story.mp4");
    let config = StorySyncConfig {
        cleanup_temp_files: false,
        ..StorySyncConfig::default()
    };
    let sync = make_sync(
        config,
        FixedProber {
            video: 10.0,
            narration: 8.0,
            music: 20.0,
        },
        RecordingEncoder::new(),
    );

    let outcome = sync
        .render("story.mp4", "narration.mp3", "music.mp3", &story_words(), &output)
        .unwrap();

    let mixed = dir.path().join("story_mixed.mp4");
    assert_eq!(outcome.mixed_video, Some(mixed.clone()));
    assert!(mixed.exists());
}

#[test]
fn test_mix_writes_uncaptioned_output() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("mixed_only.mp4");
    let encoder = RecordingEncoder::new();
    let sync = make_sync(
        StorySyncConfig::default(),
        FixedProber {
            video: 10.0,
            narration: 8.0,
            music: 20.0,
        },
        encoder.clone(),
    );

    let path = sync
        .mix("story.mp4", "narration.mp3", "music.mp3", &output)
        .unwrap();

    assert_eq!(path, output);
    assert!(output.exists());
    assert_eq!(encoder.recorded_plans()[0].caption_count(), 0);
}

#[test]
fn test_render_reports_progress_to_observers() {
    let dir = TempDir::new().unwrap();
    let observer = MemoryProgressObserver::new();
    let mut reporter = DefaultProgressReporter::new();
    reporter.add_observer(Box::new(observer.clone()));

    let sync = StorySync::with_progress_reporter(StorySyncConfig::default(), Box::new(reporter))
        .with_prober(Box::new(FixedProber {
            video: 10.0,
            narration: 8.0,
            music: 20.0,
        }))
        .with_encoder(Box::new(RecordingEncoder::new()));

    sync.render(
        "story.mp4",
        "narration.mp3",
        "music.mp3",
        &story_words(),
        dir.path().join("story.mp4"),
    )
    .unwrap();

    let history = observer.history();
    assert!(!history.is_empty());
    assert!(history
        .iter()
        .any(|p| p.step == ProcessStep::PlanAssembly.as_str()));
    let last = history.last().unwrap();
    assert_eq!(last.total_progress, 100.0);
}
