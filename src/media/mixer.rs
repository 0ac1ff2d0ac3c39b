//! Track Mixer: duration reconciliation across video, narration and music.
//!
//! The mixer itself is pure arithmetic over probed track durations. It
//! decides the composite audio duration (always the narration duration),
//! how the music is conformed to it, and where the video is cut. The
//! resulting [`MixPlan`] drives the encoder; no media is touched here.

use log::info;
use serde::{Deserialize, Serialize};

use crate::config::{MixerConfig, MusicFillPolicy};
use crate::error::{Result, StorySyncError};
use crate::media::probe::MediaTrack;

/// The mixed audio bed: narration layered over attenuated background music.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompositeAudio {
    /// Composite duration in seconds, always the narration duration
    pub duration: f64,
    /// Amplitude scale applied to the music
    pub music_volume: f32,
    /// Fill policy when the music is shorter than the narration
    pub music_fill: MusicFillPolicy,
    /// Duration of the music source before conforming
    pub music_source_duration: f64,
}

impl CompositeAudio {
    /// Whether the music must be looped or padded to cover the narration.
    pub fn music_needs_fill(&self) -> bool {
        self.music_source_duration < self.duration
    }
}

/// Result of the Track Mixer's duration reconciliation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MixPlan {
    /// Description of the composite audio bed
    pub composite: CompositeAudio,
    /// The video is kept over `[0, video_end)`
    pub video_end: f64,
}

fn ensure_usable(track: &MediaTrack) -> Result<()> {
    if !track.duration.is_finite() || track.duration <= 0.0 {
        return Err(StorySyncError::TrackTooShort(format!(
            "{} track {} has duration {:.3}s",
            track.kind.as_str(),
            track.path.display(),
            track.duration
        )));
    }
    Ok(())
}

/// Reconcile the three input tracks into a [`MixPlan`].
///
/// The composite audio duration is pinned to the narration duration: music
/// longer than the narration is truncated, music shorter than it is filled
/// per `config.music_fill`. The video is kept over
/// `[0, min(video.duration, composite.duration + video_tail_tolerance))`,
/// so it may run briefly past the audio but never past its own source.
///
/// Any zero or negative length input is [`StorySyncError::TrackTooShort`].
pub fn plan_mix(
    video: &MediaTrack,
    narration: &MediaTrack,
    music: &MediaTrack,
    config: &MixerConfig,
) -> Result<MixPlan> {
    if !config.music_volume.is_finite() || config.music_volume < 0.0 {
        return Err(StorySyncError::Configuration(format!(
            "music_volume must be a non-negative number, got {}",
            config.music_volume
        )));
    }
    if !config.video_tail_tolerance.is_finite() || config.video_tail_tolerance < 0.0 {
        return Err(StorySyncError::Configuration(format!(
            "video_tail_tolerance must be a non-negative number, got {}",
            config.video_tail_tolerance
        )));
    }

    ensure_usable(video)?;
    ensure_usable(narration)?;
    ensure_usable(music)?;

    let composite = CompositeAudio {
        duration: narration.duration,
        music_volume: config.music_volume,
        music_fill: config.music_fill,
        music_source_duration: music.duration,
    };
    let video_end = video
        .duration
        .min(composite.duration + config.video_tail_tolerance);

    info!(
        "Mix plan: narration {:.3}s, music {:.3}s ({}), video {:.3}s, video end {:.3}s",
        narration.duration,
        music.duration,
        composite.music_fill.as_str(),
        video.duration,
        video_end
    );

    Ok(MixPlan {
        composite,
        video_end,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::probe::TrackKind;

    fn video(duration: f64) -> MediaTrack {
        MediaTrack::new("video.mp4", duration, TrackKind::Video)
    }

    fn audio(name: &str, duration: f64) -> MediaTrack {
        MediaTrack::new(name, duration, TrackKind::Audio)
    }

    #[test]
    fn test_long_video_is_trimmed_to_audio_plus_tolerance() {
        // video 10s, narration 8s, music 20s
        let plan = plan_mix(
            &video(10.0),
            &audio("narration.mp3", 8.0),
            &audio("music.mp3", 20.0),
            &MixerConfig::default(),
        )
        .unwrap();

        assert_eq!(plan.composite.duration, 8.0);
        assert!(!plan.composite.music_needs_fill());
        assert_eq!(plan.video_end, 10.0);
    }

    #[test]
    fn test_short_video_caps_the_output() {
        // video 5s, narration 8s
        let plan = plan_mix(
            &video(5.0),
            &audio("narration.mp3", 8.0),
            &audio("music.mp3", 20.0),
            &MixerConfig::default(),
        )
        .unwrap();

        assert_eq!(plan.composite.duration, 8.0);
        assert_eq!(plan.video_end, 5.0);
    }

    #[test]
    fn test_output_never_exceeds_video_and_respects_tolerance() {
        let config = MixerConfig::default();
        for video_duration in [1.0, 3.5, 8.0, 9.9, 10.0, 10.1, 25.0] {
            for narration_duration in [0.5, 2.0, 8.0, 12.0] {
                let plan = plan_mix(
                    &video(video_duration),
                    &audio("n.mp3", narration_duration),
                    &audio("m.mp3", 6.0),
                    &config,
                )
                .unwrap();

                assert!(plan.video_end <= video_duration);
                if video_duration >= narration_duration + config.video_tail_tolerance {
                    assert_eq!(plan.video_end, narration_duration + config.video_tail_tolerance);
                } else {
                    assert_eq!(plan.video_end, video_duration);
                }
            }
        }
    }

    #[test]
    fn test_short_music_is_marked_for_fill() {
        let plan = plan_mix(
            &video(30.0),
            &audio("narration.mp3", 20.0),
            &audio("music.mp3", 7.5),
            &MixerConfig::default(),
        )
        .unwrap();

        assert!(plan.composite.music_needs_fill());
        assert_eq!(plan.composite.music_fill, MusicFillPolicy::Loop);
        assert_eq!(plan.composite.music_source_duration, 7.5);
    }

    #[test]
    fn test_zero_length_tracks_are_rejected() {
        let config = MixerConfig::default();

        let err = plan_mix(
            &video(0.0),
            &audio("n.mp3", 8.0),
            &audio("m.mp3", 8.0),
            &config,
        )
        .unwrap_err();
        assert!(matches!(err, StorySyncError::TrackTooShort(_)));

        let err = plan_mix(
            &video(10.0),
            &audio("n.mp3", 0.0),
            &audio("m.mp3", 8.0),
            &config,
        )
        .unwrap_err();
        assert!(matches!(err, StorySyncError::TrackTooShort(_)));

        let err = plan_mix(
            &video(10.0),
            &audio("n.mp3", 8.0),
            &audio("m.mp3", -1.0),
            &config,
        )
        .unwrap_err();
        assert!(matches!(err, StorySyncError::TrackTooShort(_)));
    }

    #[test]
    fn test_negative_music_volume_is_a_configuration_error() {
        let config = MixerConfig {
            music_volume: -0.2,
            ..MixerConfig::default()
        };
        let err = plan_mix(
            &video(10.0),
            &audio("n.mp3", 8.0),
            &audio("m.mp3", 8.0),
            &config,
        )
        .unwrap_err();
        assert!(matches!(err, StorySyncError::Configuration(_)));
    }
}
