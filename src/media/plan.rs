//! Render plan assembly.
//!
//! A [`RenderPlan`] is the declarative description of one output video:
//! which input files take part, the ordered operations to apply to them,
//! and the caption style. It is not a media file. The plan is built in full
//! before it is handed to the encode collaborator, so a job that fails
//! during planning never starts encoding.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::config::{CaptionStyle, MusicFillPolicy};
use crate::error::Result;
use crate::media::mixer::MixPlan;
use crate::media::overlay::CaptionOverlay;

/// The input files of a plan.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlanInputs {
    /// Base video track
    pub video: PathBuf,
    /// Narration audio track
    pub narration: PathBuf,
    /// Background music track
    pub music: PathBuf,
}

/// One declarative operation in a render plan.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum PlanOp {
    /// Scale the music amplitude
    ScaleMusicVolume {
        /// Multiplier applied to the music samples
        factor: f32,
    },
    /// Conform the music stream to the composite duration
    FitMusic {
        /// Target duration in seconds
        duration: f64,
        /// Source duration of the music before conforming
        source_duration: f64,
        /// Fill policy when the source is shorter than the target
        fill: MusicFillPolicy,
    },
    /// Mix narration and conformed music into the composite audio bed
    MixAudio {
        /// Composite duration in seconds (the narration duration)
        duration: f64,
    },
    /// Keep the video track over `[start, end)` and attach the composite
    TrimVideo {
        /// Trim start in seconds
        start: f64,
        /// Trim end in seconds
        end: f64,
    },
    /// Draw one caption over `[start, end)`
    DrawCaption {
        /// Caption text
        text: String,
        /// Visible from this time, in seconds
        start: f32,
        /// Hidden from this time, in seconds
        end: f32,
    },
}

/// Declarative description of what to encode.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RenderPlan {
    /// Input files in encoder order
    pub inputs: PlanInputs,
    /// Ordered operations
    pub ops: Vec<PlanOp>,
    /// Caption style shared by all DrawCaption operations
    pub style: CaptionStyle,
    /// Duration of the finished output in seconds
    pub output_duration: f64,
}

impl RenderPlan {
    /// Assemble a complete plan from the mixer's duration math and the
    /// overlay schedule.
    pub fn assemble(
        inputs: PlanInputs,
        mix: &MixPlan,
        overlays: &[CaptionOverlay],
        style: CaptionStyle,
    ) -> Self {
        let mut ops = Vec::with_capacity(4 + overlays.len());
        ops.push(PlanOp::ScaleMusicVolume {
            factor: mix.composite.music_volume,
        });
        ops.push(PlanOp::FitMusic {
            duration: mix.composite.duration,
            source_duration: mix.composite.music_source_duration,
            fill: mix.composite.music_fill,
        });
        ops.push(PlanOp::MixAudio {
            duration: mix.composite.duration,
        });
        ops.push(PlanOp::TrimVideo {
            start: 0.0,
            end: mix.video_end,
        });
        for overlay in overlays {
            ops.push(PlanOp::DrawCaption {
                text: overlay.text.clone(),
                start: overlay.start,
                end: overlay.end,
            });
        }

        Self {
            inputs,
            ops,
            style,
            output_duration: mix.video_end,
        }
    }

    /// Number of caption overlays in the plan.
    pub fn caption_count(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, PlanOp::DrawCaption { .. }))
            .count()
    }

    /// Serialize the plan as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MixerConfig;
    use crate::media::mixer::plan_mix;
    use crate::media::probe::{MediaTrack, TrackKind};

    fn sample_plan() -> RenderPlan {
        let mix = plan_mix(
            &MediaTrack::new("video.mp4", 10.0, TrackKind::Video),
            &MediaTrack::new("narration.mp3", 8.0, TrackKind::Audio),
            &MediaTrack::new("music.mp3", 20.0, TrackKind::Audio),
            &MixerConfig::default(),
        )
        .unwrap();
        let overlays = vec![
            CaptionOverlay {
                text: "Once upon a time".to_string(),
                start: 0.0,
                end: 1.1,
            },
            CaptionOverlay {
                text: "there".to_string(),
                start: 3.0,
                end: 3.3,
            },
        ];
        let inputs = PlanInputs {
            video: "video.mp4".into(),
            narration: "narration.mp3".into(),
            music: "music.mp3".into(),
        };
        RenderPlan::assemble(inputs, &mix, &overlays, CaptionStyle::default())
    }

    #[test]
    fn test_assemble_orders_operations() {
        let plan = sample_plan();

        assert_eq!(plan.output_duration, 10.0);
        assert_eq!(plan.ops.len(), 6);
        assert!(matches!(plan.ops[0], PlanOp::ScaleMusicVolume { .. }));
        assert!(matches!(
            plan.ops[1],
            PlanOp::FitMusic { duration, .. } if duration == 8.0
        ));
        assert!(matches!(plan.ops[2], PlanOp::MixAudio { duration } if duration == 8.0));
        assert!(matches!(
            plan.ops[3],
            PlanOp::TrimVideo { start, end } if start == 0.0 && end == 10.0
        ));
        assert!(matches!(plan.ops[4], PlanOp::DrawCaption { .. }));
        assert_eq!(plan.caption_count(), 2);
    }

    #[test]
    fn test_caption_order_follows_the_schedule() {
        let plan = sample_plan();
        let captions: Vec<&str> = plan
            .ops
            .iter()
            .filter_map(|op| match op {
                PlanOp::DrawCaption { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(captions, vec!["Once upon a time", "there"]);
    }

    #[test]
    fn test_plan_serializes_to_json() {
        let plan = sample_plan();
        let json = plan.to_json().unwrap();
        assert!(json.contains("TrimVideo"));
        assert!(json.contains("Once upon a time"));

        let parsed: RenderPlan = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, plan);
    }
}
