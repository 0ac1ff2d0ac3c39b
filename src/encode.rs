//! Render plan execution via ffmpeg.
//!
//! The encoder consumes a complete [`RenderPlan`] and produces output media
//! in stages, writing each intermediate into a scoped temp directory: first
//! the composite audio bed, then the trimmed video with that audio
//! attached, and finally the caption burn-in. Every published file is
//! written under a staging name and renamed into place, so a failed or
//! cancelled run never leaves a partial file at a requested path.

use std::fs;
use std::path::{Path, PathBuf};

use log::info;

use crate::config::{CaptionPosition, EncodeSettings, MusicFillPolicy};
use crate::error::{Result, StorySyncError};
use crate::media::plan::{PlanOp, RenderPlan};
use crate::progress::{ProcessStep, ProgressTracker};
use crate::utils::ffmpeg::run_ffmpeg_command;
use crate::utils::temp::TempFileManager;

/// Executes render plans.
///
/// The facade is generic over this seam; tests drive the pipeline with a
/// fake encoder and production code uses [`FfmpegEncoder`].
pub trait PlanEncoder: Send + Sync {
    /// Produce the mixed video (trimmed, with composite audio, no captions)
    /// at `output`.
    fn encode_mix(
        &self,
        plan: &RenderPlan,
        output: &Path,
        tracker: Option<&ProgressTracker>,
    ) -> Result<PathBuf>;

    /// Burn the plan's captions into `mixed`, producing `output`.
    fn encode_captions(
        &self,
        plan: &RenderPlan,
        mixed: &Path,
        output: &Path,
        tracker: Option<&ProgressTracker>,
    ) -> Result<PathBuf>;
}

/// [`PlanEncoder`] backed by the ffmpeg binary.
pub struct FfmpegEncoder {
    settings: EncodeSettings,
    cleanup_temp_files: bool,
}

impl FfmpegEncoder {
    /// Create an encoder with the given codec settings.
    pub fn new(settings: EncodeSettings, cleanup_temp_files: bool) -> Self {
        Self {
            settings,
            cleanup_temp_files,
        }
    }
}

impl Default for FfmpegEncoder {
    fn default() -> Self {
        Self::new(EncodeSettings::default(), true)
    }
}

impl PlanEncoder for FfmpegEncoder {
    fn encode_mix(
        &self,
        plan: &RenderPlan,
        output: &Path,
        tracker: Option<&ProgressTracker>,
    ) -> Result<PathBuf> {
        let mut temp = TempFileManager::new(self.cleanup_temp_files)?;

        if let Some(t) = tracker {
            t.set_step(ProcessStep::AudioMixdown);
        }
        info!("Mixing composite audio for {}", output.display());
        let composite = temp.create_temp_file("composite", "mka")?;
        let args = build_composite_audio_args(plan, &self.settings, &composite)?;
        run_args(&args)?;
        if let Some(t) = tracker {
            t.update_step_progress(100.0, Some("Composite audio ready".to_string()));
            t.set_step(ProcessStep::VideoAssembly);
        }

        info!("Assembling mixed video {}", output.display());
        let staging = staging_path(output);
        let args = build_mix_args(plan, &self.settings, &composite, &staging)?;
        run_and_publish(&args, &staging, output)?;
        if let Some(t) = tracker {
            t.update_step_progress(100.0, Some("Mixed video ready".to_string()));
        }

        temp.cleanup()?;
        Ok(output.to_path_buf())
    }

    fn encode_captions(
        &self,
        plan: &RenderPlan,
        mixed: &Path,
        output: &Path,
        tracker: Option<&ProgressTracker>,
    ) -> Result<PathBuf> {
        if let Some(t) = tracker {
            t.set_step(ProcessStep::CaptionBurnIn);
        }

        let staging = staging_path(output);
        if plan.caption_count() == 0 {
            info!("No captions scheduled, copying mixed video to {}", output.display());
            fs::copy(mixed, &staging)?;
            fs::rename(&staging, output)?;
        } else {
            info!(
                "Burning {} captions into {}",
                plan.caption_count(),
                output.display()
            );
            let args = build_caption_args(plan, &self.settings, mixed, &staging)?;
            run_and_publish(&args, &staging, output)?;
        }

        if let Some(t) = tracker {
            t.update_step_progress(100.0, Some("Captions burned".to_string()));
        }
        Ok(output.to_path_buf())
    }
}

fn run_args(args: &[String]) -> Result<()> {
    let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
    run_ffmpeg_command(&arg_refs)
}

// Publish through a staging file so the target path only ever holds a
// complete output.
fn run_and_publish(args: &[String], staging: &Path, output: &Path) -> Result<()> {
    match run_args(args) {
        Ok(()) => {
            fs::rename(staging, output)?;
            Ok(())
        }
        Err(e) => {
            if staging.exists() {
                let _ = fs::remove_file(staging);
            }
            Err(e)
        }
    }
}

// Staging sibling of `output` that keeps the extension, so ffmpeg still
// infers the container format: `story.mp4` -> `story.part.mp4`.
fn staging_path(output: &Path) -> PathBuf {
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "output".to_string());
    let name = match output.extension() {
        Some(ext) => format!("{}.part.{}", stem, ext.to_string_lossy()),
        None => format!("{}.part", stem),
    };
    output.with_file_name(name)
}

fn find_trim(plan: &RenderPlan) -> Result<(f64, f64)> {
    plan.ops
        .iter()
        .find_map(|op| match op {
            PlanOp::TrimVideo { start, end } => Some((*start, *end)),
            _ => None,
        })
        .ok_or_else(|| {
            StorySyncError::EncodeFailed("render plan has no video trim operation".to_string())
        })
}

struct MusicOps {
    volume: f32,
    duration: f64,
    source_duration: f64,
    fill: MusicFillPolicy,
}

fn find_music_ops(plan: &RenderPlan) -> Result<MusicOps> {
    let volume = plan
        .ops
        .iter()
        .find_map(|op| match op {
            PlanOp::ScaleMusicVolume { factor } => Some(*factor),
            _ => None,
        })
        .ok_or_else(|| {
            StorySyncError::EncodeFailed("render plan has no music volume operation".to_string())
        })?;
    let (duration, source_duration, fill) = plan
        .ops
        .iter()
        .find_map(|op| match op {
            PlanOp::FitMusic {
                duration,
                source_duration,
                fill,
            } => Some((*duration, *source_duration, *fill)),
            _ => None,
        })
        .ok_or_else(|| {
            StorySyncError::EncodeFailed("render plan has no music fit operation".to_string())
        })?;

    Ok(MusicOps {
        volume,
        duration,
        source_duration,
        fill,
    })
}

// Stage 1: narration plus conformed music -> composite audio bed.
fn build_composite_audio_args(
    plan: &RenderPlan,
    settings: &EncodeSettings,
    output: &Path,
) -> Result<Vec<String>> {
    let music = find_music_ops(plan)?;
    let loop_music = music.fill == MusicFillPolicy::Loop && music.source_duration < music.duration;

    let mut filter = format!("[1:a]volume={:.3}", music.volume);
    if music.fill == MusicFillPolicy::Silence && music.source_duration < music.duration {
        filter.push_str(",apad");
    }
    filter.push_str(&format!(
        ",atrim=0:{:.3},asetpts=PTS-STARTPTS[bgm];[0:a][bgm]amix=inputs=2:duration=first:normalize=0[mix]",
        music.duration
    ));

    let mut args = vec!["-y".to_string()];
    args.push("-i".to_string());
    args.push(plan.inputs.narration.to_string_lossy().to_string());
    if loop_music {
        args.push("-stream_loop".to_string());
        args.push("-1".to_string());
    }
    args.push("-i".to_string());
    args.push(plan.inputs.music.to_string_lossy().to_string());
    args.extend([
        "-filter_complex".to_string(),
        filter,
        "-map".to_string(),
        "[mix]".to_string(),
        "-c:a".to_string(),
        settings.audio_codec.clone(),
        output.to_string_lossy().to_string(),
    ]);

    Ok(args)
}

// Stage 2: trim the video and attach the composite audio. The muxer runs
// to the end of the longest mapped stream, so the file is bounded with -t
// at the trimmed duration.
fn build_mix_args(
    plan: &RenderPlan,
    settings: &EncodeSettings,
    composite: &Path,
    output: &Path,
) -> Result<Vec<String>> {
    let (start, end) = find_trim(plan)?;
    let filter = format!(
        "[0:v]trim=start={:.3}:end={:.3},setpts=PTS-STARTPTS[v]",
        start, end
    );

    Ok(vec![
        "-y".to_string(),
        "-i".to_string(),
        plan.inputs.video.to_string_lossy().to_string(),
        "-i".to_string(),
        composite.to_string_lossy().to_string(),
        "-filter_complex".to_string(),
        filter,
        "-map".to_string(),
        "[v]".to_string(),
        "-map".to_string(),
        "1:a".to_string(),
        "-c:v".to_string(),
        settings.video_codec.clone(),
        "-c:a".to_string(),
        "copy".to_string(),
        "-t".to_string(),
        format!("{:.3}", end - start),
        output.to_string_lossy().to_string(),
    ])
}

// Stage 3: burn the caption overlays into the mixed video.
fn build_caption_args(
    plan: &RenderPlan,
    settings: &EncodeSettings,
    mixed: &Path,
    output: &Path,
) -> Result<Vec<String>> {
    let filters: Vec<String> = plan
        .ops
        .iter()
        .filter_map(|op| match op {
            PlanOp::DrawCaption { text, start, end } => {
                Some(drawtext_filter(plan, text, *start, *end))
            }
            _ => None,
        })
        .collect();

    if filters.is_empty() {
        return Err(StorySyncError::EncodeFailed(
            "render plan has no caption operations".to_string(),
        ));
    }

    Ok(vec![
        "-y".to_string(),
        "-i".to_string(),
        mixed.to_string_lossy().to_string(),
        "-vf".to_string(),
        filters.join(","),
        "-c:v".to_string(),
        settings.video_codec.clone(),
        "-c:a".to_string(),
        "copy".to_string(),
        output.to_string_lossy().to_string(),
    ])
}

fn drawtext_filter(plan: &RenderPlan, text: &str, start: f32, end: f32) -> String {
    let style = &plan.style;
    let (x, y) = position_expressions(style.position);

    let mut filter = String::from("drawtext=expansion=none");
    if let Some(font) = &style.font_file {
        filter.push_str(&format!(":fontfile='{}'", font.to_string_lossy()));
    }
    filter.push_str(&format!(
        ":text='{}':fontsize={}:fontcolor={}:borderw={}:bordercolor={}:x={}:y={}:enable='gte(t,{:.3})*lt(t,{:.3})'",
        escape_caption_text(text),
        style.font_size,
        normalize_color(&style.color),
        style.stroke_width,
        normalize_color(&style.stroke_color),
        x,
        y,
        start,
        end
    ));
    filter
}

fn position_expressions(position: CaptionPosition) -> (&'static str, &'static str) {
    match position {
        CaptionPosition::Center => ("(w-text_w)/2", "(h-text_h)/2"),
        CaptionPosition::Bottom => ("(w-text_w)/2", "h-text_h-h/10"),
        CaptionPosition::Top => ("(w-text_w)/2", "h/10"),
    }
}

// The caption text is carried inside a single-quoted filter value; a
// literal quote has to close it, emit an escaped quote and reopen.
fn escape_caption_text(text: &str) -> String {
    text.replace('\'', "'\\''")
}

// ffmpeg's color parser wants bare hex prefixed with 0x.
fn normalize_color(color: &str) -> String {
    if color.len() == 6 && color.chars().all(|c| c.is_ascii_hexdigit()) {
        format!("0x{}", color)
    } else {
        color.to_string()
    }
}
