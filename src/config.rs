//! Configuration for the story-sync library.
//!
//! All pipeline thresholds are carried here rather than as constants, so a
//! host application can tune mixing, segmentation and caption styling per
//! job. [`StorySyncConfig::default`] reproduces the stock story pipeline:
//! background music at one tenth volume, a two second video tail, four-word
//! captions with a one second gap limit, centered white text with a black
//! stroke.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Result, StorySyncError};

/// Policy for filling background music that is shorter than the narration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum MusicFillPolicy {
    /// Loop the music track until it covers the narration
    Loop,
    /// Pad the tail with silence
    Silence,
}

impl Default for MusicFillPolicy {
    fn default() -> Self {
        Self::Loop
    }
}

impl MusicFillPolicy {
    /// Get the string representation of the policy
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Loop => "loop",
            Self::Silence => "silence",
        }
    }
}

/// On-screen position of rendered captions.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum CaptionPosition {
    /// Centered horizontally and vertically
    Center,
    /// Centered horizontally, near the bottom edge
    Bottom,
    /// Centered horizontally, near the top edge
    Top,
}

impl Default for CaptionPosition {
    fn default() -> Self {
        Self::Center
    }
}

impl CaptionPosition {
    /// Get the string representation of the position
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Center => "center",
            Self::Bottom => "bottom",
            Self::Top => "top",
        }
    }
}

/// Track Mixer settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MixerConfig {
    /// Amplitude scale applied to the background music (0.0 - 1.0)
    pub music_volume: f32,
    /// How many seconds the video may run past the composite audio
    pub video_tail_tolerance: f64,
    /// How to fill music that is shorter than the narration
    pub music_fill: MusicFillPolicy,
}

impl Default for MixerConfig {
    fn default() -> Self {
        Self {
            music_volume: 0.1,
            video_tail_tolerance: 2.0,
            music_fill: MusicFillPolicy::default(),
        }
    }
}

/// Caption Segmenter settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmenterConfig {
    /// Maximum number of words per caption chunk
    pub max_words_per_chunk: usize,
    /// Maximum silence between consecutive words kept in one chunk, in seconds
    pub max_gap_seconds: f32,
    /// Treat an empty chunk sequence as an error
    pub require_captions: bool,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            max_words_per_chunk: 4,
            max_gap_seconds: 1.0,
            require_captions: false,
        }
    }
}

/// Caption rendering style.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CaptionStyle {
    /// Font file to render with; when `None` the renderer's default font is used
    pub font_file: Option<PathBuf>,
    /// Font size in points
    pub font_size: u32,
    /// Fill color (color name or RRGGBB hex, optionally prefixed with `#` or `0x`)
    pub color: String,
    /// Stroke (outline) color
    pub stroke_color: String,
    /// Stroke width in pixels
    pub stroke_width: u32,
    /// On-screen position
    pub position: CaptionPosition,
}

impl Default for CaptionStyle {
    fn default() -> Self {
        Self {
            font_file: None,
            font_size: 48,
            color: "white".to_string(),
            stroke_color: "black".to_string(),
            stroke_width: 2,
            position: CaptionPosition::default(),
        }
    }
}

/// Encode/mux collaborator settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncodeSettings {
    /// Video codec passed to the encoder
    pub video_codec: String,
    /// Audio codec passed to the encoder
    pub audio_codec: String,
}

impl Default for EncodeSettings {
    fn default() -> Self {
        Self {
            video_codec: "libx264".to_string(),
            audio_codec: "aac".to_string(),
        }
    }
}

/// Library configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorySyncConfig {
    /// Track Mixer settings
    pub mixer: MixerConfig,
    /// Caption Segmenter settings
    pub segmenter: SegmenterConfig,
    /// Caption rendering style
    pub style: CaptionStyle,
    /// Encoder settings
    pub encode: EncodeSettings,
    /// Remove intermediate files after a successful render
    pub cleanup_temp_files: bool,
}

impl Default for StorySyncConfig {
    fn default() -> Self {
        Self {
            mixer: MixerConfig::default(),
            segmenter: SegmenterConfig::default(),
            style: CaptionStyle::default(),
            encode: EncodeSettings::default(),
            cleanup_temp_files: true,
        }
    }
}

impl StorySyncConfig {
    /// Check the configuration for values the pipeline cannot work with.
    ///
    /// Called by the facade before any stage runs, so bad settings fail fast
    /// instead of producing a nonsense plan.
    pub fn validate(&self) -> Result<()> {
        if !self.mixer.music_volume.is_finite() || self.mixer.music_volume < 0.0 {
            return Err(StorySyncError::Configuration(format!(
                "music_volume must be a non-negative number, got {}",
                self.mixer.music_volume
            )));
        }
        if !self.mixer.video_tail_tolerance.is_finite() || self.mixer.video_tail_tolerance < 0.0 {
            return Err(StorySyncError::Configuration(format!(
                "video_tail_tolerance must be a non-negative number, got {}",
                self.mixer.video_tail_tolerance
            )));
        }
        if self.segmenter.max_words_per_chunk == 0 {
            return Err(StorySyncError::Configuration(
                "max_words_per_chunk must be at least 1".to_string(),
            ));
        }
        if !self.segmenter.max_gap_seconds.is_finite() || self.segmenter.max_gap_seconds < 0.0 {
            return Err(StorySyncError::Configuration(format!(
                "max_gap_seconds must be a non-negative number, got {}",
                self.segmenter.max_gap_seconds
            )));
        }
        if self.style.font_size == 0 {
            return Err(StorySyncError::Configuration(
                "font_size must be at least 1".to_string(),
            ));
        }
        if self.encode.video_codec.is_empty() || self.encode.audio_codec.is_empty() {
            return Err(StorySyncError::Configuration(
                "video_codec and audio_codec must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
