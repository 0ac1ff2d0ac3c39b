//! Opening and probing input media tracks.
//!
//! A [`MediaTrack`] is the pipeline's handle to an input file: its path,
//! its probed duration and its stream kind. Handles are owned by the stage
//! that opened them and are never shared across jobs; each job probes its
//! own inputs.

use std::path::{Path, PathBuf};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{Result, StorySyncError};
use crate::utils::ffmpeg::run_ffprobe_command;

/// Kind of stream a media track carries.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TrackKind {
    /// A video stream
    Video,
    /// An audio stream
    Audio,
}

impl TrackKind {
    /// Get the string representation of the kind
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Audio => "audio",
        }
    }
}

/// An opened input track.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MediaTrack {
    /// Source file
    pub path: PathBuf,
    /// Duration in seconds
    pub duration: f64,
    /// Stream kind
    pub kind: TrackKind,
}

impl MediaTrack {
    /// Create a track handle from known metadata.
    pub fn new(path: impl Into<PathBuf>, duration: f64, kind: TrackKind) -> Self {
        Self {
            path: path.into(),
            duration,
            kind,
        }
    }
}

/// Opens input tracks and reports their durations.
///
/// The facade is generic over this seam so the pipeline can be driven
/// without media files present.
pub trait TrackProber: Send + Sync {
    /// Open `path` as a track of the given kind.
    ///
    /// Fails with [`StorySyncError::MissingTrack`] when the file does not
    /// exist or cannot be inspected.
    fn open_track(&self, path: &Path, kind: TrackKind) -> Result<MediaTrack>;
}

/// [`TrackProber`] backed by the ffprobe binary.
#[derive(Debug, Default, Clone, Copy)]
pub struct FfprobeProber;

impl FfprobeProber {
    /// Create a new prober.
    pub fn new() -> Self {
        Self
    }
}

impl TrackProber for FfprobeProber {
    fn open_track(&self, path: &Path, kind: TrackKind) -> Result<MediaTrack> {
        if !path.exists() {
            return Err(StorySyncError::MissingTrack(format!(
                "{} track not found: {}",
                kind.as_str(),
                path.display()
            )));
        }

        let duration = probe_duration(path)?;
        debug!(
            "Opened {} track {} ({:.3}s)",
            kind.as_str(),
            path.display(),
            duration
        );

        Ok(MediaTrack::new(path, duration, kind))
    }
}

/// Get the duration of a media file in seconds via ffprobe.
pub fn probe_duration(path: &Path) -> Result<f64> {
    let path_str = path.to_string_lossy().to_string();
    let output = run_ffprobe_command(&[
        "-v",
        "error",
        "-show_entries",
        "format=duration",
        "-of",
        "default=noprint_wrappers=1:nokey=1",
        &path_str,
    ])?;

    output.trim().parse::<f64>().map_err(|_| {
        StorySyncError::MissingTrack(format!(
            "could not read a duration for {}: {:?}",
            path.display(),
            output.trim()
        ))
    })
}
