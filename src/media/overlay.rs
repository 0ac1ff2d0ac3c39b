//! Overlay Compositor: caption schedule building.
//!
//! Builds the timed text-overlay schedule from the segmenter's chunks.
//! Pure with respect to timing: every overlay is active over exactly its
//! chunk's `[start, end)` interval. Style resources are validated here so
//! an unresolvable font or color fails before any encoding starts.

use lazy_static::lazy_static;
use log::debug;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::CaptionStyle;
use crate::error::{Result, StorySyncError};
use crate::transcript::CaptionChunk;

lazy_static! {
    // Color names ("white") or RRGGBB hex, optionally prefixed with # or 0x
    static ref COLOR_RE: Regex =
        Regex::new(r"^(?:[A-Za-z]+|(?:#|0x)?[0-9A-Fa-f]{6})$").unwrap();
}

/// One scheduled caption overlay, active during `[start, end)`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CaptionOverlay {
    /// Text to draw
    pub text: String,
    /// Overlay becomes visible at this time, in seconds
    pub start: f32,
    /// Overlay disappears at this time, in seconds
    pub end: f32,
}

/// Check that a caption style's resources can be resolved.
///
/// A configured font file must exist on disk; colors must be a color name
/// or six-digit hex. Violations are [`StorySyncError::InvalidStyle`].
pub fn validate_style(style: &CaptionStyle) -> Result<()> {
    if let Some(font) = &style.font_file {
        if !font.exists() {
            return Err(StorySyncError::InvalidStyle(format!(
                "font file not found: {}",
                font.display()
            )));
        }
    }
    if !COLOR_RE.is_match(&style.color) {
        return Err(StorySyncError::InvalidStyle(format!(
            "unrecognized color: {:?}",
            style.color
        )));
    }
    if !COLOR_RE.is_match(&style.stroke_color) {
        return Err(StorySyncError::InvalidStyle(format!(
            "unrecognized stroke color: {:?}",
            style.stroke_color
        )));
    }
    if style.font_size == 0 {
        return Err(StorySyncError::InvalidStyle(
            "font_size must be at least 1".to_string(),
        ));
    }
    Ok(())
}

/// Build the overlay schedule for an ordered chunk sequence.
///
/// Timing is taken from the chunks unchanged; chunks produced by the
/// segmenter never overlap, so at most one overlay is active at a time.
pub fn build_overlay_schedule(
    chunks: &[CaptionChunk],
    style: &CaptionStyle,
) -> Result<Vec<CaptionOverlay>> {
    validate_style(style)?;

    let overlays: Vec<CaptionOverlay> = chunks
        .iter()
        .map(|chunk| CaptionOverlay {
            text: chunk.text.clone(),
            start: chunk.start,
            end: chunk.end,
        })
        .collect();

    debug!("Scheduled {} caption overlays", overlays.len());
    Ok(overlays)
}
