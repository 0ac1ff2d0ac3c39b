//! Helpers for invoking ffmpeg and ffprobe.
//!
//! All external media work in this crate goes through these two binaries;
//! nothing else shells out.

use std::process::Command;

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::{Result, StorySyncError};

lazy_static! {
    static ref FFMPEG_VERSION_RE: Regex = Regex::new(r"ffmpeg version (\S+)").unwrap();
}

/// Check whether the ffmpeg binary can be spawned.
pub fn check_ffmpeg_installed() -> Result<bool> {
    match Command::new("ffmpeg").arg("-version").output() {
        Ok(output) => Ok(output.status.success()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}

/// Get the installed ffmpeg version string (for example `6.1.1`).
pub fn get_ffmpeg_version() -> Result<String> {
    let output = Command::new("ffmpeg").arg("-version").output()?;

    if !output.status.success() {
        return Err(StorySyncError::EncodeFailed(
            "failed to query ffmpeg version".to_string(),
        ));
    }

    let version_str = String::from_utf8_lossy(&output.stdout);
    parse_version_line(&version_str).ok_or_else(|| {
        StorySyncError::EncodeFailed(format!(
            "unrecognized ffmpeg version output: {}",
            version_str.lines().next().unwrap_or("")
        ))
    })
}

fn parse_version_line(output: &str) -> Option<String> {
    FFMPEG_VERSION_RE
        .captures(output)
        .map(|caps| caps[1].to_string())
}

/// Run an ffmpeg command.
///
/// ffmpeg is only ever invoked to produce output media, so a failure is
/// reported as [`StorySyncError::EncodeFailed`] with the tail of stderr.
pub fn run_ffmpeg_command(args: &[&str]) -> Result<()> {
    log::debug!("Running ffmpeg {}", args.join(" "));
    let output = Command::new("ffmpeg").args(args).output()?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(StorySyncError::EncodeFailed(format!(
            "ffmpeg exited with {}: {}",
            output.status,
            stderr_excerpt(&stderr)
        )));
    }

    Ok(())
}

/// Run an ffprobe command and return its stdout.
///
/// ffprobe is only ever used to open and inspect input tracks, so a failure
/// is reported as [`StorySyncError::MissingTrack`].
pub fn run_ffprobe_command(args: &[&str]) -> Result<String> {
    log::debug!("Running ffprobe {}", args.join(" "));
    let output = Command::new("ffprobe").args(args).output()?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(StorySyncError::MissingTrack(format!(
            "ffprobe exited with {}: {}",
            output.status,
            stderr_excerpt(&stderr)
        )));
    }

    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

// Error messages carry only the last few lines of stderr; full ffmpeg
// output can run to hundreds of lines of banner and progress text.
fn stderr_excerpt(stderr: &str) -> String {
    let lines: Vec<&str> = stderr.lines().filter(|l| !l.trim().is_empty()).collect();
    let tail = lines.len().saturating_sub(4);
    lines[tail..].join(" | ")
}
