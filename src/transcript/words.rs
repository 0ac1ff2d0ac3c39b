//! Word-level timing records produced by the transcription collaborator.
//!
//! The pipeline never talks to a speech-to-text service itself; it consumes
//! the word dump such a service produces. This module defines the
//! [`TimedWord`] record, loads it from a JSON dump, and enforces the input
//! contract (times in seconds, non-decreasing, non-overlapping) that the
//! rest of the pipeline relies on.

use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{Result, StorySyncError};

/// A single transcribed word with its start/end offset in seconds,
/// relative to the start of the narration track.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimedWord {
    /// The spoken word
    #[serde(alias = "word")]
    pub text: String,
    /// Start offset in seconds
    pub start: f32,
    /// End offset in seconds
    pub end: f32,
}

impl TimedWord {
    /// Create a new timed word.
    pub fn new(text: impl Into<String>, start: f32, end: f32) -> Self {
        Self {
            text: text.into(),
            start,
            end,
        }
    }

    /// Spoken duration of the word in seconds.
    pub fn duration(&self) -> f32 {
        self.end - self.start
    }
}

/// Transcription dumps come either as a bare word array or wrapped in a
/// document object, depending on the service.
#[derive(Deserialize)]
#[serde(untagged)]
enum WordDump {
    List(Vec<TimedWord>),
    Document { words: Vec<TimedWord> },
}

/// Load a word-timing list from a transcription JSON dump.
///
/// Accepts either `[{"text": ..., "start": ..., "end": ...}, ...]` or an
/// object with a top-level `words` array; `"word"` is accepted as an alias
/// for `"text"`. The loaded list is validated before it is returned.
pub fn read_timed_words<P: AsRef<Path>>(path: P) -> Result<Vec<TimedWord>> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)?;
    let words = match serde_json::from_str::<WordDump>(&content)? {
        WordDump::List(words) => words,
        WordDump::Document { words } => words,
    };
    validate_words(&words)?;
    debug!("Read {} timed words from {}", words.len(), path.display());
    Ok(words)
}

/// Check a word list against the transcription contract.
///
/// Each word must have finite times with `start <= end` and non-empty text;
/// the sequence must be non-decreasing in `start`, and a word may not begin
/// before the previous word has ended. A shared boundary
/// (`next.start == prev.end`) is legal. Violations are reported as
/// [`StorySyncError::InvalidTranscript`] with the offending word index.
pub fn validate_words(words: &[TimedWord]) -> Result<()> {
    for (i, word) in words.iter().enumerate() {
        if !word.start.is_finite() || !word.end.is_finite() {
            return Err(StorySyncError::InvalidTranscript(format!(
                "word {} ({:?}) has a non-finite timestamp",
                i, word.text
            )));
        }
        if word.start > word.end {
            return Err(StorySyncError::InvalidTranscript(format!(
                "word {} ({:?}) starts at {:.3}s but ends at {:.3}s",
                i, word.text, word.start, word.end
            )));
        }
        if word.text.trim().is_empty() {
            return Err(StorySyncError::InvalidTranscript(format!(
                "word {} has empty text",
                i
            )));
        }
    }
    for (i, pair) in words.windows(2).enumerate() {
        let (prev, next) = (&pair[0], &pair[1]);
        if next.start < prev.start {
            return Err(StorySyncError::InvalidTranscript(format!(
                "word {} ({:?}) starts at {:.3}s, before word {} at {:.3}s",
                i + 1,
                next.text,
                next.start,
                i,
                prev.start
            )));
        }
        if next.start < prev.end {
            return Err(StorySyncError::InvalidTranscript(format!(
                "word {} ({:?}) starts at {:.3}s, overlapping word {} which ends at {:.3}s",
                i + 1,
                next.text,
                next.start,
                i,
                prev.end
            )));
        }
    }
    Ok(())
}
