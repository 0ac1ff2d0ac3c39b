//! Caption segmentation.
//!
//! Turns the flat word-timing list into short caption intervals using a
//! greedy, single-pass grouping heuristic: keep appending words to the open
//! caption while the word count stays under the limit and the silence since
//! the previous word stays within the gap threshold; otherwise close the
//! caption at the previous word's end and start a new one.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::config::SegmenterConfig;
use crate::error::{Result, StorySyncError};
use crate::transcript::words::{validate_words, TimedWord};

/// A group of consecutive words rendered as one on-screen caption.
///
/// `start` is the first word's start, `end` the last word's end; `text` is
/// the words joined with single spaces. Chunks are immutable once emitted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CaptionChunk {
    /// Space-joined caption text
    pub text: String,
    /// Display start in seconds
    pub start: f32,
    /// Display end in seconds
    pub end: f32,
    /// Number of words in the chunk
    pub word_count: usize,
}

impl CaptionChunk {
    /// Display duration of the chunk in seconds.
    pub fn duration(&self) -> f32 {
        self.end - self.start
    }
}

/// Group a time-ordered word list into caption chunks.
///
/// Single greedy pass. A word joins the open chunk only while the chunk
/// holds fewer than `max_words_per_chunk` words AND the silence between the
/// previous word's end and this word's start is at most `max_gap_seconds`.
/// The gap is measured against the previous *word*, not the chunk start, so
/// a chunk of closely spoken words can span more real time than
/// `max_gap_seconds * max_words_per_chunk`. Chunk boundaries always fall on
/// word boundaries.
///
/// An empty word list produces an empty chunk list, unless
/// `require_captions` is set, in which case it is
/// [`StorySyncError::EmptyTranscript`]. The input is validated first and
/// out-of-order or overlapping word timings are rejected as
/// [`StorySyncError::InvalidTranscript`].
pub fn segment_words(words: &[TimedWord], config: &SegmenterConfig) -> Result<Vec<CaptionChunk>> {
    if config.max_words_per_chunk == 0 {
        return Err(StorySyncError::Configuration(
            "max_words_per_chunk must be at least 1".to_string(),
        ));
    }
    if !config.max_gap_seconds.is_finite() || config.max_gap_seconds < 0.0 {
        return Err(StorySyncError::Configuration(format!(
            "max_gap_seconds must be a non-negative number, got {}",
            config.max_gap_seconds
        )));
    }
    validate_words(words)?;

    let mut chunks = Vec::new();
    let mut current_text = String::new();
    let mut chunk_start = 0.0f32;
    let mut word_count = 0usize;
    let mut prev_end = 0.0f32;

    for word in words {
        if word_count == 0 {
            current_text = word.text.clone();
            chunk_start = word.start;
            word_count = 1;
        } else if word_count < config.max_words_per_chunk
            && word.start - prev_end <= config.max_gap_seconds
        {
            current_text.push(' ');
            current_text.push_str(&word.text);
            word_count += 1;
        } else {
            chunks.push(CaptionChunk {
                text: current_text.clone(),
                start: chunk_start,
                end: prev_end,
                word_count,
            });
            current_text = word.text.clone();
            chunk_start = word.start;
            word_count = 1;
        }
        prev_end = word.end;
    }

    if word_count > 0 {
        chunks.push(CaptionChunk {
            text: current_text,
            start: chunk_start,
            end: prev_end,
            word_count,
        });
    }

    if chunks.is_empty() && config.require_captions {
        return Err(StorySyncError::EmptyTranscript(
            "no caption chunks were produced".to_string(),
        ));
    }

    debug!(
        "Segmented {} words into {} caption chunks",
        words.len(),
        chunks.len()
    );
    Ok(chunks)
}
