//! Transcript handling: timed words and caption segmentation.

pub mod segmenter;
pub mod words;

#[cfg(test)]
mod tests {
    mod test_segmenter;
    mod test_words;
}

pub use segmenter::{segment_words, CaptionChunk};
pub use words::{read_timed_words, validate_words, TimedWord};
