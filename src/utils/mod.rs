//! Shared process and filesystem helpers.

pub mod ffmpeg;
pub mod temp;

pub use ffmpeg::{check_ffmpeg_installed, get_ffmpeg_version};
pub use temp::TempFileManager;
