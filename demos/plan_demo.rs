//! Segments a short story transcript and prints the render plan that a
//! full render would execute, without touching ffmpeg.
//!
//! Run with: cargo run --example plan_demo

use story_sync::{
    CompositeProgressObserver, ConsoleProgressObserver, DefaultProgressReporter,
    LogProgressObserver, MediaTrack, ProgressReporter, StorySync, StorySyncConfig, TimedWord,
    TrackKind,
};

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let words = vec![
        TimedWord::new("Once", 0.0, 0.3),
        TimedWord::new("upon", 0.3, 0.6),
        TimedWord::new("a", 0.6, 0.8),
        TimedWord::new("time", 0.8, 1.1),
        TimedWord::new("there", 3.0, 3.3),
        TimedWord::new("was", 3.3, 3.5),
        TimedWord::new("a", 3.5, 3.6),
        TimedWord::new("fox", 3.6, 4.0),
        TimedWord::new("who", 5.2, 5.4),
        TimedWord::new("loved", 5.4, 5.8),
        TimedWord::new("puzzles", 5.8, 6.4),
    ];

    let mut composite = CompositeProgressObserver::new();
    composite.add_observer(Box::new(ConsoleProgressObserver::with_prefix("[plan] ")));
    composite.add_observer(Box::new(LogProgressObserver::new()));

    let mut reporter = DefaultProgressReporter::new();
    reporter.add_observer(Box::new(composite));

    let sync = StorySync::with_progress_reporter(StorySyncConfig::default(), Box::new(reporter));

    let voiced: f32 = words.iter().map(TimedWord::duration).sum();
    let chunks = sync.segment(&words)?;
    println!(
        "Segmented {} words ({:.1}s of speech) into {} captions:",
        words.len(),
        voiced,
        chunks.len()
    );
    for chunk in &chunks {
        println!(
            "  {:6.2}s +{:.2}s  {:?} ({} words)",
            chunk.start,
            chunk.duration(),
            chunk.text,
            chunk.word_count
        );
    }

    let video = MediaTrack::new("story.mp4", 42.0, TrackKind::Video);
    let narration = MediaTrack::new("narration.mp3", 37.5, TrackKind::Audio);
    let music = MediaTrack::new("music.mp3", 15.0, TrackKind::Audio);

    let plan = sync.plan(&video, &narration, &music, &words)?;
    println!();
    println!("Render plan:");
    println!("{}", plan.to_json()?);

    Ok(())
}
