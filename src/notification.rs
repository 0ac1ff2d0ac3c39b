//! Ready-made progress observers.
//!
//! Concrete [`ProgressObserver`] implementations a host application can
//! register: console and log output, an in-memory history for tests and
//! UIs, a plain callback, a console progress bar, and a composite that
//! fans updates out to several observers.

use std::io::Write;
use std::sync::{Arc, Mutex};

use crate::progress::{ProgressInfo, ProgressObserver};

/// Prints each progress update to stdout.
pub struct ConsoleProgressObserver {
    /// Optional output prefix
    prefix: Option<String>,
}

impl ConsoleProgressObserver {
    /// Create an observer without a prefix.
    pub fn new() -> Self {
        Self { prefix: None }
    }

    /// Create an observer that prefixes every line.
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
        }
    }
}

impl Default for ConsoleProgressObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressObserver for ConsoleProgressObserver {
    fn on_progress_update(&self, progress: ProgressInfo) {
        let prefix = self.prefix.as_deref().unwrap_or("");
        let details = progress.details.as_deref().unwrap_or("");

        println!(
            "{}[Progress] Step: {}, step {:.1}%, total {:.1}%{}",
            prefix,
            progress.step,
            progress.step_progress,
            progress.total_progress,
            if details.is_empty() {
                String::new()
            } else {
                format!(", {}", details)
            }
        );
    }
}

/// Forwards progress updates to the `log` facade at info level.
pub struct LogProgressObserver;

impl LogProgressObserver {
    /// Create a new log observer.
    pub fn new() -> Self {
        Self
    }
}

impl Default for LogProgressObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressObserver for LogProgressObserver {
    fn on_progress_update(&self, progress: ProgressInfo) {
        match progress.details {
            Some(details) => log::info!(
                "{}: step {:.1}%, total {:.1}% ({})",
                progress.step,
                progress.step_progress,
                progress.total_progress,
                details
            ),
            None => log::info!(
                "{}: step {:.1}%, total {:.1}%",
                progress.step,
                progress.step_progress,
                progress.total_progress
            ),
        }
    }
}

/// Keeps every update in memory; useful for tests and UIs.
#[derive(Clone)]
pub struct MemoryProgressObserver {
    history: Arc<Mutex<Vec<ProgressInfo>>>,
}

impl MemoryProgressObserver {
    /// Create an observer with an empty history.
    pub fn new() -> Self {
        Self {
            history: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Snapshot of all updates received so far.
    pub fn history(&self) -> Vec<ProgressInfo> {
        let history = self.history.lock().unwrap();
        history.clone()
    }

    /// Discard the recorded history.
    pub fn clear_history(&self) {
        let mut history = self.history.lock().unwrap();
        history.clear();
    }
}

impl Default for MemoryProgressObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressObserver for MemoryProgressObserver {
    fn on_progress_update(&self, progress: ProgressInfo) {
        let mut history = self.history.lock().unwrap();
        history.push(progress);
    }
}

/// Calls a closure for every update.
pub struct CallbackProgressObserver<F>
where
    F: Fn(ProgressInfo) + Send + Sync + 'static,
{
    callback: F,
}

impl<F> CallbackProgressObserver<F>
where
    F: Fn(ProgressInfo) + Send + Sync + 'static,
{
    /// Create an observer around `callback`.
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> ProgressObserver for CallbackProgressObserver<F>
where
    F: Fn(ProgressInfo) + Send + Sync + 'static,
{
    fn on_progress_update(&self, progress: ProgressInfo) {
        (self.callback)(progress);
    }
}

/// Renders a single-line progress bar on the console.
pub struct ProgressBarObserver {
    /// Bar width in characters
    width: usize,
    /// Last drawn total progress
    last_progress: Mutex<f32>,
}

impl ProgressBarObserver {
    /// Create a bar of the given width.
    pub fn new(width: usize) -> Self {
        Self {
            width,
            // Negative sentinel so the first update always draws
            last_progress: Mutex::new(-1.0),
        }
    }
}

impl Default for ProgressBarObserver {
    fn default() -> Self {
        Self::new(50)
    }
}

impl ProgressObserver for ProgressBarObserver {
    fn on_progress_update(&self, progress: ProgressInfo) {
        let mut last_progress = self.last_progress.lock().unwrap();

        // Redraw only on a visible change, the first update, or completion
        if (*last_progress - progress.total_progress).abs() >= 1.0
            || *last_progress < 0.0
            || progress.total_progress >= 100.0
        {
            *last_progress = progress.total_progress;

            let filled = ((progress.total_progress / 100.0) * self.width as f32) as usize;
            let empty = self.width.saturating_sub(filled);

            let bar = format!(
                "[{}{}] {:.1}% - {}",
                "=".repeat(filled),
                " ".repeat(empty),
                progress.total_progress,
                progress.step
            );

            print!("\r{}", bar);
            let _ = std::io::stdout().flush();

            if progress.total_progress >= 100.0 {
                println!();
            }
        }
    }
}

/// Fans updates out to a list of observers.
pub struct CompositeProgressObserver {
    observers: Vec<Box<dyn ProgressObserver>>,
}

impl CompositeProgressObserver {
    /// Create an empty composite.
    pub fn new() -> Self {
        Self {
            observers: Vec::new(),
        }
    }

    /// Add an observer to the composite.
    pub fn add_observer(&mut self, observer: Box<dyn ProgressObserver>) {
        self.observers.push(observer);
    }

    /// Remove all observers.
    pub fn clear(&mut self) {
        self.observers.clear();
    }
}

impl Default for CompositeProgressObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressObserver for CompositeProgressObserver {
    fn on_progress_update(&self, progress: ProgressInfo) {
        for observer in &self.observers {
            observer.on_progress_update(progress.clone());
        }
    }
}
