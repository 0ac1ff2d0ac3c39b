//! Progress tracking for pipeline runs.
//!
//! Implements the observer pattern for reporting progress of long render
//! jobs: a [`ProgressTracker`] owned by the facade moves through weighted
//! [`ProcessStep`]s and pushes [`ProgressInfo`] updates to whatever
//! observers the host application registered. Everything here is
//! synchronous; observers are called inline on the rendering thread.

use std::collections::HashMap;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    RwLock,
};

use serde::{Deserialize, Serialize};

/// A single progress update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressInfo {
    /// Name of the current step
    pub step: String,
    /// Progress of the current step (0.0 - 100.0)
    pub step_progress: f32,
    /// Progress of the whole operation (0.0 - 100.0)
    pub total_progress: f32,
    /// Optional details about the current step
    pub details: Option<String>,
}

impl ProgressInfo {
    /// Create a new progress update, clamping percentages into range.
    pub fn new(
        step: impl Into<String>,
        step_progress: f32,
        total_progress: f32,
        details: Option<String>,
    ) -> Self {
        Self {
            step: step.into(),
            step_progress: step_progress.clamp(0.0, 100.0),
            total_progress: total_progress.clamp(0.0, 100.0),
            details,
        }
    }
}

/// Receives progress updates.
pub trait ProgressObserver: Send + Sync {
    /// Called for every progress update
    fn on_progress_update(&self, progress: ProgressInfo);
}

/// Distributes progress updates to registered observers.
pub trait ProgressReporter: Send + Sync {
    /// Add an observer; returns an id usable with `remove_observer`
    fn add_observer(&mut self, observer: Box<dyn ProgressObserver>) -> usize;

    /// Remove an observer by id, returning it if present
    fn remove_observer(&mut self, id: usize) -> Option<Box<dyn ProgressObserver>>;

    /// Push an update to every observer
    fn notify_progress(&self, progress: ProgressInfo);
}

/// Standard [`ProgressReporter`] implementation.
pub struct DefaultProgressReporter {
    observers: RwLock<HashMap<usize, Box<dyn ProgressObserver>>>,
    next_id: AtomicUsize,
}

impl DefaultProgressReporter {
    /// Create a reporter with no observers.
    pub fn new() -> Self {
        Self {
            observers: RwLock::new(HashMap::new()),
            next_id: AtomicUsize::new(0),
        }
    }

    fn next_id(&self) -> usize {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }
}

impl Default for DefaultProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter for DefaultProgressReporter {
    fn add_observer(&mut self, observer: Box<dyn ProgressObserver>) -> usize {
        let id = self.next_id();
        let mut observers = self.observers.write().unwrap();
        observers.insert(id, observer);
        id
    }

    fn remove_observer(&mut self, id: usize) -> Option<Box<dyn ProgressObserver>> {
        let mut observers = self.observers.write().unwrap();
        observers.remove(&id)
    }

    fn notify_progress(&self, progress: ProgressInfo) {
        let observers = self.observers.read().unwrap();
        for observer in observers.values() {
            observer.on_progress_update(progress.clone());
        }
    }
}

/// Steps of a render job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProcessStep {
    /// Opening and probing the input tracks
    TrackProbing,
    /// Grouping the word-timing list into caption chunks
    TranscriptSegmentation,
    /// Assembling the render plan
    PlanAssembly,
    /// Mixing narration and music into the composite audio bed
    AudioMixdown,
    /// Trimming the video and attaching the composite audio
    VideoAssembly,
    /// Burning caption overlays into the mixed video
    CaptionBurnIn,
}

impl ProcessStep {
    /// Get the display name of the step
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TrackProbing => "Probing input tracks",
            Self::TranscriptSegmentation => "Segmenting transcript",
            Self::PlanAssembly => "Assembling render plan",
            Self::AudioMixdown => "Mixing composite audio",
            Self::VideoAssembly => "Assembling mixed video",
            Self::CaptionBurnIn => "Burning captions",
        }
    }

    /// Weight of the step as a share of the whole job (percent)
    pub fn weight(&self) -> f32 {
        match self {
            Self::TrackProbing => 10.0,
            Self::TranscriptSegmentation => 10.0,
            Self::PlanAssembly => 5.0,
            Self::AudioMixdown => 25.0,
            Self::VideoAssembly => 30.0,
            Self::CaptionBurnIn => 20.0,
        }
    }
}

/// Tracks a job's position across the weighted steps and reports updates.
pub struct ProgressTracker {
    reporter: Option<Box<dyn ProgressReporter>>,
    current_step: RwLock<ProcessStep>,
    step_progress: RwLock<f32>,
    total_progress: RwLock<f32>,
    completed_steps: RwLock<HashMap<ProcessStep, f32>>,
}

impl ProgressTracker {
    /// Create a tracker without a reporter (updates are dropped).
    pub fn new() -> Self {
        Self {
            reporter: None,
            current_step: RwLock::new(ProcessStep::TrackProbing),
            step_progress: RwLock::new(0.0),
            total_progress: RwLock::new(0.0),
            completed_steps: RwLock::new(HashMap::new()),
        }
    }

    /// Create a tracker that reports through `reporter`.
    pub fn with_reporter(reporter: Box<dyn ProgressReporter>) -> Self {
        let mut tracker = Self::new();
        tracker.reporter = Some(reporter);
        tracker
    }

    /// Set the reporter.
    pub fn set_reporter(&mut self, reporter: Box<dyn ProgressReporter>) {
        self.reporter = Some(reporter);
    }

    /// Add an observer to the current reporter, if one is set.
    pub fn add_observer(&mut self, observer: Box<dyn ProgressObserver>) -> Option<usize> {
        self.reporter
            .as_mut()
            .map(|reporter| reporter.add_observer(observer))
    }

    /// Enter a new step. The previous step is counted as fully complete.
    pub fn set_step(&self, step: ProcessStep) {
        let mut current_step = self.current_step.write().unwrap();
        if *current_step != step {
            let mut completed_steps = self.completed_steps.write().unwrap();
            completed_steps.insert(*current_step, 100.0);
            *current_step = step;
            drop(completed_steps);

            let mut step_progress = self.step_progress.write().unwrap();
            *step_progress = 0.0;
            drop(step_progress);
            drop(current_step);

            self.update_total_progress();
            self.report_progress(None);
        }
    }

    /// Update progress within the current step.
    pub fn update_step_progress(&self, progress: f32, details: Option<String>) {
        let mut step_progress = self.step_progress.write().unwrap();
        *step_progress = progress.clamp(0.0, 100.0);
        drop(step_progress);

        self.update_total_progress();
        self.report_progress(details);
    }

    /// Recompute the overall progress from completed and current steps.
    fn update_total_progress(&self) {
        let mut total = 0.0;
        let mut total_weight = 0.0;

        let completed_steps = self.completed_steps.read().unwrap();
        for (step, progress) in completed_steps.iter() {
            total += step.weight() * progress / 100.0;
            total_weight += step.weight();
        }
        drop(completed_steps);

        let current_step = self.current_step.read().unwrap();
        let step_progress = self.step_progress.read().unwrap();
        total += current_step.weight() * *step_progress / 100.0;
        total_weight += current_step.weight();

        let mut total_progress = self.total_progress.write().unwrap();
        *total_progress = (total / total_weight * 100.0).clamp(0.0, 100.0);
    }

    fn report_progress(&self, details: Option<String>) {
        if let Some(reporter) = &self.reporter {
            let current_step = self.current_step.read().unwrap();
            let step_progress = self.step_progress.read().unwrap();
            let total_progress = self.total_progress.read().unwrap();

            let progress = ProgressInfo::new(
                current_step.as_str(),
                *step_progress,
                *total_progress,
                details,
            );
            reporter.notify_progress(progress);
        }
    }

    /// Mark the whole job as complete.
    pub fn complete(&self) {
        let current_step = self.current_step.read().unwrap();
        let mut completed_steps = self.completed_steps.write().unwrap();
        completed_steps.insert(*current_step, 100.0);
        drop(completed_steps);
        drop(current_step);

        let mut total_progress = self.total_progress.write().unwrap();
        *total_progress = 100.0;
        drop(total_progress);

        self.report_progress(Some("Job complete".to_string()));
    }
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new()
    }
}
