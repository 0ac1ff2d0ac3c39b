//! Media track handling: probing, mix planning, caption scheduling and
//! the assembled render plan.

pub mod mixer;
pub mod overlay;
pub mod plan;
pub mod probe;

#[cfg(test)]
mod tests {
    mod test_pipeline;
}

pub use mixer::{plan_mix, CompositeAudio, MixPlan};
pub use overlay::{build_overlay_schedule, validate_style, CaptionOverlay};
pub use plan::{PlanInputs, PlanOp, RenderPlan};
pub use probe::{FfprobeProber, MediaTrack, TrackKind, TrackProber};
