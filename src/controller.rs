//! Controller module - PID feedback from measured firing rate to stimulus intensity

pub mod pid;
pub mod stimulus;

pub use pid::{AntiWindup, OutputBounds, PidController, PidGains, PidTerms};
pub use stimulus::{LatentMapping, LinearLatentScale, StimulusController, DEFAULT_TARGET_RATE};
