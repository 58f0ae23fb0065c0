//! Stimulus module - Simulated neural firing-rate source for the demo loop

pub mod generator;

pub use generator::{RateGenerator, RateReading};
