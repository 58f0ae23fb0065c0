pub mod controller;
pub mod logger;
pub mod stimulus;
pub mod driver;
pub mod metrics;
pub mod config;
pub mod error;

pub use controller::{
    AntiWindup, LatentMapping, LinearLatentScale, OutputBounds, PidController,
    PidGains, PidTerms, StimulusController,
};
pub use logger::{DataLogger, FileSink, LogSink, MemorySink};
pub use stimulus::{RateGenerator, RateReading};
pub use driver::{FeedbackDriver, SampleRecord};
pub use metrics::{MetricsReport, TimingMetrics};
pub use config::{load_config, ExperimentConfig};
pub use error::{ConfigError, ControllerError, LogError};
