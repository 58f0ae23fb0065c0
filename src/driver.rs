//! Driver module - Fixed-interval sampling loop: rate source -> controller -> logger

use std::thread;
use std::time::{Duration, Instant};

use crate::config::ExperimentConfig;
use crate::controller::StimulusController;
use crate::error::{ConfigError, LogError};
use crate::logger::{DataLogger, LogSink};
use crate::metrics::TimingMetrics;
use crate::stimulus::RateGenerator;

pub const START_MESSAGE: &str = "Neuromorphic system started";

/// One pass through the loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleRecord {
    pub sequence_id: u64,
    pub measured: f64,
    pub control: f64,
    pub saturated: bool,
}

impl SampleRecord {
    pub fn status_line(&self) -> String {
        format!("Measured: {:.3} -> Control: {:.3}", self.measured, self.control)
    }
}

pub struct FeedbackDriver<S: LogSink> {
    generator: RateGenerator,
    controller: StimulusController,
    logger: DataLogger<S>,
    metrics: TimingMetrics,
    interval: Duration,
}

impl<S: LogSink> FeedbackDriver<S> {
    pub fn new(
        generator: RateGenerator,
        controller: StimulusController,
        logger: DataLogger<S>,
        interval: Duration,
    ) -> Self {
        Self {
            generator,
            controller,
            logger,
            metrics: TimingMetrics::new(),
            interval,
        }
    }

    /// Wire up generator and controller from `config` around an existing logger.
    pub fn from_config(config: &ExperimentConfig, logger: DataLogger<S>) -> Result<Self, ConfigError> {
        let pid = config.controller.build()?;
        Ok(Self::new(
            RateGenerator::new(config.driver.seed),
            StimulusController::from_pid(pid),
            logger,
            Duration::from_millis(config.driver.sample_interval_ms),
        ))
    }

    /// Run and collect every record. Long runs should stream through `run_with`.
    pub fn run(&mut self, iterations: u64) -> Result<Vec<SampleRecord>, LogError> {
        let mut records = Vec::new();
        self.run_with(iterations, |record| records.push(*record))?;
        Ok(records)
    }

    /// Run `iterations` cycles, calling `on_sample` after each one, and return
    /// the number of samples taken. Each cycle sleeps off whatever is left of
    /// the sampling interval, except the last.
    pub fn run_with<F>(&mut self, iterations: u64, mut on_sample: F) -> Result<u64, LogError>
    where
        F: FnMut(&SampleRecord),
    {
        self.log_timed(START_MESSAGE)?;
        tracing::info!(iterations, interval = ?self.interval, "feedback loop started");

        let mut samples = 0u64;
        for i in 0..iterations {
            let cycle_start = Instant::now();

            // 1. Sample the firing rate
            let reading = self.generator.generate();

            // 2. Compute control
            let compute_start = Instant::now();
            let control = self.controller.compute(reading.rate, reading.timestamp);
            let saturated = self.controller.pid().is_saturated();
            self.metrics.record_compute(compute_start.elapsed(), saturated);

            let record = SampleRecord {
                sequence_id: reading.sequence_id,
                measured: reading.rate,
                control,
                saturated,
            };

            // 3. Log
            self.log_timed(&record.status_line())?;
            if saturated {
                tracing::debug!(cycle = record.sequence_id, control, "control output saturated");
            }

            on_sample(&record);
            samples += 1;

            // Sleep to maintain sampling rate
            if i + 1 < iterations {
                let elapsed = cycle_start.elapsed();
                if elapsed < self.interval {
                    thread::sleep(self.interval - elapsed);
                }
            }
            self.metrics.record_cycle_jitter(cycle_start.elapsed().as_nanos() as u64);
        }

        tracing::info!(samples, "feedback loop finished");
        Ok(samples)
    }

    fn log_timed(&mut self, message: &str) -> Result<(), LogError> {
        let start = Instant::now();
        self.logger.log(message)?;
        self.metrics.record_log_write(start.elapsed());
        Ok(())
    }

    pub fn controller(&self) -> &StimulusController {
        &self.controller
    }

    pub fn logger(&self) -> &DataLogger<S> {
        &self.logger
    }

    pub fn metrics(&self) -> &TimingMetrics {
        &self.metrics
    }
}
