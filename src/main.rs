use std::error::Error;

use neurostim_feedback::config::load_config;
use neurostim_feedback::{DataLogger, FeedbackDriver};
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG_PATH: &str = "config/experiment.toml";

fn main() -> Result<(), Box<dyn Error>> {
    // Diagnostics go to stderr; stdout carries the sample lines
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let config = load_config(&config_path)?;

    println!("===========================================");
    println!("Starting Neuromorphic Stimulus Feedback Loop");
    println!("===========================================\n");
    println!(
        "Target rate: {:.3}, gains: kp={} ki={} kd={}, output [{}, {}], log: {}\n",
        config.controller.setpoint,
        config.controller.kp,
        config.controller.ki,
        config.controller.kd,
        config.controller.output_min,
        config.controller.output_max,
        config.logger.log_file,
    );

    let logger = DataLogger::open(&config.logger.log_file)?;
    let mut driver = FeedbackDriver::from_config(&config, logger)?;

    let samples = driver.run_with(config.driver.iterations, |record| {
        println!("{}", record.status_line());
    })?;

    let report = driver.metrics().report();
    println!("\n===========================================");
    println!(
        "Samples: {} ({} saturated, {:.1}%)",
        samples,
        report.saturated_samples,
        report.saturation_ratio() * 100.0
    );
    println!("Compute P50: {:?}, P99: {:?}", report.compute_p50, report.compute_p99);
    println!("Log write P50: {:?}, P99: {:?}", report.log_write_p50, report.log_write_p99);
    println!("Cycle jitter P50: {:?}, P99: {:?}", report.jitter_p50, report.jitter_p99);
    println!("Log entries written: {}", driver.logger().entries_written());
    println!("===========================================");

    Ok(())
}
