use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use config::File;
use tracing::info;

use accrual_core::clock::{Clock, ManualClock};
use accrual_core::config::{ConfigBuilder, FailureDetectorConfig};
use accrual_core::ext::init_logger_with_filter;
use accrual_core::failure_detector::phi_accrual_failure_detector::PhiAccrualFailureDetector;
use accrual_core::failure_detector::{FailureDetector, FailureDetectorWithAddress};

/// Replays heartbeat arrivals against a manual clock and reports phi in between.
#[derive(Parser, Debug)]
struct Args {
    /// TOML file with a [failure-detector] table, layered over the defaults
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Milliseconds between consecutive heartbeats, the first value is the arrival of the first one
    #[arg(short, long, value_delimiter = ',', default_values_t = [0u64, 1000, 1000, 1000, 1000, 5000, 1000, 1000])]
    intervals: Vec<u64>,
    /// Milliseconds between two phi readings
    #[arg(short, long, default_value_t = 500)]
    step: u64,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logger_with_filter("accrual_core=debug,simulate=info");
    let mut loader = FailureDetectorConfig::loader();
    if let Some(path) = &args.config {
        loader = loader.add_source(File::from(path.as_path()))?;
    }
    let config = loader.build()?;
    info!("{:?}", config);
    let clock = Arc::new(ManualClock::new(0));
    let detector = PhiAccrualFailureDetector::from_config(&config, clock.clone())?;
    detector.set_address("simulated");
    let step = args.step.max(1);
    for interval in args.intervals {
        let arrival = clock.now_millis() + interval;
        while clock.now_millis() + step < arrival {
            let now = clock.advance(step);
            info!(now, phi = detector.phi(), available = detector.is_available(), "reading");
        }
        clock.set(arrival);
        detector.heartbeat();
        let state = detector.state();
        info!(
            now = arrival,
            samples = state.history().len(),
            mean = state.history().mean(),
            std_deviation = state.history().std_deviation(),
            "heartbeat"
        );
    }
    Ok(())
}
