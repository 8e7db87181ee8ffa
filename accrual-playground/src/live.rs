use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use config::File;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::time::sleep;
use tracing::{info, warn};

use accrual_core::clock::MonotonicClock;
use accrual_core::config::{ConfigBuilder, FailureDetectorConfig};
use accrual_core::ext::init_logger_with_filter;
use accrual_core::failure_detector::phi_accrual_failure_detector::PhiAccrualFailureDetector;
use accrual_core::failure_detector::{FailureDetector, FailureDetectorWithAddress};

/// Emits jittered heartbeats on one task, injects a pause, and watches phi from another.
#[derive(Parser, Debug)]
struct Args {
    /// TOML file with a [failure-detector] table, layered over the defaults
    #[arg(short, long)]
    config: Option<PathBuf>,
    #[arg(long, default_value_t = 200)]
    heartbeat_interval: u64,
    #[arg(long, default_value_t = 50)]
    jitter: u64,
    #[arg(long, default_value_t = 40)]
    heartbeats: u32,
    /// Number of heartbeats sent before the pause
    #[arg(long, default_value_t = 20)]
    pause_after: u32,
    #[arg(long, default_value_t = 5000)]
    pause: u64,
    #[arg(long, default_value_t = 100)]
    sample_interval: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logger_with_filter("accrual_core=debug,live=info");
    let mut loader = FailureDetectorConfig::loader();
    if let Some(path) = &args.config {
        loader = loader.add_source(File::from(path.as_path()))?;
    }
    let config = FailureDetectorConfig {
        first_heartbeat_estimate: Duration::from_millis(args.heartbeat_interval).into(),
        ..loader.build()?
    };
    let detector = Arc::new(PhiAccrualFailureDetector::from_config(&config, Arc::new(MonotonicClock::new()))?);
    detector.set_address("live-peer");

    let mut emitter = {
        let detector = detector.clone();
        let Args { heartbeat_interval, jitter, heartbeats, pause_after, pause, .. } = args;
        tokio::spawn(async move {
            let mut rng = StdRng::from_entropy();
            for n in 0..heartbeats {
                if n == pause_after {
                    warn!("peer goes silent for {} millis", pause);
                    sleep(Duration::from_millis(pause)).await;
                }
                let delay = heartbeat_interval + rng.gen_range(0..=jitter);
                sleep(Duration::from_millis(delay)).await;
                detector.heartbeat();
            }
        })
    };

    let mut ticker = tokio::time::interval(Duration::from_millis(args.sample_interval.max(1)));
    let mut available = true;
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let phi = detector.phi();
                let now_available = detector.is_available();
                if now_available != available {
                    if now_available {
                        info!(phi, "peer is available again");
                    } else {
                        warn!(phi, "peer is suspected to have failed");
                    }
                    available = now_available;
                }
            }
            result = &mut emitter => {
                result?;
                break;
            }
        }
    }
    info!("emitter finished, final phi {}", detector.phi());
    Ok(())
}
