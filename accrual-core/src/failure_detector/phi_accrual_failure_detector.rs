use std::fmt::{Debug, Formatter};
use std::sync::Arc;
use std::time::Duration;

use arc_swap::{ArcSwap, ArcSwapOption};
use tracing::{debug, trace, warn};

use crate::clock::Clock;
use crate::config::FailureDetectorConfig;
use crate::error::{ConfigViolation, Error, Result};
use crate::ext::duration_ext::AsMillis;
use crate::failure_detector::heartbeat_history::HeartbeatHistory;
use crate::failure_detector::state::State;
use crate::failure_detector::{FailureDetector, FailureDetectorWithAddress};

const UNKNOWN_ADDRESS: &str = "unknown";

/// Implementation of 'The Phi Accrual Failure Detector' by Hayashibara et al. as defined in their paper:
/// [https://oneofus.la/have-emacs-will-hack/files/HDY04.pdf]
///
/// The suspicion level of failure is given by a value called φ (phi).
/// The basic idea of the φ failure detector is to express the value of φ on a scale that
/// is dynamically adjusted to reflect current network conditions. A configurable
/// threshold is used to decide if φ is considered to be a failure.
///
/// The value of φ is calculated as:
///
/// ```text
/// φ = -log10(1 - F(timeSinceLastHeartbeat))
/// ```
/// where F is the cumulative distribution function of a normal distribution with mean
/// and standard deviation estimated from historical heartbeat inter-arrival times.
///
/// The detector state is an immutable [`State`] snapshot behind an [`ArcSwap`]. Readers
/// never block, concurrent heartbeats race with compare-and-swap and the loser retries
/// against the snapshot that beat it.
///
/// [threshold] A low threshold is prone to generate many wrong suspicions but ensures a quick detection in the event
///  of a real crash. Conversely, a high threshold generates fewer mistakes but needs more time to detect
///  actual crashes
/// [max_sample_size] Number of samples to use for calculation of mean and standard deviation of
///  inter-arrival times.
/// [min_std_deviation] Minimum standard deviation to use for the normal distribution used when calculating phi.
///  Too low standard deviation might result in too much sensitivity for sudden, but normal, deviations
///  in heartbeat inter arrival times.
/// [acceptable_heartbeat_pause] Duration corresponding to number of potentially lost/delayed
///  heartbeats that will be accepted before considering it to be an anomaly.
///  This margin is important to be able to survive sudden, occasional, pauses in heartbeat
///  arrivals, due to for example garbage collect or network drop.
/// [first_heartbeat_estimate] Bootstrap the stats with heartbeats that corresponds to
///  to this duration, with a with rather high standard deviation (since environment is unknown
///  in the beginning)
/// [clock] The clock, returning current time in milliseconds, but can be faked for testing
///  purposes. It is only used for measuring intervals (duration).
pub struct PhiAccrualFailureDetector {
    threshold: f64,
    max_sample_size: usize,
    min_std_deviation: Duration,
    acceptable_heartbeat_pause: Duration,
    first_heartbeat_estimate: Duration,
    clock: Arc<dyn Clock>,
    address: ArcSwapOption<String>,
    first_heartbeat: HeartbeatHistory,
    state: ArcSwap<State>,
}

/// What a heartbeat did to the interval history.
#[derive(Debug, Copy, Clone)]
enum Sample {
    Bootstrap,
    Accepted(u64),
    Discarded(u64),
}

impl PhiAccrualFailureDetector {
    pub fn new(
        threshold: f64,
        max_sample_size: usize,
        min_std_deviation: Duration,
        acceptable_heartbeat_pause: Duration,
        first_heartbeat_estimate: Duration,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        Self::check_valid(threshold, max_sample_size, min_std_deviation, first_heartbeat_estimate)?;
        let first_heartbeat = Self::first_heartbeat(first_heartbeat_estimate, max_sample_size)?;
        let detector = Self {
            threshold,
            max_sample_size,
            min_std_deviation,
            acceptable_heartbeat_pause,
            first_heartbeat_estimate,
            clock,
            address: ArcSwapOption::empty(),
            state: ArcSwap::from_pointee(State::new(first_heartbeat.clone(), None)),
            first_heartbeat,
        };
        Ok(detector)
    }

    pub fn from_config(config: &FailureDetectorConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        Self::new(
            config.threshold,
            config.max_sample_size,
            config.min_std_deviation(),
            config.acceptable_heartbeat_pause(),
            config.first_heartbeat_estimate(),
            clock,
        )
    }

    /// An independent detector with the same settings and clock, in the bootstrap state.
    pub fn fresh(&self) -> Self {
        Self {
            threshold: self.threshold,
            max_sample_size: self.max_sample_size,
            min_std_deviation: self.min_std_deviation,
            acceptable_heartbeat_pause: self.acceptable_heartbeat_pause,
            first_heartbeat_estimate: self.first_heartbeat_estimate,
            clock: self.clock.clone(),
            address: ArcSwapOption::empty(),
            first_heartbeat: self.first_heartbeat.clone(),
            state: ArcSwap::from_pointee(State::new(self.first_heartbeat.clone(), None)),
        }
    }

    fn check_valid(
        threshold: f64,
        max_sample_size: usize,
        min_std_deviation: Duration,
        first_heartbeat_estimate: Duration,
    ) -> Result<()> {
        let mut violations = vec![];
        // written negated so that NaN is rejected as well
        if !(threshold > 0.0) {
            violations.push(ConfigViolation::Threshold(threshold));
        }
        if max_sample_size < 1 {
            violations.push(ConfigViolation::MaxSampleSize(max_sample_size));
        }
        if min_std_deviation.is_zero() {
            violations.push(ConfigViolation::MinStdDeviation(min_std_deviation));
        }
        if first_heartbeat_estimate.is_zero() {
            violations.push(ConfigViolation::FirstHeartbeatEstimate(first_heartbeat_estimate));
        }
        if violations.is_empty() {
            Ok(())
        } else {
            Err(Error::InvalidConfiguration(violations))
        }
    }

    fn first_heartbeat(first_heartbeat_estimate: Duration, max_sample_size: usize) -> Result<HeartbeatHistory> {
        let mean = millis_f64(first_heartbeat_estimate);
        let std_deviation = mean / 4.0;
        let history = HeartbeatHistory::new(max_sample_size)?
            .append(mean - std_deviation)
            .append(mean + std_deviation);
        Ok(history)
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn max_sample_size(&self) -> usize {
        self.max_sample_size
    }

    pub fn min_std_deviation(&self) -> Duration {
        self.min_std_deviation
    }

    pub fn acceptable_heartbeat_pause(&self) -> Duration {
        self.acceptable_heartbeat_pause
    }

    pub fn first_heartbeat_estimate(&self) -> Duration {
        self.first_heartbeat_estimate
    }

    pub fn address(&self) -> Option<Arc<String>> {
        self.address.load_full()
    }

    /// The latest committed snapshot.
    pub fn state(&self) -> Arc<State> {
        self.state.load_full()
    }

    /// The current suspicion level according to the injected clock.
    pub fn phi(&self) -> f64 {
        self.phi_at(self.clock.now_millis())
    }

    pub fn phi_at(&self, timestamp: u64) -> f64 {
        self.calc_phi_for(&self.state.load(), timestamp)
    }

    pub fn is_available_at(&self, timestamp: u64) -> bool {
        self.is_available_for(&self.state.load(), timestamp)
    }

    pub fn heartbeat_at(&self, timestamp: u64) {
        let mut old_state = self.state.load();
        loop {
            let (new_history, sample) = match old_state.timestamp() {
                None => (self.first_heartbeat.clone(), Sample::Bootstrap),
                Some(latest_timestamp) => {
                    let interval = timestamp.saturating_sub(latest_timestamp);
                    if self.is_available_for(&old_state, timestamp) {
                        (old_state.history() + interval as f64, Sample::Accepted(interval))
                    } else {
                        (old_state.history().clone(), Sample::Discarded(interval))
                    }
                }
            };
            let new_state = Arc::new(State::new(new_history, Some(timestamp)));
            let previous = self.state.compare_and_swap(&*old_state, new_state);
            if Arc::ptr_eq(&*previous, &*old_state) {
                self.log_sample(sample);
                return;
            }
            trace!("concurrent heartbeat for address {} committed first, retrying heartbeat at {}", self.address_label(), timestamp);
            old_state = previous;
        }
    }

    /// Forgets every observed interval and the latest heartbeat, as if the detector
    /// had just been created.
    pub fn reset(&self) {
        self.state.store(Arc::new(State::new(self.first_heartbeat.clone(), None)));
        debug!("failure detector for address {} reset", self.address_label());
    }

    fn is_available_for(&self, state: &State, timestamp: u64) -> bool {
        self.calc_phi_for(state, timestamp) < self.threshold
    }

    fn calc_phi_for(&self, state: &State, timestamp: u64) -> f64 {
        match state.timestamp() {
            None => {
                0.0
            }
            Some(old_timestamp) => {
                let time_diff = timestamp.saturating_sub(old_timestamp);
                let history = state.history();
                let mean = history.mean();
                let std_deviation = self.ensure_valid_std_deviation(history.std_deviation());
                Self::calc_phi(time_diff as f64, mean + self.acceptable_heartbeat_pause_millis(), std_deviation)
            }
        }
    }

    /// Calculation of phi, derived from the Cumulative distribution function for
    /// N(mean, std_deviation) normal distribution, given by
    /// 1.0 / (1.0 + math.exp(-y * (1.5976 + 0.070566 * y * y)))
    /// where y = (x - mean) / standard_deviation
    /// This is an approximation defined in β Mathematics Handbook (Logistic approximation).
    /// Error is 0.00014 at +- 3.16
    /// The calculated value is equivalent to -log10(1 - CDF(y))
    ///
    /// An exponent out of range saturates to infinity, which keeps both branches defined.
    pub fn calc_phi(time_diff: f64, mean: f64, std_deviation: f64) -> f64 {
        let y = (time_diff - mean) / std_deviation;
        let e = f64::exp(-y * (1.5976 + 0.070566 * y * y));
        if time_diff > mean {
            -f64::log10(e / (1.0 + e))
        } else {
            -f64::log10(1.0 - 1.0 / (1.0 + e))
        }
    }

    fn ensure_valid_std_deviation(&self, std_deviation: f64) -> f64 {
        std_deviation.max(millis_f64(self.min_std_deviation))
    }

    fn acceptable_heartbeat_pause_millis(&self) -> f64 {
        millis_f64(self.acceptable_heartbeat_pause)
    }

    fn log_sample(&self, sample: Sample) {
        match sample {
            Sample::Bootstrap => {
                debug!("first heartbeat from address {}", self.address_label());
            }
            Sample::Accepted(interval) => {
                let pause = self.acceptable_heartbeat_pause.as_millis_u64();
                if pause > 0 && interval >= pause / 3 * 2 {
                    warn!("heartbeat interval is growing too large for address {}: {} millis", self.address_label(), interval);
                }
            }
            Sample::Discarded(interval) => {
                debug!("address {} already considered unavailable, interval of {} millis not sampled", self.address_label(), interval);
            }
        }
    }

    fn address_label(&self) -> String {
        match self.address.load_full() {
            None => UNKNOWN_ADDRESS.to_string(),
            Some(address) => address.to_string(),
        }
    }
}

fn millis_f64(duration: Duration) -> f64 {
    duration.as_secs() as f64 * 1000.0 + duration.subsec_nanos() as f64 / 1_000_000.0
}

impl FailureDetector for PhiAccrualFailureDetector {
    fn is_available(&self) -> bool {
        self.is_available_at(self.clock.now_millis())
    }

    fn is_monitoring(&self) -> bool {
        self.state.load().timestamp().is_some()
    }

    fn heartbeat(&self) {
        self.heartbeat_at(self.clock.now_millis())
    }
}

impl FailureDetectorWithAddress for PhiAccrualFailureDetector {
    fn set_address(&self, address: &str) {
        self.address.store(Some(Arc::new(address.to_string())));
    }
}

impl Debug for PhiAccrualFailureDetector {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhiAccrualFailureDetector")
            .field("threshold", &self.threshold)
            .field("max_sample_size", &self.max_sample_size)
            .field("min_std_deviation", &self.min_std_deviation)
            .field("acceptable_heartbeat_pause", &self.acceptable_heartbeat_pause)
            .field("first_heartbeat_estimate", &self.first_heartbeat_estimate)
            .field("address", &self.address.load_full())
            .field("state", &self.state.load_full())
            .finish_non_exhaustive()
    }
}
