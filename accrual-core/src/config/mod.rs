use std::time::Duration;

use config::builder::DefaultState;
use config::{File, FileFormat, Source};
use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use crate::util::duration::ConfigDuration;
use crate::REFERENCE_CONFIG;

pub trait ConfigBuilder: Sized {
    type C;

    fn add_source<T>(self, source: T) -> anyhow::Result<Self>
        where
            T: Source + Send + Sync + 'static;

    fn build(self) -> anyhow::Result<Self::C>;
}

/// Settings of a [`PhiAccrualFailureDetector`](crate::failure_detector::phi_accrual_failure_detector::PhiAccrualFailureDetector).
///
/// Loaded from the `[failure-detector]` table, see `reference.toml` for the defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "kebab-case")]
pub struct FailureDetectorConfig {
    /// Phi value above which the monitored resource is considered unavailable.
    #[builder(default = 8.0)]
    pub threshold: f64,
    /// Number of inter-arrival samples kept for mean and standard deviation.
    #[builder(default = 1000)]
    pub max_sample_size: usize,
    /// Lower bound of the standard deviation used in the phi calculation.
    #[builder(default = ConfigDuration::from_millis(100), setter(into))]
    pub min_std_deviation: ConfigDuration,
    /// Number of lost or delayed heartbeats, expressed as a duration, tolerated
    /// before the silence counts as an anomaly.
    #[builder(default = ConfigDuration::from_millis(3000), setter(into))]
    pub acceptable_heartbeat_pause: ConfigDuration,
    /// Expected heartbeat interval used to bootstrap the statistics before any
    /// real interval has been observed.
    #[builder(default = ConfigDuration::from_millis(1000), setter(into))]
    pub first_heartbeat_estimate: ConfigDuration,
}

impl Default for FailureDetectorConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl FailureDetectorConfig {
    pub fn loader() -> FailureDetectorConfigLoader {
        FailureDetectorConfigLoader::default()
    }

    pub fn min_std_deviation(&self) -> Duration {
        self.min_std_deviation.to_std_duration()
    }

    pub fn acceptable_heartbeat_pause(&self) -> Duration {
        self.acceptable_heartbeat_pause.to_std_duration()
    }

    pub fn first_heartbeat_estimate(&self) -> Duration {
        self.first_heartbeat_estimate.to_std_duration()
    }
}

#[derive(Debug, Deserialize)]
struct ConfigRoot {
    #[serde(rename = "failure-detector")]
    failure_detector: FailureDetectorConfig,
}

/// Layers user supplied sources on top of the embedded reference configuration.
#[derive(Debug)]
pub struct FailureDetectorConfigLoader {
    builder: config::ConfigBuilder<DefaultState>,
}

impl Default for FailureDetectorConfigLoader {
    fn default() -> Self {
        let builder = config::Config::builder()
            .add_source(File::from_str(REFERENCE_CONFIG, FileFormat::Toml));
        Self { builder }
    }
}

impl ConfigBuilder for FailureDetectorConfigLoader {
    type C = FailureDetectorConfig;

    fn add_source<T>(self, source: T) -> anyhow::Result<Self> where T: Source + Send + Sync + 'static {
        Ok(Self { builder: self.builder.add_source(source) })
    }

    fn build(self) -> anyhow::Result<Self::C> {
        let root = self.builder.build()?.try_deserialize::<ConfigRoot>()?;
        Ok(root.failure_detector)
    }
}
