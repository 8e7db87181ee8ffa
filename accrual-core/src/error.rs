use std::time::Duration;

use itertools::Itertools;
use thiserror::Error;

pub type Result<T, E = Error> = core::result::Result<T, E>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("invalid failure detector configuration: {}", .0.iter().join(", "))]
    InvalidConfiguration(Vec<ConfigViolation>),
}

#[derive(Error, Debug, Copy, Clone, PartialEq)]
pub enum ConfigViolation {
    #[error("threshold must be > 0, got {0}")]
    Threshold(f64),
    #[error("max-sample-size must be >= 1, got {0}")]
    MaxSampleSize(usize),
    #[error("min-std-deviation must be > 0, got {0:?}")]
    MinStdDeviation(Duration),
    #[error("first-heartbeat-estimate must be > 0, got {0:?}")]
    FirstHeartbeatEstimate(Duration),
}

impl Error {
    pub fn violations(&self) -> &[ConfigViolation] {
        match self {
            Error::InvalidConfiguration(violations) => violations,
        }
    }
}
