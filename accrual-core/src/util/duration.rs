use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Human writable duration used in configuration files, either a plain number of
/// milliseconds (`100`) or a table of units (`{ seconds = 1, milliseconds = 500 }`).
/// Every unit present is summed up.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "ConfigDurationRepr")]
pub struct ConfigDuration {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    days: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    hours: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    minutes: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    seconds: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    milliseconds: Option<u64>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ConfigDurationRepr {
    Millis(u64),
    Units {
        days: Option<u64>,
        hours: Option<u64>,
        minutes: Option<u64>,
        seconds: Option<u64>,
        milliseconds: Option<u64>,
    },
}

impl From<ConfigDurationRepr> for ConfigDuration {
    fn from(value: ConfigDurationRepr) -> Self {
        match value {
            ConfigDurationRepr::Millis(millis) => Self::from_millis(millis),
            ConfigDurationRepr::Units { days, hours, minutes, seconds, milliseconds } => {
                Self { days, hours, minutes, seconds, milliseconds }
            }
        }
    }
}

impl ConfigDuration {
    pub fn to_std_duration(&self) -> Duration {
        let days = self.days.unwrap_or(0);
        let hours = self.hours.unwrap_or(0);
        let minutes = self.minutes.unwrap_or(0);
        let seconds = self.seconds.unwrap_or(0);
        let milliseconds = self.milliseconds.unwrap_or(0);
        let secs = days
            .saturating_mul(24 * 60 * 60)
            .saturating_add(hours.saturating_mul(60 * 60))
            .saturating_add(minutes.saturating_mul(60))
            .saturating_add(seconds);
        Duration::from_secs(secs).saturating_add(Duration::from_millis(milliseconds))
    }

    pub fn from_millis(millis: u64) -> Self {
        Self {
            milliseconds: Some(millis),
            ..Default::default()
        }
    }

    pub fn from_secs(secs: u64) -> Self {
        Self {
            seconds: Some(secs),
            ..Default::default()
        }
    }
}

impl From<Duration> for ConfigDuration {
    fn from(value: Duration) -> Self {
        let millis = u64::try_from(value.as_millis()).unwrap_or(u64::MAX);
        if millis % 1000 == 0 {
            Self::from_secs(millis / 1000)
        } else {
            Self::from_millis(millis)
        }
    }
}

impl From<ConfigDuration> for Duration {
    fn from(value: ConfigDuration) -> Self {
        value.to_std_duration()
    }
}
