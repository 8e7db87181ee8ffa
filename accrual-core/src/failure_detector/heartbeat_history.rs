use std::collections::VecDeque;
use std::ops::Add;

use crate::error::{ConfigViolation, Error, Result};

/// Sliding window of the most recent heartbeat inter-arrival times, in milliseconds.
///
/// The sum and the sum of squares of the window are maintained alongside the
/// samples, so mean and variance never rescan the window. The history is a value:
/// [`append`](Self::append) and [`drop_oldest`](Self::drop_oldest) return a new
/// instance and leave `self` untouched.
///
/// Samples are fractional so the bootstrap history can hold an exact quarter of
/// any estimate. Whole-millisecond samples keep the sums exact up to 2^53.
#[derive(Debug, Clone, PartialEq)]
pub struct HeartbeatHistory {
    max_sample_size: usize,
    intervals: VecDeque<f64>,
    interval_sum: f64,
    squared_interval_sum: f64,
}

impl HeartbeatHistory {
    pub fn new(max_sample_size: usize) -> Result<Self> {
        if max_sample_size < 1 {
            return Err(Error::InvalidConfiguration(vec![ConfigViolation::MaxSampleSize(max_sample_size)]));
        }
        Ok(Self {
            max_sample_size,
            intervals: VecDeque::with_capacity(max_sample_size.min(1024)),
            interval_sum: 0.0,
            squared_interval_sum: 0.0,
        })
    }

    pub fn max_sample_size(&self) -> usize {
        self.max_sample_size
    }

    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    /// Samples in arrival order, oldest first.
    pub fn intervals(&self) -> impl Iterator<Item=f64> + '_ {
        self.intervals.iter().copied()
    }

    pub fn interval_sum(&self) -> f64 {
        self.interval_sum
    }

    pub fn squared_interval_sum(&self) -> f64 {
        self.squared_interval_sum
    }

    /// Mean of the samples currently in the window. `NaN` for an empty history.
    pub fn mean(&self) -> f64 {
        self.interval_sum / self.intervals.len() as f64
    }

    /// Population variance of the samples currently in the window.
    pub fn variance(&self) -> f64 {
        let mean = self.mean();
        (self.squared_interval_sum / self.intervals.len() as f64 - mean * mean).max(0.0)
    }

    pub fn std_deviation(&self) -> f64 {
        self.variance().sqrt()
    }

    /// Adds a sample, evicting the oldest one first when the window is full.
    /// Negative and `NaN` samples are recorded as zero.
    ///
    /// The statistics are updated in constant time, but the returned history owns a
    /// copy of the window, so each call costs O(`max_sample_size`) in copying. A
    /// heartbeat that loses a compare-and-swap race pays that copy again on retry.
    pub fn append(&self, interval: f64) -> HeartbeatHistory {
        let interval = interval.max(0.0);
        let mut history = self.clone();
        if history.intervals.len() >= history.max_sample_size {
            history.evict_oldest();
        }
        history.intervals.push_back(interval);
        history.interval_sum += interval;
        history.squared_interval_sum += interval * interval;
        history
    }

    pub fn drop_oldest(&self) -> HeartbeatHistory {
        let mut history = self.clone();
        history.evict_oldest();
        history
    }

    fn evict_oldest(&mut self) {
        if let Some(interval) = self.intervals.pop_front() {
            if self.intervals.is_empty() {
                self.interval_sum = 0.0;
                self.squared_interval_sum = 0.0;
            } else {
                self.interval_sum = (self.interval_sum - interval).max(0.0);
                self.squared_interval_sum = (self.squared_interval_sum - interval * interval).max(0.0);
            }
        }
    }
}

impl Add<f64> for &HeartbeatHistory {
    type Output = HeartbeatHistory;

    fn add(self, rhs: f64) -> Self::Output {
        self.append(rhs)
    }
}

impl Add<f64> for HeartbeatHistory {
    type Output = HeartbeatHistory;

    fn add(self, rhs: f64) -> Self::Output {
        self.append(rhs)
    }
}
