use std::time::Duration;

pub trait AsMillis {
    /// Whole milliseconds, saturating at `u64::MAX`.
    fn as_millis_u64(&self) -> u64;
}

impl AsMillis for Duration {
    fn as_millis_u64(&self) -> u64 {
        u64::try_from(self.as_millis()).unwrap_or(u64::MAX)
    }
}
