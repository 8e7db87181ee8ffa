use crate::failure_detector::heartbeat_history::HeartbeatHistory;

/// Snapshot of a failure detector: the interval history together with the time of
/// the latest heartbeat, `None` until the first heartbeat arrives.
///
/// Snapshots are never modified once published, a heartbeat installs a new one.
#[derive(Debug, Clone, PartialEq)]
pub struct State {
    history: HeartbeatHistory,
    timestamp: Option<u64>,
}

impl State {
    pub fn new(history: HeartbeatHistory, timestamp: Option<u64>) -> Self {
        Self { history, timestamp }
    }

    pub fn history(&self) -> &HeartbeatHistory {
        &self.history
    }

    pub fn timestamp(&self) -> Option<u64> {
        self.timestamp
    }
}
