pub mod default_failure_detector_registry;
pub mod failure_detector_registry;
pub mod heartbeat_history;
pub mod phi_accrual_failure_detector;
pub mod state;

/// A failure detector for a single monitored resource.
pub trait FailureDetector: Send + Sync {
    /// Returns `true` if the resource is considered to be up and healthy.
    fn is_available(&self) -> bool;

    /// Returns `true` once the detector has received any heartbeat.
    fn is_monitoring(&self) -> bool;

    /// Notifies the detector that a heartbeat arrived from the monitored resource.
    fn heartbeat(&self);
}

/// Failure detectors that can be told which resource they watch after construction,
/// so a factory can create them before the address is known.
pub trait FailureDetectorWithAddress {
    fn set_address(&self, address: &str);
}
