use std::fmt::Debug;
use std::hash::Hash;

/// Registry managing per-resource failure detectors.
///
/// New resources are implicitly registered when [`heartbeat`](Self::heartbeat)
/// is first called with a given resource key.
pub trait FailureDetectorRegistry: Debug + Send + Sync {
    type A: Hash + Eq;

    /// Returns `true` if the resource is considered up and healthy, unknown resources included.
    fn is_available(&self, resource: &Self::A) -> bool;

    fn is_monitoring(&self, resource: &Self::A) -> bool;

    fn heartbeat(&self, resource: Self::A);

    /// Removes heartbeat management for the resource.
    fn remove(&self, resource: &Self::A);

    /// Removes all resources and any associated failure detector state.
    fn reset(&self);
}
