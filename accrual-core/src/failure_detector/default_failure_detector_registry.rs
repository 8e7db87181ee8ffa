use std::any::type_name;
use std::fmt::{Debug, Formatter};
use std::hash::Hash;
use std::sync::Arc;

use ahash::RandomState;
use dashmap::DashMap;
use tracing::debug;

use crate::clock::Clock;
use crate::config::FailureDetectorConfig;
use crate::error::Result;
use crate::failure_detector::failure_detector_registry::FailureDetectorRegistry;
use crate::failure_detector::phi_accrual_failure_detector::PhiAccrualFailureDetector;
use crate::failure_detector::FailureDetector;

pub type DetectorFactory = Box<dyn Fn() -> Box<dyn FailureDetector> + Send + Sync>;

/// Creates a detector per resource on its first heartbeat.
pub struct DefaultFailureDetectorRegistry<A> {
    detector_factory: DetectorFactory,
    resource_to_failure_detector: DashMap<A, Arc<dyn FailureDetector>, RandomState>,
}

impl<A> DefaultFailureDetectorRegistry<A> where A: Hash + Eq {
    pub fn new<F>(factory: F) -> DefaultFailureDetectorRegistry<A>
        where
            F: Fn() -> Box<dyn FailureDetector> + Send + Sync + 'static,
    {
        Self {
            detector_factory: Box::new(factory),
            resource_to_failure_detector: DashMap::with_hasher(RandomState::new()),
        }
    }

    /// A registry of [`PhiAccrualFailureDetector`]s sharing one configuration and clock.
    /// The configuration is validated once, here.
    pub fn phi_accrual(config: &FailureDetectorConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        let template = PhiAccrualFailureDetector::from_config(config, clock)?;
        Ok(Self::new(move || Box::new(template.fresh()) as Box<dyn FailureDetector>))
    }

    /// The detector of a resource, if it has sent any heartbeat.
    pub fn detector(&self, resource: &A) -> Option<Arc<dyn FailureDetector>> {
        self.resource_to_failure_detector.get(resource).map(|detector| Arc::clone(detector.value()))
    }

    pub fn len(&self) -> usize {
        self.resource_to_failure_detector.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resource_to_failure_detector.is_empty()
    }
}

impl<A> Debug for DefaultFailureDetectorRegistry<A> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let struct_name = format!("DefaultFailureDetectorRegistry<{}>", type_name::<A>());
        f.debug_struct(&struct_name)
            .finish_non_exhaustive()
    }
}

impl<A> FailureDetectorRegistry for DefaultFailureDetectorRegistry<A> where A: Hash + Eq + Send + Sync {
    type A = A;

    fn is_available(&self, resource: &Self::A) -> bool {
        match self.detector(resource) {
            None => true,
            Some(detector) => detector.is_available(),
        }
    }

    fn is_monitoring(&self, resource: &Self::A) -> bool {
        match self.detector(resource) {
            None => false,
            Some(detector) => detector.is_monitoring(),
        }
    }

    fn heartbeat(&self, resource: Self::A) {
        // never call into a detector while holding a map guard
        let detector = match self.detector(&resource) {
            Some(detector) => detector,
            None => {
                let entry = self.resource_to_failure_detector
                    .entry(resource)
                    .or_insert_with(|| Arc::from((self.detector_factory)()));
                Arc::clone(entry.value())
            }
        };
        detector.heartbeat();
    }

    fn remove(&self, resource: &Self::A) {
        if self.resource_to_failure_detector.remove(resource).is_some() {
            debug!("stopped monitoring a resource, {} left", self.resource_to_failure_detector.len());
        }
    }

    fn reset(&self) {
        self.resource_to_failure_detector.clear();
    }
}
