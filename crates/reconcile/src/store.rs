//! Per-instance attribute storage.

use crate::attributes::{Attribute, ChangeSet, DiskSpec, ObservedState};

/// Where a controller reads desired attributes and records observed ones.
pub trait AttributeStore {
    /// The configured attributes.
    fn desired(&self) -> &DiskSpec;

    /// What the last read confirmed.
    fn observed(&self) -> &ObservedState;

    /// Record a fresh observation.
    fn set_observed(&mut self, observed: ObservedState);

    /// Record the instance identity; empty once the disk is gone.
    fn set_id(&mut self, id: &str);

    /// Attributes whose desired value differs from the observed one.
    fn changes(&self) -> ChangeSet {
        ChangeSet::between(self.desired(), &self.observed().attributes)
    }

    fn has_changed(&self, attribute: Attribute) -> bool {
        self.changes().contains(attribute)
    }
}

/// In-memory store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    desired: DiskSpec,
    observed: ObservedState,
    id: Option<String>,
}

impl MemoryStore {
    /// Store for a disk that has never been read.
    pub fn new(desired: DiskSpec) -> Self {
        Self {
            desired,
            observed: ObservedState::default(),
            id: None,
        }
    }

    /// Store seeded with a previous observation.
    pub fn with_observed(desired: DiskSpec, observed: ObservedState) -> Self {
        let id = observed.exists().then(|| observed.attributes.path.clone());
        Self {
            desired,
            observed,
            id,
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn into_parts(self) -> (DiskSpec, ObservedState) {
        (self.desired, self.observed)
    }
}

impl AttributeStore for MemoryStore {
    fn desired(&self) -> &DiskSpec {
        &self.desired
    }

    fn observed(&self) -> &ObservedState {
        &self.observed
    }

    fn set_observed(&mut self, observed: ObservedState) {
        self.observed = observed;
    }

    fn set_id(&mut self, id: &str) {
        self.id = (!id.is_empty()).then(|| id.to_string());
    }
}
