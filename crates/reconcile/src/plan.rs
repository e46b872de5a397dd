//! Pure decision step of a reconciliation cycle.

use crate::attributes::{Attribute, ChangeSet, DiskSpec, ObservedState};
use std::fmt;

/// One step of a cycle, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Create the disk; `replace` destroys an existing one first
    CreateOrUpdate { replace: bool },
    /// Resize in place to `size` bytes
    Resize { size: u64 },
    /// Read the disk back
    Refresh,
}

impl Action {
    pub fn is_mutation(&self) -> bool {
        !matches!(self, Self::Refresh)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::CreateOrUpdate { replace: false } => write!(f, "create"),
            Action::CreateOrUpdate { replace: true } => write!(f, "replace"),
            Action::Resize { size } => write!(f, "resize to {size} bytes"),
            Action::Refresh => write!(f, "refresh"),
        }
    }
}

/// Actions one cycle will take for one disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    pub path: String,
    pub changes: ChangeSet,
    pub actions: Vec<Action>,
}

impl Plan {
    /// Decide what a cycle does, without touching the host.
    ///
    /// A missing disk or a change to a creation attribute recreates it, and
    /// the create request carries the desired size. Only otherwise does a
    /// size change on a disk without a parent resize it. Every plan ends
    /// with a refresh.
    pub fn compute(desired: &DiskSpec, observed: &ObservedState) -> Self {
        let changes = ChangeSet::between(desired, &observed.attributes);
        let exists = observed.exists();
        let mut actions = Vec::with_capacity(2);

        if !exists || changes.forces_recreation() {
            actions.push(Action::CreateOrUpdate { replace: exists });
        } else if desired.size > 0
            && !desired.is_differencing()
            && changes.contains(Attribute::Size)
        {
            actions.push(Action::Resize { size: desired.size });
        }
        actions.push(Action::Refresh);

        log::debug!("plan for {}: {:?} (changed: {})", desired.path, actions, changes);

        Self {
            path: desired.path.clone(),
            changes,
            actions,
        }
    }

    /// Check if the plan changes anything on the host
    pub fn mutates(&self) -> bool {
        self.actions.iter().any(Action::is_mutation)
    }

    /// Changed attributes this plan does not act on.
    ///
    /// A type, block size or sector size only takes effect when a disk is
    /// created, and a differencing disk's size follows its parent.
    pub fn unapplied(&self) -> Vec<Attribute> {
        if self.creates() {
            return Vec::new();
        }
        let resizes = self
            .actions
            .iter()
            .any(|a| matches!(a, Action::Resize { .. }));
        self.changes
            .iter()
            .filter(|attribute| !(resizes && *attribute == Attribute::Size))
            .collect()
    }

    /// Whether the plan (re)creates the disk
    pub fn creates(&self) -> bool {
        self.actions
            .iter()
            .any(|a| matches!(a, Action::CreateOrUpdate { .. }))
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let steps: Vec<String> = self
            .actions
            .iter()
            .filter(|a| a.is_mutation())
            .map(ToString::to_string)
            .collect();
        if steps.is_empty() {
            write!(f, "{}: no change", self.path)
        } else {
            write!(f, "{}: {}", self.path, steps.join(", "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::DiskStatus;
    use hvclient::VhdType;

    const DISK: &str = r"C:\vms\disk1.vhdx";

    fn present(spec: DiskSpec) -> ObservedState {
        ObservedState {
            status: DiskStatus::Present,
            attributes: spec,
            ..Default::default()
        }
    }

    #[test]
    fn test_absent_disk_is_created_first() {
        for observed in [ObservedState::default(), ObservedState::absent()] {
            let plan = Plan::compute(&DiskSpec::new(DISK), &observed);
            assert_eq!(
                plan.actions,
                vec![Action::CreateOrUpdate { replace: false }, Action::Refresh]
            );
        }
    }

    #[test]
    fn test_absent_disk_with_size_is_not_resized() {
        let plan = Plan::compute(&DiskSpec::new(DISK).with_size(1 << 30), &ObservedState::absent());
        assert_eq!(plan.actions[0], Action::CreateOrUpdate { replace: false });
        assert!(
            !plan
                .actions
                .iter()
                .any(|a| matches!(a, Action::Resize { .. }))
        );
    }

    #[test]
    fn test_size_growth_resizes() {
        let observed = present(DiskSpec::new(DISK).with_size(1_073_741_824));
        let plan = Plan::compute(&DiskSpec::new(DISK).with_size(2_147_483_648), &observed);
        assert_eq!(
            plan.actions,
            vec![
                Action::Resize {
                    size: 2_147_483_648
                },
                Action::Refresh
            ]
        );
        assert!(!plan.creates());
    }

    #[test]
    fn test_parent_change_replaces_without_resize() {
        let observed = present(DiskSpec::new(DISK).with_size(1 << 30));
        let desired = DiskSpec::new(DISK)
            .with_size(2 << 30)
            .with_parent(r"C:\vms\base.vhdx");

        let plan = Plan::compute(&desired, &observed);
        assert_eq!(
            plan.actions,
            vec![Action::CreateOrUpdate { replace: true }, Action::Refresh]
        );
    }

    #[test]
    fn test_size_change_on_differencing_disk_is_ignored() {
        let spec = DiskSpec::new(DISK).with_parent(r"C:\vms\base.vhdx");
        let observed = present(spec.clone().with_size(1 << 30));
        let plan = Plan::compute(&spec.with_size(2 << 30), &observed);
        assert_eq!(plan.actions, vec![Action::Refresh]);
        assert!(!plan.mutates());
    }

    #[test]
    fn test_zero_size_leaves_size_alone() {
        let observed = present(DiskSpec::new(DISK).with_size(1 << 30));
        let plan = Plan::compute(&DiskSpec::new(DISK), &observed);
        assert!(plan.changes.is_empty());
        assert!(!plan.mutates());
    }

    #[test]
    fn test_type_drift_is_reported_as_unapplied() {
        let observed = present(DiskSpec::new(DISK).with_type(VhdType::Dynamic).with_size(1 << 30));
        let desired = DiskSpec::new(DISK).with_type(VhdType::Fixed).with_size(2 << 30);

        let plan = Plan::compute(&desired, &observed);
        assert_eq!(plan.actions[0], Action::Resize { size: 2 << 30 });
        assert_eq!(plan.unapplied(), vec![Attribute::VhdType]);
    }

    #[test]
    fn test_recreation_applies_everything() {
        let desired = DiskSpec::new(DISK).with_type(VhdType::Fixed).with_parent(r"C:\vms\base.vhdx");
        let observed = present(DiskSpec::new(DISK).with_type(VhdType::Dynamic));
        assert!(Plan::compute(&desired, &observed).unapplied().is_empty());
    }

    #[test]
    fn test_display() {
        let plan = Plan::compute(&DiskSpec::new(DISK), &ObservedState::absent());
        assert_eq!(plan.to_string(), format!("{DISK}: create"));

        let spec = DiskSpec::new(DISK);
        let plan = Plan::compute(&spec, &present(spec.clone()));
        assert_eq!(plan.to_string(), format!("{DISK}: no change"));
    }
}
