//! Subcommands of the vhdsync CLI.

pub mod apply;
pub mod destroy;
pub mod plan;
pub mod show;
pub mod status;

use anyhow::Result;
use reconcile::{ApplyResult, AttributeStore, MemoryStore, ProgressCallback};

use crate::Context;
use crate::config::VhdsyncConfig;
use crate::state::StateFile;
use crate::ui;

/// Declared disks paired with their recorded state
pub struct Inventory {
    pub config: VhdsyncConfig,
    pub state: StateFile,
    pub stores: Vec<MemoryStore>,
}

impl Inventory {
    /// Load config and state, keeping disks whose path contains `target`
    pub fn load(ctx: &Context, target: Option<&str>) -> Result<Self> {
        let (config, _) = VhdsyncConfig::load(ctx.config.as_deref())?;
        let state = StateFile::load()?;
        Ok(Self::assemble(config, state, target))
    }

    pub fn assemble(config: VhdsyncConfig, state: StateFile, target: Option<&str>) -> Self {
        let stores = config
            .select(target)
            .into_iter()
            .map(|disk| MemoryStore::with_observed(disk.clone(), state.observed(&disk.path)))
            .collect();

        Self {
            config,
            state,
            stores,
        }
    }

    /// Copy every store's observation into the state file
    pub fn record(&mut self) {
        for store in &self.stores {
            self.state
                .record(&store.desired().path, store.observed().clone());
        }
    }
}

/// Prints cycle outcomes as they are reported
pub struct Reporter {
    /// Print successful outcomes too, not only failures
    pub show_all: bool,
}

impl ProgressCallback for Reporter {
    fn on_batch_start(&mut self, count: usize) {
        log::debug!("Reconciling {count} disk(s)");
    }

    fn on_resource_start(&mut self, id: &str) {
        log::debug!("Starting {id}");
    }

    fn on_resource_complete(&mut self, id: &str, result: &ApplyResult) {
        if self.show_all || !result.is_success() {
            println!(
                "  {} {}: {}",
                ui::result_symbol(result),
                id,
                ui::describe_result(result)
            );
        }
    }

    fn on_batch_complete(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use reconcile::{DiskSpec, DiskStatus, ObservedState};

    #[test]
    fn test_assemble_pairs_disks_with_state() {
        let config = VhdsyncConfig::parse(
            r"
[[disks]]
path = 'C:\vms\web.vhdx'

[[disks]]
path = 'C:\vms\db.vhdx'
",
        )
        .unwrap();
        let mut state = StateFile::default();
        state.record(
            r"C:\vms\db.vhdx",
            ObservedState {
                status: DiskStatus::Present,
                attributes: DiskSpec::new(r"C:\vms\db.vhdx"),
                ..Default::default()
            },
        );

        let inventory = Inventory::assemble(config, state, Some("db"));

        assert_eq!(inventory.stores.len(), 1);
        assert!(inventory.stores[0].observed().exists());
    }

    #[test]
    fn test_record_copies_observations() {
        let config = VhdsyncConfig::parse("[[disks]]\npath = 'a.vhdx'\n").unwrap();
        let mut inventory = Inventory::assemble(config, StateFile::default(), None);
        inventory.stores[0].set_observed(ObservedState::absent());

        inventory.record();

        assert_eq!(
            inventory.state.observed("a.vhdx").status,
            DiskStatus::Absent
        );
    }
}
