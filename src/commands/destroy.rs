//! `vhdsync destroy` - delete one disk and mark it absent

use anyhow::{Context as _, Result};
use dialoguer::Confirm;
use reconcile::{Controller, DiskSpec, MemoryStore};

use crate::Context;
use crate::config::VhdsyncConfig;
use crate::state::StateFile;
use crate::ui;

pub fn run(ctx: &Context, path: &str, yes: bool) -> Result<()> {
    let (config, _) = VhdsyncConfig::load(ctx.config.as_deref())?;
    let mut state = StateFile::load()?;

    let declared = config.find_disk(path).cloned();
    if declared.is_some() {
        ui::warn(&format!(
            "{path} is still declared; the next apply creates it again"
        ));
    }
    let desired = declared.unwrap_or_else(|| DiskSpec::new(path));
    let key = desired.path.clone();

    if !yes {
        let confirmed = Confirm::new()
            .with_prompt(format!("Delete {key} and its sibling files?"))
            .default(false)
            .interact()?;
        if !confirmed {
            ui::info("Aborted");
            return Ok(());
        }
    }

    let client = config.host.client()?;
    let mut store = MemoryStore::with_observed(desired, state.observed(&key));
    Controller::new(&client)
        .destroy(&mut store)
        .with_context(|| format!("Failed to delete {key}"))?;

    let (_, observed) = store.into_parts();
    state.record(&key, observed);
    state.save()?;

    ui::success(&format!("Deleted {key}"));
    Ok(())
}
