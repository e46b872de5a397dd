//! `vhdsync status` - read every declared disk from the host

use anyhow::{Context as _, Result, bail};
use colored::Colorize;
use reconcile::{AttributeStore, DiskStatus, ExecuteOptions, MemoryStore, Operation, Plan};

use super::{Inventory, Reporter};
use crate::Context;
use crate::ui;

pub fn run(ctx: &Context, target: Option<&str>) -> Result<()> {
    let mut inventory = Inventory::load(ctx, target)?;

    if !ctx.quiet {
        ui::header("Disk status");
    }

    if inventory.stores.is_empty() {
        ui::info("No disks declared");
        return Ok(());
    }

    let client = inventory.config.host.client()?;
    let opts = ExecuteOptions {
        jobs: inventory.config.apply.jobs,
        ..Default::default()
    };

    let mut reporter = Reporter { show_all: false };
    let summary = reconcile::execute(
        &client,
        &mut inventory.stores,
        Operation::Refresh,
        &opts,
        &mut reporter,
    )
    .context("Failed to read disks")?;

    for store in &inventory.stores {
        print_disk(store, ctx.verbose > 0);
    }

    inventory.record();
    inventory.state.save()?;

    if !summary.is_success() {
        bail!("{} disk(s) could not be read", summary.failed);
    }
    Ok(())
}

fn print_disk(store: &MemoryStore, detailed: bool) {
    let desired = store.desired();
    let observed = store.observed();

    match observed.status {
        DiskStatus::Present => {
            let attrs = &observed.attributes;
            let attached = if observed.attached { ", attached" } else { "" };
            println!(
                "  {} {} ({} {}{})",
                "●".green(),
                desired.path,
                ui::format_size(attrs.size),
                attrs.vhd_type,
                attached
            );

            let plan = Plan::compute(desired, observed);
            if !plan.changes.is_empty() {
                println!("    {} {}", "drift:".yellow(), plan.changes);
            }

            if detailed {
                ui::kv("file size", &ui::format_size(observed.file_size));
                ui::kv("format", &format!("{:?}", observed.vhd_format));
                if !attrs.parent_path.is_empty() {
                    ui::kv("parent", &attrs.parent_path);
                }
                ui::kv("block size", &attrs.block_size.to_string());
            }
        }
        DiskStatus::Absent => {
            println!("  {} {} {}", "○".dimmed(), desired.path, "absent".dimmed());
        }
        DiskStatus::Unknown => {
            println!("  {} {} {}", "?".yellow(), desired.path, "unknown".yellow());
        }
    }
}
