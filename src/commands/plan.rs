//! `vhdsync plan` - show what apply would do, without contacting the host

use anyhow::Result;
use colored::Colorize;
use reconcile::{AttributeStore, DiskStatus, ObservedState, Plan};

use super::Inventory;
use crate::Context;
use crate::ui;

pub fn run(ctx: &Context, target: Option<&str>) -> Result<()> {
    let inventory = Inventory::load(ctx, target)?;

    if !ctx.quiet {
        ui::header("Plan");
    }

    if inventory.stores.is_empty() {
        ui::info("No disks declared");
        return Ok(());
    }

    let plans = compute(&inventory);
    for (plan, observed) in &plans {
        print_plan(plan, observed);
    }

    let pending = plans.iter().filter(|(p, _)| p.mutates()).count();
    println!();
    if pending == 0 {
        ui::success("Everything up to date");
    } else {
        ui::info(&format!("{pending} disk(s) to change; run `vhdsync apply`"));
    }

    Ok(())
}

/// Plans for every selected disk, with the observation each is based on
pub fn compute(inventory: &Inventory) -> Vec<(Plan, ObservedState)> {
    inventory
        .stores
        .iter()
        .map(|store| {
            (
                Plan::compute(store.desired(), store.observed()),
                store.observed().clone(),
            )
        })
        .collect()
}

pub fn print_plan(plan: &Plan, observed: &ObservedState) {
    let symbol = if plan.mutates() {
        "→".cyan()
    } else {
        "○".dimmed()
    };
    println!("  {symbol} {plan}");

    if observed.status == DiskStatus::Unknown {
        ui::dim("not observed yet; an existing disk is kept as is");
    } else if observed.exists() && !plan.changes.is_empty() {
        ui::dim(&format!("differs in: {}", plan.changes));
        let unapplied = plan.unapplied();
        if !unapplied.is_empty() {
            ui::warn(&format!(
                "not applied in place: {}",
                unapplied
                    .iter()
                    .map(|a| a.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            ));
        }
    }
}
