//! `vhdsync apply` - reconcile declared disks with the host

use anyhow::{Context as _, Result, bail};
use dialoguer::Confirm;
use hvclient::RetryConfig;
use reconcile::{ExecuteOptions, Operation};

use super::{Inventory, Reporter, plan};
use crate::Context;
use crate::cli::ApplyArgs;
use crate::ui;

pub fn run(ctx: &Context, args: &ApplyArgs) -> Result<()> {
    let mut inventory = Inventory::load(ctx, args.target.as_deref())?;

    if !ctx.quiet {
        ui::header("Applying disks");
    }

    if inventory.stores.is_empty() {
        ui::info("No disks declared");
        return Ok(());
    }

    let plans = plan::compute(&inventory);
    let pending = plans.iter().filter(|(p, _)| p.mutates()).count();
    for (plan, observed) in &plans {
        plan::print_plan(plan, observed);
    }
    println!();

    if args.dry_run {
        ui::warn("Dry run - no changes will be made");
        return Ok(());
    }

    if pending > 0 && !args.yes && !confirm_proceed(pending)? {
        ui::info("Aborted");
        return Ok(());
    }

    let client = inventory.config.host.client()?;
    let opts = options(args, &inventory);
    log::debug!(
        "Running with {} job(s), {} attempt(s) per disk",
        opts.jobs,
        opts.retry.max_attempts
    );

    let mut reporter = Reporter { show_all: true };
    let summary = reconcile::execute(
        &client,
        &mut inventory.stores,
        Operation::Apply,
        &opts,
        &mut reporter,
    )
    .context("Failed to run reconciliation")?;

    inventory.record();
    let state_path = inventory.state.save()?;
    log::debug!("Recorded state in {}", state_path.display());

    ui::print_summary(&summary);

    if !summary.is_success() {
        bail!("{} disk(s) failed", summary.failed);
    }
    Ok(())
}

fn options(args: &ApplyArgs, inventory: &Inventory) -> ExecuteOptions {
    let apply = &inventory.config.apply;
    ExecuteOptions {
        jobs: args.jobs.unwrap_or(apply.jobs).max(1),
        retry: RetryConfig::with_retries(args.retries.unwrap_or(apply.retries)),
        fail_fast: false,
    }
}

fn confirm_proceed(pending: usize) -> Result<bool> {
    let confirmed = Confirm::new()
        .with_prompt(format!("Apply changes to {pending} disk(s)?"))
        .default(false)
        .interact()?;

    Ok(confirmed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VhdsyncConfig;
    use crate::state::StateFile;

    fn args(jobs: Option<usize>, retries: Option<u32>) -> ApplyArgs {
        ApplyArgs {
            target: None,
            dry_run: false,
            yes: true,
            jobs,
            retries,
        }
    }

    #[test]
    fn test_options_from_config() {
        let config = VhdsyncConfig::parse("[apply]\njobs = 8\nretries = 2\n").unwrap();
        let inventory = Inventory::assemble(config, StateFile::default(), None);

        let opts = options(&args(None, None), &inventory);
        assert_eq!(opts.jobs, 8);
        assert_eq!(opts.retry.max_attempts, 3);
    }

    #[test]
    fn test_flags_override_config() {
        let inventory = Inventory::assemble(VhdsyncConfig::default(), StateFile::default(), None);

        let opts = options(&args(Some(0), Some(0)), &inventory);
        assert_eq!(opts.jobs, 1);
        assert_eq!(opts.retry.max_attempts, 1);
    }
}
