//! `vhdsync show` - print what the host reports for one disk

use anyhow::{Context as _, Result};

use crate::Context;
use crate::config::VhdsyncConfig;
use crate::ui;

pub fn run(ctx: &Context, path: &str) -> Result<()> {
    let (config, _) = VhdsyncConfig::load(ctx.config.as_deref())?;
    let client = config.host.client()?;

    let info = client
        .get_vhd(path)
        .with_context(|| format!("Failed to read {path}"))?;

    if !info.exists() {
        ui::error(&format!("{path} does not exist"));
    }

    let json = serde_json::to_string_pretty(&info).context("Failed to serialize disk")?;
    println!("{json}");
    Ok(())
}
