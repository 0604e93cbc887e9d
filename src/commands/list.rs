//! List instances matching the selection.

use anyhow::{Context as _, Result};

use crate::Context as AppContext;
use crate::cli::SelectArgs;
use crate::config::Config;
use crate::ui;

pub fn run(ctx: &AppContext, args: SelectArgs) -> Result<()> {
    let cfg = Config::load()?;
    let filters = super::filter_set(&args)?;
    let client = super::client(ctx, &cfg)?;
    let retry = super::retry_config(&cfg);

    let instances = client
        .list_with_retry(&filters, &retry)
        .context("describing instances")?;

    if instances.is_empty() {
        ui::info("No instances matched the selection");
        return Ok(());
    }

    for instance in &instances {
        super::print_instance(instance);
    }

    if !ctx.quiet {
        println!();
        ui::dim(&format!("{} instance(s)", instances.len()));
    }

    Ok(())
}
