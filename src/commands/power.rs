//! Start/stop the selected instances and wait for convergence.
//!
//! Pipeline: select → report → confirmation gate → mutating call →
//! convergence polling. A rejected confirmation exits cleanly with no
//! action; an ambiguous answer aborts with an error.

use anyhow::{Context as _, Result};
use colored::Colorize;
use std::io;

use crate::Context as AppContext;
use crate::cli::PowerArgs;
use crate::config::Config;
use crate::ui;
use fleetkit::converge::ConvergeObserver;
use fleetkit::{ActionGate, Decision, InstanceStatus, PowerAction};

pub fn run(ctx: &AppContext, action: PowerAction, args: PowerArgs) -> Result<()> {
    let cfg = Config::load()?;
    let filters = super::filter_set(&args.select)?;
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
    println!();

    let ids: Vec<String> = instances.iter().map(|i| i.id.clone()).collect();

    let mut gate = ActionGate::new(args.force);
    let stdin = io::stdin();
    let decision = gate.confirm(action, stdin.lock(), io::stdout())?;
    if decision == Decision::Rejected {
        ui::info("Exiting and taking no action");
        return Ok(());
    }

    println!(
        "Performing {} action on {} instance(s)",
        action.verb(),
        ids.len()
    );
    match action {
        PowerAction::Start => client
            .start_with_retry(&ids, &retry)
            .context("starting instances")?,
        PowerAction::Stop => client
            .stop_with_retry(&ids, &retry)
            .context("stopping instances")?,
    }

    let poll = super::poll_config(&cfg, args.poll_interval, args.timeout);
    let mut observer = StatusPrinter { quiet: ctx.quiet };
    client
        .converge_with_retry(&ids, action.desired_state(), &poll, &retry, &mut observer)
        .with_context(|| format!("waiting for instances to become {}", action.desired_state()))?;

    println!();
    ui::success(&format!(
        "{} instance(s) now {}",
        ids.len(),
        action.desired_state()
    ));
    Ok(())
}

/// Observer that prints one status block per poll entry, mirroring the
/// selection report format.
struct StatusPrinter {
    quiet: bool,
}

impl ConvergeObserver for StatusPrinter {
    fn on_status(&mut self, status: &InstanceStatus, ready: bool) {
        if self.quiet && !ready {
            return;
        }
        let heading = format!("Instance ID: {}", status.id);
        println!("{}", "─".repeat(heading.chars().count()).dimmed());
        println!("{heading}");
        if ready {
            println!("Status: {} {}", ui::state_colored(&status.state), "✓".green());
        } else {
            println!("Status: {}", ui::state_colored(&status.state));
        }
    }
}
