// Command implementations built on fleetkit

pub mod config;
pub mod doctor;
pub mod list;
pub mod power;

use anyhow::{Context as _, Result};
use colored::Colorize;
use std::time::Duration;

use crate::Context;
use crate::cli::SelectArgs;
use crate::config::Config;
use crate::ui;
use fleetkit::backend::aws::AwsBackend;
use fleetkit::{Client, FilterSet, Instance, PollConfig, RetryConfig};

/// Build a filter set from the repeatable selection flags, in the order
/// they were given.
pub(crate) fn filter_set(args: &SelectArgs) -> Result<FilterSet> {
    let mut set = FilterSet::new();
    for spec in &args.tags {
        set.add_tag(spec)
            .with_context(|| format!("invalid --tag {spec}"))?;
    }
    for spec in &args.filters {
        set.add_attribute(spec)
            .with_context(|| format!("invalid --filter {spec}"))?;
    }
    Ok(set)
}

/// Construct the client, preferring flag/env profile and region over the
/// config file defaults.
pub(crate) fn client(ctx: &Context, cfg: &Config) -> Result<Client> {
    let mut backend = AwsBackend::new()?;
    if let Some(profile) = ctx.profile.as_deref().or(cfg.profile.as_deref()) {
        backend = backend.with_profile(profile);
    }
    if let Some(region) = ctx.region.as_deref().or(cfg.region.as_deref()) {
        backend = backend.with_region(region);
    }
    Ok(Client::with_backend(Box::new(backend)))
}

/// Retry policy for remote calls, with the attempt count taken from the
/// config file when present.
pub(crate) fn retry_config(cfg: &Config) -> RetryConfig {
    let mut retry = RetryConfig::default();
    if let Some(attempts) = cfg.retry_attempts {
        retry.max_attempts = attempts.max(1);
    }
    retry
}

/// Poll policy: flags beat the config file, which beats the built-in
/// 1s interval / 300s deadline.
pub(crate) fn poll_config(
    cfg: &Config,
    interval_flag: Option<u64>,
    timeout_flag: Option<u64>,
) -> PollConfig {
    let interval = interval_flag
        .or(cfg.poll_interval_secs)
        .unwrap_or(1)
        .max(1);
    let timeout = timeout_flag.or(cfg.timeout_secs).unwrap_or(300);
    PollConfig::with_deadline(Duration::from_secs(interval), Duration::from_secs(timeout))
}

/// Print the report block for one instance: id header, state, tag dump.
pub(crate) fn print_instance(instance: &Instance) {
    let heading = format!("Instance ID: {}", instance.id);
    println!("{}", "─".repeat(heading.chars().count()).dimmed());
    println!("{}", heading.bold());
    println!("State: {}", ui::state_colored(&instance.state));
    if !instance.tags.is_empty() {
        println!("Tags");
        for tag in &instance.tags {
            ui::kv(&tag.key, &tag.value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::SelectArgs;

    fn select(tags: &[&str], filters: &[&str]) -> SelectArgs {
        SelectArgs {
            tags: tags.iter().map(|s| s.to_string()).collect(),
            filters: filters.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_filter_set_from_flags() {
        let set = filter_set(&select(&["Env:prod"], &["instance-type:t3.micro"])).unwrap();
        let keys: Vec<String> = set.clauses().into_iter().map(|c| c.key).collect();
        assert_eq!(keys, vec!["instance-type", "tag:Env"]);
    }

    #[test]
    fn test_filter_set_reports_bad_spec() {
        let err = filter_set(&select(&["nocolon"], &[])).unwrap_err();
        assert!(format!("{err}").contains("invalid --tag nocolon"));
    }

    #[test]
    fn test_poll_config_precedence() {
        let cfg = Config {
            poll_interval_secs: Some(5),
            timeout_secs: Some(100),
            ..Default::default()
        };

        // Flags win over config
        let poll = poll_config(&cfg, Some(2), Some(60));
        assert_eq!(poll.interval, Duration::from_secs(2));
        assert_eq!(poll.max_polls, 30);

        // Config wins over built-ins
        let poll = poll_config(&cfg, None, None);
        assert_eq!(poll.interval, Duration::from_secs(5));
        assert_eq!(poll.max_polls, 20);

        // Built-ins when nothing is set
        let poll = poll_config(&Config::default(), None, None);
        assert_eq!(poll.interval, Duration::from_secs(1));
        assert_eq!(poll.max_polls, 300);
    }

    #[test]
    fn test_retry_config_from_file() {
        let cfg = Config {
            retry_attempts: Some(7),
            ..Default::default()
        };
        assert_eq!(retry_config(&cfg).max_attempts, 7);
        // A zero in the file still means one attempt
        let cfg = Config {
            retry_attempts: Some(0),
            ..Default::default()
        };
        assert_eq!(retry_config(&cfg).max_attempts, 1);
    }
}
