//! Real EC2 backend using `aws` CLI commands.
//!
//! Each trait method shells out to `aws ec2 ...` with `--output json` and
//! parses the payload with serde. Credential and session handling stays
//! entirely with the CLI; this backend only forwards an optional profile
//! and region.

use crate::backend::Backend;
use crate::error::{Error, Result};
use crate::filter::FilterClause;
use crate::types::{Instance, InstanceStatus, Tag};
use serde::Deserialize;
use std::process::Command;

/// Backend that executes real `aws` commands.
pub struct AwsBackend {
    /// Path to the aws executable
    aws_path: String,
    profile: Option<String>,
    region: Option<String>,
}

impl AwsBackend {
    /// Create a new AwsBackend.
    ///
    /// Returns an error if the aws CLI is not installed.
    pub fn new() -> Result<Self> {
        let aws_path = find_aws()?;
        Ok(Self {
            aws_path,
            profile: None,
            region: None,
        })
    }

    /// Forward `--profile` to every invocation.
    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = Some(profile.into());
        self
    }

    /// Forward `--region` to every invocation.
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Common argument prefix for an `aws ec2` subcommand.
    fn ec2_args(&self, subcommand: &str) -> Vec<String> {
        let mut args = vec![
            "ec2".to_string(),
            subcommand.to_string(),
            "--output".to_string(),
            "json".to_string(),
        ];
        if let Some(profile) = &self.profile {
            args.push("--profile".to_string());
            args.push(profile.clone());
        }
        if let Some(region) = &self.region {
            args.push("--region".to_string());
            args.push(region.clone());
        }
        args
    }

    /// Run an aws command and return output.
    fn run_aws(&self, args: &[String]) -> Result<std::process::Output> {
        log::debug!("running: {} {}", self.aws_path, args.join(" "));
        let output = Command::new(&self.aws_path)
            .args(args)
            .output()
            .map_err(|e| Error::CommandFailed {
                message: format!("failed to execute aws: {}", e),
                stderr: String::new(),
            })?;
        Ok(output)
    }

    /// Run an aws command and check for success.
    fn run_aws_checked(&self, args: &[String], operation: &str) -> Result<String> {
        let output = self.run_aws(args)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::from_aws_stderr(&stderr, operation));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

impl Backend for AwsBackend {
    fn is_available(&self) -> bool {
        self.run_aws(&["--version".to_string()])
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    fn describe_instances(&self, clauses: &[FilterClause]) -> Result<Vec<Instance>> {
        let mut args = self.ec2_args("describe-instances");
        if !clauses.is_empty() {
            args.push("--filters".to_string());
            args.extend(clauses.iter().map(filter_arg));
        }

        let stdout = self.run_aws_checked(&args, "ec2 describe-instances")?;
        parse_describe_instances(&stdout)
    }

    fn describe_status(&self, ids: &[String]) -> Result<Vec<InstanceStatus>> {
        let mut args = self.ec2_args("describe-instance-status");
        // Stopped instances drop out of the default status listing.
        args.push("--include-all-instances".to_string());
        args.push("--instance-ids".to_string());
        args.extend(ids.iter().cloned());

        let stdout = self.run_aws_checked(&args, "ec2 describe-instance-status")?;
        parse_describe_status(&stdout)
    }

    fn start_instances(&self, ids: &[String]) -> Result<()> {
        let mut args = self.ec2_args("start-instances");
        args.push("--instance-ids".to_string());
        args.extend(ids.iter().cloned());

        self.run_aws_checked(&args, "ec2 start-instances")?;
        Ok(())
    }

    fn stop_instances(&self, ids: &[String]) -> Result<()> {
        let mut args = self.ec2_args("stop-instances");
        args.push("--instance-ids".to_string());
        args.extend(ids.iter().cloned());

        self.run_aws_checked(&args, "ec2 stop-instances")?;
        Ok(())
    }
}

/// Render one clause as a `--filters` argument
/// (`Name=tag:Env,Values=prod,staging`).
fn filter_arg(clause: &FilterClause) -> String {
    format!("Name={},Values={}", clause.key, clause.values.join(","))
}

// Wire format of `aws ec2 describe-instances`.
#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeInstancesOutput {
    #[serde(default)]
    reservations: Vec<Reservation>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Reservation {
    #[serde(default)]
    instances: Vec<ApiInstance>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ApiInstance {
    instance_id: String,
    state: ApiState,
    #[serde(default)]
    tags: Vec<ApiTag>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ApiState {
    name: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ApiTag {
    key: String,
    value: String,
}

// Wire format of `aws ec2 describe-instance-status`.
#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeStatusOutput {
    #[serde(default)]
    instance_statuses: Vec<ApiInstanceStatus>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ApiInstanceStatus {
    instance_id: String,
    instance_state: ApiState,
}

/// Flatten reservations into a single instance list, preserving API order.
fn parse_describe_instances(json: &str) -> Result<Vec<Instance>> {
    let output: DescribeInstancesOutput = serde_json::from_str(json)?;
    Ok(output
        .reservations
        .into_iter()
        .flat_map(|r| r.instances)
        .map(|i| Instance {
            id: i.instance_id,
            state: i.state.name,
            tags: i
                .tags
                .into_iter()
                .map(|t| Tag::new(t.key, t.value))
                .collect(),
        })
        .collect())
}

fn parse_describe_status(json: &str) -> Result<Vec<InstanceStatus>> {
    let output: DescribeStatusOutput = serde_json::from_str(json)?;
    Ok(output
        .instance_statuses
        .into_iter()
        .map(|s| InstanceStatus {
            id: s.instance_id,
            state: s.instance_state.name,
        })
        .collect())
}

fn find_aws() -> Result<String> {
    // Check common locations
    let paths = [
        "/usr/local/bin/aws",
        "/opt/homebrew/bin/aws",
        "/usr/bin/aws",
    ];

    for path in &paths {
        if std::path::Path::new(path).exists() {
            return Ok(path.to_string());
        }
    }

    // Try which
    let output = Command::new("which")
        .arg("aws")
        .output()
        .map_err(|_| Error::AwsCliNotFound)?;

    if output.status.success() {
        let path = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if !path.is_empty() {
            return Ok(path);
        }
    }

    Err(Error::AwsCliNotFound)
}
