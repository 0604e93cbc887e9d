//! Health checks for the AWS environment corral depends on.

use anyhow::Result;
use colored::Colorize;
use std::process::{Command, Stdio};

use crate::Context;
use crate::config;
use crate::ui;

struct Issue {
    category: &'static str,
    summary: String,
    detail: Option<String>,
    fix: Option<String>,
    fix_cmd: Option<String>,
}

pub fn run(ctx: &Context) -> Result<()> {
    ui::header("Environment Health Check");

    let mut issues: Vec<Issue> = Vec::new();

    // Check 1: aws CLI
    check_aws_cli(ctx, &mut issues);

    // Check 2: Credentials
    check_credentials(ctx, &mut issues);

    // Check 3: Config file
    check_config(&mut issues);

    // Summary
    println!();
    if issues.is_empty() {
        ui::success("All systems healthy!");
    } else {
        print_issue_summary(&issues);
    }

    Ok(())
}

fn check_aws_cli(ctx: &Context, issues: &mut Vec<Issue>) {
    ui::section("AWS CLI");

    match fleetkit::backend::default_backend() {
        Ok(backend) => {
            use fleetkit::backend::Backend;
            if backend.is_available() {
                println!("  {} aws CLI installed and runnable", "✓".green());
                if ctx.verbose > 0 {
                    if let Ok(output) = Command::new("aws").arg("--version").output() {
                        ui::dim(String::from_utf8_lossy(&output.stdout).trim());
                    }
                }
            } else {
                println!("  {} aws CLI found but not runnable", "✗".red());
                issues.push(Issue {
                    category: "AWS CLI",
                    summary: "aws executable exists but --version failed".to_string(),
                    detail: None,
                    fix: Some("Reinstall the AWS CLI".to_string()),
                    fix_cmd: None,
                });
            }
        }
        Err(_) => {
            println!("  {} aws CLI not found {}", "✗".red(), "(missing)".red());
            issues.push(Issue {
                category: "AWS CLI",
                summary: "aws is not installed".to_string(),
                detail: Some("Every remote call shells out to the aws CLI".to_string()),
                fix: Some("Install the AWS CLI".to_string()),
                fix_cmd: Some("https://docs.aws.amazon.com/cli/latest/userguide/getting-started-install.html".to_string()),
            });
        }
    }
}

fn check_credentials(ctx: &Context, issues: &mut Vec<Issue>) {
    ui::section("Credentials");

    let mut cmd = Command::new("aws");
    cmd.args(["sts", "get-caller-identity"]);
    if let Some(profile) = &ctx.profile {
        cmd.args(["--profile", profile]);
    }
    if let Some(region) = &ctx.region {
        cmd.args(["--region", region]);
    }

    let ok = cmd
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false);

    if ok {
        println!("  {} credentials resolve (sts get-caller-identity)", "✓".green());
    } else {
        println!("  {} credentials do not resolve", "✗".red());
        issues.push(Issue {
            category: "Credentials",
            summary: "sts get-caller-identity failed".to_string(),
            detail: Some("corral itself never handles credentials; the aws CLI must".to_string()),
            fix: Some("Configure a profile or export credentials".to_string()),
            fix_cmd: Some("aws configure".to_string()),
        });
    }
}

fn check_config(issues: &mut Vec<Issue>) {
    ui::section("Config File");

    let Ok(path) = config::config_path() else {
        ui::dim("home directory not resolvable; skipping");
        return;
    };

    if !path.exists() {
        println!("  {} no config file (defaults apply)", "✓".green());
        ui::dim(&path.display().to_string());
        return;
    }

    match config::Config::load_from(&path) {
        Ok(_) => println!("  {} {}", "✓".green(), path.display()),
        Err(e) => {
            println!("  {} {} is invalid", "✗".red(), path.display());
            issues.push(Issue {
                category: "Config File",
                summary: "config.json failed to parse".to_string(),
                detail: Some(format!("{e:#}")),
                fix: Some("Fix or remove the file".to_string()),
                fix_cmd: None,
            });
        }
    }
}

fn print_issue_summary(issues: &[Issue]) {
    let count = issues.len();
    let label = if count == 1 { "Issue" } else { "Issues" };
    ui::header(&format!("{count} {label} Found"));

    for (i, issue) in issues.iter().enumerate() {
        let num = i + 1;
        println!(
            "  {}  {} {}",
            format!("{num}.").bold(),
            issue.summary,
            format!("[{}]", issue.category).dimmed()
        );
        if let Some(detail) = &issue.detail {
            for line in detail.lines() {
                println!("      {}", line.dimmed());
            }
        }
        if let Some(fix) = &issue.fix {
            println!("      {} {}", "Fix:".cyan(), fix);
        }
        if let Some(cmd) = &issue.fix_cmd {
            println!("      {} {}", "$".dimmed(), cmd.bold());
        }
        println!();
    }
}
