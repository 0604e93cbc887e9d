//! Show and locate the config file.

use anyhow::Result;

use crate::Context;
use crate::cli::ConfigCommand;
use crate::config;
use crate::ui;

pub fn run(_ctx: &Context, cmd: ConfigCommand) -> Result<()> {
    match cmd {
        ConfigCommand::Show => show(),
        ConfigCommand::Path => path(),
    }
}

fn show() -> Result<()> {
    let path = config::config_path()?;
    let cfg = config::Config::load()?;

    ui::header("Configuration");
    ui::kv("file", &path.display().to_string());
    if !path.exists() {
        ui::dim("(not present; built-in defaults apply)");
    }
    println!("{}", serde_json::to_string_pretty(&cfg)?);
    Ok(())
}

fn path() -> Result<()> {
    println!("{}", config::config_path()?.display());
    Ok(())
}
