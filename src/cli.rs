use clap::{Parser, Subcommand};
use clap_complete::Shell;

#[derive(Parser)]
#[command(name = "corral")]
#[command(author = "Alberto Cavalcante")]
#[command(version)]
#[command(about = "Select EC2 instances by tag and drive their power state", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// AWS profile to use for every API call
    #[arg(long, global = true, env = "AWS_PROFILE")]
    pub profile: Option<String>,

    /// AWS region to use for every API call
    #[arg(long, global = true, env = "AWS_REGION")]
    pub region: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// List instances matching the selection
    List(SelectArgs),

    /// Start the selected instances and wait until they are running
    Start(PowerArgs),

    /// Stop the selected instances and wait until they are stopped
    Stop(PowerArgs),

    /// Run health checks on the AWS environment
    Doctor,

    /// Manage configuration files
    #[command(subcommand)]
    Config(ConfigCommand),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

// ============================================================================
// Selection
// ============================================================================

#[derive(Parser)]
pub struct SelectArgs {
    /// Select by tag: key:value1,value2 (repeatable; clauses AND together)
    #[arg(short, long = "tag", value_name = "KEY:VALUE[,VALUE...]")]
    pub tags: Vec<String>,

    /// Select by attribute: key:value1,value2 (repeatable; tag:key:value also accepted)
    #[arg(short, long = "filter", value_name = "KEY:VALUE[,VALUE...]")]
    pub filters: Vec<String>,
}

// ============================================================================
// Power Actions
// ============================================================================

#[derive(Parser)]
pub struct PowerArgs {
    #[command(flatten)]
    pub select: SelectArgs,

    /// Skip the confirmation prompt
    #[arg(long, alias = "yes")]
    pub force: bool,

    /// Seconds between status polls
    #[arg(long, value_name = "SECONDS")]
    pub poll_interval: Option<u64>,

    /// Give up on convergence after this many seconds
    #[arg(long, value_name = "SECONDS")]
    pub timeout: Option<u64>,
}

// ============================================================================
// Config Commands
// ============================================================================

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show the resolved configuration
    Show,

    /// Print the config file location
    Path,
}
