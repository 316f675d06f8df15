use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};
use const_format::concatcp;
use emosync_engine::Topology;
use eyre::Result as EyreResult;

mod init;
mod sync;

use init::InitCommand;
use sync::SyncCommand;

pub const EXAMPLES: &str = r"
  # Write a starter configuration
  $ emosync --home data/ init

  # Mirror the configured sources into every destination, trimmed to
  # each destination's own limits
  $ emosync --home data/ mirror

  # Shard the shared inventory across the numbered destination list
  $ emosync --home data/ shard

  # Show what would change without applying anything
  $ emosync --home data/ mirror --dry-run
";

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
#[command(after_help = concatcp!(
    "Environment variables:\n",
    "  EMOSYNC_HOME    Directory for config, archive and cached emotes\n\n",
    "Examples:",
    EXAMPLES
))]
pub struct RootCommand {
    #[command(flatten)]
    pub args: RootArgs,

    #[command(subcommand)]
    pub action: SubCommands,
}

#[derive(Debug, Subcommand)]
pub enum SubCommands {
    Init(InitCommand),
    /// Shard one inventory across the numbered destination list
    Shard(SyncCommand),
    /// Mirror the inventory into each destination independently
    Mirror(SyncCommand),
}

#[derive(Debug, Parser)]
pub struct RootArgs {
    /// Directory for config, archive and cached emotes
    #[arg(long, value_name = "PATH", default_value = ".")]
    #[arg(env = "EMOSYNC_HOME", hide_env_values = true)]
    pub home: Utf8PathBuf,
}

impl RootCommand {
    pub async fn run(self) -> EyreResult<()> {
        match self.action {
            SubCommands::Init(init) => init.run(&self.args).await,
            SubCommands::Shard(sync) => sync.run(&self.args, Topology::Shard).await,
            SubCommands::Mirror(sync) => sync.run(&self.args, Topology::Mirror).await,
        }
    }
}
