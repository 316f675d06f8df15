use clap::Parser;
use emosync_config::{ConfigFile, CONFIG_FILE};
use eyre::{bail, Result as EyreResult};
use tokio::fs::create_dir_all;
use tracing::info;

use crate::cli::RootArgs;

#[derive(Debug, Parser)]
#[command(about = "Write a starter configuration")]
pub struct InitCommand {
    /// Overwrite an existing configuration
    #[arg(long)]
    pub force: bool,
}

impl InitCommand {
    pub async fn run(self, root: &RootArgs) -> EyreResult<()> {
        create_dir_all(&root.home).await?;

        if ConfigFile::exists(&root.home) && !self.force {
            bail!(
                "{} already exists in {}, pass --force to overwrite",
                CONFIG_FILE,
                root.home
            );
        }

        ConfigFile::default().save(&root.home).await?;

        info!(path = %root.home.join(CONFIG_FILE), "wrote starter configuration");
        info!("fill in remote.token and the destinations list before running a sync");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn force_flag_parses() {
        let command = InitCommand::try_parse_from(["init", "--force"]).unwrap();
        assert!(command.force);

        let command = InitCommand::try_parse_from(["init"]).unwrap();
        assert!(!command.force);
    }
}
