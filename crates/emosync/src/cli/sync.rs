use clap::Parser;
use emosync_catalog::sources::{BetterTtv, FrankerFaceZ, SevenTv};
use emosync_catalog::{Catalog, EmoteSource};
use emosync_client::HttpRemote;
use emosync_config::{ConfigFile, SourceConfig};
use emosync_engine::{sync_destinations, SyncOptions, Topology};
use emosync_store::{ArchiveStore, VariantCache};
use eyre::{bail, Result as EyreResult};
use tracing::info;

use crate::cli::RootArgs;

#[derive(Debug, Parser)]
#[command(about = "Synchronize destinations with the configured sources")]
pub struct SyncCommand {
    /// Compute and report mutations without applying them
    #[arg(long)]
    pub dry_run: bool,
}

impl SyncCommand {
    pub async fn run(self, root: &RootArgs, topology: Topology) -> EyreResult<()> {
        if !ConfigFile::exists(&root.home) {
            bail!("no configuration in {}, run `emosync init` first", root.home);
        }

        let config = ConfigFile::load(&root.home).await?;

        let destinations = config.destinations()?;
        if destinations.is_empty() {
            bail!("no destinations configured");
        }
        if config.sources.is_empty() {
            bail!("no sources configured");
        }

        let archive_store = ArchiveStore::new(root.home.join(&config.archive_path));
        let archive = archive_store.load_previous().await?;

        let cache = VariantCache::prepare(root.home.join(&config.cache_dir)).await?;
        let catalog = Catalog::new(cache, config.ceiling_bytes);

        let sources = build_sources(&config.sources);
        let inventory = catalog.collect(&sources).await?;

        let api = HttpRemote::new(config.remote.api_base.clone(), &config.remote.token);
        let options = SyncOptions {
            topology,
            dry_run: self.dry_run,
        };

        let summary = sync_destinations(
            &api,
            &inventory,
            &destinations,
            &archive,
            &config.remote.roles,
            options,
        )
        .await?;

        for report in &summary.reports {
            info!(
                destination = %report.destination,
                planned = report.planned,
                applied = report.applied(),
                rejected = report.rejected(),
                "destination reconciled"
            );
        }
        info!(
            planned = summary.planned(),
            applied = summary.applied(),
            rejected = summary.rejected(),
            dry_run = self.dry_run,
            "run finished"
        );

        if !self.dry_run {
            archive_store
                .save_previous(&inventory.archive_records())
                .await?;
        }

        Ok(())
    }
}

fn build_sources(entries: &[SourceConfig]) -> Vec<Box<dyn EmoteSource>> {
    entries
        .iter()
        .map(|entry| match entry {
            SourceConfig::BetterTtv { twitch_uid, cdn } => match twitch_uid {
                Some(uid) => {
                    Box::new(BetterTtv::channel(uid, cdn.clone())) as Box<dyn EmoteSource>
                }
                None => Box::new(BetterTtv::global(cdn.clone())),
            },
            SourceConfig::FrankerFaceZ { twitch_uid } => {
                Box::new(FrankerFaceZ::channel(twitch_uid))
            }
            SourceConfig::SevenTv { user_id } => match user_id {
                Some(uid) => Box::new(SevenTv::user(uid)),
                None => Box::new(SevenTv::global()),
            },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dry_run_flag_parses() {
        let command = SyncCommand::try_parse_from(["sync", "--dry-run"]).unwrap();
        assert!(command.dry_run);

        let command = SyncCommand::try_parse_from(["sync"]).unwrap();
        assert!(!command.dry_run);
    }

    #[test]
    fn every_configured_source_kind_builds() {
        let entries = [
            SourceConfig::BetterTtv {
                twitch_uid: None,
                cdn: None,
            },
            SourceConfig::BetterTtv {
                twitch_uid: Some("39396".to_owned()),
                cdn: None,
            },
            SourceConfig::FrankerFaceZ {
                twitch_uid: "39396".to_owned(),
            },
            SourceConfig::SevenTv { user_id: None },
        ];

        let sources = build_sources(&entries);
        let labels: Vec<_> = sources.iter().map(|source| source.label()).collect();
        assert_eq!(
            labels,
            [
                "betterttv:global",
                "betterttv:39396",
                "frankerfacez:39396",
                "seventv:global"
            ]
        );
    }
}
