//! Explicit configuration for an emosync run.
//!
//! Everything the components need is read from one `emosync.toml` and
//! passed into constructors; nothing reads config at import time.

use camino::{Utf8Path, Utf8PathBuf};
use emosync_primitives::{Destination, DestinationId, MAX_UPLOAD_BYTES};
use eyre::{bail, Result as EyreResult, WrapErr};
use serde::{Deserialize, Serialize};
use tokio::fs::{read_to_string, write};
use url::Url;

pub const CONFIG_FILE: &str = "emosync.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[non_exhaustive]
pub struct ConfigFile {
    /// Byte ceiling for uploadable binaries.
    #[serde(default = "default_ceiling")]
    pub ceiling_bytes: u64,

    /// Directory downloaded variants are cached under for the run.
    #[serde(default = "default_cache_dir")]
    pub cache_dir: Utf8PathBuf,

    /// File the prior-run archive records are kept in.
    #[serde(default = "default_archive_path")]
    pub archive_path: Utf8PathBuf,

    pub remote: RemoteConfig,

    /// Source catalogs in priority order. The order is significant: it
    /// decides which emotes land in low-index destinations first.
    pub sources: Vec<SourceConfig>,

    pub destinations: Vec<DestinationConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Base URL of the mutation API.
    #[serde(default = "default_api_base")]
    pub api_base: Url,

    /// Bot token sent on every request.
    pub token: String,

    /// Optional role ids uploads are restricted to.
    #[serde(default)]
    pub roles: Vec<String>,
}

/// One source catalog entry.
///
/// Scope is implied the way the upstream APIs imply it: a missing user id
/// selects the global emote set where the catalog has one.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SourceConfig {
    #[serde(rename = "betterttv")]
    BetterTtv {
        #[serde(default)]
        twitch_uid: Option<String>,
        #[serde(default)]
        cdn: Option<Url>,
    },
    #[serde(rename = "frankerfacez")]
    FrankerFaceZ { twitch_uid: String },
    #[serde(rename = "seventv")]
    SevenTv {
        #[serde(default)]
        user_id: Option<String>,
    },
}

/// Destination entry as written in the config file.
///
/// Either both class limits are given, or the legacy `emoji_limit` caps
/// both.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DestinationConfig {
    pub id: DestinationId,
    #[serde(default)]
    pub static_limit: Option<usize>,
    #[serde(default)]
    pub animated_limit: Option<usize>,
    #[serde(default)]
    pub emoji_limit: Option<usize>,
    #[serde(default)]
    pub page_size: Option<usize>,
}

impl DestinationConfig {
    pub fn resolve(&self) -> EyreResult<Destination> {
        let mut destination = match (self.static_limit, self.animated_limit, self.emoji_limit) {
            (Some(stat), Some(animated), _) => {
                Destination::new(self.id.clone(), stat, animated)
            }
            (None, None, Some(limit)) => Destination::with_emoji_limit(self.id.clone(), limit),
            _ => bail!(
                "destination {}: set both static_limit and animated_limit, or emoji_limit alone",
                self.id
            ),
        };

        if let Some(page_size) = self.page_size {
            destination.page_size = page_size;
        }

        Ok(destination)
    }
}

impl ConfigFile {
    pub fn exists(dir: &Utf8Path) -> bool {
        dir.join(CONFIG_FILE).is_file()
    }

    pub async fn load(dir: &Utf8Path) -> EyreResult<Self> {
        let path = dir.join(CONFIG_FILE);
        let content = read_to_string(&path)
            .await
            .wrap_err_with(|| format!("failed to read {path}"))?;

        toml::from_str(&content).wrap_err_with(|| format!("failed to parse {path}"))
    }

    pub async fn save(&self, dir: &Utf8Path) -> EyreResult<()> {
        let path = dir.join(CONFIG_FILE);
        let content = toml::to_string_pretty(self)?;

        write(&path, content)
            .await
            .wrap_err_with(|| format!("failed to write {path}"))
    }

    /// Resolve every destination entry, in listed order.
    pub fn destinations(&self) -> EyreResult<Vec<Destination>> {
        self.destinations.iter().map(DestinationConfig::resolve).collect()
    }
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            ceiling_bytes: default_ceiling(),
            cache_dir: default_cache_dir(),
            archive_path: default_archive_path(),
            remote: RemoteConfig {
                api_base: default_api_base(),
                token: String::new(),
                roles: Vec::new(),
            },
            sources: vec![
                SourceConfig::BetterTtv {
                    twitch_uid: None,
                    cdn: None,
                },
                SourceConfig::SevenTv { user_id: None },
            ],
            destinations: Vec::new(),
        }
    }
}

const fn default_ceiling() -> u64 {
    MAX_UPLOAD_BYTES
}

fn default_cache_dir() -> Utf8PathBuf {
    Utf8PathBuf::from("emotes")
}

fn default_archive_path() -> Utf8PathBuf {
    Utf8PathBuf::from("archive.toml")
}

fn default_api_base() -> Url {
    "https://discord.com/api".parse().unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_emoji_limit_caps_both_classes() {
        let entry = DestinationConfig {
            id: DestinationId::new("g1"),
            static_limit: None,
            animated_limit: None,
            emoji_limit: Some(100),
            page_size: None,
        };

        let destination = entry.resolve().unwrap();
        assert_eq!(destination.static_limit, 100);
        assert_eq!(destination.animated_limit, 100);
        assert_eq!(destination.page_size, emosync_primitives::DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn conflicting_limits_are_rejected() {
        let entry = DestinationConfig {
            id: DestinationId::new("g1"),
            static_limit: Some(10),
            animated_limit: None,
            emoji_limit: None,
            page_size: None,
        };

        assert!(entry.resolve().is_err());
    }

    #[test]
    fn parses_a_full_config() {
        let raw = r#"
            [remote]
            token = "bot-token"

            [[sources]]
            kind = "betterttv"
            twitch_uid = "39396"

            [[sources]]
            kind = "frankerfacez"
            twitch_uid = "39396"

            [[sources]]
            kind = "seventv"

            [[destinations]]
            id = "123"
            emoji_limit = 50

            [[destinations]]
            id = "456"
            static_limit = 200
            animated_limit = 100
            page_size = 75
        "#;

        let config: ConfigFile = toml::from_str(raw).unwrap();
        assert_eq!(config.ceiling_bytes, MAX_UPLOAD_BYTES);
        assert_eq!(config.sources.len(), 3);

        let destinations = config.destinations().unwrap();
        assert_eq!(destinations.len(), 2);
        assert_eq!(destinations[1].page_size, 75);
    }
}
