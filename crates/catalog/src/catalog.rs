use std::collections::HashMap;

use emosync_primitives::{ArchiveRecord, Asset, AssetId, EmoteCode, Variant};
use emosync_store::VariantCache;
use eyre::{Result as EyreResult, WrapErr};
use futures_util::{stream, StreamExt};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::animate::is_animated;
use crate::select::select_variant;
use crate::source::{EmoteSource, RawEmote};

/// Variant downloads in flight at once per source.
const DOWNLOAD_BURST: usize = 8;

/// More than one local variant left for a single identity after
/// trimming. Mutating against this would upload arbitrary binaries, so
/// the pool build stops here.
#[derive(Debug, Error)]
#[error("unclean trim: {count} local variants resolve to identity {identity}")]
pub struct UncleanTrim {
    pub identity: AssetId,
    pub count: usize,
}

/// The desired emote inventory for one run, partitioned by animation
/// class. Pool order follows configured source priority, then each
/// source's emission order.
#[derive(Debug, Default)]
pub struct Inventory {
    pub static_pool: Vec<Asset>,
    pub animated_pool: Vec<Asset>,
}

impl Inventory {
    pub fn pool(&self, animated: bool) -> &[Asset] {
        if animated {
            &self.animated_pool
        } else {
            &self.static_pool
        }
    }

    /// Archive snapshot of everything kept this run.
    pub fn archive_records(&self) -> Vec<ArchiveRecord> {
        self.static_pool
            .iter()
            .chain(&self.animated_pool)
            .map(|asset| ArchiveRecord::new(asset.code.clone(), asset.identity.clone()))
            .collect()
    }
}

/// Normalizes raw source records into trimmed [`Asset`]s.
#[derive(Clone, Debug)]
pub struct Catalog {
    cache: VariantCache,
    ceiling: u64,
}

impl Catalog {
    pub fn new(cache: VariantCache, ceiling: u64) -> Self {
        Self { cache, ceiling }
    }

    /// Build the run's inventory from the configured sources, in
    /// priority order.
    ///
    /// A source that fails to list aborts the run (collaborator
    /// failure); an emote that fails to download or has no qualifying
    /// variant is dropped with a log line and the run continues.
    pub async fn collect(&self, sources: &[Box<dyn EmoteSource>]) -> EyreResult<Inventory> {
        let mut inventory = Inventory::default();

        for source in sources {
            let raws = source
                .list()
                .await
                .wrap_err_with(|| format!("listing {} failed", source.label()))?;

            info!(source = source.label(), listed = raws.len(), "collecting source");

            let assets: Vec<Option<Asset>> = stream::iter(raws)
                .map(|raw| self.build_asset(source.as_ref(), raw))
                .buffered(DOWNLOAD_BURST)
                .collect()
                .await;

            for asset in assets.into_iter().flatten() {
                if asset.animated {
                    inventory.animated_pool.push(asset);
                } else {
                    inventory.static_pool.push(asset);
                }
            }
        }

        ensure_clean_trim(&inventory)?;

        info!(
            static_pool = inventory.static_pool.len(),
            animated_pool = inventory.animated_pool.len(),
            "inventory assembled"
        );

        Ok(inventory)
    }

    /// Download, classify and trim one emote.
    ///
    /// Returns `None` when the asset has to be dropped; every drop is
    /// logged with its identity and reason.
    async fn build_asset(&self, source: &dyn EmoteSource, raw: RawEmote) -> Option<Asset> {
        let code = EmoteCode::legalize(&raw.name);

        if raw.variants.is_empty() {
            warn!(identity = %raw.id, %code, "source listed no variants, dropping asset");
            return None;
        }

        let mut variants = Vec::with_capacity(raw.variants.len());
        let mut payloads = Vec::with_capacity(raw.variants.len());

        for reference in &raw.variants {
            let bytes = match source.fetch_variant(reference).await {
                Ok(bytes) => bytes,
                Err(err) => {
                    warn!(
                        identity = %raw.id,
                        %code,
                        tag = reference.tag,
                        %err,
                        "variant download failed, dropping asset"
                    );
                    self.discard(&variants).await;
                    return None;
                }
            };

            match self.cache.put(&raw.id, &code, &reference.tag, &bytes).await {
                Ok(variant) => {
                    variants.push(variant);
                    payloads.push(bytes);
                }
                Err(err) => {
                    warn!(identity = %raw.id, %code, %err, "caching variant failed, dropping asset");
                    self.discard(&variants).await;
                    return None;
                }
            }
        }

        let Some(selected) = select_variant(&variants, self.ceiling).cloned() else {
            warn!(
                identity = %raw.id,
                %code,
                ceiling = self.ceiling,
                "no variant under the ceiling, dropping asset"
            );
            self.discard(&variants).await;
            return None;
        };

        let animated = match raw.animated {
            Some(animated) => animated,
            None => {
                let index = variants
                    .iter()
                    .position(|variant| *variant == selected)
                    .unwrap_or(0);
                is_animated(&payloads[index])
            }
        };

        // Keep the winner, free the rest. A prune that fails leaves the
        // loser in the record so the unclean-trim check trips.
        let mut kept = vec![selected.clone()];
        for variant in &variants {
            if *variant == selected {
                continue;
            }
            if let Err(err) = self.cache.remove(variant).await {
                warn!(handle = %variant.handle, %err, "pruning variant failed");
                kept.push(variant.clone());
            }
        }

        debug!(identity = %raw.id, %code, animated, tag = selected.tag, "asset trimmed");

        Some(Asset {
            identity: raw.id,
            code,
            animated,
            variants: kept,
        })
    }

    async fn discard(&self, variants: &[Variant]) {
        for variant in variants {
            if let Err(err) = self.cache.remove(variant).await {
                warn!(handle = %variant.handle, %err, "discarding variant failed");
            }
        }
    }
}

/// Stop before mutations when any identity still maps to more than one
/// local variant.
fn ensure_clean_trim(inventory: &Inventory) -> Result<(), UncleanTrim> {
    let mut counts: HashMap<&AssetId, usize> = HashMap::new();

    for asset in inventory.static_pool.iter().chain(&inventory.animated_pool) {
        *counts.entry(&asset.identity).or_default() += asset.variants.len();
    }

    for (identity, count) in counts {
        if count > 1 {
            error!(%identity, count, "unclean trim, refusing to compute mutations");
            return Err(UncleanTrim {
                identity: identity.clone(),
                count,
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use async_trait::async_trait;
    use bytes::Bytes;
    use camino::Utf8Path;
    use emosync_primitives::MAX_UPLOAD_BYTES;
    use eyre::bail;
    use url::Url;

    use super::*;
    use crate::source::VariantRef;

    const GIF_STATIC: &[u8] = b"GIF89a\x01\x00\x01\x00\x00\x00\x00\x2C\x00\x00\x00\x00\x01\x00\x01\x00\x00\x02\x02\x4C\x01\x00\x3B";
    const PNG: &[u8] = b"\x89PNG\r\n\x1a\n\x00\x00\x00\rIHDR";

    fn animated_gif() -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(b"GIF89a");
        out.extend_from_slice(&[0x01, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00]);
        for _ in 0..2 {
            out.extend_from_slice(&[0x2C, 0, 0, 0, 0, 0x01, 0x00, 0x01, 0x00, 0x00]);
            out.extend_from_slice(&[0x02, 0x02, 0x4C, 0x01, 0x00]);
        }
        out.push(0x3B);
        out
    }

    struct MockSource {
        label: String,
        emotes: Vec<RawEmote>,
        payloads: HashMap<String, Bytes>,
    }

    impl MockSource {
        fn new(label: &str) -> Self {
            Self {
                label: label.to_owned(),
                emotes: Vec::new(),
                payloads: HashMap::new(),
            }
        }

        fn emote(
            mut self,
            id: &str,
            name: &str,
            animated: Option<bool>,
            variants: &[(&str, &[u8])],
        ) -> Self {
            let mut refs = Vec::new();
            for (tag, payload) in variants {
                let url: Url = format!("https://cdn.mock.test/{id}/{tag}").parse().unwrap();
                drop(self.payloads.insert(url.as_str().to_owned(), Bytes::copy_from_slice(payload)));
                refs.push(VariantRef {
                    tag: (*tag).to_owned(),
                    url,
                });
            }
            self.emotes.push(RawEmote {
                id: AssetId::new(id),
                name: name.to_owned(),
                animated,
                variants: refs,
            });
            self
        }

        fn boxed(self) -> Box<dyn EmoteSource> {
            Box::new(self)
        }
    }

    #[async_trait]
    impl EmoteSource for MockSource {
        fn label(&self) -> &str {
            &self.label
        }

        async fn list(&self) -> EyreResult<Vec<RawEmote>> {
            Ok(self.emotes.clone())
        }

        async fn fetch_variant(&self, reference: &VariantRef) -> EyreResult<Bytes> {
            match self.payloads.get(reference.url.as_str()) {
                Some(bytes) => Ok(bytes.clone()),
                None => bail!("download of {} failed", reference.url),
            }
        }
    }

    async fn catalog(dir: &tempfile::TempDir) -> Catalog {
        let root = Utf8Path::from_path(dir.path()).unwrap().join("emotes");
        let cache = VariantCache::prepare(root).await.unwrap();
        Catalog::new(cache, MAX_UPLOAD_BYTES)
    }

    #[tokio::test]
    async fn partitions_pools_in_source_priority_order() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = catalog(&dir).await;

        let first = MockSource::new("first")
            .emote("a1", "alpha", Some(false), &[("1x", PNG)])
            .emote("a2", "spinner", Some(true), &[("1x", GIF_STATIC)])
            .boxed();
        let second = MockSource::new("second")
            .emote("b1", "beta", Some(false), &[("1x", PNG)])
            .boxed();

        let inventory = catalog.collect(&[first, second]).await.unwrap();

        let static_codes: Vec<_> = inventory
            .static_pool
            .iter()
            .map(|asset| asset.code.as_str())
            .collect();
        assert_eq!(static_codes, ["alpha", "beta"]);

        assert_eq!(inventory.animated_pool.len(), 1);
        assert_eq!(inventory.animated_pool[0].code, "spinner");
    }

    #[tokio::test]
    async fn sniffs_animation_when_the_source_does_not_assert() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = catalog(&dir).await;

        let gif = animated_gif();
        let source = MockSource::new("seventv:global")
            .emote("e1", "party", None, &[("1x", &gif)])
            .emote("e2", "still", None, &[("1x", PNG)])
            .boxed();

        let inventory = catalog.collect(&[source]).await.unwrap();

        assert_eq!(inventory.animated_pool.len(), 1);
        assert_eq!(inventory.animated_pool[0].code, "party");
        assert_eq!(inventory.static_pool.len(), 1);
        assert_eq!(inventory.static_pool[0].code, "still");
    }

    #[tokio::test]
    async fn trims_to_the_largest_qualifying_variant() {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8Path::from_path(dir.path()).unwrap().join("emotes");
        let cache = VariantCache::prepare(root).await.unwrap();
        let catalog = Catalog::new(cache, 16);

        let big = [PNG, &[0_u8; 64][..]].concat();
        let source = MockSource::new("first")
            .emote("e1", "pick", Some(false), &[("2x", &big), ("1x", &PNG[..12])])
            .boxed();

        let inventory = catalog.collect(&[source]).await.unwrap();

        let asset = &inventory.static_pool[0];
        assert_eq!(asset.variants.len(), 1);
        assert_eq!(asset.variants[0].tag, "1x");
        assert!(asset.variants[0].handle.is_file());

        // The losing handle is gone from the cache.
        let remaining: Vec<_> = std::fs::read_dir(asset.variants[0].handle.parent().unwrap())
            .unwrap()
            .collect();
        assert_eq!(remaining.len(), 1);
    }

    #[tokio::test]
    async fn oversize_assets_are_dropped_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8Path::from_path(dir.path()).unwrap().join("emotes");
        let cache = VariantCache::prepare(root).await.unwrap();
        let catalog = Catalog::new(cache, 4);

        let source = MockSource::new("first")
            .emote("e1", "huge", Some(false), &[("1x", PNG)])
            .emote("e2", "fits", Some(false), &[("1x", &PNG[..4])])
            .boxed();

        let inventory = catalog.collect(&[source]).await.unwrap();

        let codes: Vec<_> = inventory
            .static_pool
            .iter()
            .map(|asset| asset.code.as_str())
            .collect();
        assert_eq!(codes, ["fits"]);
    }

    #[tokio::test]
    async fn download_failure_drops_the_asset_and_continues() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = catalog(&dir).await;

        let mut source = MockSource::new("first")
            .emote("e1", "broken", Some(false), &[("1x", PNG)])
            .emote("e2", "healthy", Some(false), &[("1x", PNG)]);
        // Forget the payload so the fetch fails.
        drop(source.payloads.remove("https://cdn.mock.test/e1/1x"));

        let inventory = catalog.collect(&[source.boxed()]).await.unwrap();

        assert_eq!(inventory.static_pool.len(), 1);
        assert_eq!(inventory.static_pool[0].code, "healthy");
    }

    #[tokio::test]
    async fn duplicate_identities_after_trim_are_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = catalog(&dir).await;

        let source = MockSource::new("first")
            .emote("dup", "one", Some(false), &[("1x", PNG)])
            .emote("dup", "two", Some(false), &[("2x", PNG)])
            .boxed();

        let err = catalog.collect(&[source]).await.unwrap_err();
        let trim = err.downcast_ref::<UncleanTrim>().expect("unclean trim");
        assert_eq!(trim.identity.as_str(), "dup");
        assert_eq!(trim.count, 2);
    }
}
