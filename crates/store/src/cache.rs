use camino::{Utf8Path, Utf8PathBuf};
use emosync_primitives::{AssetId, EmoteCode, Variant};
use eyre::{Result as EyreResult, WrapErr};
use tokio::fs::{create_dir_all, remove_dir_all, remove_file, rename, write};
use tracing::debug;

/// Filesystem cache for downloaded variants, scoped to one run.
///
/// Each stored file is owned exclusively by the asset that downloaded it
/// until the selector prunes it. File names carry identity, code and size
/// tag for inspection only; the in-memory [`Variant`] record is the source
/// of truth and nothing ever parses a name back.
#[derive(Clone, Debug)]
pub struct VariantCache {
    root: Utf8PathBuf,
}

impl VariantCache {
    /// Rotate the previous run's directory aside and start fresh.
    ///
    /// An existing `<root>-archived` from two runs ago is removed, the
    /// last run's directory (if any) takes its place, and a new empty
    /// root is created.
    pub async fn prepare(root: impl Into<Utf8PathBuf>) -> EyreResult<Self> {
        let root = root.into();
        let archived = Utf8PathBuf::from(format!("{root}-archived"));

        if archived.is_dir() {
            remove_dir_all(&archived)
                .await
                .wrap_err_with(|| format!("failed to clear {archived}"))?;
        }

        if root.is_dir() {
            rename(&root, &archived)
                .await
                .wrap_err_with(|| format!("failed to rotate {root}"))?;
            debug!(%root, %archived, "rotated previous cache");
        }

        create_dir_all(&root)
            .await
            .wrap_err_with(|| format!("failed to create {root}"))?;

        Ok(Self { root })
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Store one downloaded binary and return its variant record.
    ///
    /// The extension is sniffed from the payload's magic bytes.
    pub async fn put(
        &self,
        identity: &AssetId,
        code: &EmoteCode,
        tag: &str,
        bytes: &[u8],
    ) -> EyreResult<Variant> {
        let ext = infer::get(bytes).map_or("bin", |kind| kind.extension());
        let path = self.root.join(format!("{identity}_{code}_{tag}.{ext}"));

        write(&path, bytes)
            .await
            .wrap_err_with(|| format!("failed to write {path}"))?;

        Ok(Variant {
            tag: tag.to_owned(),
            len: bytes.len() as u64,
            handle: path,
        })
    }

    /// Free one variant's binary after selection discarded it.
    pub async fn remove(&self, variant: &Variant) -> EyreResult<()> {
        remove_file(&variant.handle)
            .await
            .wrap_err_with(|| format!("failed to remove {}", variant.handle))
    }
}
