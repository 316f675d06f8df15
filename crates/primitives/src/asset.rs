use std::fmt;

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use crate::code::EmoteCode;

/// Hard per-image byte ceiling enforced by the destination platform.
pub const MAX_UPLOAD_BYTES: u64 = 262_144;

/// Identity of one emote on its source catalog.
///
/// Stable across size variants, but not across modification: a
/// re-uploaded or renamed emote gets a fresh identity upstream.
#[derive(Clone, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetId(String);

impl AssetId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl From<&str> for AssetId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

/// One binary rendition of an asset at a given size tag.
///
/// The handle points into the run-scoped variant cache and is owned
/// exclusively by this asset until the selector prunes it.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Variant {
    pub tag: String,
    pub len: u64,
    pub handle: Utf8PathBuf,
}

/// One emote's logical identity plus its downloaded binary variants.
///
/// Built once per run by catalog normalization, consumed by one
/// reconciliation pass, and discarded. The only thing that outlives the
/// run is the `{code, identity}` pair written to the archive.
#[derive(Clone, Debug)]
pub struct Asset {
    pub identity: AssetId,
    pub code: EmoteCode,
    pub animated: bool,
    pub variants: Vec<Variant>,
}

impl Asset {
    /// The variant kept after selection, if any.
    ///
    /// Pools only ever hold assets trimmed to a single variant, so this
    /// is the upload payload for a create mutation.
    pub fn selected_variant(&self) -> Option<&Variant> {
        self.variants.first()
    }
}
