use std::fmt;

use serde::{Deserialize, Serialize};

/// Default number of emotes paged into one destination under the shard
/// topology.
pub const DEFAULT_PAGE_SIZE: usize = 50;

/// Remote identifier of an emoji slot on a destination.
#[derive(Clone, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlotId(String);

impl SlotId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

/// One emoji currently present on a destination.
///
/// Listed fresh at the start of every reconciliation pass, never cached
/// across passes.
#[derive(Clone, Debug, Deserialize)]
pub struct RemoteSlot {
    pub name: String,
    pub id: SlotId,
    pub animated: bool,
}

/// Identifier of a target server.
#[derive(Clone, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DestinationId(String);

impl DestinationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DestinationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

/// A target server with independent static and animated slot budgets.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Destination {
    pub id: DestinationId,
    pub static_limit: usize,
    pub animated_limit: usize,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

impl Destination {
    pub fn new(id: DestinationId, static_limit: usize, animated_limit: usize) -> Self {
        Self {
            id,
            static_limit,
            animated_limit,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Legacy constructor: one `emoji_limit` caps both classes.
    pub fn with_emoji_limit(id: DestinationId, emoji_limit: usize) -> Self {
        Self::new(id, emoji_limit, emoji_limit)
    }
}

const fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}
