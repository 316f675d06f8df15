use serde::{Deserialize, Serialize};

use crate::asset::AssetId;
use crate::code::EmoteCode;

/// Minimal snapshot of one asset kept from the previous run.
///
/// The pair exists to detect modification: the same code showing up with
/// a different identity means the upstream emote was replaced and its
/// slot must be force re-uploaded even though the name already exists
/// remotely. Records are never mutated in place, only replaced wholesale
/// at the end of a run.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ArchiveRecord {
    pub code: EmoteCode,
    pub identity: AssetId,
}

impl ArchiveRecord {
    pub fn new(code: EmoteCode, identity: AssetId) -> Self {
        Self { code, identity }
    }
}
