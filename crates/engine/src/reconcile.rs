use std::collections::{HashMap, HashSet};

use emosync_primitives::{ArchiveRecord, Asset, Mutation, RemoteSlot};
use tracing::debug;

/// Mutations for one destination and one animation class, grouped into
/// the four ordered bursts.
///
/// Replacement bursts fully precede the generic delete burst, which
/// fully precedes the generic create burst; within a burst, mutations
/// are independent.
#[derive(Debug, Default)]
pub struct MutationPlan {
    pub replace_deletes: Vec<Mutation>,
    pub replace_creates: Vec<Mutation>,
    pub deletes: Vec<Mutation>,
    pub creates: Vec<Mutation>,
}

impl MutationPlan {
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn len(&self) -> usize {
        self.replace_deletes.len()
            + self.replace_creates.len()
            + self.deletes.len()
            + self.creates.len()
    }

    /// Bursts in mandatory apply order.
    pub fn bursts(&self) -> [(&'static str, &[Mutation]); 4] {
        [
            ("replace-delete", &self.replace_deletes),
            ("replace-create", &self.replace_creates),
            ("delete", &self.deletes),
            ("create", &self.creates),
        ]
    }
}

/// Diff one desired chunk against a destination's live slots and the
/// prior-run archive.
///
/// Both inputs must already be filtered to a single animation class.
/// Matching is by exact, case-sensitive string equality between desired
/// codes and remote names.
pub fn reconcile(
    desired: &[Asset],
    remote: &[RemoteSlot],
    archive: &[ArchiveRecord],
) -> MutationPlan {
    let remote_by_name: HashMap<&str, &RemoteSlot> = remote
        .iter()
        .map(|slot| (slot.name.as_str(), slot))
        .collect();
    let desired_codes: HashSet<&str> = desired.iter().map(|asset| asset.code.as_str()).collect();
    let archived: HashMap<&str, &ArchiveRecord> = archive
        .iter()
        .map(|record| (record.code.as_str(), record))
        .collect();

    let mut plan = MutationPlan::default();
    let mut replaced: HashSet<&str> = HashSet::new();

    // An asset whose code survived from last run under a different
    // identity was modified upstream: its slot (if present) is deleted
    // and the asset re-created, ahead of everything else.
    for asset in desired {
        let Some(record) = archived.get(asset.code.as_str()) else {
            continue;
        };
        if record.identity == asset.identity {
            continue;
        }

        debug!(
            code = %asset.code,
            was = %record.identity,
            now = %asset.identity,
            "asset modified upstream, forcing re-upload"
        );
        let _ = replaced.insert(asset.code.as_str());

        if let Some(slot) = remote_by_name.get(asset.code.as_str()) {
            plan.replace_deletes.push(Mutation::Delete {
                name: slot.name.clone(),
                id: slot.id.clone(),
            });
        }

        if let Some(variant) = asset.selected_variant() {
            plan.replace_creates.push(Mutation::Create {
                name: asset.code.clone(),
                handle: variant.handle.clone(),
            });
        }
    }

    // Codes consumed by replacement never reappear in the generic sets.
    for slot in remote {
        if replaced.contains(slot.name.as_str()) {
            continue;
        }
        if !desired_codes.contains(slot.name.as_str()) {
            plan.deletes.push(Mutation::Delete {
                name: slot.name.clone(),
                id: slot.id.clone(),
            });
        }
    }

    for asset in desired {
        if replaced.contains(asset.code.as_str()) {
            continue;
        }
        if !remote_by_name.contains_key(asset.code.as_str()) {
            if let Some(variant) = asset.selected_variant() {
                plan.creates.push(Mutation::Create {
                    name: asset.code.clone(),
                    handle: variant.handle.clone(),
                });
            }
        }
    }

    plan
}
