use emosync_catalog::Inventory;
use emosync_client::{MutationStatus, RemoteApi};
use emosync_primitives::{ArchiveRecord, Destination, DestinationId, RemoteSlot};
use eyre::{Result as EyreResult, WrapErr};
use futures_util::future::try_join_all;
use tracing::{debug, info};

use crate::allocate::{desired_chunk, Topology};
use crate::execute::{MutationExecutor, MutationOutcome};
use crate::reconcile::reconcile;

#[derive(Clone, Copy, Debug)]
pub struct SyncOptions {
    pub topology: Topology,
    /// Compute and report plans without applying them or touching the
    /// archive.
    pub dry_run: bool,
}

/// Everything that happened on one destination.
#[derive(Debug)]
pub struct DestinationReport {
    pub destination: DestinationId,
    pub planned: usize,
    pub outcomes: Vec<MutationOutcome>,
}

impl DestinationReport {
    pub fn applied(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|outcome| outcome.status == MutationStatus::Applied)
            .count()
    }

    pub fn rejected(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|outcome| matches!(outcome.status, MutationStatus::Rejected { .. }))
            .count()
    }
}

#[derive(Debug)]
pub struct RunSummary {
    pub reports: Vec<DestinationReport>,
}

impl RunSummary {
    pub fn planned(&self) -> usize {
        self.reports.iter().map(|report| report.planned).sum()
    }

    pub fn applied(&self) -> usize {
        self.reports.iter().map(DestinationReport::applied).sum()
    }

    pub fn rejected(&self) -> usize {
        self.reports.iter().map(DestinationReport::rejected).sum()
    }
}

/// Per-class sync pass states, in order.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Phase {
    Start,
    Listed,
    Diffed,
    Applied,
    Done,
}

struct ClassPass {
    animated: bool,
    phase: Phase,
}

impl ClassPass {
    fn new(animated: bool) -> Self {
        Self {
            animated,
            phase: Phase::Start,
        }
    }

    fn advance(&mut self, destination: &DestinationId, phase: Phase) {
        self.phase = phase;
        debug!(%destination, animated = self.animated, phase = ?self.phase, "sync pass advanced");
    }
}

/// Reconcile every destination against the shared pools.
///
/// Destinations run concurrently and independently: the pools are only
/// read, and one destination's throttle backoff never blocks another's
/// progress.
pub async fn sync_destinations(
    api: &dyn RemoteApi,
    inventory: &Inventory,
    destinations: &[Destination],
    archive: &[ArchiveRecord],
    roles: &[String],
    options: SyncOptions,
) -> EyreResult<RunSummary> {
    let reports = try_join_all(
        destinations
            .iter()
            .enumerate()
            .map(|(index, destination)| {
                sync_destination(api, inventory, index, destination, archive, roles, options)
            }),
    )
    .await?;

    Ok(RunSummary { reports })
}

async fn sync_destination(
    api: &dyn RemoteApi,
    inventory: &Inventory,
    index: usize,
    destination: &Destination,
    archive: &[ArchiveRecord],
    roles: &[String],
    options: SyncOptions,
) -> EyreResult<DestinationReport> {
    let slots = api
        .list_slots(&destination.id)
        .await
        .wrap_err_with(|| format!("listing slots on {} failed", destination.id))?;

    let executor = MutationExecutor::new(api, roles);
    let mut planned = 0;
    let mut outcomes = Vec::new();

    for animated in [false, true] {
        let mut pass = ClassPass::new(animated);
        pass.advance(&destination.id, Phase::Listed);

        let desired = desired_chunk(
            inventory.pool(animated),
            options.topology,
            index,
            destination,
            animated,
        );
        let class_slots: Vec<RemoteSlot> = slots
            .iter()
            .filter(|slot| slot.animated == animated)
            .cloned()
            .collect();

        let plan = reconcile(desired, &class_slots, archive);
        pass.advance(&destination.id, Phase::Diffed);

        info!(
            destination = %destination.id,
            animated,
            replacements = plan.replace_creates.len(),
            deletes = plan.deletes.len(),
            creates = plan.creates.len(),
            "plan computed"
        );
        planned += plan.len();

        if options.dry_run {
            for (stage, burst) in plan.bursts() {
                for mutation in burst {
                    info!(
                        destination = %destination.id,
                        stage,
                        kind = %mutation.kind(),
                        name = mutation.name(),
                        "dry run, would apply"
                    );
                }
            }
        } else {
            outcomes.extend(executor.apply_plan(&destination.id, &plan).await?);
            pass.advance(&destination.id, Phase::Applied);
        }

        pass.advance(&destination.id, Phase::Done);
    }

    Ok(DestinationReport {
        destination: destination.id.clone(),
        planned,
        outcomes,
    })
}
