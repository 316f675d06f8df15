use std::fmt::{self, Debug, Formatter};
use std::future::Future;

use emosync_client::{DataUri, MutationStatus, RemoteApi};
use emosync_primitives::{DestinationId, Mutation, MutationKind};
use eyre::{Result as EyreResult, WrapErr};
use futures_util::future::try_join_all;
use tokio::fs::read;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::reconcile::MutationPlan;

/// What happened to one mutation, for reporting.
#[derive(Clone, Debug)]
pub struct MutationOutcome {
    pub kind: MutationKind,
    pub name: String,
    pub status: MutationStatus,
    /// Throttle retries it took to reach a terminal status.
    pub retries: u32,
}

/// Applies mutation plans against one remote API.
///
/// Bursts run concurrently inside themselves; across bursts the plan's
/// mandatory order is kept by waiting for each burst to drain before the
/// next starts.
pub struct MutationExecutor<'a> {
    api: &'a dyn RemoteApi,
    roles: &'a [String],
}

impl Debug for MutationExecutor<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("MutationExecutor")
            .field("roles", &self.roles)
            .finish_non_exhaustive()
    }
}

impl<'a> MutationExecutor<'a> {
    pub fn new(api: &'a dyn RemoteApi, roles: &'a [String]) -> Self {
        Self { api, roles }
    }

    pub async fn apply_plan(
        &self,
        destination: &DestinationId,
        plan: &MutationPlan,
    ) -> EyreResult<Vec<MutationOutcome>> {
        let mut outcomes = Vec::with_capacity(plan.len());

        for (stage, burst) in plan.bursts() {
            if burst.is_empty() {
                continue;
            }

            debug!(%destination, stage, count = burst.len(), "applying burst");

            let results = try_join_all(
                burst
                    .iter()
                    .map(|mutation| self.apply_one(destination, mutation)),
            )
            .await?;

            outcomes.extend(results);
        }

        Ok(outcomes)
    }

    /// Issue one mutation until it reaches a terminal status.
    ///
    /// Transport errors propagate and fail the run; everything else is
    /// reported in the outcome.
    async fn apply_one(
        &self,
        destination: &DestinationId,
        mutation: &Mutation,
    ) -> EyreResult<MutationOutcome> {
        let (status, retries) = match mutation {
            Mutation::Create { name, handle } => {
                let bytes = read(handle)
                    .await
                    .wrap_err_with(|| format!("failed to read {handle}"))?;
                let image = DataUri::from_bytes(&bytes);

                self.ride_out_throttling(destination, mutation, || {
                    self.api.create(destination, name, &image, self.roles)
                })
                .await?
            }
            Mutation::Delete { id, .. } => {
                self.ride_out_throttling(destination, mutation, || {
                    self.api.delete(destination, id)
                })
                .await?
            }
        };

        match status {
            MutationStatus::Applied => info!(
                %destination,
                kind = %mutation.kind(),
                name = mutation.name(),
                retries,
                "mutation applied"
            ),
            MutationStatus::Rejected { status } => warn!(
                %destination,
                kind = %mutation.kind(),
                name = mutation.name(),
                status,
                "mutation rejected"
            ),
            MutationStatus::Throttled { .. } => {}
        }

        Ok(MutationOutcome {
            kind: mutation.kind(),
            name: mutation.name().to_owned(),
            status,
            retries,
        })
    }

    /// Re-issue a mutation for as long as the server keeps throttling.
    ///
    /// Each throttled response suspends for exactly the server-supplied
    /// duration; a bounded loop rather than recursion, so sustained
    /// throttling cannot grow the stack.
    async fn ride_out_throttling<F, Fut>(
        &self,
        destination: &DestinationId,
        mutation: &Mutation,
        issue: F,
    ) -> EyreResult<(MutationStatus, u32)>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = EyreResult<MutationStatus>>,
    {
        let mut retries = 0_u32;

        loop {
            match issue().await? {
                MutationStatus::Throttled { retry_after } => {
                    info!(
                        %destination,
                        kind = %mutation.kind(),
                        name = mutation.name(),
                        wait_ms = retry_after.as_millis() as u64,
                        "mutation throttled, waiting"
                    );
                    sleep(retry_after).await;
                    retries = retries.saturating_add(1);
                }
                status => return Ok((status, retries)),
            }
        }
    }
}
