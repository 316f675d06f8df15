use core::time::Duration;

use async_trait::async_trait;
use emosync_primitives::{DestinationId, EmoteCode, RemoteSlot, SlotId};
use eyre::Result as EyreResult;

use crate::datauri::DataUri;

/// Outcome of one mutation attempt against the remote API.
///
/// Transport failures surface as errors; this type only classifies
/// responses the server actually produced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MutationStatus {
    /// The defined success status for the mutation kind (created for
    /// uploads, no-content for removals).
    Applied,
    /// The server asked us to wait before retrying the same mutation.
    Throttled { retry_after: Duration },
    /// Any other non-success response. Terminal for this mutation.
    Rejected { status: u16 },
}

/// Capability the reconciliation core is given for talking to
/// destinations. Implementations own transport, auth and payload shapes.
#[async_trait]
pub trait RemoteApi: Send + Sync {
    async fn list_slots(&self, destination: &DestinationId) -> EyreResult<Vec<RemoteSlot>>;

    async fn create(
        &self,
        destination: &DestinationId,
        name: &EmoteCode,
        image: &DataUri,
        roles: &[String],
    ) -> EyreResult<MutationStatus>;

    async fn delete(
        &self,
        destination: &DestinationId,
        id: &SlotId,
    ) -> EyreResult<MutationStatus>;
}
