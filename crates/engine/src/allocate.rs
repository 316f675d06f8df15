use emosync_primitives::{Asset, Destination};

/// How the desired pools are distributed over the destination list.
///
/// The two modes correspond to two deployment topologies and are always
/// chosen explicitly, never inferred.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Topology {
    /// Shard one inventory across numbered destinations: destination
    /// `idx` takes the `idx`-th page of the pool, page size per
    /// destination.
    Shard,
    /// Mirror the same inventory into independently-capacitied
    /// destinations: each takes the pool head truncated to its own
    /// class limit.
    Mirror,
}

/// The slice of one class pool destined for one destination.
///
/// Deterministic for a fixed pool order and fixed capacities: recomputing
/// yields the identical chunk.
pub fn desired_chunk<'a>(
    pool: &'a [Asset],
    topology: Topology,
    index: usize,
    destination: &Destination,
    animated: bool,
) -> &'a [Asset] {
    match topology {
        Topology::Shard => {
            let page = destination.page_size;
            let start = usize::min(index.saturating_mul(page), pool.len());
            let end = usize::min(start.saturating_add(page), pool.len());
            &pool[start..end]
        }
        Topology::Mirror => {
            let limit = if animated {
                destination.animated_limit
            } else {
                destination.static_limit
            };
            &pool[..usize::min(limit, pool.len())]
        }
    }
}
