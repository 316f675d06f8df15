//! Core data model shared by every emosync crate.
//!
//! Everything here is plain data: asset records assembled from source
//! catalogs, the slots observed on a destination, the mutations computed
//! between the two, and the prior-run archive records used to detect
//! upstream replacement.

pub mod archive;
pub mod asset;
pub mod code;
pub mod mutation;
pub mod remote;

pub use archive::ArchiveRecord;
pub use asset::{Asset, AssetId, Variant, MAX_UPLOAD_BYTES};
pub use code::EmoteCode;
pub use mutation::{Mutation, MutationKind};
pub use remote::{Destination, DestinationId, RemoteSlot, SlotId, DEFAULT_PAGE_SIZE};
