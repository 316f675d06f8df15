//! Assembling the desired emote inventory: source catalog adapters,
//! normalization into canonical [`Asset`](emosync_primitives::Asset)
//! records, variant download and selection, and the static/animated pool
//! partition.

pub mod animate;
pub mod catalog;
pub mod select;
pub mod source;
pub mod sources;

pub use catalog::{Catalog, Inventory, UncleanTrim};
pub use select::select_variant;
pub use source::{EmoteSource, RawEmote, VariantRef};
