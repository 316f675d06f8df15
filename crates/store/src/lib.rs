//! Run-scoped local storage: the variant cache holding downloaded
//! binaries, and the archive of `{code, identity}` records carried over
//! from the previous run.

pub mod archive;
pub mod cache;

pub use archive::ArchiveStore;
pub use cache::VariantCache;
