//! Remote mutation API: listing the emoji slots on a destination and
//! applying create/delete mutations against them.

pub mod api;
pub mod datauri;
pub mod http;

pub use api::{MutationStatus, RemoteApi};
pub use datauri::DataUri;
pub use http::HttpRemote;
