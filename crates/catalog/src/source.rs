use async_trait::async_trait;
use bytes::Bytes;
use emosync_primitives::AssetId;
use eyre::Result as EyreResult;
use url::Url;

/// Reference to one downloadable rendition of an emote.
#[derive(Clone, Debug)]
pub struct VariantRef {
    pub tag: String,
    pub url: Url,
}

/// One emote as a source catalog lists it, before normalization.
///
/// `name` is the raw upstream name; legalization happens exactly once,
/// in the catalog. `animated` is set when the source asserts the
/// classification, and left open when only the binary can tell.
#[derive(Clone, Debug)]
pub struct RawEmote {
    pub id: AssetId,
    pub name: String,
    pub animated: Option<bool>,
    pub variants: Vec<VariantRef>,
}

/// Capability shape of a source catalog.
///
/// Implementations own their API payload shapes, CDN layout and
/// pagination; the core only ever sees raw emote records and bytes.
#[async_trait]
pub trait EmoteSource: Send + Sync {
    /// Short label used in logs and reports.
    fn label(&self) -> &str;

    /// List the emotes this source currently serves, in emission order.
    async fn list(&self) -> EyreResult<Vec<RawEmote>>;

    /// Download one variant's binary.
    async fn fetch_variant(&self, reference: &VariantRef) -> EyreResult<Bytes>;
}
