use async_trait::async_trait;
use bytes::Bytes;
use emosync_primitives::AssetId;
use eyre::{bail, Result as EyreResult, WrapErr};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use url::Url;

use crate::source::{EmoteSource, RawEmote, VariantRef};
use crate::sources::{extend_url, fetch_bytes, BROWSER_AGENT};

const DEFAULT_API: &str = "https://api.betterttv.net/3/cached";
const DEFAULT_CDN: &str = "https://cdn.betterttv.net/emote";

/// BetterTTV serves fixed scale factors per emote id.
const SIZE_TAGS: [&str; 3] = ["3x", "2x", "1x"];

/// BetterTTV catalog, either the global emote set or one channel's.
#[derive(Clone, Debug)]
pub struct BetterTtv {
    client: Client,
    api: Url,
    cdn: Url,
    label: String,
}

#[derive(Debug, Deserialize)]
struct BttvEmote {
    id: String,
    code: String,
    #[serde(rename = "imageType")]
    image_type: String,
    #[serde(default)]
    animated: Option<bool>,
}

/// Channel listings split emotes into the channel's own uploads and the
/// shared ones it enabled; both belong to the channel's set, shared
/// first.
#[derive(Debug, Deserialize)]
struct ChannelListing {
    #[serde(rename = "sharedEmotes", default)]
    shared: Vec<BttvEmote>,
    #[serde(rename = "channelEmotes", default)]
    channel: Vec<BttvEmote>,
}

impl BetterTtv {
    pub fn global(cdn: Option<Url>) -> Self {
        Self::build("emotes/global", "betterttv:global", cdn)
    }

    pub fn channel(twitch_uid: &str, cdn: Option<Url>) -> Self {
        Self::build(
            &format!("users/twitch/{twitch_uid}"),
            &format!("betterttv:{twitch_uid}"),
            cdn,
        )
    }

    fn build(path: &str, label: &str, cdn: Option<Url>) -> Self {
        let api = format!("{DEFAULT_API}/{path}")
            .parse()
            .unwrap();
        let cdn = cdn.unwrap_or_else(|| DEFAULT_CDN.parse().unwrap());

        Self {
            client: Client::new(),
            api,
            cdn,
            label: label.to_owned(),
        }
    }

    fn raw(&self, emote: BttvEmote) -> EyreResult<RawEmote> {
        let animated = emote.animated.or(match emote.image_type.as_str() {
            "gif" => Some(true),
            "png" => Some(false),
            _ => None,
        });

        let mut variants = Vec::with_capacity(SIZE_TAGS.len());
        for tag in SIZE_TAGS {
            variants.push(VariantRef {
                tag: tag.to_owned(),
                url: extend_url(&self.cdn, [emote.id.as_str(), tag])?,
            });
        }

        Ok(RawEmote {
            id: AssetId::new(emote.id),
            name: emote.code,
            animated,
            variants,
        })
    }
}

#[async_trait]
impl EmoteSource for BetterTtv {
    fn label(&self) -> &str {
        &self.label
    }

    async fn list(&self) -> EyreResult<Vec<RawEmote>> {
        let response = self
            .client
            .get(self.api.clone())
            .header(reqwest::header::USER_AGENT, BROWSER_AGENT)
            .send()
            .await
            .wrap_err_with(|| format!("listing {} failed", self.label))?;

        if !response.status().is_success() {
            bail!(
                "listing {} returned status {}",
                self.label,
                response.status()
            );
        }

        // Global listings are a bare array; channel listings wrap two
        // arrays in an object.
        let payload: Value = response.json().await?;
        let emotes: Vec<BttvEmote> = if payload.get("sharedEmotes").is_some() {
            let listing: ChannelListing = serde_json::from_value(payload)?;
            listing.shared.into_iter().chain(listing.channel).collect()
        } else {
            serde_json::from_value(payload)?
        };

        emotes.into_iter().map(|emote| self.raw(emote)).collect()
    }

    async fn fetch_variant(&self, reference: &VariantRef) -> EyreResult<Bytes> {
        fetch_bytes(&self.client, &reference.url, &self.label).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_listing_concatenates_shared_then_channel() {
        let source = BetterTtv::channel("39396", None);
        let payload: Value = serde_json::from_str(
            r#"{
                "id": "u1",
                "channelEmotes": [{"id": "c1", "code": "ownEmote", "imageType": "png"}],
                "sharedEmotes": [{"id": "s1", "code": "sharedEmote", "imageType": "gif"}]
            }"#,
        )
        .unwrap();

        let listing: ChannelListing = serde_json::from_value(payload).unwrap();
        let emotes: Vec<_> = listing
            .shared
            .into_iter()
            .chain(listing.channel)
            .map(|emote| source.raw(emote).unwrap())
            .collect();

        assert_eq!(emotes.len(), 2);
        assert_eq!(emotes[0].id.as_str(), "s1");
        assert_eq!(emotes[0].animated, Some(true));
        assert_eq!(emotes[1].id.as_str(), "c1");
        assert_eq!(emotes[1].animated, Some(false));
    }

    #[test]
    fn variant_urls_follow_the_cdn_scheme() {
        let source = BetterTtv::global(None);
        let emote: BttvEmote = serde_json::from_str(
            r#"{"id": "abc123", "code": "kappa", "imageType": "png"}"#,
        )
        .unwrap();

        let raw = source.raw(emote).unwrap();
        assert_eq!(raw.variants.len(), 3);
        assert_eq!(raw.variants[0].tag, "3x");
        assert_eq!(
            raw.variants[0].url.as_str(),
            "https://cdn.betterttv.net/emote/abc123/3x"
        );
    }

    #[test]
    fn asserted_animated_flag_wins_over_image_type() {
        let source = BetterTtv::global(None);
        let emote: BttvEmote = serde_json::from_str(
            r#"{"id": "x", "code": "c", "imageType": "png", "animated": true}"#,
        )
        .unwrap();

        assert_eq!(source.raw(emote).unwrap().animated, Some(true));
    }
}
