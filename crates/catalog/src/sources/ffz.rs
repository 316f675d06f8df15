use std::collections::BTreeMap;

use async_trait::async_trait;
use bytes::Bytes;
use emosync_primitives::AssetId;
use eyre::{bail, Result as EyreResult, WrapErr};
use reqwest::Client;
use serde::Deserialize;
use url::Url;

use crate::source::{EmoteSource, RawEmote, VariantRef};
use crate::sources::{fetch_bytes, BROWSER_AGENT};

const DEFAULT_API: &str = "https://api.betterttv.net/3/cached/frankerfacez/users/twitch";

/// FrankerFaceZ channel catalog, read through the cached mirror.
///
/// FrankerFaceZ has no global set on this API; a channel id is required.
#[derive(Clone, Debug)]
pub struct FrankerFaceZ {
    client: Client,
    api: Url,
    label: String,
}

/// Image urls come keyed by size tag, absolute, and sometimes null.
#[derive(Debug, Deserialize)]
struct FfzEmote {
    id: i64,
    code: String,
    images: BTreeMap<String, Option<String>>,
    #[serde(rename = "imageType")]
    image_type: String,
}

impl FrankerFaceZ {
    pub fn channel(twitch_uid: &str) -> Self {
        Self {
            client: Client::new(),
            api: format!("{DEFAULT_API}/{twitch_uid}").parse().unwrap(),
            label: format!("frankerfacez:{twitch_uid}"),
        }
    }

    fn raw(emote: FfzEmote) -> EyreResult<RawEmote> {
        let animated = match emote.image_type.as_str() {
            "gif" => Some(true),
            "png" => Some(false),
            _ => None,
        };

        let mut variants = Vec::with_capacity(emote.images.len());
        for (tag, url) in emote.images {
            let Some(url) = url else { continue };
            variants.push(VariantRef {
                tag,
                url: url.parse().wrap_err("bad image url in listing")?,
            });
        }

        Ok(RawEmote {
            id: AssetId::new(emote.id.to_string()),
            name: emote.code,
            animated,
            variants,
        })
    }
}

#[async_trait]
impl EmoteSource for FrankerFaceZ {
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

        let emotes: Vec<FfzEmote> = response.json().await?;
        emotes.into_iter().map(Self::raw).collect()
    }

    async fn fetch_variant(&self, reference: &VariantRef) -> EyreResult<Bytes> {
        fetch_bytes(&self.client, &reference.url, &self.label).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_image_sizes_are_skipped() {
        let emote: FfzEmote = serde_json::from_str(
            r#"{
                "id": 720,
                "code": "CatBag",
                "images": {
                    "1x": "https://cdn.frankerfacez.com/emote/720/1",
                    "2x": null,
                    "4x": "https://cdn.frankerfacez.com/emote/720/4"
                },
                "imageType": "png"
            }"#,
        )
        .unwrap();

        let raw = FrankerFaceZ::raw(emote).unwrap();
        assert_eq!(raw.id.as_str(), "720");
        assert_eq!(raw.animated, Some(false));

        let tags: Vec<_> = raw.variants.iter().map(|variant| variant.tag.as_str()).collect();
        assert_eq!(tags, ["1x", "4x"]);
    }
}
