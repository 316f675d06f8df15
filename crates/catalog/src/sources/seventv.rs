use async_trait::async_trait;
use bytes::Bytes;
use emosync_primitives::AssetId;
use eyre::{bail, Result as EyreResult, WrapErr};
use reqwest::Client;
use serde::Deserialize;
use url::Url;

use crate::source::{EmoteSource, RawEmote, VariantRef};
use crate::sources::{fetch_bytes, BROWSER_AGENT};

const DEFAULT_API: &str = "https://api.7tv.app/v2";

/// SevenTV catalog, either the global emote set or one user's.
#[derive(Clone, Debug)]
pub struct SevenTv {
    client: Client,
    api: Url,
    label: String,
}

/// Listings carry `[size, url]` pairs; WebP payloads may or may not be
/// animated, so the mime alone is not a classification.
#[derive(Debug, Deserialize)]
struct SevenTvEmote {
    id: String,
    name: String,
    mime: String,
    urls: Vec<(String, String)>,
}

impl SevenTv {
    pub fn global() -> Self {
        Self {
            client: Client::new(),
            api: format!("{DEFAULT_API}/emotes/global").parse().unwrap(),
            label: "seventv:global".to_owned(),
        }
    }

    pub fn user(user_id: &str) -> Self {
        Self {
            client: Client::new(),
            api: format!("{DEFAULT_API}/users/{user_id}/emotes").parse().unwrap(),
            label: format!("seventv:{user_id}"),
        }
    }

    fn raw(emote: SevenTvEmote) -> EyreResult<RawEmote> {
        let animated = match emote.mime.as_str() {
            "image/gif" => Some(true),
            "image/png" => Some(false),
            _ => None,
        };

        let mut variants = Vec::with_capacity(emote.urls.len());
        for (tag, url) in emote.urls {
            variants.push(VariantRef {
                tag,
                url: url.parse().wrap_err("bad emote url in listing")?,
            });
        }

        Ok(RawEmote {
            id: AssetId::new(emote.id),
            name: emote.name,
            animated,
            variants,
        })
    }
}

#[async_trait]
impl EmoteSource for SevenTv {
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

        let emotes: Vec<SevenTvEmote> = response.json().await?;
        emotes.into_iter().map(Self::raw).collect()
    }

    async fn fetch_variant(&self, reference: &VariantRef) -> EyreResult<Bytes> {
        fetch_bytes(&self.client, &reference.url, &self.label).await
    }
}
