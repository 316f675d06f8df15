//! Concrete source catalog adapters.
//!
//! Each adapter owns its API payload shape, CDN layout and size-tag
//! scheme behind the one [`EmoteSource`](crate::source::EmoteSource)
//! capability; nothing source-specific leaks past normalization.

use core::time::Duration;
use std::time::{SystemTime, UNIX_EPOCH};

use bytes::Bytes;
use eyre::{bail, eyre, Result as EyreResult, WrapErr};
use reqwest::{Client, StatusCode};
use tokio::time::sleep;
use tracing::{debug, warn};
use url::Url;

pub mod bttv;
pub mod ffz;
pub mod seventv;

pub use bttv::BetterTtv;
pub use ffz::FrankerFaceZ;
pub use seventv::SevenTv;

/// User agent the upstream CDNs expect on anonymous requests.
const BROWSER_AGENT: &str = "Mozilla/5.0";

/// Download one binary, riding out CDN throttling.
///
/// A 429 sleeps to the next minute boundary and retries; any other
/// non-success status fails the fetch.
pub(crate) async fn fetch_bytes(client: &Client, url: &Url, label: &str) -> EyreResult<Bytes> {
    loop {
        let response = client
            .get(url.clone())
            .header(reqwest::header::USER_AGENT, BROWSER_AGENT)
            .send()
            .await
            .wrap_err_with(|| format!("download of {url} failed"))?;

        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            warn!(source = label, %url, "download throttled, sleeping to the next minute");
            sleep_to_next_minute().await;
            continue;
        }

        if !response.status().is_success() {
            bail!("download of {url} returned status {}", response.status());
        }

        debug!(source = label, %url, "downloaded variant");
        return response.bytes().await.map_err(Into::into);
    }
}

async fn sleep_to_next_minute() {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    let into_minute = now.as_secs() % 60;

    sleep(Duration::from_secs(60 - into_minute)).await;
}

/// Append path segments to a base URL.
pub(crate) fn extend_url<'a>(
    base: &Url,
    segments: impl IntoIterator<Item = &'a str>,
) -> EyreResult<Url> {
    let mut url = base.clone();

    url.path_segments_mut()
        .map_err(|()| eyre!("url {base} cannot be a base"))?
        .pop_if_empty()
        .extend(segments);

    Ok(url)
}
