use core::time::Duration;

use async_trait::async_trait;
use emosync_primitives::{DestinationId, EmoteCode, RemoteSlot, SlotId};
use eyre::{eyre, Result as EyreResult, WrapErr};
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::warn;
use url::Url;

use crate::api::{MutationStatus, RemoteApi};
use crate::datauri::DataUri;

/// Wait applied when a throttled response carries no usable duration.
const FALLBACK_RETRY_AFTER: Duration = Duration::from_secs(1);

/// Mutation API over the destination platform's guild emoji endpoints.
#[derive(Clone, Debug)]
pub struct HttpRemote {
    api_base: Url,
    client: Client,
    auth_header: String,
}

#[derive(Debug, Serialize)]
struct CreatePayload<'a> {
    name: &'a str,
    image: &'a DataUri,
    roles: &'a [String],
}

#[derive(Debug, Deserialize)]
struct ThrottleBody {
    retry_after: f64,
}

impl HttpRemote {
    pub fn new(api_base: Url, token: &str) -> Self {
        Self {
            api_base,
            client: Client::new(),
            auth_header: format!("Bot {token}"),
        }
    }

    fn emojis_url(&self, destination: &DestinationId, slot: Option<&SlotId>) -> EyreResult<Url> {
        let mut url = self.api_base.clone();

        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|()| eyre!("api base url cannot be a base"))?;
            let _ = segments
                .pop_if_empty()
                .extend(["guilds", destination.as_str(), "emojis"]);
            if let Some(slot) = slot {
                let _ = segments.push(slot.as_str());
            }
        }

        Ok(url)
    }

    /// Map a response onto the mutation status taxonomy.
    ///
    /// `expected` is the single defined success status for the mutation
    /// kind. A 429 reads the server-supplied wait out of the body; any
    /// other status is terminal and reported with its body text.
    async fn decode(response: Response, expected: StatusCode) -> EyreResult<MutationStatus> {
        let status = response.status();

        if status == expected {
            return Ok(MutationStatus::Applied);
        }

        if status == StatusCode::TOO_MANY_REQUESTS {
            let body = response.text().await.unwrap_or_default();
            return Ok(MutationStatus::Throttled {
                retry_after: parse_retry_after(&body),
            });
        }

        let body = response.text().await.unwrap_or_default();
        warn!(%status, body, "mutation rejected");

        Ok(MutationStatus::Rejected {
            status: status.as_u16(),
        })
    }
}

/// Read the wait duration out of a throttled response body.
///
/// The platform reports `retry_after` in milliseconds.
fn parse_retry_after(body: &str) -> Duration {
    match serde_json::from_str::<ThrottleBody>(body) {
        Ok(throttle) => Duration::from_millis(throttle.retry_after as u64),
        Err(err) => {
            warn!(%err, body, "unparseable throttle body, using fallback wait");
            FALLBACK_RETRY_AFTER
        }
    }
}

#[async_trait]
impl RemoteApi for HttpRemote {
    async fn list_slots(&self, destination: &DestinationId) -> EyreResult<Vec<RemoteSlot>> {
        let url = self.emojis_url(destination, None)?;

        let response = self
            .client
            .get(url)
            .header("Authorization", &self.auth_header)
            .send()
            .await
            .wrap_err_with(|| format!("failed to list slots on {destination}"))?;

        if !response.status().is_success() {
            return Err(eyre!(
                "listing slots on {destination} failed with status {}",
                response.status()
            ));
        }

        response.json().await.map_err(Into::into)
    }

    async fn create(
        &self,
        destination: &DestinationId,
        name: &EmoteCode,
        image: &DataUri,
        roles: &[String],
    ) -> EyreResult<MutationStatus> {
        let url = self.emojis_url(destination, None)?;
        let payload = CreatePayload {
            name: name.as_str(),
            image,
            roles,
        };

        let response = self
            .client
            .post(url)
            .header("Authorization", &self.auth_header)
            .json(&payload)
            .send()
            .await
            .wrap_err_with(|| format!("failed to post {name} to {destination}"))?;

        Self::decode(response, StatusCode::CREATED).await
    }

    async fn delete(
        &self,
        destination: &DestinationId,
        id: &SlotId,
    ) -> EyreResult<MutationStatus> {
        let url = self.emojis_url(destination, Some(id))?;

        let response = self
            .client
            .delete(url)
            .header("Authorization", &self.auth_header)
            .send()
            .await
            .wrap_err_with(|| format!("failed to delete {id} on {destination}"))?;

        Self::decode(response, StatusCode::NO_CONTENT).await
    }
}
