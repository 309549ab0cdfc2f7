//! `reqwest`-backed transport speaking the server's JSON contract.

use crate::error::{Result, SyncError};
use crate::transport::SyncTransport;
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use stash_core::{Resource, ResourceView, ShareOutcome, ShareRequest, SharedItemPatch};
use std::time::Duration;

/// Header carrying the authenticated user id, mirrored from the server.
const USER_HEADER: &str = "x-stash-user";

const OPERATION_TIMEOUT: Duration = Duration::from_secs(15);

/// Response envelope used by every server endpoint.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    success: bool,
    data: Option<T>,
    error: Option<String>,
}

pub struct HttpTransport {
    client: Client,
    base_url: String,
    user_id: String,
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>, user_id: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(OPERATION_TIMEOUT)
            .build()
            .map_err(|e| SyncError::Network(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            user_id: user_id.into(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn unwrap_envelope<T: DeserializeOwned>(response: Response) -> Result<T> {
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => SyncError::Denied(message),
                StatusCode::NOT_FOUND => SyncError::NotFound(message),
                _ => SyncError::Network(format!("HTTP {status}: {message}")),
            });
        }
        let envelope: Envelope<T> = response
            .json()
            .await
            .map_err(|e| SyncError::InvalidResponse(e.to_string()))?;
        match envelope.data {
            Some(data) if envelope.success => Ok(data),
            _ => Err(SyncError::InvalidResponse(
                envelope.error.unwrap_or_else(|| "missing data".to_string()),
            )),
        }
    }
}

fn network(e: reqwest::Error) -> SyncError {
    SyncError::Network(e.to_string())
}

#[async_trait]
impl<P> SyncTransport<P> for HttpTransport
where
    P: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    async fn fetch_resources(&self) -> Result<Vec<ResourceView<P>>> {
        let response = self
            .client
            .get(self.url("/api/resources"))
            .header(USER_HEADER, &self.user_id)
            .send()
            .await
            .map_err(network)?;
        Self::unwrap_envelope(response).await
    }

    async fn save_owned(&self, resources: Vec<Resource<P>>) -> Result<Vec<Resource<P>>> {
        let response = self
            .client
            .post(self.url("/api/resources/save"))
            .header(USER_HEADER, &self.user_id)
            .json(&serde_json::json!({ "resources": resources }))
            .send()
            .await
            .map_err(network)?;
        Self::unwrap_envelope(response).await
    }

    async fn save_shared_item(&self, id: &str, patch: SharedItemPatch) -> Result<Resource<P>> {
        let response = self
            .client
            .put(self.url(&format!("/api/resources/{id}/shared")))
            .header(USER_HEADER, &self.user_id)
            .json(&patch)
            .send()
            .await
            .map_err(network)?;
        Self::unwrap_envelope(response).await
    }

    async fn share(&self, request: ShareRequest) -> Result<ShareOutcome> {
        let response = self
            .client
            .post(self.url("/api/share"))
            .header(USER_HEADER, &self.user_id)
            .json(&request)
            .send()
            .await
            .map_err(network)?;
        Self::unwrap_envelope(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let transport = HttpTransport::new("http://localhost:4000/", "user-1").unwrap();
        assert_eq!(
            transport.url("/api/resources"),
            "http://localhost:4000/api/resources"
        );
    }
}
