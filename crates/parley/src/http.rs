//! [`HttpFetcher`] over reqwest.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::collaborators::{CollaboratorResult, HttpFetcher};
use crate::error::CollaboratorError;
use crate::model::HttpResponse;

/// Timeout applied to every request unless another client is supplied.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    client: Client,
}

impl ReqwestFetcher {
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .user_agent(concat!("parley/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpFetcher for ReqwestFetcher {
    async fn get(&self, url: &str) -> CollaboratorResult<HttpResponse> {
        let failed = |e: reqwest::Error| CollaboratorError::Http {
            url: url.to_string(),
            message: e.to_string(),
        };
        let response = self.client.get(url).send().await.map_err(failed)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(failed)?;
        Ok(HttpResponse { status, body })
    }
}
