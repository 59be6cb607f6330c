use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{StatusCode, Url};

use crate::config::ClientConfig;
use crate::error::SearchError;

use super::models::{ErrorBody, HealthStatus, SearchRequest, SearchResult};

/// Anything that can turn a query into an answer. The orchestrator only ever
/// talks to this, so tests can hand it a fake.
#[async_trait]
pub trait SearchService: Send + Sync {
    async fn search(&self, query: &str) -> Result<SearchResult, SearchError>;
}

/// Talks to the answer service over HTTP. One attempt per call, no timeout.
#[derive(Debug, Clone)]
pub struct HttpSearchClient {
    http: reqwest::Client,
    search_url: Url,
    origin: Url,
}

impl HttpSearchClient {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        Self::with_client(reqwest::Client::new(), config)
    }

    pub fn with_client(http: reqwest::Client, config: &ClientConfig) -> Result<Self> {
        let search_url = config
            .endpoint("search")
            .context("Failed to build search endpoint")?;
        let origin = config.origin()?;
        Ok(Self {
            http,
            search_url,
            origin,
        })
    }

    pub fn search_url(&self) -> &Url {
        &self.search_url
    }

    /// Health probe against `GET /` on the service origin.
    pub async fn health(&self) -> Result<HealthStatus> {
        let res = self
            .http
            .get(self.origin.clone())
            .header(ACCEPT, "application/json")
            .send()
            .await
            .with_context(|| format!("Failed to reach {}", self.origin))?;
        let status = res.status();
        if !status.is_success() {
            anyhow::bail!("Health check returned {status}");
        }
        res.json::<HealthStatus>()
            .await
            .context("Health check returned an unexpected body")
    }
}

#[async_trait]
impl SearchService for HttpSearchClient {
    async fn search(&self, query: &str) -> Result<SearchResult, SearchError> {
        log::debug!("sending search request to {}", self.search_url);

        let res = self
            .http
            .post(self.search_url.clone())
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .json(&SearchRequest {
                query: query.to_string(),
            })
            .send()
            .await
            .map_err(|e| {
                log::error!("search request failed, error: {:#}", e);
                SearchError::Network(e)
            })?;

        let status = res.status();
        let body = res.bytes().await?;

        if !status.is_success() {
            let err = error_from_body(status, &body);
            log::error!("search API error: {err}");
            return Err(err);
        }

        parse_search_result(&body)
    }
}

/// Pull `detail` out of an error body, if there is one worth showing.
pub fn error_from_body(status: StatusCode, body: &[u8]) -> SearchError {
    match serde_json::from_slice::<ErrorBody>(body) {
        Ok(ErrorBody {
            detail: Some(detail),
        }) if !detail.trim().is_empty() => SearchError::Server { status, detail },
        _ => SearchError::ServerUnparseable { status },
    }
}

/// Shape check on a success body. `answer` must be a string and `sources` an
/// array of strings; the values themselves are passed through untouched.
pub fn parse_search_result(body: &[u8]) -> Result<SearchResult, SearchError> {
    serde_json::from_slice::<SearchResult>(body)
        .map_err(|e| SearchError::MalformedResponse(e.to_string()))
}
