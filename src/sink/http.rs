//! HTTP client for the ingestion API

use crate::config::IngestConfig;
use crate::sink::{Sink, SinkAck, SinkError};
use crate::storage::ScrapedRecord;
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use std::collections::HashSet;
use std::time::Duration;

/// Posts records to `{api}/ingest` and lists known URLs from `{api}/urls`
#[derive(Debug, Clone)]
pub struct HttpSink {
    client: Client,
    api_url: String,
    timeout: Duration,
}

impl HttpSink {
    pub fn new(api_url: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    pub fn from_config(config: &IngestConfig) -> Result<Self, reqwest::Error> {
        Self::new(&config.api_url, Duration::from_secs(config.request_timeout_secs))
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }

    fn transport_error(&self, e: reqwest::Error) -> SinkError {
        if e.is_timeout() {
            SinkError::Timeout(self.timeout)
        } else {
            SinkError::Network(e.to_string())
        }
    }

    /// Maps a non-2xx response onto the error taxonomy
    async fn check_status(&self, response: Response) -> Result<Response, SinkError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(SinkError::RateLimited);
        }
        if status.is_server_error() {
            return Err(SinkError::Server {
                status: status.as_u16(),
            });
        }

        let body = response.text().await.unwrap_or_default();
        Err(SinkError::Client {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl Sink for HttpSink {
    async fn put(&self, record: &ScrapedRecord) -> Result<SinkAck, SinkError> {
        let response = self
            .client
            .post(self.endpoint("/ingest"))
            .json(record)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let response = self.check_status(response).await?;
        response
            .json::<SinkAck>()
            .await
            .map_err(|e| SinkError::Decode(e.to_string()))
    }

    async fn known_urls(&self) -> Result<HashSet<String>, SinkError> {
        let response = self
            .client
            .get(self.endpoint("/urls"))
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let response = self.check_status(response).await?;
        let urls: Vec<String> = response
            .json()
            .await
            .map_err(|e| SinkError::Decode(e.to_string()))?;

        Ok(urls.into_iter().collect())
    }
}
