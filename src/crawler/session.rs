//! Page sessions
//!
//! This module provides the isolated execution context each scrape task runs in:
//! - `SessionFactory` opens one context per task
//! - `PageSession` navigates to a page and hands back its markup
//! - The HTTP implementation gives every session its own client and cookie jar
//!
//! A session is released by dropping it, so every exit path of a task
//! (success, failure, timeout, abort) closes it.

use crate::crawler::TaskError;
use async_trait::async_trait;
use reqwest::{redirect::Policy, Client, ClientBuilder};
use std::time::Duration;

/// A page as delivered by a session
#[derive(Debug, Clone)]
pub struct LoadedPage {
    /// The URL the task asked for; becomes the record's identity
    pub url: String,

    /// URL after redirects
    pub final_url: String,

    pub status: u16,

    pub body: String,
}

/// One isolated navigation context
#[async_trait]
pub trait PageSession: Send {
    /// Navigates to `url` and returns the loaded page
    async fn load(&mut self, url: &str) -> Result<LoadedPage, TaskError>;
}

/// Opens fresh sessions for scrape tasks
#[async_trait]
pub trait SessionFactory: Send + Sync {
    async fn open(&self) -> Result<Box<dyn PageSession>, TaskError>;
}

/// Settings shared by every HTTP session
#[derive(Debug, Clone)]
pub struct HttpSessionConfig {
    pub user_agent: String,

    /// Deadline for sending the request and receiving headers
    pub navigation_timeout: Duration,

    /// Deadline for the body to arrive once headers are in
    pub content_timeout: Duration,
}

/// Opens HTTP sessions, each with a private cookie store
#[derive(Debug, Clone)]
pub struct HttpSessionFactory {
    config: HttpSessionConfig,
}

impl HttpSessionFactory {
    pub fn new(config: HttpSessionConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl SessionFactory for HttpSessionFactory {
    async fn open(&self) -> Result<Box<dyn PageSession>, TaskError> {
        // No whole-request timeout: headers and body each get their own deadline in `load`
        let client = client_builder(&self.config.user_agent)
            .build()
            .map_err(|e| TaskError::Session(e.to_string()))?;

        Ok(Box::new(HttpSession {
            client,
            navigation_timeout: self.config.navigation_timeout,
            content_timeout: self.config.content_timeout,
        }))
    }
}

/// A session backed by its own `reqwest::Client`
pub struct HttpSession {
    client: Client,
    navigation_timeout: Duration,
    content_timeout: Duration,
}

#[async_trait]
impl PageSession for HttpSession {
    /// Fetches the page
    ///
    /// | Condition | Result |
    /// |-----------|--------|
    /// | 2xx with body | `LoadedPage` |
    /// | Non-2xx status | `HttpStatus` |
    /// | Headers not in within `navigation_timeout` | `Timeout` |
    /// | Body not in within `content_timeout` | `Timeout` |
    /// | Connection or body error | `Network` |
    async fn load(&mut self, url: &str) -> Result<LoadedPage, TaskError> {
        let response = tokio::time::timeout(self.navigation_timeout, self.client.get(url).send())
            .await
            .map_err(|_| TaskError::Timeout(self.navigation_timeout))?
            .map_err(|e| {
                if e.is_timeout() {
                    TaskError::Timeout(self.navigation_timeout)
                } else if e.is_connect() {
                    TaskError::Network(format!("connection failed: {}", e))
                } else {
                    TaskError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        let final_url = response.url().to_string();

        if !status.is_success() {
            return Err(TaskError::HttpStatus(status.as_u16()));
        }

        let body = tokio::time::timeout(self.content_timeout, response.text())
            .await
            .map_err(|_| TaskError::Timeout(self.content_timeout))?
            .map_err(|e| TaskError::Network(e.to_string()))?;

        Ok(LoadedPage {
            url: url.to_string(),
            final_url,
            status: status.as_u16(),
            body,
        })
    }
}

/// Client settings shared by sessions and the sitemap client
fn client_builder(user_agent: &str) -> ClientBuilder {
    Client::builder()
        .user_agent(user_agent)
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(10))
        .cookie_store(true)
        .gzip(true)
        .brotli(true)
}

/// Builds an HTTP client with a private cookie store
///
/// # Arguments
///
/// * `user_agent` - The User-Agent header value
/// * `timeout` - Whole-request timeout
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(user_agent: &str, timeout: Duration) -> Result<Client, reqwest::Error> {
    client_builder(user_agent).timeout(timeout).build()
}
