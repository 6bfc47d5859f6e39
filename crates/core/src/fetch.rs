//! HTTP transport and offline input.
//!
//! This module provides the [`Fetcher`] used by [`crate::Page`] to talk to
//! the APIs, plus helpers for reading API documents from local files and
//! standard input.

use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use reqwest::{Client, Proxy};
use serde::Serialize;
use tracing::debug;
use url::Url;

use crate::{Result, WikiError};

/// HTTP client configuration.
///
/// This struct controls timeout, user agent and proxy settings for requests.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Request timeout in seconds (0 waits forever).
    pub timeout: u64,
    /// Custom User-Agent string.
    pub user_agent: String,
    /// Proxy URL applied to every request.
    pub proxy: Option<String>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: 30,
            user_agent: format!("wikipage/{} (https://crates.io/crates/wikipage-core)", env!("CARGO_PKG_VERSION")),
            proxy: None,
        }
    }
}

/// Transfer details recorded alongside each response.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResponseInfo {
    /// HTTP status code.
    pub status: u16,
    /// `Content-Type` header, if sent.
    pub content_type: Option<String>,
    /// Size of the body in bytes.
    pub bytes: usize,
    /// Wall time of the request in milliseconds.
    pub elapsed_ms: u64,
    /// URL after redirects.
    pub url: String,
}

/// A raw API exchange: the request URL, the body, and transfer info.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Response {
    pub query: String,
    pub response: String,
    pub info: ResponseInfo,
}

impl Response {
    /// Build a response from a body obtained elsewhere (a file, a test fixture).
    pub fn from_body(query: impl Into<String>, body: impl Into<String>) -> Self {
        let query = query.into();
        let response = body.into();
        let info = ResponseInfo { status: 200, bytes: response.len(), url: query.clone(), ..Default::default() };
        Self { query, response, info }
    }
}

/// Issues GET requests with one shared [`Client`].
#[derive(Debug, Clone)]
pub struct Fetcher {
    config: FetchConfig,
    client: Client,
}

impl Fetcher {
    pub fn new(config: FetchConfig) -> Result<Self> {
        let client = build_client(&config)?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Set the timeout for entire requests in seconds (0 waits forever).
    pub fn set_timeout(&mut self, seconds: u64) -> Result<()> {
        self.config.timeout = seconds;
        self.client = build_client(&self.config)?;
        Ok(())
    }

    /// Fetch a URL and keep the body as text.
    ///
    /// Non-success statuses are not errors here: the APIs describe
    /// failures in their JSON bodies, which the callers decode.
    pub async fn fetch(&self, url: &str) -> Result<Response> {
        let parsed_url = Url::parse(url).map_err(|e| WikiError::InvalidUrl(format!("{}: {}", url, e)))?;

        debug!(url, "fetching");
        let started = Instant::now();

        let response = self
            .client
            .get(parsed_url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| self.map_error(e))?;

        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let body = response.text().await.map_err(|e| self.map_error(e))?;

        let info = ResponseInfo {
            status,
            content_type,
            bytes: body.len(),
            elapsed_ms: started.elapsed().as_millis() as u64,
            url: final_url,
        };
        debug!(status = info.status, bytes = info.bytes, elapsed_ms = info.elapsed_ms, "fetched");

        Ok(Response { query: url.to_string(), response: body, info })
    }

    fn map_error(&self, err: reqwest::Error) -> WikiError {
        if err.is_timeout() { WikiError::Timeout { timeout: self.config.timeout } } else { WikiError::HttpError(err) }
    }
}

fn build_client(config: &FetchConfig) -> Result<Client> {
    let mut builder = Client::builder().user_agent(config.user_agent.clone());

    if config.timeout > 0 {
        builder = builder.timeout(Duration::from_secs(config.timeout));
    }

    if let Some(proxy) = &config.proxy {
        let proxy = Proxy::all(proxy).map_err(|e| WikiError::InvalidUrl(format!("proxy {}: {}", proxy, e)))?;
        builder = builder.proxy(proxy);
    }

    builder.build().map_err(WikiError::HttpError)
}

/// Reads an API document from a local file.
///
/// Callers should validate and sanitize the path when accepting user input.
pub fn fetch_file(path: &str) -> Result<String> {
    let path_buf = PathBuf::from(path);

    if !path_buf.exists() {
        Err(WikiError::FileNotFound(path_buf))
    } else {
        fs::read_to_string(&path_buf).map_err(WikiError::from)
    }
}

/// Reads an API document from standard input until EOF.
pub fn fetch_stdin() -> Result<String> {
    use std::io::{self, Read};

    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer).map_err(WikiError::from)?;

    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_config_default() {
        let config = FetchConfig::default();
        assert_eq!(config.timeout, 30);
        assert!(config.user_agent.starts_with("wikipage/"));
        assert!(config.proxy.is_none());
    }

    #[test]
    fn test_fetch_invalid_url() {
        let fetcher = Fetcher::new(FetchConfig::default()).unwrap();
        let result = std::thread::spawn(move || {
            tokio::runtime::Runtime::new()
                .unwrap()
                .block_on(async move { fetcher.fetch("not-a-url").await })
        })
        .join()
        .unwrap();

        assert!(matches!(result, Err(WikiError::InvalidUrl(_))));
    }

    #[test]
    fn test_set_timeout_rebuilds() {
        let mut fetcher = Fetcher::new(FetchConfig::default()).unwrap();
        fetcher.set_timeout(0).unwrap();
        assert_eq!(fetcher.config().timeout, 0);
    }

    #[test]
    fn test_response_from_body() {
        let response = Response::from_body("file:///tmp/query.json", "{}");
        assert_eq!(response.info.bytes, 2);
        assert_eq!(response.info.status, 200);
    }

    #[test]
    fn test_fetch_file_not_found() {
        let result = fetch_file("/nonexistent/path/query.json");
        assert!(matches!(result, Err(WikiError::FileNotFound(_))));
    }

    #[test]
    fn test_fetch_file_reads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.json");
        std::fs::write(&path, "{\"query\":{}}").unwrap();
        assert_eq!(fetch_file(path.to_str().unwrap()).unwrap(), "{\"query\":{}}");
    }
}
