//! Fetching processed images from the service.
//!
//! The [`Transport`] trait is the single seam between request construction
//! and the network. [`HttpTransport`] is the production implementation: a
//! blocking `reqwest` client with explicit total and connect timeouts, one
//! GET per call, no retries. Bodies over `max_response_bytes` are refused,
//! either up front from `Content-Length` or while streaming.

use crate::config::ClientConfig;
use reqwest::Url;
use std::io::Read;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("invalid request URL {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("timed out fetching {0}")]
    Timeout(String),
    #[error("service returned HTTP {status} for {url}")]
    Status { status: u16, url: String },
    #[error("response from {url} exceeds the {limit} byte limit")]
    TooLarge { limit: u64, url: String },
    #[error("failed reading response from {url}: {source}")]
    Body {
        url: String,
        #[source]
        source: std::io::Error,
    },
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Raw response body plus the content type the service reported, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedImage {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

/// Performs the one GET request an operation needs.
pub trait Transport {
    fn fetch(&self, url: &Url) -> Result<FetchedImage, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn fetch(&self, url: &Url) -> Result<FetchedImage, TransportError> {
        (**self).fetch(url)
    }
}

/// Blocking HTTP transport.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::blocking::Client,
    max_response_bytes: u64,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Result<Self, TransportError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .user_agent(config.user_agent.as_str())
            .build()?;
        Ok(Self {
            client,
            max_response_bytes: config.max_response_bytes,
        })
    }
}

impl Transport for HttpTransport {
    fn fetch(&self, url: &Url) -> Result<FetchedImage, TransportError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .map_err(|e| map_reqwest_error(e, url))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        if response
            .content_length()
            .is_some_and(|length| length > self.max_response_bytes)
        {
            return Err(TransportError::TooLarge {
                limit: self.max_response_bytes,
                url: url.to_string(),
            });
        }

        let bytes = read_capped(response, self.max_response_bytes, url)?;
        log::debug!(
            "fetched {} bytes ({}) from {url}",
            bytes.len(),
            content_type.as_deref().unwrap_or("no content type")
        );

        Ok(FetchedImage {
            bytes,
            content_type,
        })
    }
}

/// Read at most `limit` bytes; anything beyond that is an error.
fn read_capped(reader: impl Read, limit: u64, url: &Url) -> Result<Vec<u8>, TransportError> {
    let mut bytes = Vec::new();
    reader
        .take(limit.saturating_add(1))
        .read_to_end(&mut bytes)
        .map_err(|source| map_body_error(source, url))?;
    if bytes.len() as u64 > limit {
        return Err(TransportError::TooLarge {
            limit,
            url: url.to_string(),
        });
    }
    Ok(bytes)
}

fn map_body_error(err: std::io::Error, url: &Url) -> TransportError {
    let timed_out = err.kind() == std::io::ErrorKind::TimedOut
        || err
            .get_ref()
            .and_then(|inner| inner.downcast_ref::<reqwest::Error>())
            .is_some_and(reqwest::Error::is_timeout);
    if timed_out {
        TransportError::Timeout(url.to_string())
    } else {
        TransportError::Body {
            url: url.to_string(),
            source: err,
        }
    }
}

fn map_reqwest_error(err: reqwest::Error, url: &Url) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout(url.to_string())
    } else {
        TransportError::Http(err)
    }
}
