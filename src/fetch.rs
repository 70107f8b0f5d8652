//! Remote resource fetching
//!
//! A [`Fetcher`] performs exactly one retrieval of a named resource and either
//! yields a validated, typed value or a [`FetchError`]. Fetchers never retry;
//! the sync engine's schedule is what brings a failed resource back.

use futures::future::{BoxFuture, FutureExt};
use reqwest::Client;
use serde::{de::DeserializeOwned, Serialize};
use std::marker::PhantomData;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Default bound on a single request, including reading the body
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors that can occur when fetching a resource
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    /// The server could not be reached or the request timed out
    #[error("Network error: {0}")]
    Network(String),

    /// The server answered with a non-success status
    #[error("Server responded with HTTP {status}")]
    HttpStatus { status: u16 },

    /// The response body was malformed or had an unexpected shape
    #[error("Unexpected response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            FetchError::Decode(error.to_string())
        } else if error.is_timeout() {
            FetchError::Network("request timed out".to_string())
        } else {
            FetchError::Network(error.to_string())
        }
    }
}

/// A value that can be fetched, cached and shown
///
/// Decoding is strict (every field the type declares must be present), and
/// `validate` gets a chance to reject values that decoded but are unusable,
/// such as an empty list.
pub trait Payload: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Checks a freshly decoded value, describing the problem on failure
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

/// Turns a response body into a typed value
pub type Decoder<T> = fn(&[u8]) -> Result<T, FetchError>;

/// Decodes a JSON body and validates the result
pub fn decode_json<T: Payload>(body: &[u8]) -> Result<T, FetchError> {
    let value: T = serde_json::from_slice(body).map_err(|e| FetchError::Decode(e.to_string()))?;
    value.validate().map_err(FetchError::Decode)?;
    Ok(value)
}

/// Performs one retrieval of a resource
pub trait Fetcher<T>: Send + Sync {
    /// Fetches the resource identified by `key`
    fn fetch<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<T, FetchError>>;
}

/// Fetches a resource with an HTTP GET against a fixed endpoint
pub struct HttpFetcher<T> {
    client: Client,
    url: String,
    decode: Decoder<T>,
    _payload: PhantomData<fn() -> T>,
}

impl<T> std::fmt::Debug for HttpFetcher<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpFetcher").field("url", &self.url).finish()
    }
}

impl<T: Payload> HttpFetcher<T> {
    /// Creates a fetcher whose requests are bounded by `timeout`
    ///
    /// # Returns
    /// * `Ok(HttpFetcher)` on success
    /// * `Err(FetchError::Network)` if the HTTP client cannot be built
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("pulseboard/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetchError::Network(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self::with_client(client, url))
    }

    /// Creates a fetcher with a custom HTTP client
    pub fn with_client(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
            decode: decode_json::<T>,
            _payload: PhantomData,
        }
    }

    /// Replaces the default JSON decoder
    pub fn with_decoder(mut self, decode: Decoder<T>) -> Self {
        self.decode = decode;
        self
    }

    /// Endpoint this fetcher requests
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl<T: Payload> Fetcher<T> for HttpFetcher<T> {
    fn fetch<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<T, FetchError>> {
        async move {
            debug!(resource = key, url = %self.url, "Fetching resource");

            let response = self.client.get(&self.url).send().await?;
            let status = response.status();
            if !status.is_success() {
                return Err(FetchError::HttpStatus {
                    status: status.as_u16(),
                });
            }

            let body = response.bytes().await?;
            (self.decode)(&body)
        }
        .boxed()
    }
}
