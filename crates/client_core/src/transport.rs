//! HTTP access to the incident API. This is the only place that performs
//! network I/O.

use std::fmt;

use async_trait::async_trait;
use reqwest::Client;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::error::TransportError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
        })
    }
}

impl From<Method> for reqwest::Method {
    fn from(value: Method) -> Self {
        match value {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
        }
    }
}

/// Human-readable description of a request, carried by every [`TransportError`].
pub fn describe(method: Method, path: &str) -> String {
    format!("{method} {path}")
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Performs exactly one request against `path`, relative to the API base.
    /// No retries, no caching.
    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, TransportError>;
}

pub struct HttpTransport {
    http: Client,
    base_url: Url,
}

impl HttpTransport {
    pub fn new(base_url: &str) -> Result<Self, url::ParseError> {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(http: Client, base_url: &str) -> Result<Self, url::ParseError> {
        Ok(Self {
            http,
            base_url: Url::parse(base_url)?,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, url::ParseError> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Url::parse(&format!("{base}/{}", path.trim_start_matches('/')))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, TransportError> {
        let operation = describe(method, path);
        let url = self
            .endpoint(path)
            .map_err(|err| TransportError::network(&operation, err))?;

        let mut request = self.http.request(method.into(), url);
        if let Some(body) = &body {
            request = request.json(body);
        }
        debug!(%operation, "incident api request");

        let response = request
            .send()
            .await
            .map_err(|err| TransportError::network(&operation, err))?;
        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                operation,
                status: status.as_u16(),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|err| TransportError::network(&operation, err))?;
        serde_json::from_slice(&bytes).map_err(|err| TransportError::malformed(&operation, err))
    }
}

pub(crate) fn encode<T: Serialize>(operation: &str, body: &T) -> Result<Value, TransportError> {
    serde_json::to_value(body)
        .map_err(|err| TransportError::malformed(operation, format!("request body: {err}")))
}

pub(crate) fn decode<T: DeserializeOwned>(
    operation: &str,
    value: Value,
) -> Result<T, TransportError> {
    serde_json::from_value(value).map_err(|err| TransportError::malformed(operation, err))
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;
