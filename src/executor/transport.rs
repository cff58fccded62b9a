use std::error::Error as StdError;

use async_trait::async_trait;
use reqwest::{header::HeaderMap, Client, Method};
use thiserror::Error;

use crate::route::HttpMethod;
use crate::validate::HeaderMapping;

/// What the executor hands to the transport: final headers and an
/// already-serialised body.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: HeaderMapping,
    pub body: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransportResponse {
    pub status: u16,
    pub status_text: String,
    pub headers: HeaderMapping,
    pub body: Vec<u8>,
}

impl TransportResponse {
    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case("content-type"))
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("request timed out after {0} ms")]
    Timeout(u64),
    #[error("{0}")]
    Failed(String),
}

/// The HTTP capability the executor rides on.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &OutboundRequest) -> Result<TransportResponse, TransportError>;
}

#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: &OutboundRequest) -> Result<TransportResponse, TransportError> {
        let method = Method::from_bytes(request.method.as_str().as_bytes())
            .map_err(|err| TransportError::Failed(err.to_string()))?;
        let mut builder = self.client.request(method, &request.url);

        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send().await.map_err(failure)?;
        let status = response.status();
        let headers = collect_headers(response.headers());
        let body = response.bytes().await.map_err(failure)?;

        Ok(TransportResponse {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            headers,
            body: body.to_vec(),
        })
    }
}

fn failure(err: reqwest::Error) -> TransportError {
    TransportError::Failed(error_chain(&err))
}

/// `reqwest` hides the interesting part (connection refused, DNS) in the
/// source chain.
fn error_chain(err: &dyn StdError) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}

/// Repeated headers are joined with `, `.
fn collect_headers(headers: &HeaderMap) -> HeaderMapping {
    let mut collected = HeaderMapping::new();
    for (name, value) in headers {
        let value = value.to_str().unwrap_or_default();
        collected
            .entry(name.as_str().to_string())
            .and_modify(|existing: &mut String| {
                existing.push_str(", ");
                existing.push_str(value);
            })
            .or_insert_with(|| value.to_string());
    }
    collected
}
