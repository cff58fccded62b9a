use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use tracing::{debug, warn};

use crate::outcome::{ResponseData, SingleResult};

use super::{
    models::{RequestSpec, JSON_CONTENT_TYPE},
    transport::{OutboundRequest, ReqwestTransport, Transport, TransportError, TransportResponse},
};

/// Issues single requests. Never fails: transport problems come back as a
/// [`SingleResult`] with status 0.
#[derive(Clone)]
pub struct RequestExecutor {
    transport: Arc<dyn Transport>,
    timeout: Option<Duration>,
}

impl Default for RequestExecutor {
    fn default() -> Self {
        Self::new(Arc::new(ReqwestTransport::new()))
    }
}

impl RequestExecutor {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            timeout: None,
        }
    }

    /// `None` waits for the transport indefinitely.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub async fn execute(&self, spec: &RequestSpec, request_number: u32) -> SingleResult {
        let outbound = match outbound_request(spec) {
            Ok(outbound) => outbound,
            Err(err) => {
                warn!(request_number, error = %err, "could not serialise request body");
                return SingleResult::network_error(err.to_string(), 0, request_number);
            }
        };

        debug!(
            request_number,
            method = %outbound.method,
            url = %outbound.url,
            "sending request"
        );

        let start = Instant::now();
        let response = self.send(&outbound).await;
        let response_time_ms = elapsed_ms(start);

        match response {
            Ok(response) => {
                debug!(
                    request_number,
                    status = response.status,
                    response_time_ms,
                    "request completed"
                );
                into_result(response, response_time_ms, request_number)
            }
            Err(err) => {
                warn!(request_number, url = %outbound.url, error = %err, "request failed");
                SingleResult::network_error(err.to_string(), response_time_ms, request_number)
            }
        }
    }

    async fn send(&self, outbound: &OutboundRequest) -> Result<TransportResponse, TransportError> {
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, self.transport.send(outbound))
                .await
                .unwrap_or_else(|_| Err(TransportError::Timeout(duration_ms(limit)))),
            None => self.transport.send(outbound).await,
        }
    }
}

fn outbound_request(spec: &RequestSpec) -> serde_json::Result<OutboundRequest> {
    let body = spec.effective_body().map(serde_json::to_string).transpose()?;
    Ok(OutboundRequest {
        method: spec.method,
        url: spec.url.clone(),
        headers: spec.effective_headers(),
        body,
    })
}

fn into_result(response: TransportResponse, response_time_ms: u64, request_number: u32) -> SingleResult {
    let data = decode_body(response.content_type(), &response.body);
    SingleResult {
        success: is_ok_status(response.status),
        status: response.status,
        status_text: response.status_text,
        headers: response.headers,
        data,
        response_time_ms,
        request_number,
        error: false,
    }
}

/// 2xx and 3xx count as success.
fn is_ok_status(status: u16) -> bool {
    (200..400).contains(&status)
}

/// JSON when the content type says so and the payload parses; anything
/// else is kept as text so error pages stay readable.
fn decode_body(content_type: Option<&str>, bytes: &[u8]) -> ResponseData {
    let is_json = content_type.is_some_and(|ct| ct.to_ascii_lowercase().contains(JSON_CONTENT_TYPE));
    if is_json {
        if let Ok(value) = serde_json::from_slice(bytes) {
            return ResponseData::Json(value);
        }
    }
    ResponseData::Text(String::from_utf8_lossy(bytes).into_owned())
}

fn elapsed_ms(start: Instant) -> u64 {
    duration_ms(start.elapsed())
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
