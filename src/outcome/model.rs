use serde::Serialize;
use serde_json::Value;

use crate::error::ValidationError;
use crate::route::HttpMethod;
use crate::validate::HeaderMapping;

pub const NETWORK_ERROR: &str = "Network Error";

/// Response payload: parsed JSON for `application/json` responses, raw text otherwise.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResponseData {
    Json(Value),
    Text(String),
}

impl ResponseData {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ResponseData::Text(text) => Some(text),
            ResponseData::Json(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SingleResult {
    pub success: bool,
    /// 0 when the transport failed before a status was received.
    pub status: u16,
    pub status_text: String,
    pub headers: HeaderMapping,
    pub data: ResponseData,
    pub response_time_ms: u64,
    /// 1-based position in issue order.
    pub request_number: u32,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub error: bool,
}

impl SingleResult {
    pub fn network_error(message: impl Into<String>, response_time_ms: u64, request_number: u32) -> Self {
        Self {
            success: false,
            status: 0,
            status_text: NETWORK_ERROR.to_string(),
            headers: HeaderMapping::new(),
            data: ResponseData::Text(message.into()),
            response_time_ms,
            request_number,
            error: true,
        }
    }

    pub fn is_network_error(&self) -> bool {
        self.error && self.status == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchStatistics {
    pub total_requests: u32,
    pub successful_requests: u32,
    pub failed_requests: u32,
    pub total_time_ms: u64,
    pub avg_response_time_ms: u64,
    pub min_response_time_ms: u64,
    pub max_response_time_ms: u64,
}

/// Echo of what was actually sent.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestContext {
    pub url: String,
    pub method: HttpMethod,
    pub request_headers: HeaderMapping,
    pub request_body: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum TestOutcome {
    Error {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        details: Option<String>,
    },
    Single {
        result: SingleResult,
        context: RequestContext,
        /// Set when more requests were asked for but only this one ran.
        #[serde(skip_serializing_if = "std::ops::Not::not")]
        cancelled: bool,
    },
    Batch {
        first_result: SingleResult,
        statistics: BatchStatistics,
        all_results: Vec<SingleResult>,
        context: RequestContext,
        #[serde(skip_serializing_if = "std::ops::Not::not")]
        cancelled: bool,
    },
}

impl TestOutcome {
    pub fn error(message: impl Into<String>, details: Option<String>) -> Self {
        TestOutcome::Error {
            message: message.into(),
            details,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            TestOutcome::Error { .. } => "error",
            TestOutcome::Single { .. } => "single",
            TestOutcome::Batch { .. } => "batch",
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, TestOutcome::Error { .. })
    }

    /// The single result, or the first result of a batch.
    pub fn first_result(&self) -> Option<&SingleResult> {
        match self {
            TestOutcome::Single { result, .. } => Some(result),
            TestOutcome::Batch { first_result, .. } => Some(first_result),
            TestOutcome::Error { .. } => None,
        }
    }

    pub fn statistics(&self) -> Option<&BatchStatistics> {
        match self {
            TestOutcome::Batch { statistics, .. } => Some(statistics),
            _ => None,
        }
    }

    pub fn context(&self) -> Option<&RequestContext> {
        match self {
            TestOutcome::Single { context, .. } | TestOutcome::Batch { context, .. } => {
                Some(context)
            }
            TestOutcome::Error { .. } => None,
        }
    }

    /// Flags a run that stopped before all requested requests were sent.
    /// Error outcomes are returned unchanged.
    pub fn with_cancelled(mut self, flag: bool) -> Self {
        match &mut self {
            TestOutcome::Single { cancelled, .. } | TestOutcome::Batch { cancelled, .. } => {
                *cancelled = flag
            }
            TestOutcome::Error { .. } => {}
        }
        self
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(
            self,
            TestOutcome::Single { cancelled: true, .. } | TestOutcome::Batch { cancelled: true, .. }
        )
    }
}

impl From<ValidationError> for TestOutcome {
    fn from(err: ValidationError) -> Self {
        TestOutcome::error(err.to_string(), None)
    }
}
