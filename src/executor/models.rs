use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use serde_json::Value;

use crate::outcome::{RequestContext, SingleResult};
use crate::route::HttpMethod;
use crate::validate::HeaderMapping;

pub const JSON_CONTENT_TYPE: &str = "application/json";

/// One fully-resolved request, rebuilt for every send.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestSpec {
    pub method: HttpMethod,
    pub url: String,
    pub headers: HeaderMapping,
    pub body: Option<Value>,
}

impl RequestSpec {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: HeaderMapping::new(),
            body: None,
        }
    }

    pub fn with_headers(mut self, headers: HeaderMapping) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_body(mut self, body: Option<Value>) -> Self {
        self.body = body;
        self
    }

    /// Caller headers on top of `Content-Type: application/json`. Header
    /// names compare case-insensitively and the caller's spelling wins.
    pub fn effective_headers(&self) -> HeaderMapping {
        let mut headers = self.headers.clone();
        let has_content_type = headers
            .keys()
            .any(|name| name.eq_ignore_ascii_case("content-type"));
        if !has_content_type {
            headers.insert("Content-Type".to_string(), JSON_CONTENT_TYPE.to_string());
        }
        headers
    }

    /// The body that goes on the wire: only for POST, PUT and PATCH, and
    /// never a JSON `null`.
    pub fn effective_body(&self) -> Option<&Value> {
        if !self.method.accepts_body() {
            return None;
        }
        self.body.as_ref().filter(|body| !body.is_null())
    }

    pub fn context(&self) -> RequestContext {
        RequestContext {
            url: self.url.clone(),
            method: self.method,
            request_headers: self.effective_headers(),
            request_body: self.effective_body().cloned(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BatchMode {
    /// One request at a time, each finishing before the next starts.
    #[default]
    Sequential,
    /// Up to `limit` requests in flight. Results still come back in issue order.
    Concurrent { limit: usize },
}

#[derive(Debug, Clone, Default)]
pub struct BatchOptions {
    pub mode: BatchMode,
    pub cancel: Option<Arc<AtomicBool>>,
}

impl BatchOptions {
    pub fn sequential() -> Self {
        Self::default()
    }

    pub fn with_mode(mut self, mode: BatchMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_cancel(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::SeqCst))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub completed: u32,
    pub total: u32,
}

#[derive(Debug, Clone)]
pub struct BatchRun {
    /// In issue order; `results[i].request_number == i + 1`.
    pub results: Vec<SingleResult>,
    pub total_time_ms: u64,
    pub cancelled: bool,
}
