//! The "send" action: validation, URL building, execution and shaping,
//! plus the per-route slot holding the latest outcome.

use std::{
    any::Any,
    collections::{hash_map::Entry, HashMap},
    panic::AssertUnwindSafe,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use futures_util::FutureExt;
use tracing::{error, warn};

use crate::config::ProbeSettings;
use crate::error::ValidationError;
use crate::executor::{
    run_batch, BatchCount, BatchError, BatchMode, BatchOptions, Progress, RequestExecutor,
    RequestSpec,
};
use crate::outcome::{shape, TestOutcome, EXECUTION_FAILED};
use crate::params::{build_url, join_base_url, missing_parameters, ParamValues};
use crate::route::RouteDescriptor;
use crate::stats::aggregate;
use crate::validate::{parse_header_text, validate_json, HeaderMapping, JsonValidation};

/// Raw user input for one send.
#[derive(Debug, Clone, PartialEq)]
pub struct TestInput {
    pub params: ParamValues,
    pub headers_text: String,
    /// Ignored for methods without a body.
    pub body_text: String,
    pub count: u32,
}

impl Default for TestInput {
    fn default() -> Self {
        Self {
            params: ParamValues::new(),
            headers_text: String::new(),
            body_text: String::new(),
            count: 1,
        }
    }
}

impl TestInput {
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    pub fn with_headers(mut self, text: impl Into<String>) -> Self {
        self.headers_text = text.into();
        self
    }

    pub fn with_body(mut self, text: impl Into<String>) -> Self {
        self.body_text = text.into();
        self
    }

    pub fn with_count(mut self, count: u32) -> Self {
        self.count = count;
        self
    }
}

pub struct TestSession {
    executor: RequestExecutor,
    base_url: Option<String>,
    default_headers: HeaderMapping,
    mode: BatchMode,
    cancel: Arc<AtomicBool>,
    outcomes: HashMap<String, TestOutcome>,
}

impl TestSession {
    pub fn new(executor: RequestExecutor, settings: &ProbeSettings) -> Self {
        Self {
            executor: executor.with_timeout(settings.timeout),
            base_url: settings.base_url.clone(),
            default_headers: settings.default_headers.clone(),
            mode: settings.mode,
            cancel: Arc::new(AtomicBool::new(false)),
            outcomes: HashMap::new(),
        }
    }

    /// Setting the flag stops the running batch before its next request.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        self.cancel.clone()
    }

    /// Validates the input and resolves the request that would be sent.
    pub fn prepare(
        &self,
        route: &RouteDescriptor,
        input: &TestInput,
    ) -> Result<(RequestSpec, BatchCount), ValidationError> {
        let headers = parse_header_text(&input.headers_text)?
            .unwrap_or_else(|| self.default_headers.clone());

        let body = if route.method.accepts_body() {
            match validate_json(&input.body_text) {
                JsonValidation::Valid(body) => body,
                JsonValidation::Invalid(message) => {
                    return Err(ValidationError::InvalidBody(message))
                }
            }
        } else {
            None
        };

        let count = BatchCount::new(input.count)?;

        let missing = missing_parameters(&route.url, &input.params);
        if !missing.is_empty() {
            warn!(route = %route.key(), ?missing, "path parameters left unsubstituted");
        }
        let path = build_url(&route.url, &input.params);
        let url = join_base_url(self.base_url.as_deref(), &path);

        let spec = RequestSpec::new(route.method, url)
            .with_headers(headers)
            .with_body(body);
        Ok((spec, count))
    }

    pub async fn send(&mut self, route: &RouteDescriptor, input: &TestInput) -> &TestOutcome {
        self.send_with_progress(route, input, |_| {}).await
    }

    /// Runs one test and stores its outcome in the route's slot, replacing
    /// whatever was there.
    pub async fn send_with_progress<F>(
        &mut self,
        route: &RouteDescriptor,
        input: &TestInput,
        on_progress: F,
    ) -> &TestOutcome
    where
        F: FnMut(Progress),
    {
        let outcome = self.run(route, input, on_progress).await;
        match self.outcomes.entry(route.key()) {
            Entry::Occupied(mut slot) => {
                slot.insert(outcome);
                slot.into_mut()
            }
            Entry::Vacant(slot) => slot.insert(outcome),
        }
    }

    pub fn outcome(&self, route: &RouteDescriptor) -> Option<&TestOutcome> {
        self.outcomes.get(&route.key())
    }

    pub fn clear(&mut self, route: &RouteDescriptor) -> Option<TestOutcome> {
        self.outcomes.remove(&route.key())
    }

    async fn run<F>(&self, route: &RouteDescriptor, input: &TestInput, on_progress: F) -> TestOutcome
    where
        F: FnMut(Progress),
    {
        let (spec, count) = match self.prepare(route, input) {
            Ok(prepared) => prepared,
            Err(err) => {
                warn!(route = %route.key(), field = err.field(), error = %err, "input rejected");
                return TestOutcome::from(err);
            }
        };

        self.cancel.store(false, Ordering::SeqCst);
        let options = BatchOptions::default()
            .with_mode(self.mode)
            .with_cancel(self.cancel.clone());

        let batch = run_batch(&self.executor, &spec, count.get(), &options, on_progress);
        let run = match AssertUnwindSafe(batch).catch_unwind().await {
            Ok(Ok(run)) => run,
            Ok(Err(BatchError::Validation(err))) => return TestOutcome::from(err),
            Ok(Err(err @ BatchError::Cancelled)) => {
                return TestOutcome::error(EXECUTION_FAILED, Some(err.to_string()))
            }
            Err(panic) => {
                let details = panic_message(panic.as_ref());
                error!(route = %route.key(), %details, "request execution panicked");
                return TestOutcome::error(EXECUTION_FAILED, Some(details));
            }
        };

        let statistics = if run.results.len() > 1 {
            aggregate(&run.results, run.total_time_ms)
        } else {
            None
        };
        shape(run.results, statistics, spec.context()).with_cancelled(run.cancelled)
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
