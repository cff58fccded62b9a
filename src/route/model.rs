use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::params::{unique_parameters, PathParameter};

use super::method::HttpMethod;

/// The handler field arrives as a string, an object with a `name`, or not
/// at all. It is resolved once when the descriptor is built.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Option<Value>", into = "Option<String>")]
pub enum Handler {
    Named(String),
    #[default]
    Anonymous,
}

impl Handler {
    pub fn name(&self) -> Option<&str> {
        match self {
            Handler::Named(name) => Some(name),
            Handler::Anonymous => None,
        }
    }
}

impl From<Option<Value>> for Handler {
    fn from(raw: Option<Value>) -> Self {
        let name = match raw {
            Some(Value::String(name)) => Some(name),
            Some(Value::Object(mut fields)) => match fields.remove("name") {
                Some(Value::String(name)) => Some(name),
                _ => None,
            },
            _ => None,
        };
        match name.map(|n| n.trim().to_string()) {
            Some(name) if !name.is_empty() => Handler::Named(name),
            _ => Handler::Anonymous,
        }
    }
}

impl From<Handler> for Option<String> {
    fn from(handler: Handler) -> Self {
        match handler {
            Handler::Named(name) => Some(name),
            Handler::Anonymous => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteDescriptor {
    pub method: HttpMethod,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validator: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<Value>,
    #[serde(default)]
    pub handler: Handler,
}

impl RouteDescriptor {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            validator: None,
            example: None,
            handler: Handler::Anonymous,
        }
    }

    pub fn with_validator(mut self, validator: impl Into<String>) -> Self {
        self.validator = Some(validator.into());
        self
    }

    pub fn with_example(mut self, example: Value) -> Self {
        self.example = Some(example);
        self
    }

    /// Identifies the route within a session, e.g. `GET /users/:id`.
    pub fn key(&self) -> String {
        format!("{} {}", self.method, self.url)
    }

    /// Form fields to render, one per distinct placeholder name.
    pub fn parameters(&self) -> Vec<PathParameter> {
        unique_parameters(&self.url)
    }
}
