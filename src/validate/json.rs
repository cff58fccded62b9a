use serde_json::Value;

/// Result of checking a text field for syntactic JSON validity.
#[derive(Debug, Clone, PartialEq)]
pub enum JsonValidation {
    /// `None` when the input was blank; the caller picks a default.
    Valid(Option<Value>),
    Invalid(String),
}

impl JsonValidation {
    pub fn is_valid(&self) -> bool {
        matches!(self, JsonValidation::Valid(_))
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            JsonValidation::Invalid(message) => Some(message),
            JsonValidation::Valid(_) => None,
        }
    }
}

pub fn validate_json(text: &str) -> JsonValidation {
    if text.trim().is_empty() {
        return JsonValidation::Valid(None);
    }

    match serde_json::from_str::<Value>(text) {
        Ok(data) => JsonValidation::Valid(Some(data)),
        Err(err) => JsonValidation::Invalid(err.to_string()),
    }
}
