use std::collections::BTreeMap;

use serde_json::Value;

use crate::error::ValidationError;

use super::json::{validate_json, JsonValidation};

pub type HeaderMapping = BTreeMap<String, String>;

/// Validates the header text field. Blank text yields `Ok(None)` so the
/// caller can fall back to its default headers.
pub fn parse_header_text(text: &str) -> Result<Option<HeaderMapping>, ValidationError> {
    let data = match validate_json(text) {
        JsonValidation::Valid(Some(data)) => data,
        JsonValidation::Valid(None) => return Ok(None),
        JsonValidation::Invalid(message) => return Err(ValidationError::InvalidHeaders(message)),
    };

    let Value::Object(entries) = data else {
        return Err(ValidationError::InvalidHeaders(
            "headers must be a JSON object".to_string(),
        ));
    };

    let mut headers = HeaderMapping::new();
    for (name, value) in entries {
        let rendered = match value {
            Value::String(text) => text,
            Value::Number(number) => number.to_string(),
            Value::Bool(flag) => flag.to_string(),
            Value::Null => continue,
            Value::Array(_) | Value::Object(_) => {
                return Err(ValidationError::InvalidHeaders(format!(
                    "header `{name}` must be a string, number or boolean"
                )))
            }
        };
        headers.insert(name, rendered);
    }

    Ok(Some(headers))
}
