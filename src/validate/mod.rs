mod headers;
mod json;

pub use headers::{parse_header_text, HeaderMapping};
pub use json::{validate_json, JsonValidation};
