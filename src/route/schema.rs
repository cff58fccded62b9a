use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::model::RouteDescriptor;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldRule {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<Value>,
}

impl FieldRule {
    /// The field's example, or an empty value of its declared type.
    pub fn placeholder(&self) -> Value {
        if let Some(example) = &self.example {
            return example.clone();
        }
        match self.kind.to_ascii_lowercase().as_str() {
            "string" | "email" | "uuid" | "date" | "datetime" | "url" => Value::String(String::new()),
            "number" | "integer" | "int" | "float" | "decimal" => Value::from(0),
            "boolean" | "bool" => Value::Bool(false),
            "array" => Value::Array(Vec::new()),
            "object" => Value::Object(Map::new()),
            _ => Value::Null,
        }
    }
}

pub type ValidationSchema = BTreeMap<String, FieldRule>;

/// Validator name to schema, as published next to the route catalog.
pub type SchemaCatalog = HashMap<String, ValidationSchema>;

/// Request body to pre-fill for a route. The route's own example wins over
/// one derived from its validation schema. Schemas are never enforced here.
pub fn default_body(route: &RouteDescriptor, schemas: &SchemaCatalog) -> Option<Value> {
    if !route.method.accepts_body() {
        return None;
    }
    if let Some(example) = &route.example {
        return Some(example.clone());
    }

    let schema = schemas.get(route.validator.as_deref()?)?;
    let body = schema
        .iter()
        .map(|(field, rule)| (field.clone(), rule.placeholder()))
        .collect::<Map<_, _>>();
    Some(Value::Object(body))
}

/// Pretty-printed [`default_body`], or an empty string when there is none.
pub fn default_body_text(route: &RouteDescriptor, schemas: &SchemaCatalog) -> String {
    default_body(route, schemas)
        .and_then(|body| serde_json::to_string_pretty(&body).ok())
        .unwrap_or_default()
}
