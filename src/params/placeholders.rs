use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::Serialize;

pub type ParamValues = HashMap<String, String>;

static PARAMETER_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r":([^/]+)").expect("valid regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterKind {
    Path,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathParameter {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ParameterKind,
    pub required: bool,
}

impl PathParameter {
    fn path(name: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: ParameterKind::Path,
            required: true,
        }
    }
}

/// Every `:name` occurrence, left to right. Repeated names yield one entry
/// per occurrence.
pub fn extract_parameters(template: &str) -> Vec<PathParameter> {
    PARAMETER_PATTERN
        .captures_iter(template)
        .filter_map(|caps| caps.get(1))
        .map(|name| PathParameter::path(name.as_str()))
        .collect()
}

/// Same as [`extract_parameters`] but keeps only the first occurrence of each name.
pub fn unique_parameters(template: &str) -> Vec<PathParameter> {
    let mut seen = HashSet::new();
    extract_parameters(template)
        .into_iter()
        .filter(|param| seen.insert(param.name.clone()))
        .collect()
}

/// Substitutes every placeholder whose name has a non-empty value. All
/// occurrences of a name are replaced in one pass, and only whole
/// placeholder tokens match, so `:id` never touches `:idx`. Placeholders
/// without a value stay in the URL verbatim.
pub fn build_url(template: &str, values: &ParamValues) -> String {
    PARAMETER_PATTERN
        .replace_all(template, |caps: &Captures| {
            match values.get(&caps[1]).filter(|value| !value.is_empty()) {
                Some(value) => value.clone(),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

/// Names that [`build_url`] would leave unsubstituted.
pub fn missing_parameters(template: &str, values: &ParamValues) -> Vec<String> {
    unique_parameters(template)
        .into_iter()
        .filter(|param| {
            values
                .get(&param.name)
                .map_or(true, |value| value.is_empty())
        })
        .map(|param| param.name)
        .collect()
}
