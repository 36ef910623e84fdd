//! Declared tool parameters and invocation-time validation.
//!
//! Tools declare their inputs as a list of [`ParameterDef`]s. The same list
//! is published by the discovery endpoint and used by [`validate_params`]
//! to check incoming calls before a tool runs.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::SearchError;

/// Parameter types understood by the calling framework.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterType {
    String,
    Integer,
    Number,
    Boolean,
}

impl ParameterType {
    fn as_str(self) -> &'static str {
        match self {
            ParameterType::String => "string",
            ParameterType::Integer => "integer",
            ParameterType::Number => "number",
            ParameterType::Boolean => "boolean",
        }
    }

    fn accepts(self, value: &Value) -> bool {
        match self {
            ParameterType::String => value.is_string(),
            ParameterType::Integer => value.is_i64() || value.is_u64(),
            ParameterType::Number => value.is_number(),
            ParameterType::Boolean => value.is_boolean(),
        }
    }
}

/// One entry of a tool's parameter list.
#[derive(Debug, Clone, Serialize)]
pub struct ParameterDef {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ParameterType,
    pub description: String,
    pub required: bool,
}

impl ParameterDef {
    pub fn new(name: &str, kind: ParameterType, description: &str, required: bool) -> Self {
        Self {
            name: name.to_string(),
            kind,
            description: description.to_string(),
            required,
        }
    }
}

/// Validate call arguments against a parameter list.
///
/// - `args` must be a JSON object.
/// - Required parameters must be present and non-null.
/// - Present parameters must match their declared type. A `null` optional
///   parameter is treated as absent and dropped.
/// - Undeclared keys are passed through untouched.
pub fn validate_params(
    defs: &[ParameterDef],
    args: &Value,
) -> Result<Map<String, Value>, SearchError> {
    let mut result = match args {
        Value::Object(map) => map.clone(),
        Value::Null => Map::new(),
        other => {
            return Err(SearchError::Validation(format!(
                "parameters must be a JSON object, got {}",
                json_type_name(other)
            )))
        }
    };

    for def in defs {
        match result.get(&def.name).cloned() {
            None | Some(Value::Null) if def.required => {
                return Err(SearchError::Validation(format!(
                    "missing required parameter: {}",
                    def.name
                )));
            }
            None => {}
            Some(Value::Null) => {
                result.remove(&def.name);
            }
            Some(value) if !def.kind.accepts(&value) => {
                return Err(SearchError::Validation(format!(
                    "parameter '{}' must be of type '{}', got {}",
                    def.name,
                    def.kind.as_str(),
                    json_type_name(&value)
                )));
            }
            Some(_) => {}
        }
    }

    Ok(result)
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
