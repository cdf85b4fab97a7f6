//! Decoding, validation and default resolution of operation arguments.

use std::collections::BTreeMap;

use jsonschema::Draft;
use serde_json::Value;
use thiserror::Error;

use crate::core::types::OperationSpec;

/// Why a single invocation request was rejected before execution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("unknown operation `{name}`")]
    UnknownOperation { name: String },
    #[error("arguments are not valid JSON: {reason}")]
    InvalidJson { reason: String },
    #[error("arguments must be a JSON object, got {found}")]
    NotAnObject { found: &'static str },
    #[error("arguments do not match the parameter schema:\n- {}", .violations.join("\n- "))]
    SchemaViolation { violations: Vec<String> },
    #[error("missing required argument `{name}`")]
    MissingArgument { name: String },
}

/// Flat string arguments decoded from a model payload.
pub type RawArguments = BTreeMap<String, String>;

/// Arguments after merging the executor's literal defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedArguments {
    values: BTreeMap<String, String>,
}

impl ResolvedArguments {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Like [`get`](Self::get), treating blank values as absent.
    pub fn non_blank(&self, name: &str) -> Option<&str> {
        self.get(name).filter(|value| !value.trim().is_empty())
    }

    pub fn require(&self, name: &str) -> Result<&str, DispatchError> {
        self.non_blank(name)
            .ok_or_else(|| DispatchError::MissingArgument {
                name: name.to_string(),
            })
    }
}

/// Decode the model's JSON-encoded argument string for `spec`.
///
/// An empty payload decodes as `{}` and `null` values count as absent.
pub fn decode_arguments(spec: &OperationSpec, raw: &str) -> Result<RawArguments, DispatchError> {
    let raw = raw.trim();
    let value: Value = if raw.is_empty() {
        Value::Object(serde_json::Map::new())
    } else {
        serde_json::from_str(raw).map_err(|err| DispatchError::InvalidJson {
            reason: err.to_string(),
        })?
    };
    let Value::Object(mut object) = value else {
        return Err(DispatchError::NotAnObject {
            found: json_kind(&value),
        });
    };
    object.retain(|_, value| !value.is_null());
    let instance = Value::Object(object);
    validate_against_schema(&instance, &spec.parameters_schema())?;

    let mut decoded = RawArguments::new();
    if let Value::Object(object) = instance {
        for (key, value) in object {
            if let Value::String(text) = value {
                decoded.insert(key, text);
            }
        }
    }
    Ok(decoded)
}

/// Merge `raw` with `defaults` and check required parameters are present.
pub fn resolve(
    spec: &OperationSpec,
    mut raw: RawArguments,
    defaults: &[(&str, &str)],
) -> Result<ResolvedArguments, DispatchError> {
    for (name, value) in defaults {
        let missing = raw.get(*name).is_none_or(|current| current.trim().is_empty());
        if missing {
            raw.insert((*name).to_string(), (*value).to_string());
        }
    }
    let resolved = ResolvedArguments { values: raw };
    for param in spec.parameters.iter().filter(|param| param.required) {
        resolved.require(param.name)?;
    }
    Ok(resolved)
}

fn validate_against_schema(instance: &Value, schema: &Value) -> Result<(), DispatchError> {
    let compiled = jsonschema::options()
        .with_draft(Draft::Draft202012)
        .build(schema)
        .map_err(|err| DispatchError::SchemaViolation {
            violations: vec![format!("invalid parameter schema: {err}")],
        })?;
    let violations: Vec<String> = compiled
        .iter_errors(instance)
        .map(|err| err.to_string())
        .collect();
    if !violations.is_empty() {
        return Err(DispatchError::SchemaViolation { violations });
    }
    Ok(())
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
