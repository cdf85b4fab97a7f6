//! Shared types passed between the catalog, the dispatcher and the executors.
//!
//! Nothing here performs I/O. Results are serialized as-is when printed, so
//! field names are part of the CLI output contract.

use serde::Serialize;

/// Declared type of an operation parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    String,
}

impl ParamKind {
    pub fn json_type(self) -> &'static str {
        match self {
            ParamKind::String => "string",
        }
    }
}

/// One named parameter of an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub kind: ParamKind,
    pub required: bool,
}

impl ParameterSpec {
    pub const fn optional(name: &'static str, description: &'static str) -> Self {
        Self {
            name,
            description,
            kind: ParamKind::String,
            required: false,
        }
    }

    pub const fn required(name: &'static str, description: &'static str) -> Self {
        Self {
            name,
            description,
            kind: ParamKind::String,
            required: true,
        }
    }
}

/// A named operation as advertised to the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub parameters: &'static [ParameterSpec],
}

impl OperationSpec {
    pub fn parameter(&self, name: &str) -> Option<&ParameterSpec> {
        self.parameters.iter().find(|param| param.name == name)
    }

    /// JSON Schema (object of string properties) describing the arguments.
    pub fn parameters_schema(&self) -> serde_json::Value {
        let mut properties = serde_json::Map::new();
        for param in self.parameters {
            properties.insert(
                param.name.to_string(),
                serde_json::json!({
                    "type": param.kind.json_type(),
                    "description": param.description,
                }),
            );
        }
        let required: Vec<&str> = self
            .parameters
            .iter()
            .filter(|param| param.required)
            .map(|param| param.name)
            .collect();
        serde_json::json!({
            "type": "object",
            "properties": properties,
            "required": required,
            "additionalProperties": false,
        })
    }
}

/// One operation call requested by the model.
///
/// `raw_arguments` is kept exactly as the model produced it so rejected
/// requests can be reported verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationRequest {
    pub operation_name: String,
    pub raw_arguments: String,
}

impl InvocationRequest {
    pub fn new(operation_name: impl Into<String>, raw_arguments: impl Into<String>) -> Self {
        Self {
            operation_name: operation_name.into(),
            raw_arguments: raw_arguments.into(),
        }
    }
}

/// Operation-specific outcome carried by an [`ExecutionResult`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Payload {
    /// Plain model reply when no operation was selected.
    Reply { text: String },
    /// Generated text (explanations, review comments, summaries, notes).
    Text { text: String },
    Commit {
        message: String,
        branch: String,
        commit: String,
    },
    PullRequest {
        status: u16,
        number: Option<u64>,
        url: Option<String>,
        title: String,
        base: String,
        head: String,
    },
    Issue {
        status: u16,
        url: Option<String>,
        title: String,
        labels: Vec<String>,
    },
    /// Model output that did not match the expected structure.
    ParseFailure { raw: String },
    /// Invocation rejected before any executor ran.
    Rejected { raw_arguments: String },
    Empty,
}

/// Outcome of one operation invocation (or of a tool-free model reply).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation: Option<String>,
    pub success: bool,
    pub payload: Payload,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExecutionResult {
    pub fn ok(operation: &str, payload: Payload) -> Self {
        Self {
            operation: Some(operation.to_string()),
            success: true,
            payload,
            error: None,
        }
    }

    pub fn failed(operation: &str, error: impl Into<String>, payload: Payload) -> Self {
        Self {
            operation: Some(operation.to_string()),
            success: false,
            payload,
            error: Some(error.into()),
        }
    }

    pub fn reply(text: impl Into<String>) -> Self {
        Self {
            operation: None,
            success: true,
            payload: Payload::Reply { text: text.into() },
            error: None,
        }
    }

    /// Text shown on stdout: raw text for textual payloads, pretty JSON otherwise.
    pub fn render(&self) -> String {
        match (&self.payload, self.success) {
            (Payload::Reply { text } | Payload::Text { text }, true) => text.clone(),
            _ => serde_json::to_string_pretty(self)
                .unwrap_or_else(|err| format!("{self:?} (serialize failed: {err})")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SPEC: OperationSpec = OperationSpec {
        name: "op",
        description: "test op",
        parameters: &[
            ParameterSpec::optional("base", "base branch"),
            ParameterSpec::required("log", "raw log"),
        ],
    };

    #[test]
    fn parameters_schema_lists_string_properties_and_required() {
        let schema = SPEC.parameters_schema();
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["properties"]["base"]["type"], "string");
        assert_eq!(schema["required"], serde_json::json!(["log"]));
        assert_eq!(schema["additionalProperties"], false);
    }

    #[test]
    fn render_prints_text_payload_verbatim() {
        let result = ExecutionResult::ok(
            "explain_changes",
            Payload::Text {
                text: "It adds a flag.".to_string(),
            },
        );
        assert_eq!(result.render(), "It adds a flag.");
    }

    #[test]
    fn render_prints_failures_as_json() {
        let result = ExecutionResult::failed(
            "create_github_issue_from_error_log",
            "could not parse",
            Payload::ParseFailure {
                raw: "nonsense".to_string(),
            },
        );
        let rendered = result.render();
        let value: serde_json::Value = serde_json::from_str(&rendered).expect("json");
        assert_eq!(value["success"], false);
        assert_eq!(value["payload"]["kind"], "parse_failure");
        assert_eq!(value["payload"]["raw"], "nonsense");
        assert_eq!(value["error"], "could not parse");
    }
}
