//! Generative-model collaborator.
//!
//! [`LanguageModel`] abstracts one chat-completion round trip. [`OpenAiClient`]
//! talks to an OpenAI-compatible `/chat/completions` endpoint over a blocking
//! HTTP client; tests use scripted models instead.

use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::core::catalog::Operation;
use crate::core::types::InvocationRequest;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// One request to the model.
///
/// When `tools` is non-empty the model may answer with invocation requests
/// instead of text (tool choice `auto`).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    pub tools: Vec<Operation>,
}

impl ChatRequest {
    pub fn text(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            tools: Vec::new(),
        }
    }
}

/// The model's answer: plain text or an ordered list of operation calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelReply {
    Text(String),
    Invocations(Vec<InvocationRequest>),
}

pub trait LanguageModel {
    fn complete(&self, request: &ChatRequest) -> Result<ModelReply>;

    /// Complete a tool-free request and return the trimmed text.
    fn generate(&self, messages: Vec<ChatMessage>) -> Result<String> {
        match self.complete(&ChatRequest::text(messages))? {
            ModelReply::Text(text) => Ok(text.trim().to_string()),
            ModelReply::Invocations(calls) => Err(anyhow!(
                "model requested {} tool call(s) on a text-only request",
                calls.len()
            )),
        }
    }
}

/// Connection settings for [`OpenAiClient`].
#[derive(Debug, Clone)]
pub struct OpenAiClientConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub timeout: Duration,
}

/// Blocking client for an OpenAI-compatible chat-completions API.
pub struct OpenAiClient {
    http: reqwest::blocking::Client,
    endpoint: String,
    model: String,
}

impl OpenAiClient {
    pub fn new(config: OpenAiClientConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", config.api_key))
            .context("OPENAI_API_KEY is not a valid header value")?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let http = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()
            .context("build model http client")?;
        let endpoint = format!("{}/chat/completions", config.base_url.trim_end_matches('/'));
        info!(model = %config.model, endpoint = %endpoint, "model client ready");
        Ok(Self {
            http,
            endpoint,
            model: config.model,
        })
    }
}

impl LanguageModel for OpenAiClient {
    #[instrument(skip_all, fields(model = %self.model, tools = request.tools.len()))]
    fn complete(&self, request: &ChatRequest) -> Result<ModelReply> {
        let body = WireRequest::new(&self.model, request);
        let response = self
            .http
            .post(&self.endpoint)
            .json(&body)
            .send()
            .with_context(|| format!("POST {}", self.endpoint))?;

        let status = response.status();
        let text = response.text().context("read model response body")?;
        if !status.is_success() {
            bail!("model API returned HTTP {}: {}", status.as_u16(), text.trim());
        }
        debug!(bytes = text.len(), "model response received");
        reply_from_response(&text)
    }
}

#[derive(Debug, Serialize)]
struct WireRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<WireTool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<&'static str>,
}

impl<'a> WireRequest<'a> {
    fn new(model: &'a str, request: &'a ChatRequest) -> Self {
        let tools: Vec<WireTool> = request
            .tools
            .iter()
            .map(|op| WireTool::from_operation(*op))
            .collect();
        let tool_choice = (!tools.is_empty()).then_some("auto");
        Self {
            model,
            messages: &request.messages,
            tools,
            tool_choice,
        }
    }
}

#[derive(Debug, Serialize)]
struct WireTool {
    #[serde(rename = "type")]
    kind: &'static str,
    function: WireFunction,
}

impl WireTool {
    fn from_operation(op: Operation) -> Self {
        let spec = op.spec();
        Self {
            kind: "function",
            function: WireFunction {
                name: spec.name,
                description: spec.description,
                parameters: spec.parameters_schema(),
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct WireFunction {
    name: &'static str,
    description: &'static str,
    parameters: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    #[serde(default)]
    choices: Vec<WireChoice>,
}

#[derive(Debug, Deserialize)]
struct WireChoice {
    message: WireReplyMessage,
}

#[derive(Debug, Deserialize)]
struct WireReplyMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<WireToolCall>>,
}

#[derive(Debug, Deserialize)]
struct WireToolCall {
    function: WireFunctionCall,
}

#[derive(Debug, Deserialize)]
struct WireFunctionCall {
    name: String,
    #[serde(default)]
    arguments: String,
}

/// Interpret a chat-completions response body.
///
/// Tool calls win over text and keep the order the model returned them in.
pub fn reply_from_response(body: &str) -> Result<ModelReply> {
    let parsed: WireResponse = serde_json::from_str(body).context("parse model response")?;
    let choice = parsed
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| anyhow!("model response has no choices"))?;
    let calls = choice.message.tool_calls.unwrap_or_default();
    if !calls.is_empty() {
        let requests = calls
            .into_iter()
            .map(|call| InvocationRequest::new(call.function.name, call.function.arguments))
            .collect();
        return Ok(ModelReply::Invocations(requests));
    }
    Ok(ModelReply::Text(choice.message.content.unwrap_or_default()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::catalog::model_catalog;

    #[test]
    fn parses_text_reply() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"Hi there"}}]}"#;
        assert_eq!(
            reply_from_response(body).expect("reply"),
            ModelReply::Text("Hi there".to_string())
        );
    }

    #[test]
    fn parses_tool_calls_in_order() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":null,"tool_calls":[
            {"id":"a","type":"function","function":{"name":"explain_changes","arguments":"{}"}},
            {"id":"b","type":"function","function":{"name":"create_pull_request","arguments":"{\"base\":\"dev\"}"}}
        ]}}]}"#;
        let reply = reply_from_response(body).expect("reply");
        assert_eq!(
            reply,
            ModelReply::Invocations(vec![
                InvocationRequest::new("explain_changes", "{}"),
                InvocationRequest::new("create_pull_request", r#"{"base":"dev"}"#),
            ])
        );
    }

    #[test]
    fn null_tool_calls_and_content_yield_empty_text() {
        let body = r#"{"choices":[{"message":{"content":null,"tool_calls":null}}]}"#;
        assert_eq!(
            reply_from_response(body).expect("reply"),
            ModelReply::Text(String::new())
        );
    }

    #[test]
    fn missing_choices_is_an_error() {
        let err = reply_from_response(r#"{"choices":[]}"#).unwrap_err();
        assert!(err.to_string().contains("no choices"));
    }

    #[test]
    fn wire_request_advertises_catalog_with_auto_choice() {
        let request = ChatRequest {
            messages: vec![ChatMessage::user("ship it")],
            tools: model_catalog(),
        };
        let value = serde_json::to_value(WireRequest::new("gpt-4", &request)).expect("json");
        assert_eq!(value["model"], "gpt-4");
        assert_eq!(value["tool_choice"], "auto");
        assert_eq!(value["messages"][0]["role"], "user");
        assert_eq!(value["tools"].as_array().map(Vec::len), Some(6));
        assert_eq!(value["tools"][0]["type"], "function");
        assert_eq!(
            value["tools"][0]["function"]["name"],
            "commit_and_push_changes"
        );
    }

    #[test]
    fn wire_request_without_tools_omits_tool_fields() {
        let request = ChatRequest::text(vec![ChatMessage::system("s"), ChatMessage::user("u")]);
        let value = serde_json::to_value(WireRequest::new("gpt-4", &request)).expect("json");
        assert!(value.get("tools").is_none());
        assert!(value.get("tool_choice").is_none());
    }
}
