//! Investigation tests against a live OpenAI-compatible endpoint.
//!
//! Excluded from regular runs: they need network access and `OPENAI_API_KEY`.
//!
//! Run with: `cargo test -p devagent --test investigation_llm -- --ignored`

use std::time::Duration;

use devagent::core::catalog::model_catalog;
use devagent::io::config::AgentConfig;
use devagent::io::llm::{
    ChatMessage, ChatRequest, LanguageModel, ModelReply, OpenAiClient, OpenAiClientConfig,
};

fn client() -> OpenAiClient {
    let key = std::env::var("OPENAI_API_KEY").expect("OPENAI_API_KEY must be set");
    let defaults = AgentConfig::default();
    OpenAiClient::new(OpenAiClientConfig {
        base_url: defaults.openai_base_url,
        api_key: key,
        model: std::env::var("DEVAGENT_MODEL").unwrap_or(defaults.model),
        timeout: Duration::from_secs(120),
    })
    .expect("client")
}

/// The model should map a plain request onto the matching catalog tool.
#[test]
#[ignore]
fn model_selects_explain_changes() {
    let request = ChatRequest {
        messages: vec![
            ChatMessage::system("You operate on a git repository using the provided tools."),
            ChatMessage::user("Explain what I changed in my working tree."),
        ],
        tools: model_catalog(),
    };

    let reply = client().complete(&request).expect("complete");

    println!("{reply:?}");
    let ModelReply::Invocations(calls) = reply else {
        panic!("expected tool calls");
    };
    assert!(calls.iter().any(|call| call.operation_name == "explain_changes"));
}

/// Small talk should come back as text, not a tool call.
#[test]
#[ignore]
fn model_answers_small_talk_with_text() {
    let request = ChatRequest {
        messages: vec![ChatMessage::user("Say hello in one word.")],
        tools: model_catalog(),
    };

    let reply = client().complete(&request).expect("complete");

    assert!(matches!(reply, ModelReply::Text(ref text) if !text.is_empty()), "{reply:?}");
}
