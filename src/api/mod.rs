//! Model provider access.
//!
//! - `client`: HTTP transport, direct to the provider or through a relay
//! - [`ModelTurn`]: what the agent loop takes from one reply

use crate::error::ApiError;
use crate::types::{ContentBlock, MessagesRequest, MessagesResponse, ToolCall};
use async_trait::async_trait;

mod client;

pub use client::{ApiClient, ANTHROPIC_VERSION};

/// Minimal model API interface used by the agent loop.
///
/// Tests provide scripted replies through this trait while the production
/// path uses [`ApiClient`].
#[async_trait]
pub trait ModelClient: Send + Sync {
    async fn send(&self, request: &MessagesRequest) -> Result<MessagesResponse, ApiError>;
}

/// Why the model stopped producing output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    EndTurn,
    ToolUse,
    MaxTokens,
    Other(String),
}

impl StopReason {
    /// Missing stop reasons count as a natural end of turn.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.unwrap_or("end_turn") {
            "end_turn" => Self::EndTurn,
            "tool_use" => Self::ToolUse,
            "max_tokens" => Self::MaxTokens,
            other => Self::Other(other.to_string()),
        }
    }
}

/// One model reply reduced to what the loop acts on.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelTurn {
    /// All text blocks joined, if there were any.
    pub text: Option<String>,
    /// The first tool invocation; later ones are ignored.
    pub tool_call: Option<ToolCall>,
    pub stop: StopReason,
}

impl ModelTurn {
    pub fn from_response(response: &MessagesResponse) -> Self {
        let mut text = String::new();
        let mut tool_call = None;
        for block in &response.content {
            match block {
                ContentBlock::Text { text: chunk } => text.push_str(chunk),
                ContentBlock::ToolUse { id, name, input } => {
                    tool_call = Some(ToolCall {
                        id: id.clone(),
                        name: name.clone(),
                        input: input.clone(),
                    });
                    break;
                }
                _ => {}
            }
        }
        Self {
            text: (!text.is_empty()).then_some(text),
            tool_call,
            stop: StopReason::parse(response.stop_reason.as_deref()),
        }
    }

    /// The run ends when the model says it is done or asks for nothing.
    pub fn is_final(&self) -> bool {
        self.stop == StopReason::EndTurn || self.tool_call.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response(value: serde_json::Value) -> MessagesResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn text_blocks_before_the_first_tool_use_are_joined() {
        let turn = ModelTurn::from_response(&response(json!({
            "content": [
                {"type": "text", "text": "Looking "},
                {"type": "text", "text": "for pizza."},
                {"type": "tool_use", "id": "t1", "name": "click", "input": {"ref": "@e3"}},
                {"type": "tool_use", "id": "t2", "name": "click", "input": {"ref": "@e4"}},
                {"type": "text", "text": " ignored"}
            ],
            "stop_reason": "tool_use"
        })));
        assert_eq!(turn.text.as_deref(), Some("Looking for pizza."));
        let call = turn.tool_call.as_ref().unwrap();
        assert_eq!(call.id, "t1");
        assert_eq!(call.input, json!({"ref": "@e3"}));
        assert_eq!(turn.stop, StopReason::ToolUse);
        assert!(!turn.is_final());
    }

    #[test]
    fn missing_stop_reason_is_end_turn() {
        let turn = ModelTurn::from_response(&response(json!({
            "content": [{"type": "text", "text": "Done."}]
        })));
        assert_eq!(turn.stop, StopReason::EndTurn);
        assert!(turn.is_final());
    }

    #[test]
    fn end_turn_wins_over_a_tool_call() {
        let turn = ModelTurn::from_response(&response(json!({
            "content": [{"type": "tool_use", "id": "t1", "name": "wait", "input": {"seconds": 1}}],
            "stop_reason": "end_turn"
        })));
        assert!(turn.tool_call.is_some());
        assert!(turn.is_final());
    }

    #[test]
    fn unknown_blocks_and_reasons_are_tolerated() {
        let turn = ModelTurn::from_response(&response(json!({
            "content": [{"type": "thinking", "thinking": "hmm"}],
            "stop_reason": "pause_turn"
        })));
        assert_eq!(turn.text, None);
        assert_eq!(turn.stop, StopReason::Other("pause_turn".into()));
        assert!(turn.is_final());
    }
}
