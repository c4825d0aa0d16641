//! Observer events published by a run and by the background router.
//!
//! These serialize to the `{type, payload}` envelope a chat UI consumes.

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Milliseconds since the Unix epoch.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

/// One chat bubble.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub role: ChatRole,
    pub content: String,
    pub timestamp: u64,
}

impl ChatMessage {
    pub fn assistant(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role: ChatRole::Assistant,
            content: content.into(),
            timestamp: now_millis(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionNotice {
    pub tool: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoneNotice {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// A question the run is suspended on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionNotice {
    pub question: String,
    pub id: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    #[serde(
        rename = "recommendedIndex",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub recommended_index: Option<usize>,
}

/// Effective routing setup, without the key itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigSummary {
    pub mode: String,
    pub model: String,
    pub backend_url: String,
    pub has_api_key: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AgentEvent {
    AgentMessage(ChatMessage),
    AgentAction(ActionNotice),
    AgentDone(DoneNotice),
    AskUser(QuestionNotice),
    Config(ConfigSummary),
}

impl AgentEvent {
    pub fn message(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self::AgentMessage(ChatMessage::assistant(id, content))
    }

    pub fn done(error: Option<String>) -> Self {
        Self::AgentDone(DoneNotice { error })
    }

    pub fn is_done(&self) -> bool {
        matches!(self, Self::AgentDone(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn events_use_type_payload_envelope() {
        let event = AgentEvent::AskUser(QuestionNotice {
            question: "Which one?".into(),
            id: "ask-1-x".into(),
            options: vec!["A".into(), "B".into()],
            recommended_index: Some(0),
        });
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({
                "type": "ASK_USER",
                "payload": {"question": "Which one?", "id": "ask-1-x", "options": ["A", "B"], "recommendedIndex": 0}
            })
        );
    }

    #[test]
    fn done_without_error_has_empty_payload() {
        assert_eq!(
            serde_json::to_value(AgentEvent::done(None)).unwrap(),
            json!({"type": "AGENT_DONE", "payload": {}})
        );
        let action = AgentEvent::AgentAction(ActionNotice {
            tool: "get_page_state".into(),
            detail: None,
        });
        assert_eq!(
            serde_json::to_value(action).unwrap(),
            json!({"type": "AGENT_ACTION", "payload": {"tool": "get_page_state"}})
        );
    }

    #[test]
    fn assistant_message_shape() {
        let value = serde_json::to_value(AgentEvent::message("abort", "Stopped by user.")).unwrap();
        assert_eq!(value["type"], "AGENT_MESSAGE");
        assert_eq!(value["payload"]["role"], "assistant");
        assert_eq!(value["payload"]["id"], "abort");
        assert!(value["payload"]["timestamp"].as_u64().unwrap() > 0);
    }
}
