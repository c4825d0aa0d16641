//! Conversation bookkeeping and tool-result summaries.

use crate::page::ActionResult;
use crate::snapshot::Snapshot;
use crate::textutil::truncate_with_suffix_by_chars;
use crate::types::{ContentBlock, Message, Role, ToolCall};

/// Appended when a snapshot copy inside a tool result was cut.
pub const RESULT_TRUNCATION_SUFFIX: &str = "\n... (truncated)";

/// What one dispatched tool call came back with.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutcome {
    /// The call succeeded; page tools carry the refreshed snapshot.
    Completed { snapshot: Option<Snapshot> },
    /// `ask_user` got its answer.
    Answered(String),
    Failed(String),
}

impl ToolOutcome {
    pub fn failed(error: impl Into<String>) -> Self {
        Self::Failed(error.into())
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    /// Text fed back to the model for this outcome.
    pub fn content(&self, max_snapshot_chars: usize) -> String {
        match self {
            Self::Answered(answer) => format!("User replied: {answer}"),
            Self::Completed { snapshot } => {
                let mut content = String::from("Action completed successfully.");
                if let Some(text) = snapshot.as_ref().map(|s| s.text.as_str()).filter(|t| !t.is_empty()) {
                    let text =
                        truncate_with_suffix_by_chars(text, max_snapshot_chars, RESULT_TRUNCATION_SUFFIX);
                    content.push_str(&format!("\n\nUpdated page snapshot:\n```\n{text}\n```"));
                }
                content
            }
            Self::Failed(error) => format!("Error: {error}"),
        }
    }

    pub fn into_block(self, tool_use_id: &str, max_snapshot_chars: usize) -> ContentBlock {
        ContentBlock::ToolResult {
            tool_use_id: tool_use_id.to_string(),
            content: self.content(max_snapshot_chars),
            is_error: self.is_error(),
        }
    }
}

impl From<ActionResult> for ToolOutcome {
    fn from(result: ActionResult) -> Self {
        if result.success {
            Self::Completed {
                snapshot: result.snapshot,
            }
        } else {
            Self::Failed(result.error.unwrap_or_else(|| "Unknown error".to_string()))
        }
    }
}

/// The message list sent with every model request.
///
/// After the seed turn, turns are only ever added in call/result pairs.
#[derive(Debug, Clone)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    pub fn new(context: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::user(context)],
        }
    }

    /// Record the honoured tool call (after any reply text) and its result.
    pub fn record_exchange(&mut self, text: Option<&str>, call: &ToolCall, result: ContentBlock) {
        let mut blocks = Vec::with_capacity(2);
        if let Some(text) = text.map(str::trim).filter(|t| !t.is_empty()) {
            blocks.push(ContentBlock::Text {
                text: text.to_string(),
            });
        }
        blocks.push(ContentBlock::ToolUse {
            id: call.id.clone(),
            name: call.name.clone(),
            input: call.input.clone(),
        });
        self.messages.push(Message::blocks(Role::Assistant, blocks));
        self.messages.push(Message::blocks(Role::User, vec![result]));
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::BTreeMap;

    fn snapshot(text: &str) -> Snapshot {
        Snapshot {
            url: "https://pizza.test/".into(),
            title: "Pizza".into(),
            text: text.into(),
            ref_map: BTreeMap::new(),
        }
    }

    #[test]
    fn success_includes_fenced_snapshot() {
        let outcome = ToolOutcome::Completed {
            snapshot: Some(snapshot("[page] Pizza")),
        };
        assert_eq!(
            outcome.content(100),
            "Action completed successfully.\n\nUpdated page snapshot:\n```\n[page] Pizza\n```"
        );
        assert_eq!(
            ToolOutcome::Completed { snapshot: None }.content(100),
            "Action completed successfully."
        );
    }

    #[test]
    fn long_snapshots_are_cut_visibly() {
        let outcome = ToolOutcome::Completed {
            snapshot: Some(snapshot(&"x".repeat(50))),
        };
        let content = outcome.content(10);
        assert!(content.contains(&format!("{}\n... (truncated)\n```", "x".repeat(10))));
    }

    #[test]
    fn failures_and_answers() {
        let failed = ToolOutcome::from(ActionResult::failed("Element not found: @e9"));
        assert_eq!(failed.content(10), "Error: Element not found: @e9");
        let block = failed.into_block("toolu_1", 10);
        assert_eq!(
            block,
            ContentBlock::ToolResult {
                tool_use_id: "toolu_1".into(),
                content: "Error: Element not found: @e9".into(),
                is_error: true,
            }
        );

        let bare = ToolOutcome::from(ActionResult {
            success: false,
            error: None,
            snapshot: None,
        });
        assert_eq!(bare.content(10), "Error: Unknown error");
        assert_eq!(ToolOutcome::Answered("2".into()).content(10), "User replied: 2");
    }

    #[test]
    fn exchanges_are_recorded_in_pairs() {
        let mut conversation = Conversation::new("context");
        let call = ToolCall {
            id: "toolu_1".into(),
            name: "click".into(),
            input: json!({"ref": "@e2"}),
        };
        let result = ToolOutcome::Completed { snapshot: None }.into_block(&call.id, 100);
        conversation.record_exchange(Some(" Opening search. "), &call, result);

        let messages = conversation.messages();
        assert_eq!(messages.len(), 3);
        let assistant = messages[1].content_blocks();
        assert_eq!(assistant.len(), 2);
        assert!(matches!(&assistant[0], ContentBlock::Text { text } if text == "Opening search."));
        assert!(matches!(&assistant[1], ContentBlock::ToolUse { id, .. } if id == "toolu_1"));
        assert!(matches!(
            messages[2].content_blocks(),
            [ContentBlock::ToolResult { tool_use_id, .. }] if tool_use_id == "toolu_1"
        ));
    }
}
