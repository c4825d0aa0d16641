//! Messages exchanged between the orchestrator and the page process.
//!
//! Wire shape (JSON):
//! - `{"type":"GET_SNAPSHOT","payload":{"maxTokens":3000}}` → `{"type":"PAGE_SNAPSHOT","payload":<Snapshot>}`
//! - `{"type":"EXECUTE_ACTION","payload":{"action":"click","ref":"@e4"}}` → `{"type":"ACTION_RESULT","payload":<ActionResult>}`

use crate::error::ActionError;
use crate::snapshot::Snapshot;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Pixels scrolled when a scroll action names no amount.
pub const DEFAULT_SCROLL_AMOUNT: i64 = 300;

/// Request sent to the page process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContentRequest {
    GetSnapshot {
        #[serde(rename = "maxTokens", default, skip_serializing_if = "Option::is_none")]
        max_tokens: Option<usize>,
    },
    ExecuteAction(PageAction),
}

/// Response from the page process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContentResponse {
    PageSnapshot(Snapshot),
    ActionResult(ActionResult),
}

impl ContentResponse {
    /// Wire name, used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::PageSnapshot(_) => "PAGE_SNAPSHOT",
            Self::ActionResult(_) => "ACTION_RESULT",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScrollDirection {
    Up,
    Down,
}

impl ScrollDirection {
    /// Signed viewport delta for scrolling `amount` pixels this way.
    pub fn delta(self, amount: i64) -> i64 {
        match self {
            Self::Up => -amount,
            Self::Down => amount,
        }
    }
}

impl fmt::Display for ScrollDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Up => f.write_str("up"),
            Self::Down => f.write_str("down"),
        }
    }
}

/// One user-equivalent interaction for the page executor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum PageAction {
    Click {
        #[serde(rename = "ref")]
        reference: String,
    },
    TypeText {
        #[serde(rename = "ref")]
        reference: String,
        text: String,
    },
    PressKey {
        #[serde(rename = "ref")]
        reference: String,
        key: String,
    },
    Scroll {
        direction: ScrollDirection,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        amount: Option<i64>,
    },
    SelectOption {
        #[serde(rename = "ref")]
        reference: String,
        value: String,
    },
    Wait {
        seconds: f64,
    },
    Navigate {
        url: String,
    },
}

impl PageAction {
    /// Decode an `EXECUTE_ACTION` payload received from outside the process.
    pub fn from_wire(payload: &Value) -> Result<Self, ActionError> {
        serde_json::from_value(payload.clone()).map_err(|_| {
            let name = payload
                .get("action")
                .and_then(Value::as_str)
                .unwrap_or("<missing>");
            ActionError::UnsupportedAction(name.to_string())
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Click { .. } => "click",
            Self::TypeText { .. } => "type_text",
            Self::PressKey { .. } => "press_key",
            Self::Scroll { .. } => "scroll",
            Self::SelectOption { .. } => "select_option",
            Self::Wait { .. } => "wait",
            Self::Navigate { .. } => "navigate",
        }
    }

    /// Element reference this action targets, if any.
    pub fn reference(&self) -> Option<&str> {
        match self {
            Self::Click { reference }
            | Self::TypeText { reference, .. }
            | Self::PressKey { reference, .. }
            | Self::SelectOption { reference, .. } => Some(reference),
            Self::Scroll { .. } | Self::Wait { .. } | Self::Navigate { .. } => None,
        }
    }
}

/// Outcome of one page action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<Snapshot>,
}

impl ActionResult {
    pub fn ok(snapshot: Option<Snapshot>) -> Self {
        Self {
            success: true,
            error: None,
            snapshot,
        }
    }

    pub fn failed(error: impl fmt::Display) -> Self {
        Self {
            success: false,
            error: Some(error.to_string()),
            snapshot: None,
        }
    }
}
