//! Shared fixtures for unit test modules.
//!
//! A scripted model client plus response builders, so loop tests never need
//! a live endpoint.

use crate::api::ModelClient;
use crate::error::ApiError;
use crate::types::{MessagesRequest, MessagesResponse};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::Mutex;

/// Small storefront home page with a search box and one landmark of each kind.
pub const HOME_HTML: &str = r#"<html><head><title>Pizza Town</title></head><body>
<header><a href="/">Pizza Town</a></header>
<main>
  <div>
    <input type="text" placeholder="Search for restaurants and food">
    <button>Search</button>
  </div>
</main>
</body></html>"#;

/// Model response body containing only text, ending the turn.
pub fn text_reply(text: &str) -> Value {
    json!({
        "id": "msg_test",
        "content": [{"type": "text", "text": text}],
        "stop_reason": "end_turn",
        "usage": {"input_tokens": 10, "output_tokens": 5}
    })
}

/// Model response body requesting one tool call.
pub fn tool_reply(id: &str, name: &str, input: Value) -> Value {
    json!({
        "id": "msg_test",
        "content": [{"type": "tool_use", "id": id, "name": name, "input": input}],
        "stop_reason": "tool_use"
    })
}

/// Model client that replays canned response bodies in order and records
/// every request it receives.
///
/// Once the script runs out every call fails with a 500.
#[derive(Debug, Default)]
pub struct ScriptedClient {
    replies: Mutex<VecDeque<Value>>,
    requests: Mutex<Vec<MessagesRequest>>,
}

impl ScriptedClient {
    pub fn new(replies: Vec<Value>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Copies of all requests seen so far.
    pub fn requests(&self) -> Vec<MessagesRequest> {
        self.requests.lock().expect("requests lock").clone()
    }
}

#[async_trait]
impl ModelClient for ScriptedClient {
    async fn send(&self, request: &MessagesRequest) -> Result<MessagesResponse, ApiError> {
        self.requests
            .lock()
            .expect("requests lock")
            .push(request.clone());
        let next = self.replies.lock().expect("replies lock").pop_front();
        let Some(body) = next else {
            return Err(ApiError::Status {
                code: 500,
                body: "script exhausted".into(),
            });
        };
        serde_json::from_value(body).map_err(|err| ApiError::InvalidResponse(err.to_string()))
    }
}
