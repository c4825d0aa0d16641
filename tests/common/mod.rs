//! Shared fixtures for end-to-end runs against the demo storefront.

#![allow(dead_code)]

use async_trait::async_trait;
use errand::agent::AgentEvent;
use errand::api::ModelClient;
use errand::config::{Config, PageConfig};
use errand::error::ApiError;
use errand::host::SimulatedHost;
use errand::page::{ActionExecutor, PageProcess, SettleDelays};
use errand::router::BackgroundDeps;
use errand::tools::ToolRegistry;
use errand::types::{ContentBlock, MessageContent, MessagesRequest, MessagesResponse};
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, Notify};

type Responder = Box<dyn Fn(&MessagesRequest) -> Value + Send + Sync>;

/// Holds every model call open until the test releases it.
#[derive(Default)]
pub struct Gate {
    entered: Notify,
    release: Notify,
}

impl Gate {
    /// Resolves once a call is parked at the gate.
    pub async fn entered(&self) {
        tokio::time::timeout(Duration::from_secs(10), self.entered.notified())
            .await
            .expect("model call reached the gate");
    }

    pub fn release(&self) {
        self.release.notify_one();
    }
}

/// Model stand-in: each call consumes one scripted step. Steps may look at
/// the request, typically to pick up a fresh `@eN` ref.
#[derive(Default)]
pub struct ScriptedModel {
    steps: Mutex<VecDeque<Responder>>,
    fallback: Option<Responder>,
    latency: Duration,
    gate: Option<Arc<Gate>>,
    requests: Mutex<Vec<MessagesRequest>>,
}

impl ScriptedModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, body: Value) -> Self {
        self.respond(move |_| body.clone())
    }

    pub fn respond(self, step: impl Fn(&MessagesRequest) -> Value + Send + Sync + 'static) -> Self {
        self.steps
            .lock()
            .expect("steps lock")
            .push_back(Box::new(step));
        self
    }

    /// Used once the scripted steps run out.
    pub fn otherwise(mut self, step: impl Fn(&MessagesRequest) -> Value + Send + Sync + 'static) -> Self {
        self.fallback = Some(Box::new(step));
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn gated(mut self, gate: Arc<Gate>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn requests(&self) -> Vec<MessagesRequest> {
        self.requests.lock().expect("requests lock").clone()
    }
}

#[async_trait]
impl ModelClient for ScriptedModel {
    async fn send(&self, request: &MessagesRequest) -> Result<MessagesResponse, ApiError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        if let Some(gate) = &self.gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }
        self.requests
            .lock()
            .expect("requests lock")
            .push(request.clone());
        let step = self.steps.lock().expect("steps lock").pop_front();
        let body = match (step, &self.fallback) {
            (Some(step), _) => step(request),
            (None, Some(fallback)) => fallback(request),
            (None, None) => {
                return Err(ApiError::Status {
                    code: 500,
                    body: "script exhausted".into(),
                })
            }
        };
        serde_json::from_value(body).map_err(|err| ApiError::InvalidResponse(err.to_string()))
    }
}

pub fn text(text: &str) -> Value {
    json!({
        "content": [{"type": "text", "text": text}],
        "stop_reason": "end_turn"
    })
}

pub fn tool(id: &str, name: &str, input: Value) -> Value {
    json!({
        "content": [{"type": "tool_use", "id": id, "name": name, "input": input}],
        "stop_reason": "tool_use"
    })
}

/// All text the model could read in one message.
pub fn message_text(content: &MessageContent) -> String {
    match content {
        MessageContent::Text(text) => text.clone(),
        MessageContent::Blocks(blocks) => blocks
            .iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text.as_str()),
                ContentBlock::ToolResult { content, .. } => Some(content.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

pub fn latest_text(request: &MessagesRequest) -> String {
    request
        .messages
        .last()
        .map(|message| message_text(&message.content))
        .unwrap_or_default()
}

/// Ref of the first snapshot line containing `needle`, searching the newest
/// message first.
pub fn find_ref(request: &MessagesRequest, needle: &str) -> String {
    request
        .messages
        .iter()
        .rev()
        .map(|message| message_text(&message.content))
        .find_map(|text| {
            text.lines()
                .filter(|line| line.contains(needle))
                .find_map(|line| line.split_whitespace().find(|word| word.starts_with("@e")))
                .map(str::to_string)
        })
        .unwrap_or_else(|| panic!("no ref for {needle:?} in conversation"))
}

/// Config with a usable key and no settle delays.
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.api.api_key = "test-key".to_string();
    config.page = PageConfig::immediate();
    config
}

pub fn demo_deps(config: Config, model: Arc<ScriptedModel>) -> BackgroundDeps {
    deps_for(config, model, errand::demo::page_process(), true)
}

pub fn deps_for(
    config: Config,
    model: Arc<ScriptedModel>,
    process: PageProcess,
    injection: bool,
) -> BackgroundDeps {
    let tab = process
        .with_executor(ActionExecutor::new(SettleDelays::none()))
        .spawn(config.page.request_timeout());
    let host = SimulatedHost::new(tab)
        .with_home(errand::demo::HOME_URL)
        .with_injection(injection);
    BackgroundDeps {
        config,
        client: model,
        host: Arc::new(host),
        tools: ToolRegistry::storefront(),
    }
}

pub async fn next_event(events: &mut mpsc::UnboundedReceiver<AgentEvent>) -> AgentEvent {
    tokio::time::timeout(Duration::from_secs(10), events.recv())
        .await
        .expect("event before timeout")
        .expect("router still running")
}

/// Every event up to and including `AGENT_DONE`.
pub async fn until_done(events: &mut mpsc::UnboundedReceiver<AgentEvent>) -> Vec<AgentEvent> {
    let mut seen = Vec::new();
    loop {
        let event = next_event(events).await;
        let done = event.is_done();
        seen.push(event);
        if done {
            return seen;
        }
    }
}

pub fn messages(events: &[AgentEvent]) -> Vec<&str> {
    events
        .iter()
        .filter_map(|event| match event {
            AgentEvent::AgentMessage(message) => Some(message.content.as_str()),
            _ => None,
        })
        .collect()
}

/// One short line per event, for asserting exact sequences.
pub fn describe(events: &[AgentEvent]) -> Vec<String> {
    events
        .iter()
        .map(|event| match event {
            AgentEvent::AgentMessage(message) => format!("message: {}", message.content),
            AgentEvent::AgentAction(action) => format!("action: {}", action.tool),
            AgentEvent::AskUser(notice) => format!("ask: {}", notice.question),
            AgentEvent::AgentDone(done) => match &done.error {
                Some(error) => format!("done: {error}"),
                None => "done".to_string(),
            },
            AgentEvent::Config(_) => "config".to_string(),
        })
        .collect()
}

pub fn actions(events: &[AgentEvent]) -> Vec<&str> {
    events
        .iter()
        .filter_map(|event| match event {
            AgentEvent::AgentAction(action) => Some(action.tool.as_str()),
            _ => None,
        })
        .collect()
}
