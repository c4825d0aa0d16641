//! Core agentic loop.
//!
//! [`run_agent`] drives one run: it reads the page, seeds the conversation,
//! then alternates model calls with exactly one tool call each until the
//! model stops asking for tools, the run is aborted, or the step cap is hit.
//! Every assistant message, action and terminal outcome is published as an
//! [`AgentEvent`].

use crate::api::{ModelClient, ModelTurn};
use crate::config::Config;
use crate::host::Host;
use crate::prompt::{render_system_prompt, user_context_block, SystemPromptParams};
use crate::router::PageLink;
use crate::snapshot::Snapshot;
use crate::tools::{AskUserArgs, ToolInput, ToolRegistry};
use crate::types::{MessagesRequest, ToolCall};
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

mod conversation;
pub mod events;
pub mod questions;
mod session;

pub use conversation::{Conversation, ToolOutcome, RESULT_TRUNCATION_SUFFIX};
pub use events::{
    ActionNotice, AgentEvent, ChatMessage, ChatRole, ConfigSummary, DoneNotice, QuestionNotice,
};
pub use questions::{QuestionPrompt, IMPLICIT_YES};
pub use session::{RunSession, RunState};

pub const PAGE_UNREADABLE_MESSAGE: &str = "Could not read the page. The tab may still be loading; please wait a moment and try again, or refresh the tab.";
pub const STOPPED_MESSAGE: &str = "Stopped by user.";
pub const STEP_LIMIT_MESSAGE: &str = "Reached maximum steps. You can try again with a simpler request.";
/// Tool result when an abort withdraws the question the run was waiting on.
const QUESTION_WITHDRAWN: &str = "Question was withdrawn before an answer arrived.";

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Completed,
    Aborted,
    StepLimit,
    /// Carries the short error reported in `AGENT_DONE`.
    Failed(String),
}

impl RunOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// Everything a run needs besides its session and target page.
#[derive(Clone)]
pub struct AgentDeps {
    pub config: Config,
    pub client: Arc<dyn ModelClient>,
    pub host: Arc<dyn Host>,
    pub tools: ToolRegistry,
    pub events: mpsc::UnboundedSender<AgentEvent>,
}

impl AgentDeps {
    fn emit(&self, event: AgentEvent) {
        // Nobody watching is not an error for the run.
        let _ = self.events.send(event);
    }

    fn say(&self, id: impl Into<String>, content: impl Into<String>) {
        self.emit(AgentEvent::message(id, content));
    }

    fn notify_action(&self, tool: &str, detail: Option<String>) {
        self.emit(AgentEvent::AgentAction(ActionNotice {
            tool: tool.to_string(),
            detail,
        }));
    }

    fn system_prompt(&self) -> String {
        let agent = &self.config.agent;
        let definitions = self.tools.definitions();
        render_system_prompt(SystemPromptParams {
            site_name: &agent.site_name,
            home_url: agent.home_url.as_deref(),
            enabled_tools: definitions.iter().map(|def| def.name.as_str()).collect(),
            custom_instructions: agent.instructions.as_deref(),
        })
    }
}

/// Drive one run against `page` to a terminal outcome.
pub async fn run_agent(
    deps: &AgentDeps,
    session: &RunSession,
    page: &PageLink,
    request: &str,
) -> RunOutcome {
    let outcome = Run {
        deps,
        session,
        page,
    }
    .drive(request)
    .await;
    session.set_state(match &outcome {
        RunOutcome::Completed | RunOutcome::StepLimit => RunState::Done,
        RunOutcome::Aborted => RunState::Aborted,
        RunOutcome::Failed(_) => RunState::Failed,
    });
    info!(outcome = ?outcome, "run finished");
    outcome
}

struct Run<'a> {
    deps: &'a AgentDeps,
    session: &'a RunSession,
    page: &'a PageLink,
}

impl Run<'_> {
    async fn drive(&self, request: &str) -> RunOutcome {
        let deps = self.deps;
        self.session.set_state(RunState::AwaitingSnapshot);
        let Some(snapshot) = self.initial_snapshot().await else {
            warn!("page never produced a snapshot");
            deps.say("err-1", PAGE_UNREADABLE_MESSAGE);
            deps.emit(AgentEvent::done(Some("No snapshot".into())));
            return RunOutcome::Failed("No snapshot".into());
        };

        let system = deps.system_prompt();
        let tools = deps.tools.definitions();
        let max_iterations = deps.config.agent.max_iterations;
        let result_chars = deps.config.agent.result_snapshot_chars;
        let mut conversation = Conversation::new(user_context_block(&snapshot.text, request));
        let mut iterations = 0;

        while iterations < max_iterations && !self.session.is_aborted() {
            iterations += 1;
            self.session.set_state(RunState::Conversing {
                iteration: iterations,
            });
            debug!(iteration = iterations, messages = conversation.len(), "calling model");

            let model_request = MessagesRequest {
                model: deps.config.api.model.clone(),
                max_tokens: deps.config.api.max_tokens,
                system: system.clone(),
                messages: conversation.messages().to_vec(),
                tools: tools.clone(),
            };
            let response = match deps.client.send(&model_request).await {
                Ok(response) => response,
                Err(err) => {
                    warn!(iteration = iterations, error = %err, "model call failed");
                    deps.say(message_id("err"), format!("Error calling API: {err}"));
                    deps.emit(AgentEvent::done(Some("API error".into())));
                    return RunOutcome::Failed("API error".into());
                }
            };

            let turn = ModelTurn::from_response(&response);
            if let Some(text) = turn.text.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
                deps.say(message_id("msg"), text);
            }
            let call = match &turn.tool_call {
                Some(call) if !turn.is_final() => call,
                _ => {
                    deps.emit(AgentEvent::done(None));
                    return RunOutcome::Completed;
                }
            };

            let outcome = self.dispatch(call).await;
            info!(
                iteration = iterations,
                tool = %call.name,
                ok = !outcome.is_error(),
                "tool finished"
            );
            conversation.record_exchange(
                turn.text.as_deref(),
                call,
                outcome.into_block(&call.id, result_chars),
            );
        }

        let outcome = if self.session.is_aborted() {
            deps.say("abort", STOPPED_MESSAGE);
            RunOutcome::Aborted
        } else {
            deps.say("max", STEP_LIMIT_MESSAGE);
            RunOutcome::StepLimit
        };
        deps.emit(AgentEvent::done(None));
        outcome
    }

    /// Bounded retries with one executor reinjection part way through.
    async fn initial_snapshot(&self) -> Option<Snapshot> {
        let page_config = &self.deps.config.page;
        let tokens = Some(self.deps.config.agent.snapshot_max_tokens);
        let attempts = page_config.snapshot_attempts;
        for attempt in 1..=attempts {
            match self.page.get_snapshot(tokens).await {
                Ok(snapshot) => return Some(snapshot),
                Err(err) => debug!(attempt, error = %err, "initial snapshot failed"),
            }
            if attempt == page_config.inject_after_attempts {
                match self.deps.host.inject_executor(self.page).await {
                    Ok(()) => pause(page_config.inject_settle_ms).await,
                    Err(err) => warn!(error = %err, "executor reinjection failed"),
                }
            }
            if attempt < attempts {
                pause(page_config.snapshot_retry_delay_ms).await;
            }
        }
        None
    }

    async fn dispatch(&self, call: &ToolCall) -> ToolOutcome {
        let input = match self.deps.tools.parse_call(&call.name, &call.input) {
            Ok(input) => input,
            Err(err) => {
                debug!(tool = %call.name, error = %err, "rejected tool call");
                return ToolOutcome::failed(err.to_string());
            }
        };
        self.session.set_state(RunState::ExecutingTool {
            tool: input.name().to_string(),
        });

        match input {
            ToolInput::Navigate { url } => self.navigate(&url).await,
            ToolInput::GetPageState => {
                self.deps.notify_action(crate::tools::GET_PAGE_STATE, None);
                match self.snapshot().await {
                    Ok(snapshot) => ToolOutcome::Completed {
                        snapshot: Some(snapshot),
                    },
                    Err(err) => ToolOutcome::failed(format!("Could not read the page: {err}")),
                }
            }
            ToolInput::AskUser(args) => self.ask(args).await,
            ToolInput::ReportStatus { message } => {
                let message = message.trim();
                if !message.is_empty() {
                    self.deps.say(message_id("msg"), message);
                }
                ToolOutcome::Completed { snapshot: None }
            }
            page_tool => {
                let Some(action) = page_tool.page_action() else {
                    return ToolOutcome::failed(format!("Unknown tool: {}", page_tool.name()));
                };
                self.deps.notify_action(page_tool.name(), page_tool.detail());
                match self.page.execute(action).await {
                    Ok(result) => result.into(),
                    Err(err) => ToolOutcome::failed(err.to_string()),
                }
            }
        }
    }

    async fn navigate(&self, url: &str) -> ToolOutcome {
        if let Err(err) = self.deps.host.navigate(self.page, url).await {
            return ToolOutcome::failed(err.to_string());
        }
        self.deps.notify_action(crate::tools::NAVIGATE, Some(url.to_string()));
        pause(self.deps.config.page.navigate_settle_ms).await;
        // The new page may still be loading; success does not depend on it.
        ToolOutcome::Completed {
            snapshot: self.snapshot().await.ok(),
        }
    }

    async fn snapshot(&self) -> Result<Snapshot, crate::error::RouterError> {
        self.page
            .get_snapshot(Some(self.deps.config.agent.snapshot_max_tokens))
            .await
    }

    /// Suspend this run until the question is answered.
    ///
    /// There is no timeout; only an answer or an abort resumes the run.
    async fn ask(&self, args: AskUserArgs) -> ToolOutcome {
        let id = question_id();
        let Some(answer) = self.session.register_question(&id) else {
            debug!(id = %id, "run aborted before the question was asked");
            return ToolOutcome::failed(QUESTION_WITHDRAWN);
        };
        self.session.set_state(RunState::AwaitingUserAnswer {
            question_id: id.clone(),
        });
        info!(id = %id, options = args.options.len(), "waiting for user answer");
        self.deps.emit(AgentEvent::AskUser(QuestionNotice {
            question: args.question,
            id,
            options: args.options,
            recommended_index: args.recommended_index,
        }));
        match answer.await {
            Ok(answer) => ToolOutcome::Answered(answer),
            Err(_) => ToolOutcome::failed(QUESTION_WITHDRAWN),
        }
    }
}

async fn pause(ms: u64) {
    if ms > 0 {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }
}

pub(crate) fn message_id(prefix: &str) -> String {
    format!("{prefix}-{}", events::now_millis())
}

/// `ask-<millis>-<random base36>`.
fn question_id() -> String {
    let nonce: u64 = rand::thread_rng().gen();
    format!("ask-{}-{}", events::now_millis(), to_base36(nonce))
}

fn to_base36(mut value: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if value == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while value > 0 {
        out.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PageConfig;
    use crate::host::SimulatedHost;
    use crate::page::{ActionExecutor, PageProcess, SettleDelays, Site};
    use crate::testsupport::{self, ScriptedClient};
    use crate::types::{ContentBlock, Role};
    use serde_json::json;

    const HOME: &str = "https://pizza.test/";

    struct Harness {
        deps: AgentDeps,
        client: Arc<ScriptedClient>,
        page: PageLink,
        events: mpsc::UnboundedReceiver<AgentEvent>,
    }

    fn harness(replies: Vec<serde_json::Value>, process: PageProcess, injection: bool) -> Harness {
        let mut config = Config::default();
        config.page = PageConfig::immediate();
        let page = process
            .with_executor(ActionExecutor::new(SettleDelays::none()))
            .spawn(config.page.request_timeout());
        let client = Arc::new(ScriptedClient::new(replies));
        let (tx, events) = mpsc::unbounded_channel();
        let deps = AgentDeps {
            config,
            client: client.clone(),
            host: Arc::new(SimulatedHost::new(page.clone()).with_injection(injection)),
            tools: ToolRegistry::storefront(),
            events: tx,
        };
        Harness {
            deps,
            client,
            page,
            events,
        }
    }

    fn home_process() -> PageProcess {
        PageProcess::new(Site::new().with_page(HOME, testsupport::HOME_HTML)).open(HOME)
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<AgentEvent>) -> Vec<AgentEvent> {
        let mut out = Vec::new();
        while let Ok(event) = rx.try_recv() {
            out.push(event);
        }
        out
    }

    #[test]
    fn base36_encoding() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "z");
        assert_eq!(to_base36(36), "10");
        let id = question_id();
        assert!(id.starts_with("ask-"));
        assert_eq!(id.split('-').count(), 3);
    }

    #[tokio::test]
    async fn plain_text_reply_completes_the_run() {
        let mut h = harness(vec![testsupport::text_reply("Hello there.")], home_process(), true);
        let session = RunSession::new();
        let outcome = run_agent(&h.deps, &session, &h.page, "hi").await;
        assert_eq!(outcome, RunOutcome::Completed);
        assert_eq!(session.state(), RunState::Done);

        let requests = h.client.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].max_tokens, 4096);
        assert_eq!(requests[0].tools.len(), 10);
        assert!(requests[0].system.contains("the storefront"));

        let events = drain(&mut h.events);
        assert!(matches!(&events[0], AgentEvent::AgentMessage(m) if m.content == "Hello there."));
        assert_eq!(events.last(), Some(&AgentEvent::done(None)));
    }

    #[tokio::test]
    async fn unknown_tool_is_fed_back_as_error() {
        let h = harness(
            vec![
                testsupport::tool_reply("t1", "teleport", json!({})),
                testsupport::text_reply("ok"),
            ],
            home_process(),
            true,
        );
        let outcome = run_agent(&h.deps, &RunSession::new(), &h.page, "go").await;
        assert_eq!(outcome, RunOutcome::Completed);
        let requests = h.client.requests();
        let second = &requests[1];
        let last = second.messages.last().unwrap();
        assert_eq!(last.role, Role::User);
        assert_eq!(
            last.content_blocks(),
            &[ContentBlock::ToolResult {
                tool_use_id: "t1".into(),
                content: "Error: Unknown tool: teleport".into(),
                is_error: true,
            }]
        );
    }

    #[tokio::test]
    async fn invalid_arguments_do_not_reach_the_page() {
        let mut h = harness(
            vec![
                testsupport::tool_reply("t1", "click", json!({})),
                testsupport::text_reply("ok"),
            ],
            home_process(),
            true,
        );
        run_agent(&h.deps, &RunSession::new(), &h.page, "go").await;
        let events = drain(&mut h.events);
        assert!(!events.iter().any(|e| matches!(e, AgentEvent::AgentAction(_))));
        let requests = h.client.requests();
        let second = &requests[1];
        match second.messages.last().unwrap().content_blocks() {
            [ContentBlock::ToolResult { content, is_error, .. }] => {
                assert!(content.starts_with("Error: Invalid arguments"), "{content}");
                assert!(is_error);
            }
            other => panic!("unexpected blocks: {other:?}"),
        }
    }

    #[tokio::test]
    async fn report_status_emits_message_and_succeeds() {
        let mut h = harness(
            vec![
                testsupport::tool_reply("t1", "report_status", json!({"message": "Found 3 places"})),
                testsupport::text_reply("done"),
            ],
            home_process(),
            true,
        );
        run_agent(&h.deps, &RunSession::new(), &h.page, "go").await;
        let events = drain(&mut h.events);
        assert!(events
            .iter()
            .any(|e| matches!(e, AgentEvent::AgentMessage(m) if m.content == "Found 3 places")));
        let requests = h.client.requests();
        let second = &requests[1];
        assert!(matches!(
            second.messages.last().unwrap().content_blocks(),
            [ContentBlock::ToolResult { content, is_error: false, .. }] if content == "Action completed successfully."
        ));
    }

    #[tokio::test]
    async fn api_failure_fails_the_run() {
        let mut h = harness(vec![], home_process(), true);
        let outcome = run_agent(&h.deps, &RunSession::new(), &h.page, "go").await;
        assert_eq!(outcome, RunOutcome::Failed("API error".into()));
        let events = drain(&mut h.events);
        assert!(matches!(&events[0], AgentEvent::AgentMessage(m) if m.content.starts_with("Error calling API: ")));
        assert_eq!(events.last(), Some(&AgentEvent::done(Some("API error".into()))));
    }

    #[tokio::test]
    async fn blank_page_recovers_after_reinjection() {
        let process = PageProcess::new(Site::new().with_page(HOME, testsupport::HOME_HTML))
            .without_content_scripts()
            .open(HOME);
        let h = harness(vec![testsupport::text_reply("ok")], process, true);
        let outcome = run_agent(&h.deps, &RunSession::new(), &h.page, "go").await;
        assert_eq!(outcome, RunOutcome::Completed);
        assert_eq!(h.client.requests().len(), 1);
    }

    #[tokio::test]
    async fn abort_before_start_sends_nothing_to_the_model() {
        let mut h = harness(vec![testsupport::text_reply("never")], home_process(), true);
        let session = RunSession::new();
        session.abort();
        let outcome = run_agent(&h.deps, &session, &h.page, "go").await;
        assert_eq!(outcome, RunOutcome::Aborted);
        assert!(h.client.requests().is_empty());
        let events = drain(&mut h.events);
        assert!(matches!(&events[0], AgentEvent::AgentMessage(m) if m.content == STOPPED_MESSAGE));
    }
}
