//! Orchestrator-process actor.
//!
//! Turns UI commands into agent runs and forwards everything those runs
//! publish. At most one run is active; its [`RunSession`] is the only place
//! abort flags and pending questions live.

use crate::agent::{
    self, run_agent, AgentDeps, AgentEvent, ConfigSummary, RunSession,
};
use crate::api::ModelClient;
use crate::config::{ApiConfig, Config};
use crate::error::RouterError;
use crate::host::Host;
use crate::tools::ToolRegistry;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

pub const NOT_CONFIGURED_MESSAGE: &str = "Set your API key or backend URL in Settings.";
pub const NO_STOREFRONT_MESSAGE: &str = "Could not open the storefront. Please try again.";
pub const BUSY_MESSAGE: &str =
    "Still working on the previous request. Stop it first to start a new one.";

const COMMAND_QUEUE: usize = 64;

/// Commands a chat UI sends to the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UiCommand {
    SendMessage { text: String },
    StopAgent,
    UserAnswer { id: String, answer: String },
    GetConfig,
}

/// Long-lived collaborators shared by every run.
#[derive(Clone)]
pub struct BackgroundDeps {
    pub config: Config,
    pub client: Arc<dyn ModelClient>,
    pub host: Arc<dyn Host>,
    pub tools: ToolRegistry,
}

/// Sending end of the background actor.
#[derive(Debug, Clone)]
pub struct BackgroundHandle {
    commands: mpsc::Sender<UiCommand>,
}

impl BackgroundHandle {
    pub async fn send(&self, command: UiCommand) -> Result<(), RouterError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| RouterError::Closed)
    }

    pub async fn send_message(&self, text: impl Into<String>) -> Result<(), RouterError> {
        self.send(UiCommand::SendMessage { text: text.into() }).await
    }

    pub async fn stop(&self) -> Result<(), RouterError> {
        self.send(UiCommand::StopAgent).await
    }

    pub async fn answer(
        &self,
        id: impl Into<String>,
        answer: impl Into<String>,
    ) -> Result<(), RouterError> {
        self.send(UiCommand::UserAnswer {
            id: id.into(),
            answer: answer.into(),
        })
        .await
    }
}

/// Spawn the actor. Dropping every handle stops it and aborts any active run.
pub fn spawn_background(
    deps: BackgroundDeps,
) -> (BackgroundHandle, mpsc::UnboundedReceiver<AgentEvent>) {
    let (command_tx, mut command_rx) = mpsc::channel::<UiCommand>(COMMAND_QUEUE);
    let (event_tx, event_rx) = mpsc::unbounded_channel::<AgentEvent>();

    tokio::spawn(async move {
        let (finished_tx, mut finished_rx) = mpsc::unbounded_channel::<u64>();
        let mut actor = Background {
            deps,
            events: event_tx,
            finished: finished_tx,
            active: None,
            next_run: 1,
        };

        loop {
            tokio::select! {
                command = command_rx.recv() => match command {
                    Some(command) => actor.handle(command),
                    None => break,
                },
                Some(run_id) = finished_rx.recv() => actor.finish(run_id),
            }
        }

        if let Some(active) = actor.active.take() {
            active.session.abort();
        }
        debug!("background router stopped");
    });

    (
        BackgroundHandle {
            commands: command_tx,
        },
        event_rx,
    )
}

struct ActiveRun {
    id: u64,
    session: Arc<RunSession>,
}

struct Background {
    deps: BackgroundDeps,
    events: mpsc::UnboundedSender<AgentEvent>,
    finished: mpsc::UnboundedSender<u64>,
    active: Option<ActiveRun>,
    next_run: u64,
}

impl Background {
    fn emit(&self, event: AgentEvent) {
        let _ = self.events.send(event);
    }

    fn handle(&mut self, command: UiCommand) {
        match command {
            UiCommand::SendMessage { text } => self.start_run(text),
            UiCommand::StopAgent => match &self.active {
                Some(active) => {
                    info!(run = active.id, "stop requested");
                    active.session.abort();
                }
                None => debug!("stop requested with no active run"),
            },
            UiCommand::UserAnswer { id, answer } => {
                let delivered = self
                    .active
                    .as_ref()
                    .is_some_and(|active| active.session.answer(&id, answer));
                if !delivered {
                    warn!(id = %id, "answer for a question nobody is waiting on");
                }
            }
            UiCommand::GetConfig => self.emit(AgentEvent::Config(summarize(&self.deps.config.api))),
        }
    }

    fn start_run(&mut self, text: String) {
        let text = text.trim().to_string();
        if text.is_empty() {
            debug!("ignoring blank message");
            return;
        }
        if self.active.is_some() {
            self.emit(AgentEvent::message(agent::message_id("err"), BUSY_MESSAGE));
            return;
        }
        if !self.deps.config.api.is_usable() {
            self.emit(AgentEvent::message(agent::message_id("err"), NOT_CONFIGURED_MESSAGE));
            self.emit(AgentEvent::done(Some(NOT_CONFIGURED_MESSAGE.to_string())));
            return;
        }

        let run_id = self.next_run;
        self.next_run += 1;
        let session = Arc::new(RunSession::new());
        self.active = Some(ActiveRun {
            id: run_id,
            session: session.clone(),
        });

        let deps = AgentDeps {
            config: self.deps.config.clone(),
            client: self.deps.client.clone(),
            host: self.deps.host.clone(),
            tools: self.deps.tools.clone(),
            events: self.events.clone(),
        };
        let finished = self.finished.clone();
        info!(run = run_id, "starting run");
        tokio::spawn(async move {
            match deps.host.target().await {
                Ok(page) => {
                    run_agent(&deps, &session, &page, &text).await;
                }
                Err(err) => {
                    warn!(error = %err, "no storefront tab");
                    let _ = deps
                        .events
                        .send(AgentEvent::message(agent::message_id("err"), NO_STOREFRONT_MESSAGE));
                    let _ = deps
                        .events
                        .send(AgentEvent::done(Some(NO_STOREFRONT_MESSAGE.to_string())));
                }
            }
            let _ = finished.send(run_id);
        });
    }

    fn finish(&mut self, run_id: u64) {
        if self.active.as_ref().is_some_and(|active| active.id == run_id) {
            debug!(run = run_id, "run released");
            self.active = None;
        }
    }
}

fn summarize(api: &ApiConfig) -> ConfigSummary {
    ConfigSummary {
        mode: api.mode().label().to_string(),
        model: api.model.clone(),
        backend_url: api.backend_url.trim().to_string(),
        has_api_key: !api.api_key.trim().is_empty(),
    }
}
