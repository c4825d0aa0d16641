//! Per-run session state: the abort flag and the pending-question table.
//!
//! A session is created for one run and dropped with it, so two runs never
//! share an abort flag or see each other's questions.

use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use tokio::sync::{oneshot, watch};
use tracing::debug;

/// Where a run currently is. Published for progress indicators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RunState {
    Init,
    AwaitingSnapshot,
    Conversing { iteration: usize },
    ExecutingTool { tool: String },
    AwaitingUserAnswer { question_id: String },
    Done,
    Aborted,
    Failed,
}

impl RunState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Aborted | Self::Failed)
    }
}

#[derive(Debug)]
pub struct RunSession {
    abort: watch::Sender<bool>,
    state: watch::Sender<RunState>,
    questions: Mutex<HashMap<String, oneshot::Sender<String>>>,
}

impl Default for RunSession {
    fn default() -> Self {
        Self::new()
    }
}

impl RunSession {
    pub fn new() -> Self {
        Self {
            abort: watch::Sender::new(false),
            state: watch::Sender::new(RunState::Init),
            questions: Mutex::new(HashMap::new()),
        }
    }

    /// Request a stop. The loop notices at its next iteration boundary.
    ///
    /// Outstanding questions are withdrawn so a run suspended on one can
    /// reach that boundary.
    pub fn abort(&self) {
        self.abort.send_replace(true);
        let withdrawn = self.questions().drain().count();
        if withdrawn > 0 {
            debug!(withdrawn, "pending questions withdrawn by abort");
        }
    }

    pub fn is_aborted(&self) -> bool {
        *self.abort.borrow()
    }

    pub fn state(&self) -> RunState {
        self.state.borrow().clone()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<RunState> {
        self.state.subscribe()
    }

    pub(crate) fn set_state(&self, state: RunState) {
        self.state.send_replace(state);
    }

    /// Register a question and return the slot its answer will arrive in.
    ///
    /// `None` once the session is aborted. The flag is read under the table
    /// lock, which `abort` only takes after setting it.
    pub(crate) fn register_question(&self, id: &str) -> Option<oneshot::Receiver<String>> {
        let mut questions = self.questions();
        if self.is_aborted() {
            return None;
        }
        let (tx, rx) = oneshot::channel();
        questions.insert(id.to_string(), tx);
        Some(rx)
    }

    /// Deliver an answer. Returns `false` for unknown or already-answered ids.
    pub fn answer(&self, id: &str, answer: impl Into<String>) -> bool {
        let Some(slot) = self.questions().remove(id) else {
            return false;
        };
        slot.send(answer.into()).is_ok()
    }

    pub fn pending_question_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.questions().keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Some pending question id.
    ///
    /// Which one is unspecified when several are open; callers that may
    /// have more than one question outstanding should answer by id instead.
    pub fn first_pending_question(&self) -> Option<String> {
        self.questions().keys().next().cloned()
    }

    fn questions(&self) -> MutexGuard<'_, HashMap<String, oneshot::Sender<String>>> {
        // A poisoned table still holds valid senders.
        self.questions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
