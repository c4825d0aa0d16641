//! Action executor: one page action in, one [`ActionResult`] out.

use super::driver::{ElementKind, Interaction, PageDriver};
use super::protocol::{ActionResult, PageAction, DEFAULT_SCROLL_AMOUNT};
use crate::dom::KeyStroke;
use crate::error::{ActionError, ExpectedElement};
use crate::snapshot::{Snapshot, DEFAULT_MAX_TOKENS};
use std::time::Duration;
use tokio::time::sleep;
use tracing::debug;

/// Longest pause a `wait` action may request.
pub const MAX_WAIT_SECS: f64 = 10.0;

/// Fixed pause after each interaction so the page's own reactions land
/// before the follow-up snapshot. Not adaptive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettleDelays {
    pub click: Duration,
    pub type_text: Duration,
    pub press_key: Duration,
    pub scroll: Duration,
    pub select_option: Duration,
}

impl Default for SettleDelays {
    fn default() -> Self {
        Self {
            click: Duration::from_millis(700),
            type_text: Duration::from_millis(600),
            press_key: Duration::from_millis(800),
            scroll: Duration::from_millis(500),
            select_option: Duration::from_millis(300),
        }
    }
}

impl SettleDelays {
    /// No settling at all; used by tests and scripted pages.
    pub fn none() -> Self {
        Self {
            click: Duration::ZERO,
            type_text: Duration::ZERO,
            press_key: Duration::ZERO,
            scroll: Duration::ZERO,
            select_option: Duration::ZERO,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ActionExecutor {
    settle: SettleDelays,
    snapshot_tokens: usize,
}

impl Default for ActionExecutor {
    fn default() -> Self {
        Self::new(SettleDelays::default())
    }
}

impl ActionExecutor {
    pub fn new(settle: SettleDelays) -> Self {
        Self {
            settle,
            snapshot_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    /// Token budget of the snapshot attached to each result.
    pub fn with_snapshot_tokens(mut self, tokens: usize) -> Self {
        self.snapshot_tokens = tokens;
        self
    }

    /// Run `action` against `driver`. Failures come back as unsuccessful
    /// results, never as panics or transport errors.
    pub async fn execute<D>(&self, driver: &mut D, action: &PageAction) -> ActionResult
    where
        D: PageDriver + Send,
    {
        match self.apply(driver, action).await {
            Ok(snapshot) => ActionResult::ok(snapshot),
            Err(err) => {
                debug!(action = action.name(), error = %err, "page action failed");
                ActionResult::failed(err)
            }
        }
    }

    async fn apply<D>(
        &self,
        driver: &mut D,
        action: &PageAction,
    ) -> Result<Option<Snapshot>, ActionError>
    where
        D: PageDriver + Send,
    {
        let (interaction, target, settle) = match action {
            PageAction::Click { reference } => (
                Interaction::Click,
                Some(locate(driver, reference)?),
                self.settle.click,
            ),
            PageAction::TypeText { reference, text } => {
                let handle = locate(driver, reference)?;
                expect_kind(driver, handle, reference, ExpectedElement::Input)?;
                (
                    Interaction::SetText(text.clone()),
                    Some(handle),
                    self.settle.type_text,
                )
            }
            PageAction::PressKey { reference, key } => (
                Interaction::Key(KeyStroke::named(key)),
                Some(locate(driver, reference)?),
                self.settle.press_key,
            ),
            PageAction::Scroll { direction, amount } => (
                Interaction::ScrollBy(direction.delta(amount.unwrap_or(DEFAULT_SCROLL_AMOUNT))),
                None,
                self.settle.scroll,
            ),
            PageAction::SelectOption { reference, value } => {
                let handle = locate(driver, reference)?;
                expect_kind(driver, handle, reference, ExpectedElement::Select)?;
                (
                    Interaction::Choose(value.clone()),
                    Some(handle),
                    self.settle.select_option,
                )
            }
            PageAction::Wait { seconds } => {
                sleep(wait_duration(*seconds)).await;
                return Ok(None);
            }
            PageAction::Navigate { .. } => return Err(ActionError::NavigationNotHandled),
        };

        debug!(action = action.name(), reference = ?action.reference(), "performing page action");
        driver.perform(interaction, target);
        if !settle.is_zero() {
            sleep(settle).await;
        }
        Ok(Some(driver.snapshot(self.snapshot_tokens)))
    }
}

fn locate<D: PageDriver>(driver: &D, reference: &str) -> Result<D::Handle, ActionError> {
    driver
        .locate(reference)
        .ok_or_else(|| ActionError::ElementNotFound(reference.to_string()))
}

fn expect_kind<D: PageDriver>(
    driver: &D,
    handle: D::Handle,
    reference: &str,
    expected: ExpectedElement,
) -> Result<(), ActionError> {
    let wanted = match expected {
        ExpectedElement::Input => ElementKind::TextEntry,
        ExpectedElement::Select => ElementKind::Choice,
    };
    if driver.kind(handle) == wanted {
        Ok(())
    } else {
        Err(ActionError::WrongElementKind {
            reference: reference.to_string(),
            expected,
        })
    }
}

/// Requested wait, clamped to `0..=MAX_WAIT_SECS`. NaN waits nothing.
fn wait_duration(seconds: f64) -> Duration {
    if seconds.is_nan() {
        return Duration::ZERO;
    }
    Duration::from_secs_f64(seconds.clamp(0.0, MAX_WAIT_SECS))
}
