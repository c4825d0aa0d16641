//! Message routing between the three logical processes.
//!
//! - [`PageLink`] carries correlated request/response exchanges from the
//!   orchestrator to one page process. Every request travels with its own
//!   one-shot reply slot, so answers never need ordering across requests.
//! - [`background`] hosts the orchestrator-process actor that turns UI
//!   commands into agent runs and agent activity into UI events.

pub mod background;

use crate::error::RouterError;
use crate::page::protocol::{ActionResult, ContentRequest, ContentResponse, PageAction};
use crate::snapshot::Snapshot;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::timeout;
use tracing::debug;

pub use background::{spawn_background, BackgroundDeps, BackgroundHandle, UiCommand};

/// Queue depth of one page link.
const PAGE_QUEUE: usize = 32;

/// Envelope delivered to a page process.
#[derive(Debug)]
pub enum PageMessage {
    Content {
        request: ContentRequest,
        reply: oneshot::Sender<ContentResponse>,
    },
    Control(PageControl),
}

/// Host-level page operations. Only the host sends these.
#[derive(Debug)]
pub enum PageControl {
    /// Replace the document with the page at `url`.
    Load {
        url: String,
        reply: oneshot::Sender<Result<(), String>>,
    },
    /// Load the page-side executor into the current document.
    Inject { reply: oneshot::Sender<()> },
    CurrentUrl { reply: oneshot::Sender<String> },
}

/// Orchestrator-side end of a page process.
#[derive(Debug, Clone)]
pub struct PageLink {
    tx: mpsc::Sender<PageMessage>,
    request_timeout: Duration,
}

impl PageLink {
    /// Create a link plus the receiving end a page process consumes.
    pub fn channel(request_timeout: Duration) -> (Self, mpsc::Receiver<PageMessage>) {
        let (tx, rx) = mpsc::channel(PAGE_QUEUE);
        (
            Self {
                tx,
                request_timeout,
            },
            rx,
        )
    }

    /// Send one request and wait for its answer.
    ///
    /// A page without a listening executor drops the reply slot, which
    /// surfaces as [`RouterError::NoReceiver`] right away.
    pub async fn request(&self, request: ContentRequest) -> Result<ContentResponse, RouterError> {
        let (reply, answer) = oneshot::channel();
        self.tx
            .send(PageMessage::Content { request, reply })
            .await
            .map_err(|_| RouterError::Closed)?;
        match timeout(self.request_timeout, answer).await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(_)) => Err(RouterError::NoReceiver),
            Err(_) => {
                debug!(timeout_ms = self.request_timeout.as_millis() as u64, "page request timed out");
                Err(RouterError::Timeout)
            }
        }
    }

    pub async fn get_snapshot(&self, max_tokens: Option<usize>) -> Result<Snapshot, RouterError> {
        match self.request(ContentRequest::GetSnapshot { max_tokens }).await? {
            ContentResponse::PageSnapshot(snapshot) => Ok(snapshot),
            other => Err(RouterError::UnexpectedResponse(other.kind().to_string())),
        }
    }

    pub async fn execute(&self, action: PageAction) -> Result<ActionResult, RouterError> {
        match self.request(ContentRequest::ExecuteAction(action)).await? {
            ContentResponse::ActionResult(result) => Ok(result),
            other => Err(RouterError::UnexpectedResponse(other.kind().to_string())),
        }
    }

    pub(crate) async fn control(&self, control: PageControl) -> Result<(), RouterError> {
        self.tx
            .send(PageMessage::Control(control))
            .await
            .map_err(|_| RouterError::Closed)
    }

    /// True once the page process has shut down.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn dropped_reply_is_no_receiver() {
        let (link, mut rx) = PageLink::channel(Duration::from_secs(1));
        tokio::spawn(async move {
            while let Some(message) = rx.recv().await {
                drop(message);
            }
        });
        let err = link.get_snapshot(None).await.unwrap_err();
        assert_eq!(err, RouterError::NoReceiver);
    }

    #[tokio::test]
    async fn silent_page_times_out() {
        let (link, mut rx) = PageLink::channel(Duration::from_millis(20));
        let _keep = tokio::spawn(async move {
            let mut held = Vec::new();
            while let Some(message) = rx.recv().await {
                held.push(message);
            }
        });
        let err = link.get_snapshot(Some(10)).await.unwrap_err();
        assert_eq!(err, RouterError::Timeout);
    }

    #[tokio::test]
    async fn closed_page_is_reported() {
        let (link, rx) = PageLink::channel(Duration::from_secs(1));
        drop(rx);
        assert!(link.is_closed());
        let err = link
            .execute(PageAction::Wait { seconds: 0.0 })
            .await
            .unwrap_err();
        assert_eq!(err, RouterError::Closed);
    }

    #[tokio::test]
    async fn mismatched_response_type_is_rejected() {
        let (link, mut rx) = PageLink::channel(Duration::from_secs(1));
        tokio::spawn(async move {
            while let Some(PageMessage::Content { reply, .. }) = rx.recv().await {
                let _ = reply.send(ContentResponse::ActionResult(ActionResult::ok(None)));
            }
        });
        let err = link.get_snapshot(None).await.unwrap_err();
        assert_eq!(err, RouterError::UnexpectedResponse("ACTION_RESULT".into()));
    }
}
