//! The page process: one live document served over a [`PageLink`].
//!
//! The process answers content requests one at a time, so at most one action
//! is ever in flight against the document. Host control messages (load a
//! URL, inject the executor) are interleaved in arrival order.

use super::driver::{ElementKind, Interaction, PageDriver};
use super::executor::ActionExecutor;
use super::protocol::{ContentRequest, ContentResponse};
use crate::dom::{DomEvent, DomEventKind, Document, NodeId};
use crate::router::{PageControl, PageLink, PageMessage};
use crate::snapshot::{Snapshot, DEFAULT_MAX_TOKENS};
use reqwest::Url;
use std::collections::BTreeMap;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// What a site script wants to happen after an interaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptEffect {
    Stay,
    /// Load another page, as a link click or form submission would.
    Navigate(String),
}

/// Site behaviour: reacts to the events one interaction produced.
pub trait PageScript: Send {
    fn react(&mut self, doc: &mut Document, events: &[DomEvent]) -> ScriptEffect;
}

impl<F> PageScript for F
where
    F: FnMut(&mut Document, &[DomEvent]) -> ScriptEffect + Send,
{
    fn react(&mut self, doc: &mut Document, events: &[DomEvent]) -> ScriptEffect {
        self(doc, events)
    }
}

/// Default behaviour: a click on (or inside) `<a href>` follows the link.
#[derive(Debug, Default, Clone, Copy)]
pub struct FollowLinks;

impl PageScript for FollowLinks {
    fn react(&mut self, doc: &mut Document, events: &[DomEvent]) -> ScriptEffect {
        events
            .iter()
            .filter(|event| event.kind == DomEventKind::Click)
            .filter_map(|event| event.target)
            .find_map(|target| link_target(doc, target))
            .map_or(ScriptEffect::Stay, ScriptEffect::Navigate)
    }
}

fn link_target(doc: &Document, node: NodeId) -> Option<String> {
    let mut current = Some(node);
    while let Some(id) = current {
        if doc.tag(id) == Some("a") {
            let href = doc.attr(id, "href")?.trim();
            if href.is_empty() || href.starts_with('#') || href.starts_with("javascript:") {
                return None;
            }
            return resolve_url(doc.url(), href);
        }
        current = doc.parent(id);
    }
    None
}

/// Resolve `href` against `base`, as a browser would for a link.
pub fn resolve_url(base: &str, href: &str) -> Option<String> {
    let base = Url::parse(base).ok()?;
    base.join(href).ok().map(String::from)
}

fn normalize_url(url: &str) -> String {
    match Url::parse(url.trim()) {
        Ok(mut parsed) => {
            parsed.set_fragment(None);
            parsed.into()
        }
        Err(_) => url.trim().to_string(),
    }
}

/// The pages a simulated browser can load, keyed by URL.
#[derive(Debug, Clone, Default)]
pub struct Site {
    pages: BTreeMap<String, String>,
}

impl Site {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: &str, html: impl Into<String>) -> Self {
        self.insert(url, html);
        self
    }

    pub fn insert(&mut self, url: &str, html: impl Into<String>) {
        self.pages.insert(normalize_url(url), html.into());
    }

    /// HTML served at `url` (fragment ignored).
    pub fn html(&self, url: &str) -> Option<&str> {
        self.pages.get(&normalize_url(url)).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

/// Builder for a page process.
pub struct PageProcess {
    site: Site,
    script: Box<dyn PageScript>,
    executor: ActionExecutor,
    content_scripts: bool,
    start_url: Option<String>,
}

impl PageProcess {
    pub fn new(site: Site) -> Self {
        Self {
            site,
            script: Box::new(FollowLinks),
            executor: ActionExecutor::default(),
            content_scripts: true,
            start_url: None,
        }
    }

    pub fn with_script(mut self, script: impl PageScript + 'static) -> Self {
        self.script = Box::new(script);
        self
    }

    pub fn with_executor(mut self, executor: ActionExecutor) -> Self {
        self.executor = executor;
        self
    }

    /// Pages do not get the executor on load; it must be injected.
    pub fn without_content_scripts(mut self) -> Self {
        self.content_scripts = false;
        self
    }

    /// Start on `url` instead of a blank page.
    pub fn open(mut self, url: &str) -> Self {
        self.start_url = Some(url.to_string());
        self
    }

    /// Spawn the process on the current tokio runtime.
    pub fn spawn(self, request_timeout: Duration) -> PageLink {
        let (link, rx) = PageLink::channel(request_timeout);
        let mut page = LivePage {
            doc: Document::empty("about:blank"),
            site: self.site,
            script: self.script,
            content_scripts: self.content_scripts,
            executor_loaded: false,
        };
        if let Some(url) = self.start_url {
            if let Err(err) = page.load(&url) {
                warn!(url = %url, error = %err, "start page not found; staying blank");
            }
        }
        tokio::spawn(page.run(self.executor, rx));
        link
    }
}

struct LivePage {
    doc: Document,
    site: Site,
    script: Box<dyn PageScript>,
    content_scripts: bool,
    executor_loaded: bool,
}

impl LivePage {
    fn load(&mut self, url: &str) -> Result<(), String> {
        let url = normalize_url(url);
        let html = self
            .site
            .html(&url)
            .ok_or_else(|| format!("no page at {url}"))?;
        self.doc = Document::parse(url.clone(), html);
        self.executor_loaded = self.content_scripts;
        info!(url = %url, executor = self.executor_loaded, "page loaded");
        Ok(())
    }

    async fn run(mut self, executor: ActionExecutor, mut rx: mpsc::Receiver<PageMessage>) {
        while let Some(message) = rx.recv().await {
            match message {
                PageMessage::Content { request, reply } => {
                    if !self.executor_loaded {
                        // Nobody is listening on this page: the reply slot is dropped.
                        debug!(url = %self.doc.url(), "no executor on page; request dropped");
                        continue;
                    }
                    let response = match request {
                        ContentRequest::GetSnapshot { max_tokens } => ContentResponse::PageSnapshot(
                            self.snapshot(max_tokens.unwrap_or(DEFAULT_MAX_TOKENS)),
                        ),
                        ContentRequest::ExecuteAction(action) => {
                            ContentResponse::ActionResult(executor.execute(&mut self, &action).await)
                        }
                    };
                    if reply.send(response).is_err() {
                        debug!("requester left before the page answered");
                    }
                }
                PageMessage::Control(control) => self.control(control),
            }
        }
        debug!("page process stopped");
    }

    fn control(&mut self, control: PageControl) {
        match control {
            PageControl::Load { url, reply } => {
                let _ = reply.send(self.load(&url));
            }
            PageControl::Inject { reply } => {
                self.executor_loaded = true;
                debug!(url = %self.doc.url(), "executor injected");
                let _ = reply.send(());
            }
            PageControl::CurrentUrl { reply } => {
                let _ = reply.send(self.doc.url().to_string());
            }
        }
    }
}

impl PageDriver for LivePage {
    type Handle = NodeId;

    fn locate(&self, reference: &str) -> Option<NodeId> {
        self.doc.locate(reference)
    }

    fn kind(&self, handle: NodeId) -> ElementKind {
        self.doc.kind(handle)
    }

    fn perform(&mut self, interaction: Interaction, target: Option<NodeId>) {
        let before = self.doc.events().len();
        self.doc.perform(interaction, target);
        let events = self.doc.events()[before..].to_vec();
        if let ScriptEffect::Navigate(url) = self.script.react(&mut self.doc, &events) {
            if let Err(err) = self.load(&url) {
                warn!(url = %url, error = %err, "navigation target missing; staying on page");
            }
        }
    }

    fn snapshot(&mut self, max_tokens: usize) -> Snapshot {
        self.doc.snapshot(max_tokens)
    }
}
