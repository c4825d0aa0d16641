//! Host-level capabilities the page process itself does not hold.
//!
//! Finding or opening the storefront page, navigating it, and (re)injecting
//! the page-side executor all go through [`Host`]. The orchestrator never
//! sends page-control messages directly.

use crate::error::HostError;
use crate::router::{PageControl, PageLink};
use async_trait::async_trait;
use reqwest::Url;
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{debug, info};

#[async_trait]
pub trait Host: Send + Sync {
    /// The storefront page, opening the home page first if needed.
    async fn target(&self) -> Result<PageLink, HostError>;

    /// Point `page` at `url`.
    async fn navigate(&self, page: &PageLink, url: &str) -> Result<(), HostError>;

    /// Load the executor into the page's current document.
    async fn inject_executor(&self, page: &PageLink) -> Result<(), HostError>;
}

/// A browser with one tab backed by a page process.
#[derive(Debug, Clone)]
pub struct SimulatedHost {
    tab: PageLink,
    home: Option<String>,
    injection: bool,
    open_settle: Duration,
}

impl SimulatedHost {
    pub fn new(tab: PageLink) -> Self {
        Self {
            tab,
            home: None,
            injection: true,
            open_settle: Duration::ZERO,
        }
    }

    /// Storefront home page; any page on the same host counts as the storefront.
    pub fn with_home(mut self, url: impl Into<String>) -> Self {
        self.home = Some(url.into());
        self
    }

    /// `false` models a page where injection is refused.
    pub fn with_injection(mut self, enabled: bool) -> Self {
        self.injection = enabled;
        self
    }

    /// Pause after opening the home page so it can finish rendering.
    pub fn with_open_settle(mut self, delay: Duration) -> Self {
        self.open_settle = delay;
        self
    }

    async fn current_url(&self) -> Result<String, HostError> {
        let (reply, url) = oneshot::channel();
        self.tab.control(PageControl::CurrentUrl { reply }).await?;
        url.await.map_err(|_| HostError::Unavailable)
    }

    async fn load(&self, page: &PageLink, url: &str) -> Result<(), HostError> {
        let (reply, loaded) = oneshot::channel();
        page.control(PageControl::Load {
            url: url.to_string(),
            reply,
        })
        .await?;
        loaded
            .await
            .map_err(|_| HostError::Unavailable)?
            .map_err(HostError::Navigation)
    }
}

fn same_site(current: &str, home: &str) -> bool {
    match (Url::parse(current), Url::parse(home)) {
        (Ok(current), Ok(home)) => current.host_str().is_some() && current.host_str() == home.host_str(),
        _ => false,
    }
}

#[async_trait]
impl Host for SimulatedHost {
    async fn target(&self) -> Result<PageLink, HostError> {
        if self.tab.is_closed() {
            return Err(HostError::Unavailable);
        }
        let current = self.current_url().await?;
        let Some(home) = &self.home else {
            // Without a home page, whatever real page is open is the target.
            return if current == "about:blank" {
                Err(HostError::Unavailable)
            } else {
                Ok(self.tab.clone())
            };
        };
        if same_site(&current, home) {
            debug!(url = %current, "storefront already open");
            return Ok(self.tab.clone());
        }
        info!(url = %home, "opening storefront");
        self.load(&self.tab, home).await?;
        if !self.open_settle.is_zero() {
            tokio::time::sleep(self.open_settle).await;
        }
        Ok(self.tab.clone())
    }

    async fn navigate(&self, page: &PageLink, url: &str) -> Result<(), HostError> {
        info!(url, "navigating");
        self.load(page, url).await
    }

    async fn inject_executor(&self, page: &PageLink) -> Result<(), HostError> {
        if !self.injection {
            return Err(HostError::Injection("scripts are not allowed on this page".into()));
        }
        let (reply, done) = oneshot::channel();
        page.control(PageControl::Inject { reply }).await?;
        done.await.map_err(|_| HostError::Unavailable)
    }
}
