//! Configuration data model.
//!
//! Struct and enum definitions plus default values. Source discovery and
//! precedence live in `config::loader` so parsing behavior stays in one place.

use serde::Deserialize;
use std::time::Duration;

use super::defaults::*;
use crate::page::SettleDelays;

/// Top-level runtime configuration.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub agent: AgentConfig,
    pub page: PageConfig,
}

/// How model requests leave the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoutingMode {
    /// Straight to the provider with the user's own key.
    Direct { endpoint: String, api_key: String },
    /// Through a backend that attaches credentials server-side.
    Relay { endpoint: String },
}

impl RoutingMode {
    pub fn endpoint(&self) -> &str {
        match self {
            Self::Direct { endpoint, .. } | Self::Relay { endpoint } => endpoint,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Direct { .. } => "direct",
            Self::Relay { .. } => "relay",
        }
    }
}

/// Model API settings.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ApiConfig {
    pub api_key: String,
    /// Name of an environment variable holding the key.
    pub api_key_env: Option<String>,
    /// Relay backend; when non-blank it wins over `api_key`.
    pub backend_url: String,
    /// Provider endpoint for direct mode.
    pub api_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_key_env: None,
            backend_url: String::new(),
            api_url: DEFAULT_API_URL.into(),
            model: DEFAULT_MODEL_ID.into(),
            max_tokens: DEFAULT_MAX_TOKENS,
            timeout_secs: DEFAULT_API_TIMEOUT_SECS,
        }
    }
}

impl ApiConfig {
    /// Relay when a backend is configured, direct otherwise.
    pub fn mode(&self) -> RoutingMode {
        let backend = self.backend_url.trim();
        if backend.is_empty() {
            RoutingMode::Direct {
                endpoint: self.api_url.trim().to_string(),
                api_key: self.api_key.trim().to_string(),
            }
        } else {
            RoutingMode::Relay {
                endpoint: format!("{}{RELAY_CHAT_PATH}", backend.trim_end_matches('/')),
            }
        }
    }

    /// False when there is neither a key nor a backend to route through.
    pub fn is_usable(&self) -> bool {
        !self.api_key.trim().is_empty() || !self.backend_url.trim().is_empty()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

/// Orchestrator settings.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct AgentConfig {
    pub max_iterations: usize,
    pub snapshot_max_tokens: usize,
    pub result_snapshot_chars: usize,
    /// Display name of the storefront used in the system prompt.
    pub site_name: String,
    /// Page opened when no storefront page is already loaded.
    pub home_url: Option<String>,
    /// Extra operator instructions appended to the system prompt.
    pub instructions: Option<String>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            snapshot_max_tokens: DEFAULT_SNAPSHOT_MAX_TOKENS,
            result_snapshot_chars: DEFAULT_RESULT_SNAPSHOT_CHARS,
            site_name: DEFAULT_SITE_NAME.into(),
            home_url: None,
            instructions: None,
        }
    }
}

/// Page-process timing.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct PageConfig {
    pub snapshot_attempts: u32,
    pub snapshot_retry_delay_ms: u64,
    /// Failed attempts before the executor is reinjected (once).
    pub inject_after_attempts: u32,
    pub inject_settle_ms: u64,
    pub navigate_settle_ms: u64,
    /// Delay after opening the home page in a fresh tab.
    pub open_settle_ms: u64,
    pub request_timeout_ms: u64,
    pub settle: SettleConfig,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            snapshot_attempts: DEFAULT_SNAPSHOT_ATTEMPTS,
            snapshot_retry_delay_ms: DEFAULT_SNAPSHOT_RETRY_DELAY_MS,
            inject_after_attempts: DEFAULT_INJECT_AFTER_ATTEMPTS,
            inject_settle_ms: DEFAULT_INJECT_SETTLE_MS,
            navigate_settle_ms: DEFAULT_NAVIGATE_SETTLE_MS,
            open_settle_ms: DEFAULT_OPEN_SETTLE_MS,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            settle: SettleConfig::default(),
        }
    }
}

impl PageConfig {
    /// Same retry structure with every delay set to zero; for tests and demos.
    pub fn immediate() -> Self {
        Self {
            snapshot_retry_delay_ms: 0,
            inject_settle_ms: 0,
            navigate_settle_ms: 0,
            open_settle_ms: 0,
            request_timeout_ms: 2000,
            settle: SettleConfig {
                click_ms: 0,
                type_text_ms: 0,
                press_key_ms: 0,
                scroll_ms: 0,
                select_option_ms: 0,
            },
            ..Self::default()
        }
    }

    pub fn settle_delays(&self) -> SettleDelays {
        SettleDelays {
            click: Duration::from_millis(self.settle.click_ms),
            type_text: Duration::from_millis(self.settle.type_text_ms),
            press_key: Duration::from_millis(self.settle.press_key_ms),
            scroll: Duration::from_millis(self.settle.scroll_ms),
            select_option: Duration::from_millis(self.settle.select_option_ms),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Per-action settle delays in milliseconds.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SettleConfig {
    pub click_ms: u64,
    pub type_text_ms: u64,
    pub press_key_ms: u64,
    pub scroll_ms: u64,
    pub select_option_ms: u64,
}

impl Default for SettleConfig {
    fn default() -> Self {
        let delays = SettleDelays::default();
        let ms = |d: Duration| u64::try_from(d.as_millis()).unwrap_or(u64::MAX);
        Self {
            click_ms: ms(delays.click),
            type_text_ms: ms(delays.type_text),
            press_key_ms: ms(delays.press_key),
            scroll_ms: ms(delays.scroll),
            select_option_ms: ms(delays.select_option),
        }
    }
}

/// Non-fatal observations made while loading.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigDiagnostics {
    pub warnings: Vec<String>,
}

/// Configuration payload plus load-time diagnostics.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: Config,
    pub diagnostics: ConfigDiagnostics,
}
