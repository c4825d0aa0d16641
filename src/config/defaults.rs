//! Default configuration constants.
//!
//! Keeping defaults in one module lets the types, the loader and the tests
//! share the same literals.

/// Embedded `errand.toml` template documenting every key.
pub const DEFAULT_CONFIG_TEMPLATE: &str = include_str!("../templates/errand.toml");
/// Default provider model ID.
pub(super) const DEFAULT_MODEL_ID: &str = "claude-sonnet-4-20250514";
/// Messages endpoint used in direct mode.
pub(super) const DEFAULT_API_URL: &str = "https://api.anthropic.com/v1/messages";
/// Path appended to the backend URL in relay mode.
pub(super) const RELAY_CHAT_PATH: &str = "/api/chat";
pub(super) const DEFAULT_MAX_TOKENS: u32 = 4096;
/// Default timeout for model API requests.
pub(super) const DEFAULT_API_TIMEOUT_SECS: u64 = 120;

pub(super) const DEFAULT_MAX_ITERATIONS: usize = 55;
pub(super) const DEFAULT_SNAPSHOT_MAX_TOKENS: usize = 3000;
/// Ceiling on the snapshot copy carried inside a tool result.
pub(super) const DEFAULT_RESULT_SNAPSHOT_CHARS: usize = 12_000;
pub(super) const DEFAULT_SITE_NAME: &str = "the storefront";

pub(super) const DEFAULT_SNAPSHOT_ATTEMPTS: u32 = 6;
pub(super) const DEFAULT_SNAPSHOT_RETRY_DELAY_MS: u64 = 2000;
pub(super) const DEFAULT_INJECT_AFTER_ATTEMPTS: u32 = 3;
pub(super) const DEFAULT_INJECT_SETTLE_MS: u64 = 2500;
pub(super) const DEFAULT_NAVIGATE_SETTLE_MS: u64 = 3000;
pub(super) const DEFAULT_OPEN_SETTLE_MS: u64 = 4500;
/// Long enough for a clamped 10s `wait` plus its settle delay.
pub(super) const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;
