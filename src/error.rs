//! Unified error types for the agent.

use std::fmt;

// ---------------------------------------------------------------------------
// ToolError
// ---------------------------------------------------------------------------

/// Errors raised while validating a tool call the model requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolError {
    /// The model asked for a name outside the catalogue.
    UnknownTool(String),
    /// The model supplied arguments the tool couldn't accept.
    InvalidArguments(String),
}

impl fmt::Display for ToolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownTool(name) => write!(f, "Unknown tool: {name}"),
            Self::InvalidArguments(msg) => write!(f, "Invalid arguments: {msg}"),
        }
    }
}

impl std::error::Error for ToolError {}

// ---------------------------------------------------------------------------
// ActionError
// ---------------------------------------------------------------------------

/// Kind of element an action needed but did not get.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpectedElement {
    Input,
    Select,
}

/// Uniform failures of the page-side action executor.
///
/// The `Display` text is what the model sees (after an `Error: ` prefix), so
/// it stays short and mentions the reference verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionError {
    ElementNotFound(String),
    WrongElementKind {
        reference: String,
        expected: ExpectedElement,
    },
    UnsupportedAction(String),
    /// `navigate` reached the page process instead of the host.
    NavigationNotHandled,
}

impl fmt::Display for ActionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ElementNotFound(reference) => write!(f, "Element not found: {reference}"),
            Self::WrongElementKind {
                reference,
                expected: ExpectedElement::Input,
            } => write!(f, "Element is not an input: {reference}"),
            Self::WrongElementKind {
                reference,
                expected: ExpectedElement::Select,
            } => write!(f, "Element is not a select: {reference}"),
            Self::UnsupportedAction(name) => write!(f, "Unknown action: {name}"),
            Self::NavigationNotHandled => {
                write!(f, "navigate is handled by the host, not the page")
            }
        }
    }
}

impl std::error::Error for ActionError {}

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// Errors when loading or parsing configuration.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Toml(toml::de::Error),
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "io: {e}"),
            Self::Toml(e) => write!(f, "toml: {e}"),
            Self::Invalid(msg) => write!(f, "invalid config: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(e: toml::de::Error) -> Self {
        Self::Toml(e)
    }
}

// ---------------------------------------------------------------------------
// ApiError
// ---------------------------------------------------------------------------

/// Errors from the HTTP API layer.
#[derive(Debug)]
pub enum ApiError {
    /// Network / reqwest-level error.
    Http(reqwest::Error),
    /// Non-2xx status from the provider or relay.
    Status { code: u16, body: String },
    /// The body could not be interpreted as a messages response.
    InvalidResponse(String),
}

impl ApiError {
    /// HTTP status code for status-class failures.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { code, .. } => Some(*code),
            _ => None,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http(e) => write!(f, "http: {e}"),
            Self::Status { code, body } => write!(f, "API error {code}: {body}"),
            Self::InvalidResponse(msg) => write!(f, "invalid response: {msg}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        Self::Http(e)
    }
}

// ---------------------------------------------------------------------------
// RouterError
// ---------------------------------------------------------------------------

/// Failures of a cross-process request/response exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouterError {
    /// The receiving process has shut down.
    Closed,
    /// The request was delivered but nobody answered it.
    NoReceiver,
    /// No answer arrived within the link timeout.
    Timeout,
    /// The answer had the wrong message type for the request.
    UnexpectedResponse(String),
}

impl fmt::Display for RouterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Closed => write!(f, "page process is gone"),
            Self::NoReceiver => write!(
                f,
                "Could not establish connection. Receiving end does not exist."
            ),
            Self::Timeout => write!(f, "page did not respond in time"),
            Self::UnexpectedResponse(kind) => write!(f, "unexpected page response: {kind}"),
        }
    }
}

impl std::error::Error for RouterError {}

// ---------------------------------------------------------------------------
// HostError
// ---------------------------------------------------------------------------

/// Failures of host-level capabilities (navigation, executor injection).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    Navigation(String),
    Injection(String),
    Unavailable,
}

impl fmt::Display for HostError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Navigation(msg) => write!(f, "navigation failed: {msg}"),
            Self::Injection(msg) => write!(f, "could not inject page executor: {msg}"),
            Self::Unavailable => write!(f, "target is no longer available"),
        }
    }
}

impl std::error::Error for HostError {}

impl From<RouterError> for HostError {
    fn from(_: RouterError) -> Self {
        Self::Unavailable
    }
}
