//! Tool catalogue offered to the model.
//!
//! The registry is pure data: names, descriptions and argument schemas. What a
//! call actually does is decided by the agent loop after the arguments have
//! been validated into a typed [`ToolInput`].

mod catalogue;
pub mod input;

use crate::error::ToolError;
use crate::types::ToolDefinition;

pub use input::{AskUserArgs, ToolInput};

pub const NAVIGATE: &str = "navigate";
pub const CLICK: &str = "click";
pub const TYPE_TEXT: &str = "type_text";
pub const PRESS_KEY: &str = "press_key";
pub const SCROLL: &str = "scroll";
pub const SELECT_OPTION: &str = "select_option";
pub const WAIT: &str = "wait";
pub const GET_PAGE_STATE: &str = "get_page_state";
pub const ASK_USER: &str = "ask_user";
pub const REPORT_STATUS: &str = "report_status";

/// Registry of tool definitions sent with every model request.
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    tools: Vec<ToolDefinition>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    /// The storefront agent's full catalogue.
    pub fn storefront() -> Self {
        let mut registry = Self::new();
        for definition in catalogue::definitions() {
            registry.register(definition);
        }
        registry
    }

    /// Register a definition, replacing any previous one with the same name.
    pub fn register(&mut self, definition: ToolDefinition) {
        self.tools.retain(|existing| existing.name != definition.name);
        self.tools.push(definition);
    }

    /// Get tool definitions for the API request.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.clone()
    }

    pub fn get(&self, name: &str) -> Option<&ToolDefinition> {
        self.tools.iter().find(|tool| tool.name == name)
    }

    /// Validate a model-issued call against the catalogue.
    pub fn parse_call(&self, name: &str, input: &serde_json::Value) -> Result<ToolInput, ToolError> {
        if self.get(name).is_none() {
            return Err(ToolError::UnknownTool(name.to_string()));
        }
        ToolInput::parse(name, input)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// True if no tools are registered.
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
