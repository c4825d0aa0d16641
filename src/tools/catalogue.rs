use super::*;
use serde_json::json;

fn tool(name: &str, description: &str, input_schema: serde_json::Value) -> ToolDefinition {
    ToolDefinition {
        name: name.into(),
        description: description.into(),
        input_schema,
    }
}

pub(super) fn definitions() -> Vec<ToolDefinition> {
    vec![
        tool(
            NAVIGATE,
            "Navigate the storefront tab to a URL. Use for going to the storefront home page or order tracking pages.",
            json!({
                "type": "object",
                "properties": {
                    "url": {"type": "string", "description": "Full URL to open (e.g. https://shop.example.com)"}
                },
                "required": ["url"]
            }),
        ),
        tool(
            CLICK,
            "Click an element on the page. Use a ref from the DOM snapshot (e.g. @e12).",
            json!({
                "type": "object",
                "properties": {
                    "ref": {"type": "string", "description": "Element ref from snapshot, e.g. @e12"}
                },
                "required": ["ref"]
            }),
        ),
        tool(
            TYPE_TEXT,
            "Type text into an input or textarea. Use the ref of the input from the snapshot.",
            json!({
                "type": "object",
                "properties": {
                    "ref": {"type": "string", "description": "Element ref of the input"},
                    "text": {"type": "string", "description": "Text to type"}
                },
                "required": ["ref", "text"]
            }),
        ),
        tool(
            PRESS_KEY,
            "Press a key on an element (e.g. Enter to submit a search box). Use the ref of the focused element, typically the same input you just typed in.",
            json!({
                "type": "object",
                "properties": {
                    "ref": {"type": "string", "description": "Element ref (e.g. the search input)"},
                    "key": {"type": "string", "description": "Key to press: use 'Enter' to submit forms/search"}
                },
                "required": ["ref", "key"]
            }),
        ),
        tool(
            SCROLL,
            "Scroll the page up or down to see more content (e.g. menu items, product lists).",
            json!({
                "type": "object",
                "properties": {
                    "direction": {"type": "string", "enum": ["up", "down"], "description": "Scroll direction"},
                    "amount": {"type": "number", "description": "Pixels to scroll (default 300)"}
                },
                "required": ["direction"]
            }),
        ),
        tool(
            SELECT_OPTION,
            "Select an option in a dropdown (select element). Use ref of the select and value to set.",
            json!({
                "type": "object",
                "properties": {
                    "ref": {"type": "string", "description": "Element ref of the select"},
                    "value": {"type": "string", "description": "Option value to select"}
                },
                "required": ["ref", "value"]
            }),
        ),
        tool(
            WAIT,
            "Wait for a number of seconds (e.g. for page load or animation to finish).",
            json!({
                "type": "object",
                "properties": {
                    "seconds": {"type": "number", "description": "Seconds to wait (1-10)"}
                },
                "required": ["seconds"]
            }),
        ),
        tool(
            GET_PAGE_STATE,
            "Re-capture the current DOM snapshot. Use after navigation or when the page may have changed.",
            json!({"type": "object", "properties": {}}),
        ),
        tool(
            ASK_USER,
            "Ask the user a question and wait for their answer. When the user must choose from a list, pass 'options' (array of strings) and 'recommended_index' (0-based index of your top pick). The UI shows the options with one marked as recommended. Use for confirmation before adding to cart or placing an order.",
            json!({
                "type": "object",
                "properties": {
                    "question": {"type": "string", "description": "Question to ask the user (e.g. 'Which restaurant?' or 'Proceed to checkout?')"},
                    "options": {
                        "type": "array",
                        "items": {"type": "string"},
                        "description": "Optional list of choices. Each string is one option; the chosen string is sent back verbatim as the answer."
                    },
                    "recommended_index": {
                        "type": "number",
                        "description": "0-based index into options for your recommended choice. Always set when options are provided."
                    }
                },
                "required": ["question"]
            }),
        ),
        tool(
            REPORT_STATUS,
            "Send a status update to the chat (e.g. 'Found restaurant X', 'Added item to cart').",
            json!({
                "type": "object",
                "properties": {
                    "message": {"type": "string", "description": "Status message to show the user"}
                },
                "required": ["message"]
            }),
        ),
    ]
}
