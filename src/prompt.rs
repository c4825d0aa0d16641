//! System prompt and the seed user turn.
//!
//! The prompt body is `templates/system_prompt.template`; `{{NAME}}`
//! placeholders are filled from [`SystemPromptParams`].

use std::collections::BTreeMap;

const SYSTEM_PROMPT_TEMPLATE: &str = include_str!("templates/system_prompt.template");

/// Per-run values substituted into the prompt.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SystemPromptParams<'a> {
    pub site_name: &'a str,
    pub home_url: Option<&'a str>,
    pub enabled_tools: Vec<&'a str>,
    pub custom_instructions: Option<&'a str>,
}

/// Fill the template and collapse runs of blank lines left by empty sections.
pub fn render_system_prompt(params: SystemPromptParams<'_>) -> String {
    let vars = BTreeMap::from([
        ("SITE_NAME", params.site_name.trim().to_string()),
        ("HOME_NOTE", render_home_note(params.home_url)),
        ("ENABLED_TOOLS_LIST", render_enabled_tools(&params.enabled_tools)),
        (
            "CUSTOM_INSTRUCTIONS_BLOCK",
            render_custom_instructions(params.custom_instructions),
        ),
    ]);
    normalize_blank_lines(&fill_placeholders(SYSTEM_PROMPT_TEMPLATE, &vars))
}

/// First user turn: the initial snapshot plus the raw request.
pub fn user_context_block(snapshot: &str, request: &str) -> String {
    format!(
        "Current page snapshot:\n```\n{snapshot}\n```\n\nUser request: {request}\n\n\
         Use the tools to fulfill the user's request. Use refs from the snapshot (e.g. @e5) when clicking or typing."
    )
}

fn fill_placeholders(template: &str, vars: &BTreeMap<&str, String>) -> String {
    vars.iter().fold(template.to_string(), |text, (name, value)| {
        text.replace(&format!("{{{{{name}}}}}"), value)
    })
}

fn render_home_note(home_url: Option<&str>) -> String {
    match home_url.map(str::trim).filter(|s| !s.is_empty()) {
        Some(url) => format!(
            "The storefront home page is {url}. Do NOT navigate back to it once you have reached search results or a restaurant page."
        ),
        None => String::new(),
    }
}

fn render_enabled_tools(tools: &[&str]) -> String {
    if tools.is_empty() {
        return "- (no tools available)".to_string();
    }
    tools
        .iter()
        .map(|name| format!("- `{name}`"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_custom_instructions(custom: Option<&str>) -> String {
    let Some(custom) = custom.map(str::trim).filter(|s| !s.is_empty()) else {
        return String::new();
    };
    format!("Store-specific instructions:\n{custom}")
}

fn normalize_blank_lines(text: &str) -> String {
    let mut lines: Vec<&str> = Vec::new();
    for line in text.lines().map(str::trim_end) {
        if line.is_empty() && lines.last().is_some_and(|prev| prev.is_empty()) {
            continue;
        }
        lines.push(line);
    }
    lines.join("\n").trim().to_string()
}
