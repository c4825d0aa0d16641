//! Page → text projection handed to the model.
//!
//! Every call is a full recompute: old `data-agent-ref` markers are cleared,
//! then emitted elements are renumbered `@e1`, `@e2`, ... in walk order. A
//! visible modal is rendered first under its own heading and left out of the
//! main-page walk.

use crate::dom::{Document, Element, NodeId};
use crate::textutil::{char_len, collapse_whitespace, prefix_by_chars, truncate_with_suffix_by_chars};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Coarse token → character conversion used for the snapshot budget.
pub const CHARS_PER_TOKEN: usize = 4;
/// Token budget used when a request does not name one.
pub const DEFAULT_MAX_TOKENS: usize = 3000;
/// Attribute written onto every referenced element.
pub const REF_ATTR: &str = "data-agent-ref";
/// Final line of a snapshot cut short by its budget.
pub const TRUNCATION_MARKER: &str = "... (snapshot truncated)";

const MODAL_HEADING: &str = "[modal - handle this first]";
const MAIN_HEADING: &str = "[main page]";
const MAX_NODE_TEXT_CHARS: usize = 100;
const MAX_HREF_CHARS: usize = 80;

const SKIP_TAGS: &[&str] = &[
    "script", "style", "noscript", "iframe", "object", "embed", "svg", "path", "defs", "clippath",
];
const INTERACTIVE_TAGS: &[&str] = &["a", "button", "input", "select", "textarea", "summary"];
const INTERACTIVE_ROLES: &[&str] = &[
    "button", "link", "tab", "option", "checkbox", "radio", "menuitem",
];
const LANDMARKS: &[&str] = &[
    "section", "header", "nav", "main", "article", "heading", "img",
];

/// Point-in-time projection of a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub url: String,
    pub title: String,
    /// Line-oriented serialization, at most `max_tokens * CHARS_PER_TOKEN` chars.
    #[serde(rename = "snapshot")]
    pub text: String,
    /// `@eN` → selector locating the marked element.
    #[serde(rename = "refMap")]
    pub ref_map: BTreeMap<String, String>,
}

/// Build a fresh snapshot of `doc`, re-marking referenced elements.
pub fn extract_snapshot(doc: &mut Document, max_tokens: usize) -> Snapshot {
    clear_refs(doc);

    let title = match doc.title() {
        title if title.is_empty() => "Untitled".to_string(),
        title => title,
    };
    let mut out = Output::new(max_tokens.saturating_mul(CHARS_PER_TOKEN));
    let mut walk = Walk {
        next_ref: 1,
        ref_map: BTreeMap::new(),
        marks: Vec::new(),
    };

    if out.push(&format!("[page] {title}")) {
        let modal = find_visible_modal(doc);
        let mut open = true;
        if let Some(modal) = modal {
            open = out.push("")
                && out.push(MODAL_HEADING)
                && walk.visit(doc, modal, 0, None, &mut out)
                && out.push("")
                && out.push(MAIN_HEADING);
        }
        if open {
            walk.visit(doc, doc.body(), 0, modal, &mut out);
        }
    }

    for (node, id) in walk.marks {
        doc.set_attr(node, REF_ATTR, id);
    }
    Snapshot {
        url: doc.url().to_string(),
        title,
        text: out.text,
        ref_map: walk.ref_map,
    }
}

/// Find the element currently marked with `reference` (`@eN` or `eN`).
pub fn resolve_ref(doc: &Document, reference: &str) -> Option<NodeId> {
    let id = reference.trim().trim_start_matches('@');
    if id.is_empty() {
        return None;
    }
    doc.find_first(doc.root(), |el| {
        el.attrs.get(REF_ATTR).is_some_and(|mark| mark == id)
    })
}

fn clear_refs(doc: &mut Document) {
    for node in doc.find_all(doc.root(), |el| el.attrs.contains_key(REF_ATTR)) {
        doc.remove_attr(node, REF_ATTR);
    }
}

fn find_visible_modal(doc: &Document) -> Option<NodeId> {
    doc.find_all(doc.root(), is_modal_candidate)
        .into_iter()
        .find(|node| doc.is_rendered(*node))
}

fn is_modal_candidate(el: &Element) -> bool {
    let attr = |name: &str| el.attrs.get(name).map(String::as_str);
    attr("role") == Some("dialog")
        || attr("aria-modal") == Some("true")
        || attr("data-testid").is_some_and(|id| id.contains("modal"))
        || (el.class_contains("modal") && el.class_contains("open"))
        || el.class_contains("Modal")
}

/// Budgeted line sink. Once a line is refused the sink stays closed.
struct Output {
    budget: usize,
    text: String,
    len: usize,
    closed: bool,
}

impl Output {
    fn new(budget: usize) -> Self {
        Self {
            budget,
            text: String::new(),
            len: 0,
            closed: false,
        }
    }

    fn separator(&self) -> usize {
        usize::from(!self.text.is_empty())
    }

    /// Append `line`, or close the sink with the truncation marker when the
    /// line and a later marker would not both fit.
    fn push(&mut self, line: &str) -> bool {
        if self.closed {
            return false;
        }
        let sep = self.separator();
        let marker_len = char_len(TRUNCATION_MARKER);
        let needed = self.len + sep + char_len(line) + 1 + marker_len;
        if needed > self.budget {
            self.close();
            return false;
        }
        if sep == 1 {
            self.text.push('\n');
        }
        self.text.push_str(line);
        self.len += sep + char_len(line);
        true
    }

    fn close(&mut self) {
        self.closed = true;
        let sep = self.separator();
        let marker_len = char_len(TRUNCATION_MARKER);
        if self.len + sep + marker_len <= self.budget {
            if sep == 1 {
                self.text.push('\n');
            }
            self.text.push_str(TRUNCATION_MARKER);
            self.len += sep + marker_len;
        } else if self.text.is_empty() {
            // Budgets too small for any full line still get a bounded prefix.
            self.text = prefix_by_chars(TRUNCATION_MARKER, self.budget).to_string();
            self.len = char_len(&self.text);
        }
    }
}

struct Walk {
    next_ref: usize,
    ref_map: BTreeMap<String, String>,
    marks: Vec<(NodeId, String)>,
}

impl Walk {
    /// Pre-order walk from `node`. Returns false once the output is closed.
    fn visit(
        &mut self,
        doc: &Document,
        node: NodeId,
        depth: usize,
        excluded: Option<NodeId>,
        out: &mut Output,
    ) -> bool {
        let Some(el) = doc.element(node) else {
            return true;
        };
        if Some(node) == excluded || SKIP_TAGS.contains(&el.tag.as_str()) || doc.is_hidden(node) {
            return true;
        }

        if let Some(line) = self.describe(doc, node, el, depth) {
            if !out.push(&line) {
                return false;
            }
            let id = format!("e{}", self.next_ref);
            self.next_ref += 1;
            self.ref_map
                .insert(format!("@{id}"), format!("[{REF_ATTR}=\"{id}\"]"));
            self.marks.push((node, id));
        }

        for child in doc.element_children(node) {
            if !self.visit(doc, child, depth + 1, excluded, out) {
                return false;
            }
        }
        true
    }

    /// Serialized line for `node`, or None when it carries nothing worth a ref.
    fn describe(&self, doc: &Document, node: NodeId, el: &Element, depth: usize) -> Option<String> {
        let role = role_of(el);
        let text = visible_text(doc, node);
        let attrs = rendered_attributes(el);
        let landmark = LANDMARKS.contains(&role.as_str())
            || LANDMARKS.contains(&el.tag.as_str())
            || is_heading_tag(&el.tag);
        if !(is_interactive(el) || !text.is_empty() || !attrs.is_empty() || landmark) {
            return None;
        }

        let mut line = format!("{}@e{} [{role}]", "  ".repeat(depth), self.next_ref);
        for attr in attrs {
            line.push(' ');
            line.push_str(&attr);
        }
        if !text.is_empty() {
            line.push_str(&format!(" \"{text}\""));
        }
        Some(line)
    }
}

fn is_interactive(el: &Element) -> bool {
    INTERACTIVE_TAGS.contains(&el.tag.as_str())
        || el
            .attrs
            .get("role")
            .is_some_and(|role| INTERACTIVE_ROLES.contains(&role.as_str()))
        || el.attrs.contains_key("onclick")
        || el.attrs.get("tabindex").is_some_and(|t| t.trim() == "0")
}

fn is_heading_tag(tag: &str) -> bool {
    matches!(tag, "h1" | "h2" | "h3" | "h4" | "h5" | "h6")
}

fn input_type(el: &Element) -> String {
    el.attrs
        .get("type")
        .map(|kind| kind.trim().to_ascii_lowercase())
        .filter(|kind| !kind.is_empty())
        .unwrap_or_else(|| "text".to_string())
}

fn role_of(el: &Element) -> String {
    if let Some(role) = el.attrs.get("role").filter(|role| !role.is_empty()) {
        return role.clone();
    }
    match el.tag.as_str() {
        "a" => "link".to_string(),
        "input" => format!("input type={}", input_type(el)),
        tag if is_heading_tag(tag) => "heading".to_string(),
        tag => tag.to_string(),
    }
}

fn visible_text(doc: &Document, node: NodeId) -> String {
    let text = collapse_whitespace(&doc.direct_text(node));
    truncate_with_suffix_by_chars(&text, MAX_NODE_TEXT_CHARS, "...")
}

fn rendered_attributes(el: &Element) -> Vec<String> {
    let non_empty = |name: &str| el.attrs.get(name).filter(|value| !value.is_empty());
    let mut parts = Vec::new();
    if let Some(placeholder) = non_empty("placeholder") {
        parts.push(format!("placeholder=\"{placeholder}\""));
    }
    if let Some(label) = non_empty("aria-label") {
        parts.push(format!("aria-label=\"{label}\""));
    }
    if el.tag == "a" {
        if let Some(href) = non_empty("href") {
            parts.push(format!("href=\"{}\"", prefix_by_chars(href, MAX_HREF_CHARS)));
        }
    }
    if el.tag == "input" {
        parts.push(format!("type={}", input_type(el)));
    }
    if let Some(test_id) = non_empty("data-testid") {
        parts.push(format!("data-testid=\"{test_id}\""));
    }
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHOP: &str = r#"<html><head><title>Pizza Town</title></head><body>
        <header><nav><a href="/menu">Menu</a><a href="/cart" aria-label="Cart"></a></nav></header>
        <main>
          <h1>Order online</h1>
          <input placeholder="Search restaurants" data-testid="search-input">
          <script>var x = 1;</script>
          <div style="display:none"><button>Hidden</button></div>
          <div><span></span><p>Fresh   pies
              daily</p></div>
          <svg><path d="M0"></path><text>icon</text></svg>
        </main>
    </body></html>"#;

    fn lines(snapshot: &Snapshot) -> Vec<&str> {
        snapshot.text.lines().collect()
    }

    #[test]
    fn header_line_uses_title() {
        let mut doc = Document::parse("https://pizza.test/", SHOP);
        let snap = extract_snapshot(&mut doc, DEFAULT_MAX_TOKENS);
        assert_eq!(lines(&snap)[0], "[page] Pizza Town");
        assert_eq!(snap.title, "Pizza Town");
        assert_eq!(snap.url, "https://pizza.test/");

        let mut untitled = Document::parse("https://pizza.test/", "<p>x</p>");
        assert_eq!(extract_snapshot(&mut untitled, 100).title, "Untitled");
    }

    #[test]
    fn emits_roles_attributes_and_indentation() {
        let mut doc = Document::parse("https://pizza.test/", SHOP);
        let snap = extract_snapshot(&mut doc, DEFAULT_MAX_TOKENS);
        let text = &snap.text;
        assert!(text.contains("@e1 [header]"), "{text}");
        assert!(text.contains("  @e2 [nav]"), "{text}");
        assert!(text.contains("    @e3 [link] href=\"/menu\" \"Menu\""), "{text}");
        assert!(text.contains("[link] aria-label=\"Cart\" href=\"/cart\""), "{text}");
        assert!(text.contains("[heading] \"Order online\""), "{text}");
        assert!(text.contains(
            "[input type=text] placeholder=\"Search restaurants\" type=text data-testid=\"search-input\""
        ));
        assert!(text.contains("[p] \"Fresh pies daily\""), "{text}");
    }

    #[test]
    fn skips_hidden_scripts_and_svg() {
        let mut doc = Document::parse("https://pizza.test/", SHOP);
        let snap = extract_snapshot(&mut doc, DEFAULT_MAX_TOKENS);
        assert!(!snap.text.contains("Hidden"));
        assert!(!snap.text.contains("var x"));
        assert!(!snap.text.contains("icon"));
        assert!(!snap.text.contains("[span]"));
    }

    #[test]
    fn every_ref_in_text_resolves_through_ref_map() {
        let mut doc = Document::parse("https://pizza.test/", SHOP);
        let snap = extract_snapshot(&mut doc, DEFAULT_MAX_TOKENS);
        let refs: Vec<&str> = snap
            .text
            .split_whitespace()
            .filter(|word| word.starts_with("@e"))
            .collect();
        assert_eq!(refs.len(), snap.ref_map.len());
        for reference in refs {
            assert_eq!(
                snap.ref_map.get(reference).map(String::as_str),
                Some(format!("[data-agent-ref=\"{}\"]", &reference[1..]).as_str())
            );
            assert!(resolve_ref(&doc, reference).is_some(), "{reference}");
        }
    }

    #[test]
    fn resnapshot_clears_stale_markers() {
        let mut doc = Document::parse("https://pizza.test/", SHOP);
        extract_snapshot(&mut doc, DEFAULT_MAX_TOKENS);
        let h1 = doc.find_first(doc.root(), |el| el.tag == "h1").unwrap();
        let before = doc.attr(h1, REF_ATTR).unwrap().to_string();

        let header = doc.find_first(doc.root(), |el| el.tag == "header").unwrap();
        doc.remove(header);
        let snap = extract_snapshot(&mut doc, DEFAULT_MAX_TOKENS);

        assert_eq!(before, "e6");
        assert_eq!(doc.attr(h1, REF_ATTR), Some("e2"));
        let marked = doc.find_all(doc.root(), |el| el.attrs.contains_key(REF_ATTR));
        assert_eq!(marked.len(), snap.ref_map.len());
        assert_eq!(resolve_ref(&doc, "@e2"), Some(h1));
        assert_eq!(resolve_ref(&doc, "e2"), Some(h1));
        assert_eq!(resolve_ref(&doc, "@e99"), None);
    }

    #[test]
    fn visible_modal_is_rendered_first_and_once() {
        let html = r#"<html><head><title>Menu</title></head><body>
            <h2>Pepperoni</h2>
            <div role="dialog" aria-label="Choose size"><button>Large</button><button>Add to order</button></div>
            <div class="Modal" style="display:none"><button>Ghost</button></div>
        </body></html>"#;
        let mut doc = Document::parse("https://pizza.test/menu", html);
        let snap = extract_snapshot(&mut doc, DEFAULT_MAX_TOKENS);
        let lines = lines(&snap);
        assert_eq!(lines[1], "");
        assert_eq!(lines[2], "[modal - handle this first]");
        assert_eq!(lines[3], "@e1 [dialog] aria-label=\"Choose size\"");
        assert_eq!(lines[4], "  @e2 [button] \"Large\"");
        let main_at = lines.iter().position(|l| *l == "[main page]").unwrap();
        assert!(lines[main_at + 1..].iter().any(|l| l.contains("Pepperoni")));
        assert_eq!(snap.text.matches("Add to order").count(), 1);
        assert!(!snap.text.contains("Ghost"));
    }

    #[test]
    fn dialog_inside_hidden_container_is_not_a_modal() {
        let html = r#"<html><head><title>Menu</title></head><body>
            <div style="display:none">
              <div role="dialog"><button>Stale addon</button></div>
            </div>
            <h2>Pepperoni</h2>
        </body></html>"#;
        let mut doc = Document::parse("https://pizza.test/menu", html);
        let snap = extract_snapshot(&mut doc, DEFAULT_MAX_TOKENS);
        assert!(!snap.text.contains("[modal - handle this first]"), "{}", snap.text);
        assert!(!snap.text.contains("Stale addon"));
        assert_eq!(lines(&snap)[1], "@e1 [heading] \"Pepperoni\"");
        assert_eq!(snap.ref_map.len(), 1);
    }

    #[test]
    fn budget_is_strict_and_ends_with_marker() {
        let mut body = String::new();
        for i in 0..200 {
            body.push_str(&format!("<button>Item number {i}</button>"));
        }
        let html = format!("<html><head><title>Long</title></head><body>{body}</body></html>");
        let mut doc = Document::parse("https://pizza.test/", &html);
        let snap = extract_snapshot(&mut doc, 50);

        assert!(char_len(&snap.text) <= 200);
        assert!(snap.text.ends_with(TRUNCATION_MARKER));
        let body_lines: Vec<&str> = lines(&snap)[1..].to_vec();
        let (last, refs) = body_lines.split_last().unwrap();
        assert_eq!(*last, TRUNCATION_MARKER);
        for line in refs {
            assert!(line.starts_with("  @e") && line.ends_with('"'), "{line}");
        }
        assert_eq!(refs.len(), snap.ref_map.len());
    }

    #[test]
    fn tiny_budget_never_exceeds_limit() {
        let mut doc = Document::parse("https://pizza.test/", SHOP);
        for tokens in 0..8 {
            let snap = extract_snapshot(&mut doc, tokens);
            assert!(char_len(&snap.text) <= tokens * CHARS_PER_TOKEN);
            assert!(snap.ref_map.is_empty());
        }
    }

    #[test]
    fn long_text_is_capped_per_node() {
        let long = "x".repeat(150);
        let mut doc = Document::parse("https://pizza.test/", &format!("<p>{long}</p>"));
        let snap = extract_snapshot(&mut doc, DEFAULT_MAX_TOKENS);
        assert!(snap.text.contains(&format!("\"{}...\"", "x".repeat(100))));
    }

    #[test]
    fn wire_names_match_page_protocol() {
        let mut doc = Document::parse("https://pizza.test/", "<button>Go</button>");
        let value = serde_json::to_value(extract_snapshot(&mut doc, 100)).unwrap();
        assert!(value.get("snapshot").is_some());
        assert_eq!(value["refMap"]["@e1"], "[data-agent-ref=\"e1\"]");
    }
}
