//! Simulated live document.
//!
//! The agent never talks to a rendering engine directly. The page process owns
//! one [`Document`]: an arena element tree parsed from HTML that supports the
//! mutations a user interaction causes (attribute markers, form values,
//! focus, scrolling) and records every simulated event so site scripts and
//! tests can react to them.

mod parse;
mod style;

use std::collections::BTreeMap;

/// Index of a node inside one [`Document`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// Element payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Lowercase tag name.
    pub tag: String,
    pub attrs: BTreeMap<String, String>,
    /// Live form value (`input.value`), distinct from the `value` attribute.
    pub value: Option<String>,
}

#[derive(Debug, Clone)]
enum NodeKind {
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone)]
struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    kind: NodeKind,
}

/// Key identity carried by synthetic keyboard events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyStroke {
    pub key: String,
    pub code: String,
    pub key_code: u32,
}

/// What a simulated interaction did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomEventKind {
    Click,
    Focus,
    Input { value: String },
    Change { value: String },
    KeyDown(KeyStroke),
    KeyPress(KeyStroke),
    KeyUp(KeyStroke),
    Scroll { delta: i64 },
}

/// One recorded event. Page-level events (scrolling) have no target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomEvent {
    pub target: Option<NodeId>,
    pub kind: DomEventKind,
}

/// An HTML document held in memory.
#[derive(Debug, Clone)]
pub struct Document {
    url: String,
    nodes: Vec<Node>,
    root: NodeId,
    scroll_y: i64,
    focused: Option<NodeId>,
    events: Vec<DomEvent>,
}

impl Document {
    /// Create a document containing only `<html><body></body></html>`.
    pub fn empty(url: impl Into<String>) -> Self {
        let mut doc = Self {
            url: url.into(),
            nodes: Vec::new(),
            root: NodeId(0),
            scroll_y: 0,
            focused: None,
            events: Vec::new(),
        };
        let root = doc.push_node(None, NodeKind::Element(Element::new("html")));
        doc.root = root;
        doc.push_node(Some(root), NodeKind::Element(Element::new("body")));
        doc
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Contents of the first `<title>`, whitespace-collapsed.
    pub fn title(&self) -> String {
        self.find_first(self.root, |el| el.tag == "title")
            .map(|id| {
                let text = self
                    .children(id)
                    .iter()
                    .filter_map(|child| self.text(*child))
                    .collect::<Vec<_>>()
                    .join(" ");
                crate::textutil::collapse_whitespace(&text)
            })
            .unwrap_or_default()
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// The `<body>` element, or the root when the markup has none.
    pub fn body(&self) -> NodeId {
        self.find_first(self.root, |el| el.tag == "body")
            .unwrap_or(self.root)
    }

    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match &self.nodes.get(id.0)?.kind {
            NodeKind::Element(el) => Some(el),
            NodeKind::Text(_) => None,
        }
    }

    fn element_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        match &mut self.nodes.get_mut(id.0)?.kind {
            NodeKind::Element(el) => Some(el),
            NodeKind::Text(_) => None,
        }
    }

    fn text(&self, id: NodeId) -> Option<&str> {
        match &self.nodes.get(id.0)?.kind {
            NodeKind::Text(text) => Some(text),
            NodeKind::Element(_) => None,
        }
    }

    pub fn tag(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|el| el.tag.as_str())
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id)?.attrs.get(name).map(String::as_str)
    }

    pub fn set_attr(&mut self, id: NodeId, name: &str, value: impl Into<String>) {
        if let Some(el) = self.element_mut(id) {
            el.attrs.insert(name.to_string(), value.into());
        }
    }

    pub fn remove_attr(&mut self, id: NodeId, name: &str) {
        if let Some(el) = self.element_mut(id) {
            el.attrs.remove(name);
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id.0)?.parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(id.0)
            .map(|node| node.children.as_slice())
            .unwrap_or(&[])
    }

    /// Element children in document order (text nodes skipped).
    pub fn element_children(&self, id: NodeId) -> Vec<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .filter(|child| self.element(*child).is_some())
            .collect()
    }

    /// Text of the direct text-node children only, joined with spaces.
    pub fn direct_text(&self, id: NodeId) -> String {
        self.children(id)
            .iter()
            .filter_map(|child| self.text(*child))
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Concatenated text of every descendant text node.
    pub fn text_content(&self, id: NodeId) -> String {
        self.descendants(id)
            .into_iter()
            .filter_map(|node| self.text(node))
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// `id` and all of its descendants in pre-order.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(self.children(node).iter().rev().copied());
        }
        out
    }

    /// True when `node` is `ancestor` or sits somewhere below it.
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    /// True while the node is still reachable from the document root.
    pub fn is_attached(&self, id: NodeId) -> bool {
        self.contains(self.root, id)
    }

    /// First element under `from` (inclusive, pre-order) matching `pred`.
    pub fn find_first(&self, from: NodeId, pred: impl Fn(&Element) -> bool) -> Option<NodeId> {
        self.descendants(from)
            .into_iter()
            .find(|id| self.element(*id).is_some_and(&pred))
    }

    /// Every element under `from` (inclusive, pre-order) matching `pred`.
    pub fn find_all(&self, from: NodeId, pred: impl Fn(&Element) -> bool) -> Vec<NodeId> {
        self.descendants(from)
            .into_iter()
            .filter(|id| self.element(*id).is_some_and(&pred))
            .collect()
    }

    /// Append a new, empty element under `parent`.
    pub fn append_element(&mut self, parent: NodeId, tag: &str) -> NodeId {
        self.push_node(Some(parent), NodeKind::Element(Element::new(tag)))
    }

    /// Append a text node under `parent`.
    pub fn append_text(&mut self, parent: NodeId, text: &str) -> NodeId {
        self.push_node(Some(parent), NodeKind::Text(text.to_string()))
    }

    /// Detach `id` (and its subtree) from its parent.
    pub fn remove(&mut self, id: NodeId) {
        let Some(parent) = self.parent(id) else {
            return;
        };
        if let Some(node) = self.nodes.get_mut(parent.0) {
            node.children.retain(|child| *child != id);
        }
        if let Some(node) = self.nodes.get_mut(id.0) {
            node.parent = None;
        }
        if self.focused.is_some_and(|focused| self.contains(id, focused)) {
            self.focused = None;
        }
    }

    /// Replace everything inside `id` with one text node.
    pub fn set_text(&mut self, id: NodeId, text: &str) {
        for child in self.children(id).to_vec() {
            self.remove(child);
        }
        self.append_text(id, text);
    }

    fn push_node(&mut self, parent: Option<NodeId>, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            parent,
            children: Vec::new(),
            kind,
        });
        if let Some(parent) = parent {
            if let Some(node) = self.nodes.get_mut(parent.0) {
                node.children.push(id);
            }
        }
        id
    }

    // -- form state ---------------------------------------------------------

    /// Current form value of an input, textarea or select.
    pub fn value(&self, id: NodeId) -> Option<String> {
        let el = self.element(id)?;
        match el.tag.as_str() {
            "select" => {
                let options = self.find_all(id, |el| el.tag == "option");
                let selected = options
                    .iter()
                    .find(|option| self.attr(**option, "selected").is_some())
                    .copied();
                match (selected, &el.value) {
                    (Some(option), _) => Some(self.option_value(option)),
                    // A cleared selection reads back as the empty string.
                    (None, Some(value)) => Some(value.clone()),
                    (None, None) => options.first().map(|option| self.option_value(*option)),
                }
            }
            "textarea" => el.value.clone().or_else(|| Some(self.text_content(id))),
            _ => el
                .value
                .clone()
                .or_else(|| el.attrs.get("value").cloned()),
        }
    }

    /// Overwrite the live form value of an element.
    pub fn set_value(&mut self, id: NodeId, value: impl Into<String>) {
        if let Some(el) = self.element_mut(id) {
            el.value = Some(value.into());
        }
    }

    /// Select the option of a `<select>` whose value matches.
    ///
    /// Returns false when no option matches; like a browser, the selection is
    /// then cleared rather than left on a stale option.
    pub fn select_option(&mut self, select: NodeId, value: &str) -> bool {
        let options = self.find_all(select, |el| el.tag == "option");
        let target = options
            .iter()
            .copied()
            .find(|option| self.option_value(*option) == value);
        for option in &options {
            self.remove_attr(*option, "selected");
        }
        match target {
            Some(option) => {
                self.set_attr(option, "selected", "");
                self.set_value(select, value);
                true
            }
            None => {
                self.set_value(select, "");
                false
            }
        }
    }

    fn option_value(&self, option: NodeId) -> String {
        self.attr(option, "value")
            .map(str::to_string)
            .unwrap_or_else(|| self.text_content(option))
    }

    // -- focus, scrolling and events ----------------------------------------

    pub fn focus(&mut self, id: NodeId) {
        self.focused = Some(id);
        self.record(Some(id), DomEventKind::Focus);
    }

    pub fn focused(&self) -> Option<NodeId> {
        self.focused
    }

    /// Scroll the viewport by `delta` pixels; the offset never goes negative.
    pub fn scroll_by(&mut self, delta: i64) {
        self.scroll_y = self.scroll_y.saturating_add(delta).max(0);
        self.record(None, DomEventKind::Scroll { delta });
    }

    pub fn scroll_y(&self) -> i64 {
        self.scroll_y
    }

    pub fn record(&mut self, target: Option<NodeId>, kind: DomEventKind) {
        self.events.push(DomEvent { target, kind });
    }

    /// All events recorded since the document was loaded.
    pub fn events(&self) -> &[DomEvent] {
        &self.events
    }
}

impl Element {
    fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attrs: BTreeMap::new(),
            value: None,
        }
    }

    /// Whitespace-separated class list contains `needle` as a substring.
    pub fn class_contains(&self, needle: &str) -> bool {
        self.attrs
            .get("class")
            .is_some_and(|class| class.contains(needle))
    }
}
