//! HTML → arena conversion via `scraper`.

use scraper::{ElementRef, Html};

use super::{Document, Element, NodeId, NodeKind};

impl Document {
    /// Parse a full HTML document served at `url`.
    pub fn parse(url: impl Into<String>, html: &str) -> Self {
        let parsed = Html::parse_document(html);
        let mut doc = Self {
            url: url.into(),
            nodes: Vec::new(),
            root: NodeId(0),
            scroll_y: 0,
            focused: None,
            events: Vec::new(),
        };
        doc.root = doc.graft_element(None, parsed.root_element());
        doc
    }

    /// Parse `fragment` and append its top-level nodes under `parent`.
    ///
    /// Returns the ids of the appended top-level elements.
    pub fn append_html(&mut self, parent: NodeId, fragment: &str) -> Vec<NodeId> {
        let parsed = Html::parse_fragment(fragment);
        let mut appended = Vec::new();
        for child in parsed.root_element().children() {
            if let Some(el) = ElementRef::wrap(child) {
                appended.push(self.graft_element(Some(parent), el));
            } else if let scraper::Node::Text(text) = child.value() {
                self.graft_text(parent, text);
            }
        }
        appended
    }

    fn graft_element(&mut self, parent: Option<NodeId>, source: ElementRef<'_>) -> NodeId {
        let mut element = Element::new(source.value().name());
        for (name, value) in source.value().attrs() {
            element
                .attrs
                .insert(name.to_ascii_lowercase(), value.to_string());
        }
        let id = self.push_node(parent, NodeKind::Element(element));
        for child in source.children() {
            if let Some(el) = ElementRef::wrap(child) {
                self.graft_element(Some(id), el);
            } else if let scraper::Node::Text(text) = child.value() {
                self.graft_text(id, text);
            }
        }
        id
    }

    fn graft_text(&mut self, parent: NodeId, text: &str) {
        // Whitespace-only runs carry no content for snapshots or actions.
        if !text.trim().is_empty() {
            self.push_node(Some(parent), NodeKind::Text(text.to_string()));
        }
    }
}
