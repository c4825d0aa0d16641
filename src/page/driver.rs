//! Capability seam between the action executor and whatever renders the page.
//!
//! The executor only needs to find an element by reference, ask what kind of
//! control it is, perform a primitive interaction on it and take a snapshot.
//! [`Document`] implements this directly; the page process wraps it so site
//! scripts can react to each interaction.

use crate::dom::{DomEventKind, Document, KeyStroke, NodeId};
use crate::snapshot::{self, Snapshot};

/// Control category, used for action preconditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    /// Text input or textarea.
    TextEntry,
    /// `<select>`.
    Choice,
    Other,
}

/// Primitive interaction the executor asks a driver to perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interaction {
    Click,
    /// Focus, replace the value, fire input and change.
    SetText(String),
    /// Focus, then key down / press / up.
    Key(KeyStroke),
    /// Page-level scroll by a signed pixel delta.
    ScrollBy(i64),
    /// Pick the option with this value and fire change.
    Choose(String),
}

pub trait PageDriver {
    type Handle: Copy + Send;

    /// Resolve a reference (`@e4` or `e4`) from the latest snapshot.
    fn locate(&self, reference: &str) -> Option<Self::Handle>;

    fn kind(&self, handle: Self::Handle) -> ElementKind;

    /// Perform `interaction`. Page-level interactions take no target.
    fn perform(&mut self, interaction: Interaction, target: Option<Self::Handle>);

    /// Take a fresh snapshot, invalidating earlier references.
    fn snapshot(&mut self, max_tokens: usize) -> Snapshot;
}

const NON_TEXT_INPUT_TYPES: &[&str] = &[
    "checkbox", "radio", "submit", "button", "reset", "file", "image", "hidden", "range", "color",
];

impl KeyStroke {
    /// Key identity for a named key as a keyboard would report it.
    pub fn named(key: &str) -> Self {
        if key == "Enter" {
            return Self {
                key: key.to_string(),
                code: "Enter".to_string(),
                key_code: 13,
            };
        }
        Self {
            key: key.to_string(),
            code: format!("Key{}", key.to_uppercase()),
            key_code: key.chars().next().map_or(13, u32::from),
        }
    }
}

impl PageDriver for Document {
    type Handle = NodeId;

    fn locate(&self, reference: &str) -> Option<NodeId> {
        snapshot::resolve_ref(self, reference)
    }

    fn kind(&self, handle: NodeId) -> ElementKind {
        let Some(el) = self.element(handle) else {
            return ElementKind::Other;
        };
        match el.tag.as_str() {
            "textarea" => ElementKind::TextEntry,
            "input" => {
                let kind = el
                    .attrs
                    .get("type")
                    .map(|kind| kind.trim().to_ascii_lowercase())
                    .unwrap_or_default();
                if NON_TEXT_INPUT_TYPES.contains(&kind.as_str()) {
                    ElementKind::Other
                } else {
                    ElementKind::TextEntry
                }
            }
            "select" => ElementKind::Choice,
            _ => ElementKind::Other,
        }
    }

    fn perform(&mut self, interaction: Interaction, target: Option<NodeId>) {
        match (interaction, target) {
            (Interaction::ScrollBy(delta), _) => self.scroll_by(delta),
            (_, None) => {}
            (Interaction::Click, Some(node)) => self.record(Some(node), DomEventKind::Click),
            (Interaction::SetText(text), Some(node)) => {
                self.focus(node);
                self.set_value(node, text.clone());
                self.record(Some(node), DomEventKind::Input { value: text.clone() });
                self.record(Some(node), DomEventKind::Change { value: text });
            }
            (Interaction::Key(stroke), Some(node)) => {
                self.focus(node);
                self.record(Some(node), DomEventKind::KeyDown(stroke.clone()));
                self.record(Some(node), DomEventKind::KeyPress(stroke.clone()));
                self.record(Some(node), DomEventKind::KeyUp(stroke));
            }
            (Interaction::Choose(value), Some(node)) => {
                self.select_option(node, &value);
                let value = self.value(node).unwrap_or_default();
                self.record(Some(node), DomEventKind::Change { value });
            }
        }
    }

    fn snapshot(&mut self, max_tokens: usize) -> Snapshot {
        snapshot::extract_snapshot(self, max_tokens)
    }
}
